use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

#[test]
fn resting_body_falls_asleep_after_time_to_sleep() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, -1.0)), ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::ZERO, 0.0)), FixtureDef::default()).unwrap();

    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.5)), ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    for _ in 0..180 {
        world.step(1.0 / 60.0, 8, 3);
    }

    assert!(!world.body(body).unwrap().flags.awake, "body resting long enough should fall asleep");
}

#[test]
fn disabling_allow_sleep_keeps_bodies_awake_indefinitely() {
    let mut world = World::new(WorldConfig::default());
    world.set_allow_sleep(false);

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, -1.0)), ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::ZERO, 0.0)), FixtureDef::default()).unwrap();

    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.5)), ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    for _ in 0..180 {
        world.step(1.0 / 60.0, 8, 3);
    }

    assert!(world.body(body).unwrap().flags.awake, "body should stay awake while allow_sleep is disabled world-wide");
}

#[test]
fn individual_body_allow_sleep_false_overrides_world_setting() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, -1.0)), ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::ZERO, 0.0)), FixtureDef::default()).unwrap();

    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.5)), allow_sleep: false, ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    for _ in 0..180 {
        world.step(1.0 / 60.0, 8, 3);
    }

    assert!(world.body(body).unwrap().flags.awake, "a body created with allow_sleep=false should never be put to sleep");
}

#[test]
fn waking_one_body_in_a_sleeping_stack_wakes_the_whole_island() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, -1.0)), ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::ZERO, 0.0)), FixtureDef::default()).unwrap();

    let bottom = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.5)), ..Default::default() }).unwrap();
    world.create_fixture(bottom, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, friction: 0.5, ..Default::default() }).unwrap();

    let top = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 1.51)), ..Default::default() }).unwrap();
    world.create_fixture(top, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, friction: 0.5, ..Default::default() }).unwrap();

    for _ in 0..180 {
        world.step(1.0 / 60.0, 8, 3);
    }
    assert!(!world.body(bottom).unwrap().flags.awake);
    assert!(!world.body(top).unwrap().flags.awake);

    world.body_mut(top).unwrap().wake();
    assert!(world.body(top).unwrap().flags.awake);

    // One more step re-islands the touching pair; since they're in contact,
    // the bottom body must wake too once the island is rebuilt.
    world.step(1.0 / 60.0, 8, 3);
    assert!(world.body(bottom).unwrap().flags.awake, "waking one body should wake the rest of its resting island");
}
