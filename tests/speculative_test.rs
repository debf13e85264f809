use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

#[test]
fn moderate_speed_body_is_stopped_by_position_solve_without_ccd() {
    let mut world = World::new(WorldConfig::default());

    let wall = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, 2.0)), ..Default::default() }).unwrap();
    world
        .create_fixture(wall, Shape::Polygon(Polygon::box_shape(5.0, 0.5, Vec2::ZERO, 0.0)), FixtureDef { restitution: 0.0, ..Default::default() })
        .unwrap();

    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.9)), gravity_scale: 0.0, ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }, FixtureDef { density: 1.0, restitution: 0.0, ..Default::default() }).unwrap();
    world.body_mut(body).unwrap().velocity.linear = Vec2::new(0.0, 12.0);

    for _ in 0..10 {
        world.step(1.0 / 60.0, 8, 3);
    }

    let y = world.body(body).unwrap().world_center().y;
    assert!(y <= 1.1, "circle penetrated the wall, y = {y}");
}

#[test]
fn resting_contact_does_not_accumulate_penetration_over_many_steps() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, -1.0)), ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::ZERO, 0.0)), FixtureDef::default()).unwrap();

    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 0.5)), ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    let mut min_y = f32::MAX;
    for _ in 0..300 {
        world.step(1.0 / 60.0, 8, 3);
        min_y = min_y.min(world.body(body).unwrap().world_center().y);
    }

    assert!(min_y > 0.4, "box sank below the expected resting position, min y = {min_y}");
}
