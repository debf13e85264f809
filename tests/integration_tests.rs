use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

fn step_n(world: &mut World, n: u32) {
    for _ in 0..n {
        world.step(1.0 / 60.0, 8, 3);
    }
}

#[test]
fn bodies_fall_under_gravity() {
    let mut world = World::new(WorldConfig::default());
    let body_id = world
        .create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 10.0)), ..Default::default() })
        .unwrap();
    world.create_fixture(body_id, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }, FixtureDef::default()).unwrap();

    world.step(1.0 / 60.0, 8, 3);

    let y = world.body(body_id).unwrap().world_center().y;
    assert!(y < 10.0, "body should start falling, y = {y}");
}

#[test]
fn resting_box_on_ground_comes_to_rest() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world
        .create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default())
        .unwrap();

    let box_body = world
        .create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 2.0)), ..Default::default() })
        .unwrap();
    world
        .create_fixture(
            box_body,
            Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)),
            FixtureDef { density: 1.0, friction: 0.3, ..Default::default() },
        )
        .unwrap();

    step_n(&mut world, 180);

    let y = world.body(box_body).unwrap().world_center().y;
    assert!((y - 0.5).abs() < 0.1, "box should settle on the ground, y = {y}");
}

#[test]
fn two_boxes_stack_without_sinking() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world
        .create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default())
        .unwrap();

    let mut top_id = None;
    for (i, y) in [0.5_f32, 1.55].into_iter().enumerate() {
        let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, y)), ..Default::default() }).unwrap();
        world
            .create_fixture(
                body,
                Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)),
                FixtureDef { density: 1.0, friction: 0.5, ..Default::default() },
            )
            .unwrap();
        if i == 1 {
            top_id = Some(body);
        }
    }

    step_n(&mut world, 240);

    let top_y = world.body(top_id.unwrap()).unwrap().world_center().y;
    assert!(top_y > 1.0, "top box should rest on the bottom box, not sink through, y = {top_y}");
}
