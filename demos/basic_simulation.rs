use glam::Vec2;
use impulse2d::core::shapes::Shape;
use impulse2d::{BodyDef, BodyKind, FixtureDef, World, WorldConfig};

fn main() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world
        .create_fixture(ground, Shape::Polygon(impulse2d::core::shapes::Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default())
        .unwrap();

    let body = world
        .create_body(BodyDef { kind: BodyKind::Dynamic, transform: impulse2d::Transform { position: Vec2::new(0.0, 1.0), ..Default::default() }, ..Default::default() })
        .unwrap();
    world.create_fixture(body, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }, FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    world.step(1.0 / 60.0, 8, 3);

    let pos = world.body(body).unwrap().world_center();
    println!("body position after one step: {pos:?}");
}
