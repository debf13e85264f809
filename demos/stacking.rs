use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn main() {
    let mut world = World::new(WorldConfig::default());

    let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world
        .create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default())
        .unwrap();

    for i in 0..5 {
        let body = world
            .create_body(BodyDef {
                kind: BodyKind::Dynamic,
                transform: Transform { position: Vec2::new(0.0, i as f32 * 1.01 + 0.5), ..Default::default() },
                ..Default::default()
            })
            .unwrap();
        world
            .create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, friction: 0.4, ..Default::default() })
            .unwrap();
    }

    for _ in 0..120 {
        world.step(1.0 / 60.0, 8, 3);
    }

    println!("simulated a stack of 5 boxes for 2 seconds");
}
