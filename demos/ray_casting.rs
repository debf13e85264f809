use glam::Vec2;
use impulse2d::core::shapes::Shape;
use impulse2d::{BodyDef, BodyKind, FixtureDef, FixtureId, World, WorldConfig};

fn main() {
    let mut world = World::new(WorldConfig::default());
    let body_id = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world.create_fixture(body_id, Shape::Circle { center: Vec2::ZERO, radius: 1.0 }, FixtureDef::default()).unwrap();

    let mut hits: Vec<FixtureId> = Vec::new();
    world.ray_cast(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), &mut |fixture: FixtureId, _point: Vec2, _normal: Vec2, _fraction: f32| {
        hits.push(fixture);
        1.0
    });

    println!("ray hits: {}", hits.len());
}
