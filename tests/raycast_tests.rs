use glam::Vec2;
use impulse2d::core::shapes::Shape;
use impulse2d::{BodyDef, BodyKind, Filter, FixtureDef, FixtureId, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

fn add_circle(world: &mut World, position: Vec2, is_sensor: bool, filter: Filter) -> FixtureId {
    let body = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(position), ..Default::default() }).unwrap();
    world
        .create_fixture(body, Shape::Circle { center: Vec2::ZERO, radius: 0.5 }, FixtureDef { is_sensor, filter, ..Default::default() })
        .unwrap()
}

#[test]
fn raycast_reports_closest_hit_first() {
    let mut world = World::new(WorldConfig::default());

    add_circle(&mut world, Vec2::new(0.0, 4.0), false, Filter::default());
    add_circle(&mut world, Vec2::new(0.0, 8.0), false, Filter::default());

    let mut hits: Vec<(FixtureId, f32)> = Vec::new();
    world.ray_cast(Vec2::ZERO, Vec2::new(0.0, 20.0), &mut |fixture: FixtureId, _point: Vec2, _normal: Vec2, fraction: f32| {
        hits.push((fixture, fraction));
        1.0
    });

    assert_eq!(hits.len(), 2, "ray should cross both circles");
    hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    assert!(hits[0].1 < hits[1].1, "hits should come back ordered by fraction along the ray when the callback asks for full enumeration");
}

#[test]
fn raycast_callback_zero_return_stops_the_whole_cast() {
    let mut world = World::new(WorldConfig::default());

    add_circle(&mut world, Vec2::new(0.0, 4.0), false, Filter::default());
    add_circle(&mut world, Vec2::new(0.0, 8.0), false, Filter::default());

    let mut visit_count = 0;
    world.ray_cast(Vec2::ZERO, Vec2::new(0.0, 20.0), &mut |_fixture: FixtureId, _point: Vec2, _normal: Vec2, _fraction: f32| {
        visit_count += 1;
        0.0
    });

    assert_eq!(visit_count, 1, "returning 0 from the callback should stop the cast after the first fixture visited");
}

#[test]
fn query_aabb_finds_overlapping_fixture_and_respects_region() {
    let mut world = World::new(WorldConfig::default());

    let near = add_circle(&mut world, Vec2::new(0.0, 0.0), false, Filter::default());
    add_circle(&mut world, Vec2::new(100.0, 100.0), false, Filter::default());

    let aabb = impulse2d::Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
    let mut found = Vec::new();
    world.query_aabb(aabb, &mut |fixture: FixtureId| {
        found.push(fixture);
        true
    });

    assert_eq!(found, vec![near], "query should only return the fixture inside the queried region");
}
