use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

#[test]
fn fast_circle_does_not_tunnel_through_thin_wall() {
    let mut world = World::new(WorldConfig::default());

    let wall = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, 5.0)), ..Default::default() }).unwrap();
    world
        .create_fixture(wall, Shape::Polygon(Polygon::box_shape(10.0, 0.1, Vec2::ZERO, 0.0)), FixtureDef { restitution: 1.0, ..Default::default() })
        .unwrap();

    let bullet = world
        .create_body(BodyDef { kind: BodyKind::Dynamic, bullet: true, gravity_scale: 0.0, ..Default::default() })
        .unwrap();
    world.create_fixture(bullet, Shape::Circle { center: Vec2::ZERO, radius: 0.2 }, FixtureDef { density: 1.0, restitution: 1.0, ..Default::default() }).unwrap();
    world.body_mut(bullet).unwrap().velocity.linear = Vec2::new(0.0, 600.0);

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(bullet).unwrap();
    assert!(body.world_center().y < 6.0, "bullet tunneled through the wall, y = {}", body.world_center().y);
    assert!(body.velocity.linear.y < 0.0, "bullet should bounce off the wall");
}

#[test]
fn fast_box_bullet_hits_wall_ccd() {
    let mut world = World::new(WorldConfig::default());

    let wall = world.create_body(BodyDef { kind: BodyKind::Static, transform: at(Vec2::new(0.0, 10.0)), ..Default::default() }).unwrap();
    world
        .create_fixture(wall, Shape::Polygon(Polygon::box_shape(5.0, 0.5, Vec2::ZERO, 0.0)), FixtureDef { restitution: 1.0, ..Default::default() })
        .unwrap();

    let projectile = world.create_body(BodyDef { kind: BodyKind::Dynamic, bullet: true, gravity_scale: 0.0, ..Default::default() }).unwrap();
    world
        .create_fixture(projectile, Shape::Polygon(Polygon::box_shape(0.2, 0.2, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, restitution: 1.0, ..Default::default() })
        .unwrap();
    world.body_mut(projectile).unwrap().velocity.linear = Vec2::new(0.0, 600.0);

    world.step(1.0 / 60.0, 8, 3);

    let body = world.body(projectile).unwrap();
    assert!(body.world_center().y < 11.0, "box bullet tunneled through the wall");
    assert!(body.velocity.linear.y < 0.0, "box bullet should bounce off the wall");
}

#[test]
fn non_bullet_dynamic_vs_dynamic_is_not_toi_eligible() {
    // Two ordinary (non-bullet) dynamic boxes passing through each other at
    // high speed are not swept by TOI; only static/bullet pairings are.
    let mut world = World::new(WorldConfig::default());

    let a = world.create_body(BodyDef { kind: BodyKind::Dynamic, gravity_scale: 0.0, ..Default::default() }).unwrap();
    world.create_fixture(a, Shape::Circle { center: Vec2::ZERO, radius: 0.1 }, FixtureDef { density: 1.0, ..Default::default() }).unwrap();
    world.body_mut(a).unwrap().velocity.linear = Vec2::new(0.0, 500.0);

    let b = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(0.0, 4.0)), gravity_scale: 0.0, ..Default::default() }).unwrap();
    world.create_fixture(b, Shape::Circle { center: Vec2::ZERO, radius: 0.1 }, FixtureDef { density: 1.0, ..Default::default() }).unwrap();

    world.step(1.0 / 60.0, 8, 3);

    // Without bullet flags on either body, no TOI pairing is eligible for
    // this pair: the non-bullet dynamic-dynamic case is excluded by design.
    assert_eq!(world.last_degeneracy_count(), 0);
}
