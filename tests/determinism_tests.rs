use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

fn build_pyramid(world: &mut World) {
    let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    world.create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default()).unwrap();

    let rows = 5;
    for row in 0..rows {
        let count = rows - row;
        let y = 0.5 + row as f32 * 1.01;
        let start_x = -(count as f32) * 0.505;
        for i in 0..count {
            let x = start_x + i as f32 * 1.01;
            let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(x, y)), ..Default::default() }).unwrap();
            world
                .create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, friction: 0.4, ..Default::default() })
                .unwrap();
        }
    }
}

fn positions_after(steps: u32) -> Vec<(f32, f32, f32)> {
    let mut world = World::new(WorldConfig::default());
    build_pyramid(&mut world);
    for _ in 0..steps {
        world.step(1.0 / 60.0, 8, 3);
    }
    world.bodies().map(|b| (b.world_center().x, b.world_center().y, b.transform.rotation.angle())).collect()
}

#[test]
fn identical_scenes_produce_bit_identical_trajectories() {
    let run_a = positions_after(300);
    let run_b = positions_after(300);
    assert_eq!(run_a.len(), run_b.len());
    for (a, b) in run_a.iter().zip(run_b.iter()) {
        assert_eq!(a.0.to_bits(), b.0.to_bits(), "x diverged between identical runs");
        assert_eq!(a.1.to_bits(), b.1.to_bits(), "y diverged between identical runs");
        assert_eq!(a.2.to_bits(), b.2.to_bits(), "angle diverged between identical runs");
    }
}

#[test]
fn island_seed_order_is_independent_of_arena_slot_reuse() {
    // Creating and destroying bodies before the scene of interest churns
    // arena slots; body_order (not arena iteration order) must still seed
    // island DFS identically to the no-churn case.
    let mut churned = World::new(WorldConfig::default());
    for i in 0..5 {
        let id = churned.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(Vec2::new(i as f32 * 10.0, 0.0)), ..Default::default() }).unwrap();
        churned.destroy_body(id).unwrap();
    }
    build_pyramid(&mut churned);

    let mut clean = World::new(WorldConfig::default());
    build_pyramid(&mut clean);

    for _ in 0..120 {
        churned.step(1.0 / 60.0, 8, 3);
        clean.step(1.0 / 60.0, 8, 3);
    }

    let churned_positions: Vec<Vec2> = churned.bodies().map(|b| b.world_center()).collect();
    let clean_positions: Vec<Vec2> = clean.bodies().map(|b| b.world_center()).collect();
    assert_eq!(churned_positions.len(), clean_positions.len());
    for (a, b) in churned_positions.iter().zip(clean_positions.iter()) {
        assert!((*a - *b).length() < 1e-3, "body positions diverged after arena churn: {a:?} vs {b:?}");
    }
}
