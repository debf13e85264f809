use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::{BodyDef, BodyKind, FixtureDef, Transform, World, WorldConfig};

fn bench_broad_phase_100_bodies(c: &mut Criterion) {
    c.bench_function("broad_phase_100_bodies", |b| {
        b.iter(|| {
            let mut world = World::new(WorldConfig::default());
            for i in 0..100 {
                let body = world
                    .create_body(BodyDef { kind: BodyKind::Dynamic, transform: Transform { position: Vec2::new(i as f32 * 0.3, 0.0), ..Default::default() }, ..Default::default() })
                    .unwrap();
                world.create_fixture(body, Shape::Circle { center: Vec2::ZERO, radius: 0.1 }, FixtureDef { density: 1.0, ..Default::default() }).unwrap();
            }
            world.step(black_box(1.0 / 60.0), 8, 3);
        })
    });
}

fn bench_stacked_boxes_steady_state(c: &mut Criterion) {
    c.bench_function("stacked_boxes_60_steps", |b| {
        b.iter(|| {
            let mut world = World::new(WorldConfig::default());
            let ground = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
            world
                .create_fixture(ground, Shape::Polygon(Polygon::box_shape(50.0, 1.0, Vec2::new(0.0, -1.0), 0.0)), FixtureDef::default())
                .unwrap();
            for i in 0..10 {
                let body = world
                    .create_body(BodyDef { kind: BodyKind::Dynamic, transform: Transform { position: Vec2::new(0.0, i as f32 * 1.01 + 0.5), ..Default::default() }, ..Default::default() })
                    .unwrap();
                world
                    .create_fixture(body, Shape::Polygon(Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0)), FixtureDef { density: 1.0, friction: 0.4, ..Default::default() })
                    .unwrap();
            }
            for _ in 0..60 {
                world.step(black_box(1.0 / 60.0), 8, 3);
            }
        })
    });
}

criterion_group!(benches, bench_broad_phase_100_bodies, bench_stacked_boxes_steady_state);
criterion_main!(benches);
