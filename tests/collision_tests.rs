use glam::Vec2;
use impulse2d::collide;
use impulse2d::collision::broadphase::BroadPhase;
use impulse2d::core::shapes::{Polygon, Shape};
use impulse2d::Transform;

fn box_shape(half: f32) -> Shape {
    Shape::Polygon(Polygon::box_shape(half, half, Vec2::ZERO, 0.0))
}

#[test]
fn contact_manifold_detects_box_overlap() {
    let shape_a = box_shape(0.5);
    let shape_b = box_shape(0.5);
    let xf_a = Transform::default();
    let xf_b = Transform { position: Vec2::new(0.4, 0.0), ..Default::default() };

    let manifold = collide(&shape_a, &xf_a, &shape_b, &xf_b);
    assert!(!manifold.points.is_empty(), "overlapping boxes should generate contact points");
}

#[test]
fn box_box_manifold_produces_multiple_points() {
    let shape_a = box_shape(0.5);
    let shape_b = box_shape(0.5);
    let xf_a = Transform::default();
    let xf_b = Transform { position: Vec2::new(0.3, 0.0), ..Default::default() };

    let manifold = collide(&shape_a, &xf_a, &shape_b, &xf_b);
    assert!(manifold.points.len() >= 2, "face-face overlap should produce clipped points, got {}", manifold.points.len());
    assert!(manifold.points.len() <= 2, "manifold should be capped at MAX_MANIFOLD_POINTS");
}

#[test]
fn separated_boxes_produce_no_manifold() {
    let shape_a = box_shape(0.5);
    let shape_b = box_shape(0.5);
    let xf_a = Transform::default();
    let xf_b = Transform { position: Vec2::new(5.0, 0.0), ..Default::default() };

    let manifold = collide(&shape_a, &xf_a, &shape_b, &xf_b);
    assert!(manifold.points.is_empty(), "separated boxes should not generate a manifold");
}

#[test]
fn broadphase_move_proxy_finds_overlapping_pair() {
    let mut broadphase = BroadPhase::new();

    let aabb_a = box_shape(0.5).compute_aabb(&Transform::default());
    let aabb_b = box_shape(0.5).compute_aabb(&Transform { position: Vec2::new(0.2, 0.0), ..Default::default() });

    let proxy_a = broadphase.create_proxy(aabb_a, 0);
    let proxy_b = broadphase.create_proxy(aabb_b, 1);

    let mut pairs = Vec::new();
    broadphase.update_pairs(|a, b| pairs.push((a, b)));

    assert!(
        pairs.iter().any(|&(a, b)| (a, b) == (0, 1) || (a, b) == (1, 0)),
        "broadphase missed overlapping proxies {proxy_a:?}/{proxy_b:?}"
    );
}
