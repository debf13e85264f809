//! AABB and ray-cast spatial queries over the broad phase, dispatched to
//! per-fixture shape tests.

use glam::Vec2;

use crate::core::body::{Body, FixtureId};
use crate::core::fixture::Fixture;
use crate::core::shapes::{Aabb, Shape};
use crate::core::types::Transform;
use crate::utils::allocator::{Arena, EntityId};

use super::broadphase::BroadPhase;

/// Callback for `World::query_aabb`. Return `false` to stop the query
/// early; otherwise every overlapping fixture's fattened-AABB proxy is
/// visited once.
pub trait QueryCallback {
    fn report_fixture(&mut self, fixture: FixtureId) -> bool;
}

impl<F: FnMut(FixtureId) -> bool> QueryCallback for F {
    fn report_fixture(&mut self, fixture: FixtureId) -> bool {
        self(fixture)
    }
}

/// Callback for `World::ray_cast`. `fraction` is along `(point1, point2)`;
/// the return value follows the broad-phase ray-cast contract: `0` stops
/// the whole cast, a negative value ignores this fixture and keeps
/// searching the full segment, and a value in `(0, 1]` clips the segment to
/// that fraction and continues (the standard way to collect the *closest*
/// hit without visiting fixtures behind it).
pub trait RayCastCallback {
    fn report_fixture(&mut self, fixture: FixtureId, point: Vec2, normal: Vec2, fraction: f32) -> f32;
}

impl<F: FnMut(FixtureId, Vec2, Vec2, f32) -> f32> RayCastCallback for F {
    fn report_fixture(&mut self, fixture: FixtureId, point: Vec2, normal: Vec2, fraction: f32) -> f32 {
        self(fixture, point, normal, fraction)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
}

fn unpack_fixture_id(packed: u64) -> FixtureId {
    EntityId::new((packed & 0xFFFF_FFFF) as usize, (packed >> 32) as u32)
}

pub fn query_aabb(broad_phase: &BroadPhase, aabb: Aabb, callback: &mut dyn QueryCallback) {
    broad_phase.query(aabb, |packed| callback.report_fixture(unpack_fixture_id(packed)));
}

pub fn ray_cast(
    broad_phase: &BroadPhase,
    fixtures: &Arena<Fixture>,
    bodies: &Arena<Body>,
    input: RayCastInput,
    callback: &mut dyn RayCastCallback,
) {
    broad_phase.ray_cast(input.p1, input.p2, |packed, p1, p2| {
        let fixture_id = unpack_fixture_id(packed);
        let Some(fixture) = fixtures.get(fixture_id) else {
            return -1.0;
        };
        let Some(body) = bodies.get(fixture.body) else {
            return -1.0;
        };
        match shape_ray_cast(&fixture.shape, &body.transform, p1, p2) {
            Some((fraction, point, normal)) => callback.report_fixture(fixture_id, point, normal, fraction),
            None => -1.0,
        }
    });
}

/// Ray-casts a single shape; returns `(fraction along p1->p2, world point,
/// world outward normal)` of the closest entry hit, if any.
fn shape_ray_cast(shape: &Shape, xf: &Transform, p1: Vec2, p2: Vec2) -> Option<(f32, Vec2, Vec2)> {
    match shape {
        Shape::Circle { center, radius } => ray_cast_circle(xf.apply(*center), *radius, p1, p2),
        Shape::Polygon(poly) => {
            let local_p1 = xf.apply_inverse(p1);
            let local_p2 = xf.apply_inverse(p2);
            ray_cast_polygon(&poly.vertices, &poly.normals, poly.radius, local_p1, local_p2)
                .map(|(fraction, normal)| (fraction, p1 + fraction * (p2 - p1), xf.apply_vec(normal)))
        }
        Shape::Edge { v1, v2, radius } => {
            let verts = vec![*v1, *v2];
            let edge_dir = (*v2 - *v1).normalize_or_zero();
            let normals = vec![Vec2::new(edge_dir.y, -edge_dir.x), Vec2::new(-edge_dir.y, edge_dir.x)];
            let local_p1 = xf.apply_inverse(p1);
            let local_p2 = xf.apply_inverse(p2);
            ray_cast_polygon(&verts, &normals, *radius, local_p1, local_p2)
                .map(|(fraction, normal)| (fraction, p1 + fraction * (p2 - p1), xf.apply_vec(normal)))
        }
    }
}

fn ray_cast_circle(center: Vec2, radius: f32, p1: Vec2, p2: Vec2) -> Option<(f32, Vec2, Vec2)> {
    let s = p1 - center;
    let d = p2 - p1;
    let length_sq = d.length_squared();
    if length_sq < 1e-12 {
        return None;
    }
    let b = s.length_squared() - radius * radius;
    let c = s.dot(d);
    let rr = c * c - length_sq * b;
    if rr < 0.0 {
        return None;
    }
    let t = -(c + rr.sqrt()) / length_sq;
    if (0.0..=1.0).contains(&t) {
        let point = p1 + t * d;
        let normal = (point - center).normalize_or_zero();
        Some((t, point, normal))
    } else {
        None
    }
}

/// Ray-cast against a convex (rounded) polygon given by local vertices and
/// outward face normals, via slab clipping along each face.
fn ray_cast_polygon(vertices: &[Vec2], normals: &[Vec2], radius: f32, p1: Vec2, p2: Vec2) -> Option<(f32, Vec2)> {
    let d = p2 - p1;
    let mut lower = 0.0f32;
    let mut upper = 1.0f32;
    let mut best_index: Option<usize> = None;

    for i in 0..vertices.len() {
        // Offset the face outward by the skin radius so rounded polygons
        // (and degenerate two-vertex "edges") are hit at their true surface.
        let numerator = normals[i].dot(vertices[i] - p1) + radius;
        let denominator = normals[i].dot(d);

        if denominator == 0.0 {
            if numerator < 0.0 {
                return None;
            }
        } else if denominator < 0.0 && numerator < lower * denominator {
            lower = numerator / denominator;
            best_index = Some(i);
        } else if denominator > 0.0 && numerator < upper * denominator {
            upper = numerator / denominator;
        }

        if upper < lower {
            return None;
        }
    }

    best_index.map(|i| (lower, normals[i]))
}
