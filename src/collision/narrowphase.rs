//! Shape-pair collision routines: "given two shapes and their transforms,
//! produce a contact manifold". Dispatches on the shape kinds of the two
//! fixtures; each routine follows the separating-axis + clipping style
//! used throughout this family of engines (compute the best separating
//! axis, pick the incident feature on the other shape, clip it against
//! the reference face's side planes).

use glam::Vec2;

use crate::core::shapes::{Polygon, Shape};
use crate::core::types::Transform;

use super::manifold::{ContactFeature, FeatureType, Manifold, ManifoldType};

/// Produces a manifold for the ordered pair `(shape_a, shape_b)`. The
/// caller (the contact manager) is responsible for canonicalizing which
/// fixture is "A" so results are orientation-stable across steps.
pub fn collide(shape_a: &Shape, xf_a: &Transform, shape_b: &Shape, xf_b: &Transform) -> Manifold {
    match (shape_a, shape_b) {
        (Shape::Circle { center: ca, radius: ra }, Shape::Circle { center: cb, radius: rb }) => {
            collide_circles(*ca, *ra, xf_a, *cb, *rb, xf_b)
        }
        (Shape::Polygon(pa), Shape::Circle { center: cb, radius: rb }) => {
            collide_polygon_circle(pa, xf_a, *cb, *rb, xf_b)
        }
        (Shape::Circle { center: ca, radius: ra }, Shape::Polygon(pb)) => {
            flip(collide_polygon_circle(pb, xf_b, *ca, *ra, xf_a))
        }
        (Shape::Polygon(pa), Shape::Polygon(pb)) => collide_polygons(pa, xf_a, pb, xf_b),
        (Shape::Edge { v1, v2, radius }, other) => {
            let edge_poly = edge_as_polygon(*v1, *v2, *radius);
            collide(&Shape::Polygon(edge_poly), xf_a, other, xf_b)
        }
        (other, Shape::Edge { v1, v2, radius }) => {
            let edge_poly = edge_as_polygon(*v1, *v2, *radius);
            collide(other, xf_a, &Shape::Polygon(edge_poly), xf_b)
        }
    }
}

fn edge_as_polygon(v1: Vec2, v2: Vec2, radius: f32) -> Polygon {
    let mut poly = Polygon::from_ccw_vertices(vec![v1, v2]);
    poly.radius = radius;
    poly
}

fn flip(mut m: Manifold) -> Manifold {
    m.manifold_type = match m.manifold_type {
        ManifoldType::Circles => ManifoldType::Circles,
        ManifoldType::FaceA => ManifoldType::FaceB,
        ManifoldType::FaceB => ManifoldType::FaceA,
    };
    for p in &mut m.points {
        std::mem::swap(&mut p.id.index_a, &mut p.id.index_b);
        std::mem::swap(&mut p.id.type_a, &mut p.id.type_b);
    }
    m
}

fn collide_circles(ca: Vec2, ra: f32, xf_a: &Transform, cb: Vec2, rb: f32, xf_b: &Transform) -> Manifold {
    let world_a = xf_a.apply(ca);
    let world_b = xf_b.apply(cb);
    let d = world_b - world_a;
    let dist = d.length();
    if dist > ra + rb {
        return Manifold::empty();
    }
    let normal = if dist > 1e-9 { d / dist } else { Vec2::X };
    Manifold::circles(ca, xf_a.apply_inverse(world_b), xf_a.apply_vec_inverse(normal))
}

fn collide_polygon_circle(poly: &Polygon, xf_a: &Transform, center_b: Vec2, radius_b: f32, xf_b: &Transform) -> Manifold {
    // Circle center in polygon's local frame.
    let c = xf_a.apply_inverse(xf_b.apply(center_b));

    let n = poly.vertices.len();
    let mut separation = f32::MIN;
    let mut normal_index = 0;
    for i in 0..n {
        let s = poly.normals[i].dot(c - poly.vertices[i]);
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let radius = poly.radius + radius_b;
    if separation > radius {
        return Manifold::empty();
    }

    let v1 = poly.vertices[normal_index];
    let v2 = poly.vertices[(normal_index + 1) % n];

    if separation < 1e-9 {
        // Center inside polygon: push out along the face normal.
        let normal = poly.normals[normal_index];
        return Manifold::circles(0.5 * (v1 + v2), c, normal);
    }

    let u1 = (c - v1).dot(v2 - v1);
    let u2 = (c - v2).dot(v1 - v2);

    if u1 <= 0.0 {
        if c.distance_squared(v1) > radius * radius {
            return Manifold::empty();
        }
        let normal = (c - v1).normalize_or_zero();
        Manifold::circles(v1, c, normal)
    } else if u2 <= 0.0 {
        if c.distance_squared(v2) > radius * radius {
            return Manifold::empty();
        }
        let normal = (c - v2).normalize_or_zero();
        Manifold::circles(v2, c, normal)
    } else {
        let normal = poly.normals[normal_index];
        if (c - v1).dot(normal) > radius {
            return Manifold::empty();
        }
        Manifold::circles(0.5 * (v1 + v2), c, normal)
    }
}

/// Finds the polygon face with the maximum separation against `other`,
/// in `self`'s local frame (the standard SAT axis search).
fn find_max_separation(poly1: &Polygon, xf1: &Transform, poly2: &Polygon, xf2: &Transform) -> (f32, usize) {
    let n1 = poly1.vertices.len();
    let mut best_separation = f32::MIN;
    let mut best_edge = 0;

    // Relative transform mapping poly2-local points into poly1-local space.
    let rel_rot = xf1.rotation.inv_mul(&xf2.rotation);
    let rel_pos = xf1.rotation.unrotate(xf2.position - xf1.position);

    for i in 0..n1 {
        let n = poly1.normals[i];
        // Same normal expressed in poly2's local frame.
        let n_in_2 = rel_rot.unrotate(n);

        let support_index = poly2.support(-n_in_2);
        let v1 = poly1.vertices[i];
        let v2_in_1 = rel_rot.rotate(poly2.vertices[support_index]) + rel_pos;

        let separation = n.dot(v2_in_1 - v1);
        if separation > best_separation {
            best_separation = separation;
            best_edge = i;
        }
    }

    (best_separation, best_edge)
}

fn incident_edge(poly: &Polygon, normal_in_local: Vec2) -> usize {
    let mut best_index = 0;
    let mut best_dot = f32::MAX;
    for (i, n) in poly.normals.iter().enumerate() {
        let dot = n.dot(normal_in_local);
        if dot < best_dot {
            best_dot = dot;
            best_index = i;
        }
    }
    best_index
}

fn collide_polygons(poly_a: &Polygon, xf_a: &Transform, poly_b: &Polygon, xf_b: &Transform) -> Manifold {
    let (separation_a, edge_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    let (separation_b, edge_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);

    let total_radius = poly_a.radius + poly_b.radius;
    if separation_a > total_radius || separation_b > total_radius {
        return Manifold::empty();
    }

    let flip_order = separation_b > separation_a + 0.1 * crate::config::LINEAR_SLOP;

    let (reference, ref_xf, incident, inc_xf, ref_edge) = if flip_order {
        (poly_b, xf_b, poly_a, xf_a, edge_b)
    } else {
        (poly_a, xf_a, poly_b, xf_b, edge_a)
    };

    let ref_normal_local = reference.normals[ref_edge];
    // Normal expressed in incident polygon's local frame.
    let rel_rot = inc_xf.rotation.inv_mul(&ref_xf.rotation);
    let normal_in_incident = rel_rot.rotate(ref_normal_local);
    let inc_edge = incident_edge(incident, normal_in_incident);

    let n_inc = incident.vertices.len();
    let i1_local = incident.vertices[inc_edge];
    let i2_local = incident.vertices[(inc_edge + 1) % n_inc];

    // Map incident vertices into reference polygon's local frame.
    let to_ref_rot = ref_xf.rotation.inv_mul(&inc_xf.rotation);
    let to_ref_pos = ref_xf.rotation.unrotate(inc_xf.position - ref_xf.position);
    let i1 = to_ref_rot.rotate(i1_local) + to_ref_pos;
    let i2 = to_ref_rot.rotate(i2_local) + to_ref_pos;

    let n_ref = reference.vertices.len();
    let v1 = reference.vertices[ref_edge];
    let v2 = reference.vertices[(ref_edge + 1) % n_ref];
    let tangent = (v2 - v1).normalize_or_zero();

    let side1 = -tangent.dot(v1);
    let side2 = tangent.dot(v2);

    let clipped = match clip_segment(i1, i2, inc_edge as u8, -tangent, side1) {
        Some(c) => c,
        None => return Manifold::empty(),
    };
    let clipped = match clip_segment(clipped.0, clipped.1, inc_edge as u8, tangent, side2) {
        Some(c) => c,
        None => return Manifold::empty(),
    };

    let mut points = Vec::new();
    for (point, inc_id) in [clipped.0, clipped.1].into_iter().zip([clipped.2, clipped.3]) {
        let separation = ref_normal_local.dot(point - v1);
        if separation <= total_radius + crate::config::LINEAR_SLOP {
            let (index_a, type_a, index_b, type_b) = if flip_order {
                (inc_id, FeatureType::Vertex, ref_edge as u8, FeatureType::Face)
            } else {
                (ref_edge as u8, FeatureType::Face, inc_id, FeatureType::Vertex)
            };
            points.push((point, ContactFeature::new(index_a, type_a, index_b, type_b)));
        }
    }

    if points.is_empty() {
        return Manifold::empty();
    }

    let manifold_type = if flip_order {
        ManifoldType::FaceB
    } else {
        ManifoldType::FaceA
    };

    Manifold::face(manifold_type, ref_normal_local, v1, points)
}

/// Clips the segment `(v1, v2)` (with ids `id1`/`id2` initially both
/// `edge_id`) against the half-plane `normal . p >= offset`; returns the
/// clipped segment plus each endpoint's surviving id tag, or `None` if the
/// whole segment lies on the excluded side.
fn clip_segment(v1: Vec2, v2: Vec2, edge_id: u8, normal: Vec2, offset: f32) -> Option<(Vec2, Vec2, u8, u8)> {
    let d1 = normal.dot(v1) - offset;
    let d2 = normal.dot(v2) - offset;

    let mut out1 = v1;
    let mut out2 = v2;
    let id1 = edge_id;
    let id2 = edge_id;
    let mut count = 0;

    if d1 <= 0.0 {
        count += 1;
    }
    if d2 <= 0.0 {
        count += 1;
    }

    if count == 0 {
        return None;
    }

    if d1 > 0.0 && d2 <= 0.0 {
        let t = d1 / (d1 - d2);
        out1 = v1 + t * (v2 - v1);
    } else if d2 > 0.0 && d1 <= 0.0 {
        let t = d1 / (d1 - d2);
        out2 = v1 + t * (v2 - v1);
    }

    Some((out1, out2, id1, id2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rot2;

    #[test]
    fn circles_overlap_produce_single_point() {
        let xf_a = Transform::default();
        let xf_b = Transform::new(Vec2::new(1.5, 0.0), Rot2::IDENTITY);
        let m = collide_circles(Vec2::ZERO, 1.0, &xf_a, Vec2::ZERO, 1.0, &xf_b);
        assert_eq!(m.points.len(), 1);
    }

    #[test]
    fn circles_far_apart_produce_no_manifold() {
        let xf_a = Transform::default();
        let xf_b = Transform::new(Vec2::new(10.0, 0.0), Rot2::IDENTITY);
        let m = collide_circles(Vec2::ZERO, 1.0, &xf_a, Vec2::ZERO, 1.0, &xf_b);
        assert!(m.points.is_empty());
    }

    #[test]
    fn stacked_boxes_produce_two_point_manifold() {
        let box_a = Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0);
        let box_b = Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0);
        let xf_a = Transform::default();
        let xf_b = Transform::new(Vec2::new(0.0, 0.99), Rot2::IDENTITY);
        let m = collide_polygons(&box_a, &xf_a, &box_b, &xf_b);
        assert_eq!(m.points.len(), 2);
    }

    #[test]
    fn separated_boxes_produce_no_manifold() {
        let box_a = Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0);
        let box_b = Polygon::box_shape(0.5, 0.5, Vec2::ZERO, 0.0);
        let xf_a = Transform::default();
        let xf_b = Transform::new(Vec2::new(0.0, 5.0), Rot2::IDENTITY);
        let m = collide_polygons(&box_a, &xf_a, &box_b, &xf_b);
        assert!(m.points.is_empty());
    }
}
