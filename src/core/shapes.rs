use glam::Vec2;
use crate::config::POLYGON_RADIUS;
use crate::core::types::{MassData, Transform};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        lower: Vec2::new(f32::MAX, f32::MAX),
        upper: Vec2::new(f32::MIN, f32::MIN),
    };

    pub fn new(lower: Vec2, upper: Vec2) -> Self {
        Self { lower, upper }
    }

    pub fn from_point_radius(center: Vec2, radius: f32) -> Self {
        Self {
            lower: center - Vec2::splat(radius),
            upper: center + Vec2::splat(radius),
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        self.lower.x <= other.lower.x
            && self.lower.y <= other.lower.y
            && other.upper.x <= self.upper.x
            && other.upper.y <= self.upper.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
    }

    pub fn perimeter(&self) -> f32 {
        let d = self.upper - self.lower;
        2.0 * (d.x + d.y)
    }

    pub fn center(&self) -> Vec2 {
        0.5 * (self.lower + self.upper)
    }

    pub fn fattened(&self, margin: f32) -> Aabb {
        Aabb {
            lower: self.lower - Vec2::splat(margin),
            upper: self.upper + Vec2::splat(margin),
        }
    }
}

/// Vertex data for a convex polygon shape, stored with CCW winding.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    pub normals: Vec<Vec2>,
    pub centroid: Vec2,
    pub radius: f32,
}

impl Polygon {
    /// Builds an axis-aligned box polygon centered on `center` with the
    /// given half-extents, rotated by `angle` (local-frame construction,
    /// matching Box2D's `b2PolygonShape::SetAsBox`).
    pub fn box_shape(half_width: f32, half_height: f32, center: Vec2, angle: f32) -> Self {
        let local = [
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ];
        let rot = super::types::Rot2::from_angle(angle);
        let vertices: Vec<Vec2> =
            local.iter().map(|v| rot.rotate(*v) + center).collect();
        Self::from_ccw_vertices(vertices)
    }

    /// Builds a polygon from a set of already-convex, CCW-ordered vertices.
    pub fn from_ccw_vertices(vertices: Vec<Vec2>) -> Self {
        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let edge = vertices[(i + 1) % n] - vertices[i];
            normals.push(Vec2::new(edge.y, -edge.x).normalize_or_zero());
        }
        let centroid = compute_centroid(&vertices);
        Self {
            vertices,
            normals,
            centroid,
            radius: POLYGON_RADIUS,
        }
    }

    pub fn support(&self, direction: Vec2) -> usize {
        let mut best_index = 0;
        let mut best_value = self.vertices[0].dot(direction);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let value = v.dot(direction);
            if value > best_value {
                best_value = value;
                best_index = i;
            }
        }
        best_index
    }
}

fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
    let n = vertices.len();
    let origin = vertices[0];
    let mut area = 0.0;
    let mut center = Vec2::ZERO;
    for i in 1..n - 1 {
        let e1 = vertices[i] - origin;
        let e2 = vertices[i + 1] - origin;
        let cross = e1.x * e2.y - e1.y * e2.x;
        let tri_area = 0.5 * cross;
        area += tri_area;
        center += tri_area * (e1 + e2) / 3.0;
    }
    if area.abs() > 1e-9 {
        center /= area;
    }
    origin + center
}

/// Concrete fixture geometry. Shapes are an external narrow-phase
/// collaborator per the design, but a working crate needs at least one
/// implementation of the "given two fixtures, produce a manifold"
/// contract, so circle/polygon/edge are implemented directly here.
#[derive(Debug, Clone)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    Polygon(Polygon),
    /// A two-sided line segment; the degenerate single-segment case of a
    /// chain shape. Intended for static geometry only.
    Edge { v1: Vec2, v2: Vec2, radius: f32 },
}

impl Shape {
    pub fn compute_aabb(&self, xf: &Transform) -> Aabb {
        match self {
            Shape::Circle { center, radius } => {
                Aabb::from_point_radius(xf.apply(*center), *radius)
            }
            Shape::Polygon(p) => {
                let mut lower = Vec2::splat(f32::MAX);
                let mut upper = Vec2::splat(f32::MIN);
                for v in &p.vertices {
                    let world = xf.apply(*v);
                    lower = lower.min(world);
                    upper = upper.max(world);
                }
                Aabb {
                    lower: lower - Vec2::splat(p.radius),
                    upper: upper + Vec2::splat(p.radius),
                }
            }
            Shape::Edge { v1, v2, radius } => {
                let w1 = xf.apply(*v1);
                let w2 = xf.apply(*v2);
                Aabb {
                    lower: w1.min(w2) - Vec2::splat(*radius),
                    upper: w1.max(w2) + Vec2::splat(*radius),
                }
            }
        }
    }

    pub fn mass_data(&self, density: f32) -> MassData {
        match self {
            Shape::Circle { center, radius } => {
                let mass = density * std::f32::consts::PI * radius * radius;
                let inertia = mass * (0.5 * radius * radius + center.dot(*center));
                MassData {
                    mass,
                    center: *center,
                    inertia,
                }
            }
            Shape::Polygon(p) => polygon_mass_data(p, density),
            // Static-only shape; contributes nothing to dynamic mass.
            Shape::Edge { .. } => MassData {
                mass: 0.0,
                center: Vec2::ZERO,
                inertia: 0.0,
            },
        }
    }

    pub fn skin_radius(&self) -> f32 {
        match self {
            Shape::Circle { radius, .. } => *radius,
            Shape::Polygon(p) => p.radius,
            Shape::Edge { radius, .. } => *radius,
        }
    }
}

fn polygon_mass_data(p: &Polygon, density: f32) -> MassData {
    let n = p.vertices.len();
    let origin = p.vertices[0];
    let mut area = 0.0;
    let mut center = Vec2::ZERO;
    let mut inertia = 0.0;
    const INV3: f32 = 1.0 / 3.0;

    for i in 1..n - 1 {
        let e1 = p.vertices[i] - origin;
        let e2 = p.vertices[i + 1] - origin;
        let d = e1.x * e2.y - e1.y * e2.x;
        let tri_area = 0.5 * d;
        area += tri_area;
        center += tri_area * INV3 * (e1 + e2);

        let intx2 = e1.x * e1.x + e1.x * e2.x + e2.x * e2.x;
        let inty2 = e1.y * e1.y + e1.y * e2.y + e2.y * e2.y;
        inertia += (0.25 * INV3 * d) * (intx2 + inty2);
    }

    let mass = density * area;
    let center = if area.abs() > 1e-9 {
        center / area
    } else {
        Vec2::ZERO
    };
    let world_center = origin + center;

    // Shift from origin-relative inertia to inertia about the shape's own
    // centroid, then offset to the body's origin at the end by the caller.
    let mut inertia = density * inertia;
    inertia -= mass * center.dot(center);

    MassData {
        mass,
        center: world_center,
        inertia: inertia + mass * world_center.dot(world_center),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_polygon_has_four_vertices_ccw() {
        let poly = Polygon::box_shape(1.0, 0.5, Vec2::ZERO, 0.0);
        assert_eq!(poly.vertices.len(), 4);
        assert!((poly.centroid - Vec2::ZERO).length() < 1e-5);
    }

    #[test]
    fn circle_mass_matches_formula() {
        let shape = Shape::Circle {
            center: Vec2::ZERO,
            radius: 2.0,
        };
        let data = shape.mass_data(1.0);
        let expected = std::f32::consts::PI * 4.0;
        assert!((data.mass - expected).abs() < 1e-4);
    }

    #[test]
    fn aabb_overlap_detection() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        let b = Aabb::new(Vec2::new(0.5, 0.5), Vec2::new(2.0, 2.0));
        let c = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
