//! Continuous collision detection: conservative-advancement time-of-impact
//! (TOI) between two swept convex shapes, driven by a small GJK distance
//! query. Used for bullet bodies (and any dynamic-vs-dynamic pair where one
//! side is a bullet) so fast-moving shapes don't tunnel through thin ones.

use glam::Vec2;

use crate::config::{LINEAR_SLOP, MAX_TOI_ITERS, MAX_TOI_ROOT_ITERS};
use crate::core::shapes::Shape;
use crate::core::types::{Rot2, Transform};

/// A linear motion interpolant for one body over a step: center of mass
/// moves from `c0` to `c`, angle from `a0` to `a`, both lerped by `alpha`.
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    pub local_center: Vec2,
    pub c0: Vec2,
    pub a0: f32,
    pub c: Vec2,
    pub a: f32,
}

impl Sweep {
    pub fn transform_at(&self, alpha: f32) -> Transform {
        let c = self.c0 + alpha * (self.c - self.c0);
        let a = self.a0 + alpha * (self.a - self.a0);
        let rotation = Rot2::from_angle(a);
        Transform::new(c - rotation.rotate(self.local_center), rotation)
    }
}

/// A convex vertex set plus skin radius, the uniform shape of shape a GJK
/// query actually needs (a circle is a one-vertex proxy).
#[derive(Debug, Clone)]
pub struct DistanceProxy {
    pub vertices: Vec<Vec2>,
    pub radius: f32,
}

impl DistanceProxy {
    pub fn from_shape(shape: &Shape) -> Self {
        match shape {
            Shape::Circle { center, radius } => DistanceProxy {
                vertices: vec![*center],
                radius: *radius,
            },
            Shape::Polygon(p) => DistanceProxy {
                vertices: p.vertices.clone(),
                radius: p.radius,
            },
            Shape::Edge { v1, v2, radius } => DistanceProxy {
                vertices: vec![*v1, *v2],
                radius: *radius,
            },
        }
    }

    fn support(&self, dir: Vec2) -> usize {
        let mut best = 0;
        let mut best_val = self.vertices[0].dot(dir);
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            let val = v.dot(dir);
            if val > best_val {
                best_val = val;
                best = i;
            }
        }
        best
    }
}

#[derive(Debug, Clone, Copy)]
struct SimplexVertex {
    w_a: Vec2,
    w_b: Vec2,
    w: Vec2,
    index_a: usize,
    index_b: usize,
}

fn support_vertex(proxy_a: &DistanceProxy, xf_a: &Transform, proxy_b: &DistanceProxy, xf_b: &Transform, dir: Vec2) -> SimplexVertex {
    let index_a = proxy_a.support(xf_a.apply_vec_inverse(dir));
    let index_b = proxy_b.support(xf_b.apply_vec_inverse(-dir));
    let w_a = xf_a.apply(proxy_a.vertices[index_a]);
    let w_b = xf_b.apply(proxy_b.vertices[index_b]);
    SimplexVertex {
        w_a,
        w_b,
        w: w_a - w_b,
        index_a,
        index_b,
    }
}

/// Closest point to the origin on the simplex, reducing it in place to just
/// the vertices that contribute (1, 2, or 3 of them) and returning the
/// barycentric-weighted witness points on each shape.
fn closest_to_origin(simplex: &mut Vec<SimplexVertex>) -> (Vec2, Vec2, Vec2) {
    match simplex.len() {
        1 => {
            let v = simplex[0];
            (v.w, v.w_a, v.w_b)
        }
        2 => {
            let a = simplex[0];
            let b = simplex[1];
            let ab = b.w - a.w;
            let t = (-a.w).dot(ab) / ab.length_squared().max(1e-12);
            if t <= 0.0 {
                simplex.truncate(1);
                (a.w, a.w_a, a.w_b)
            } else if t >= 1.0 {
                simplex[0] = b;
                simplex.truncate(1);
                (b.w, b.w_a, b.w_b)
            } else {
                let closest = a.w + t * ab;
                let wa = a.w_a + t * (b.w_a - a.w_a);
                let wb = a.w_b + t * (b.w_b - a.w_b);
                (closest, wa, wb)
            }
        }
        3 => {
            // Triangle case: if the origin lies inside, the shapes overlap
            // (distance 0); otherwise reduce to the nearest edge or vertex.
            let (a, b, c) = (simplex[0], simplex[1], simplex[2]);
            let area = cross(b.w - a.w, c.w - a.w);
            if area.abs() < 1e-12 {
                simplex.truncate(2);
                return closest_to_origin(simplex);
            }
            let u = cross(b.w, c.w) / area;
            let v = cross(c.w, a.w) / area;
            let w = cross(a.w, b.w) / area;
            if u >= 0.0 && v >= 0.0 && w >= 0.0 {
                // Origin inside the triangle: overlapping shapes, distance 0.
                let wa = u * a.w_a + v * b.w_a + w * c.w_a;
                let wb = u * a.w_b + v * b.w_b + w * c.w_b;
                return (Vec2::ZERO, wa, wb);
            }
            // Try each edge, keep whichever reduction is closest.
            let mut best: Option<(f32, Vec<SimplexVertex>, Vec2, Vec2, Vec2)> = None;
            for (p, q) in [(a, b), (b, c), (c, a)] {
                let mut edge = vec![p, q];
                let (closest, wa, wb) = closest_to_origin(&mut edge);
                let dist = closest.length_squared();
                if best.as_ref().map(|(d, ..)| dist < *d).unwrap_or(true) {
                    best = Some((dist, edge, closest, wa, wb));
                }
            }
            let (_, edge, closest, wa, wb) = best.unwrap();
            *simplex = edge;
            (closest, wa, wb)
        }
        _ => unreachable!("simplex never exceeds 3 vertices in 2D"),
    }
}

fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Distance (and witness points) between two convex core shapes (radius
/// excluded) at fixed transforms, via GJK.
fn gjk_distance(proxy_a: &DistanceProxy, xf_a: &Transform, proxy_b: &DistanceProxy, xf_b: &Transform) -> (f32, Vec2, Vec2) {
    let mut simplex = vec![support_vertex(proxy_a, xf_a, proxy_b, xf_b, Vec2::X)];

    for _ in 0..20 {
        let (closest, wa, wb) = closest_to_origin(&mut simplex);
        let dist = closest.length();
        if dist < 1e-9 {
            return (0.0, wa, wb);
        }
        let dir = -closest / dist;
        let candidate = support_vertex(proxy_a, xf_a, proxy_b, xf_b, dir);
        let progress = candidate.w.dot(dir) - (-closest).dot(dir);
        if progress < 1e-6 || simplex.iter().any(|v| v.index_a == candidate.index_a && v.index_b == candidate.index_b) {
            return (dist, wa, wb);
        }
        simplex.push(candidate);
        if simplex.len() > 3 {
            simplex.remove(0);
        }
    }

    let (closest, wa, wb) = closest_to_origin(&mut simplex);
    (closest.length(), wa, wb)
}

/// True distance (accounting for both shapes' skin radii) between `shape_a`
/// at `xf_a` and `shape_b` at `xf_b`.
pub fn shape_distance(proxy_a: &DistanceProxy, xf_a: &Transform, proxy_b: &DistanceProxy, xf_b: &Transform) -> f32 {
    let (core_dist, _, _) = gjk_distance(proxy_a, xf_a, proxy_b, xf_b);
    (core_dist - proxy_a.radius - proxy_b.radius).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToiState {
    Unknown,
    Failed,
    Overlapped,
    Touching,
    Separated,
}

#[derive(Debug, Clone)]
pub struct ToiInput {
    pub proxy_a: DistanceProxy,
    pub sweep_a: Sweep,
    pub proxy_b: DistanceProxy,
    pub sweep_b: Sweep,
    /// Fraction of the step (in `[0, 1]`) to search up to; usually 1.0.
    pub t_max: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ToiOutput {
    pub state: ToiState,
    pub t: f32,
}

/// Computes the first time of impact between two swept shapes, by repeated
/// GJK distance queries along the sweep and bisection on the crossing of a
/// small positive target separation. Conservative: if it reports `t`, the
/// shapes are guaranteed not to have overlapped (beyond the linear slop
/// skin) for any time before `t`.
pub fn toi(input: &ToiInput) -> ToiOutput {
    let total_radius = input.proxy_a.radius + input.proxy_b.radius;
    let target = (LINEAR_SLOP).max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;

    let mut t1 = 0.0f32;
    let mut iter = 0;

    loop {
        let xf_a1 = input.sweep_a.transform_at(t1);
        let xf_b1 = input.sweep_b.transform_at(t1);
        let (d1, ..) = gjk_distance(&input.proxy_a, &xf_a1, &input.proxy_b, &xf_b1);

        if d1 < target + tolerance {
            return ToiOutput {
                state: if t1 == 0.0 { ToiState::Overlapped } else { ToiState::Touching },
                t: t1,
            };
        }

        if iter >= MAX_TOI_ITERS {
            return ToiOutput { state: ToiState::Failed, t: t1 };
        }
        iter += 1;

        let mut t2 = input.t_max;
        let xf_a2 = input.sweep_a.transform_at(t2);
        let xf_b2 = input.sweep_b.transform_at(t2);
        let (d2, ..) = gjk_distance(&input.proxy_a, &xf_a2, &input.proxy_b, &xf_b2);

        if d2 > target + tolerance {
            return ToiOutput { state: ToiState::Separated, t: input.t_max };
        }

        // Bisect for the root of d(t) - target = 0 in [t1, t2]. d is not
        // guaranteed monotonic for rotating shapes, but is well-behaved
        // enough over one sub-step that bisection converges reliably.
        let mut lo = t1;
        let mut hi = t2;
        let mut d_lo = d1;
        let mut root_iters = 0;
        let mut root = t2;
        while root_iters < MAX_TOI_ROOT_ITERS {
            let mid = 0.5 * (lo + hi);
            let xf_a_m = input.sweep_a.transform_at(mid);
            let xf_b_m = input.sweep_b.transform_at(mid);
            let (d_mid, ..) = gjk_distance(&input.proxy_a, &xf_a_m, &input.proxy_b, &xf_b_m);

            if (d_mid - target).abs() < tolerance {
                root = mid;
                break;
            }
            if (d_mid > target) == (d_lo > target) {
                lo = mid;
                d_lo = d_mid;
            } else {
                hi = mid;
            }
            root = mid;
            root_iters += 1;
        }

        t1 = root;

        if t1 >= input.t_max {
            return ToiOutput { state: ToiState::Separated, t: input.t_max };
        }
    }
}
