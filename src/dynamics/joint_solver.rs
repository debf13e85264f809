//! Per-kind joint constraint solving, the `JointSolver` component of
//! §4.6. Mirrors the contact solver's shape: a flat constraint is built
//! once per island from the current body state, warm-started from the
//! impulse accumulators persisted on the `Joint` itself, iterated a fixed
//! number of times at the velocity level, and — for joints modelling a
//! genuinely rigid constraint rather than a spring or a drive — corrected
//! again at the position level after integration.
//!
//! Frequency/damping-ratio joints (soft distance, mouse, wheel suspension,
//! weld with a frequency set) convert `(frequencyHz, dampingRatio)` into a
//! per-step `(gamma, bias_factor)` pair the same way for every joint kind
//! that supports it; see `soft_params`.

use glam::Vec2;

use crate::core::body::{Body, BodyId, JointId};
use crate::core::joint::{Joint, JointKind};
use crate::core::types::cross_sv;
use crate::utils::allocator::Arena;

/// `mass * (Cdot + bias) + gamma * accumulated` soft-constraint step,
/// converting a 2-2-pole spring (`frequencyHz`, `dampingRatio`) about a
/// body pair's combined mass into per-step bias/gamma terms. Returns
/// `(gamma, erp)` where `erp` is the fraction of position error fed back
/// into the velocity bias this step.
fn soft_params(mass: f32, frequency_hz: f32, damping_ratio: f32, dt: f32) -> (f32, f32) {
    if frequency_hz <= 0.0 {
        return (0.0, 0.0);
    }
    let omega = 2.0 * std::f32::consts::PI * frequency_hz;
    let damping = 2.0 * mass * damping_ratio * omega;
    let stiffness = mass * omega * omega;
    let gamma = dt * (damping + dt * stiffness);
    let gamma = if gamma.abs() > 1e-9 { 1.0 / gamma } else { 0.0 };
    let erp = dt * stiffness * gamma;
    (gamma, erp)
}

/// Symmetric 2x2 matrix inverse used by every point (2-dof) constraint:
/// revolute's pin, prismatic/wheel's perpendicular+angle pair (solved as
/// two independent scalars instead, see below), weld's point part.
fn invert2(k11: f32, k12: f32, k22: f32) -> Option<[[f32; 2]; 2]> {
    let det = k11 * k22 - k12 * k12;
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some([[k22 * inv_det, -k12 * inv_det], [-k12 * inv_det, k11 * inv_det]])
}

fn mat2_mul_vec(m: &[[f32; 2]; 2], v: Vec2) -> Vec2 {
    Vec2::new(m[0][0] * v.x + m[0][1] * v.y, m[1][0] * v.x + m[1][1] * v.y)
}

/// Relative velocity of the two anchor points, `(vB + wB x rB) - (vA + wA x rA)`.
fn relative_point_velocity(a: &Body, b: &Body, r_a: Vec2, r_b: Vec2) -> Vec2 {
    (b.velocity.linear + cross_sv(b.velocity.angular, r_b)) - (a.velocity.linear + cross_sv(a.velocity.angular, r_a))
}

fn apply_point_impulse(a: &mut Body, b: &mut Body, r_a: Vec2, r_b: Vec2, impulse: Vec2) {
    a.velocity.linear -= a.inv_mass * impulse;
    a.velocity.angular -= a.inv_inertia * crate::core::types::cross2(r_a, impulse);
    b.velocity.linear += b.inv_mass * impulse;
    b.velocity.angular += b.inv_inertia * crate::core::types::cross2(r_b, impulse);
}

/// Anchors, in world space, relative to each body's center of mass.
fn anchors(joint_a: Vec2, joint_b: Vec2, a: &Body, b: &Body) -> (Vec2, Vec2) {
    let world_a = a.transform.rotation.rotate(joint_a - a.local_center);
    let world_b = b.transform.rotation.rotate(joint_b - b.local_center);
    (world_a, world_b)
}

/// One joint's solver state for the lifetime of a single island solve.
/// Built once before the velocity iteration loop; anchors/masses assume
/// fixed body orientation for the scope of the velocity phase (matching
/// the contact solver), recomputed from scratch for the position phase.
pub struct JointConstraint {
    joint_id: JointId,
    body_a: BodyId,
    body_b: BodyId,
    kind: ConstraintKind,
}

impl JointConstraint {
    pub fn joint_id(&self) -> JointId {
        self.joint_id
    }

    /// True if this joint degenerated to a no-op this build (orphaned gear
    /// referent, unsupported gear referent kind). A `NumericDegeneracy`
    /// recovered from locally rather than surfaced as an error.
    pub fn is_inert(&self) -> bool {
        matches!(self.kind, ConstraintKind::Inert)
    }
}

enum ConstraintKind {
    Distance {
        r_a: Vec2,
        r_b: Vec2,
        normal: Vec2,
        mass: f32,
        rest_length: f32,
        gamma: f32,
        bias: f32,
        soft: bool,
    },
    Revolute {
        r_a: Vec2,
        r_b: Vec2,
        point_mass: [[f32; 2]; 2],
        axial_mass: f32,
        motor_on: bool,
        motor_speed: f32,
        max_motor_impulse: f32,
        limit_on: bool,
        lower: f32,
        upper: f32,
        angle: f32,
    },
    Prismatic {
        r_a: Vec2,
        r_b: Vec2,
        axis: Vec2,
        perp: Vec2,
        s1: f32,
        s2: f32,
        a1: f32,
        a2: f32,
        perp_mass: f32,
        angular_mass: f32,
        axial_mass: f32,
        motor_on: bool,
        motor_speed: f32,
        max_motor_impulse: f32,
        limit_on: bool,
        lower: f32,
        upper: f32,
        translation: f32,
    },
    Pulley {
        r_a: Vec2,
        r_b: Vec2,
        normal_a: Vec2,
        normal_b: Vec2,
        mass: f32,
        ratio: f32,
    },
    Mouse {
        r_b: Vec2,
        mass: [[f32; 2]; 2],
        gamma: f32,
        bias: Vec2,
        max_impulse: f32,
    },
    Wheel {
        r_a: Vec2,
        r_b: Vec2,
        axis: Vec2,
        perp: Vec2,
        s1: f32,
        s2: f32,
        a1: f32,
        a2: f32,
        perp_mass: f32,
        angular_mass: f32,
        spring_mass: f32,
        spring_gamma: f32,
        spring_bias: f32,
        motor_on: bool,
        motor_speed: f32,
        max_motor_impulse: f32,
    },
    Weld {
        r_a: Vec2,
        r_b: Vec2,
        point_mass: [[f32; 2]; 2],
        angular_mass: f32,
        gamma: f32,
        point_bias: Vec2,
        angle_bias: f32,
        soft: bool,
    },
    Rope {
        r_a: Vec2,
        r_b: Vec2,
        normal: Vec2,
        mass: f32,
        max_length: f32,
        length: f32,
    },
    Friction {
        r_a: Vec2,
        r_b: Vec2,
        linear_mass: [[f32; 2]; 2],
        angular_mass: f32,
        max_linear_impulse: f32,
        max_angular_impulse: f32,
    },
    Motor {
        r_a: Vec2,
        r_b: Vec2,
        linear_mass: [[f32; 2]; 2],
        angular_mass: f32,
        linear_error: Vec2,
        angular_error: f32,
        max_force: f32,
        max_torque: f32,
        correction_factor: f32,
    },
    /// Orphaned or unsupported configuration (e.g. a gear joint whose
    /// referent joint kind isn't Revolute/Prismatic): skipped entirely,
    /// a `NumericDegeneracy` recovered from locally per spec §7.
    Inert,
    Gear {
        body_c: BodyId,
        body_d: BodyId,
        axis_a: Vec2,
        axis_b: Vec2,
        r_a: Vec2,
        r_b: Vec2,
        r_c: Vec2,
        r_d: Vec2,
        ratio: f32,
        mass: f32,
        constant: f32,
        coordinate1: f32,
        coordinate2: f32,
    },
}

/// Builds velocity constraints for every joint in the island and applies
/// each one's warm-started impulse (read from the `Joint`'s own
/// accumulators, matching the contact solver's per-point warm start).
pub fn build_and_warm_start(
    island_joints: &[JointId],
    joints: &Arena<Joint>,
    bodies: &mut Arena<Body>,
    dt: f32,
) -> Vec<JointConstraint> {
    let mut out = Vec::with_capacity(island_joints.len());
    for &joint_id in island_joints {
        let Some(joint) = joints.get(joint_id) else { continue };
        let Some(constraint) = build_one(joint, joints, bodies, dt) else { continue };
        warm_start_one(&constraint, joint, bodies);
        out.push(constraint);
    }
    out
}

fn build_one(joint: &Joint, joints: &Arena<Joint>, bodies: &Arena<Body>, dt: f32) -> Option<JointConstraint> {
    if let JointKind::Gear(g) = &joint.kind {
        let inert = || {
            Some(JointConstraint { joint_id: joint.id, body_a: joint.body_a, body_b: joint.body_b, kind: ConstraintKind::Inert })
        };
        let (Some(j1), Some(j2)) = (joints.get(g.joint1), joints.get(g.joint2)) else { return inert() };
        return build_gear(joint.id, j1, j2, g.ratio, g.constant, bodies).or_else(inert);
    }

    let (Some(a), Some(b)) = (bodies.get(joint.body_a), bodies.get(joint.body_b)) else { return None };
    let m_a = a.inv_mass;
    let m_b = b.inv_mass;
    let i_a = a.inv_inertia;
    let i_b = b.inv_inertia;

    let kind = match &joint.kind {
        JointKind::Distance(d) => {
            let (r_a, r_b) = anchors(d.local_anchor_a, d.local_anchor_b, a, b);
            let u = (b.world_center() + r_b) - (a.world_center() + r_a);
            let length = u.length();
            let normal = if length > 1e-9 { u / length } else { Vec2::X };
            let cr_a = crate::core::types::cross2(r_a, normal);
            let cr_b = crate::core::types::cross2(r_b, normal);
            let k = m_a + m_b + i_a * cr_a * cr_a + i_b * cr_b * cr_b;
            let mass = if k > 0.0 { 1.0 / k } else { 0.0 };
            let soft = d.frequency_hz > 0.0;
            let (gamma, erp) = soft_params(if mass > 0.0 { 1.0 / mass } else { 0.0 }, d.frequency_hz, d.damping_ratio, dt);
            let c = length - d.rest_length;
            let bias = if soft { c * erp } else { 0.0 };
            ConstraintKind::Distance { r_a, r_b, normal, mass, rest_length: d.rest_length, gamma, bias, soft }
        }
        JointKind::Revolute(r) => {
            let (r_a, r_b) = anchors(r.local_anchor_a, r.local_anchor_b, a, b);
            let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
            let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
            let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
            let point_mass = invert2(k11, k12, k22).unwrap_or([[0.0, 0.0], [0.0, 0.0]]);
            let axial_k = i_a + i_b;
            let axial_mass = if axial_k > 0.0 { 1.0 / axial_k } else { 0.0 };
            let angle = b.transform.rotation.angle() - a.transform.rotation.angle() - r.reference_angle;
            ConstraintKind::Revolute {
                r_a,
                r_b,
                point_mass,
                axial_mass,
                motor_on: r.enable_motor,
                motor_speed: r.motor_speed,
                max_motor_impulse: r.max_motor_torque * dt,
                limit_on: r.enable_limit,
                lower: r.lower_angle,
                upper: r.upper_angle,
                angle,
            }
        }
        JointKind::Prismatic(p) => {
            let (r_a, r_b) = anchors(p.local_anchor_a, p.local_anchor_b, a, b);
            let axis = a.transform.rotation.rotate(p.local_axis_a);
            let perp = cross_sv(1.0, axis);
            let d = (b.world_center() + r_b) - (a.world_center() + r_a);
            let s1 = crate::core::types::cross2(d + r_a, axis);
            let s2 = crate::core::types::cross2(r_b, axis);
            let a1 = crate::core::types::cross2(d + r_a, perp);
            let a2 = crate::core::types::cross2(r_b, perp);

            let k_perp = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;
            let perp_mass = if k_perp > 0.0 { 1.0 / k_perp } else { 0.0 };
            let k_ang = i_a + i_b;
            let angular_mass = if k_ang > 0.0 { 1.0 / k_ang } else { 0.0 };
            let k_axial = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let axial_mass = if k_axial > 0.0 { 1.0 / k_axial } else { 0.0 };
            let translation = d.dot(axis);

            ConstraintKind::Prismatic {
                r_a,
                r_b,
                axis,
                perp,
                s1,
                s2,
                a1,
                a2,
                perp_mass,
                angular_mass,
                axial_mass,
                motor_on: p.enable_motor,
                motor_speed: p.motor_speed,
                max_motor_impulse: p.max_motor_force * dt,
                limit_on: p.enable_limit,
                lower: p.lower_translation,
                upper: p.upper_translation,
                translation,
            }
        }
        JointKind::Pulley(p) => {
            let (r_a, r_b) = anchors(p.local_anchor_a, p.local_anchor_b, a, b);
            let anchor_a = a.world_center() + r_a;
            let anchor_b = b.world_center() + r_b;
            let u_a = anchor_a - p.ground_anchor_a;
            let u_b = anchor_b - p.ground_anchor_b;
            let length_a = u_a.length();
            let length_b = u_b.length();
            if length_a < 10.0 * crate::config::LINEAR_SLOP || length_b < 10.0 * crate::config::LINEAR_SLOP {
                return Some(JointConstraint { joint_id: joint.id, body_a: joint.body_a, body_b: joint.body_b, kind: ConstraintKind::Inert });
            }
            let normal_a = u_a / length_a;
            let normal_b = u_b / length_b;
            let cr_a = crate::core::types::cross2(r_a, normal_a);
            let cr_b = crate::core::types::cross2(r_b, normal_b);
            let k = m_a + p.ratio * p.ratio * m_b + i_a * cr_a * cr_a + p.ratio * p.ratio * i_b * cr_b * cr_b;
            let mass = if k > 0.0 { 1.0 / k } else { 0.0 };
            ConstraintKind::Pulley { r_a, r_b, normal_a, normal_b, mass, ratio: p.ratio }
        }
        JointKind::Mouse(m) => {
            let r_b = b.transform.rotation.rotate(m.local_anchor_b - b.local_center);
            let k11 = m_b + i_b * r_b.y * r_b.y;
            let k12 = -i_b * r_b.x * r_b.y;
            let k22 = m_b + i_b * r_b.x * r_b.x;
            let mass_matrix = invert2(k11, k12, k22).unwrap_or([[0.0, 0.0], [0.0, 0.0]]);
            let effective_mass = if k11 + k22 > 0.0 { 2.0 / (k11 + k22) } else { 0.0 };
            let (gamma, erp) = soft_params(effective_mass, m.frequency_hz.max(0.01), m.damping_ratio, dt);
            let c = (b.world_center() + r_b) - m.target;
            let bias = c * erp;
            ConstraintKind::Mouse { r_b, mass: mass_matrix, gamma, bias, max_impulse: m.max_force * dt }
        }
        JointKind::Wheel(w) => {
            let (r_a, r_b) = anchors(w.local_anchor_a, w.local_anchor_b, a, b);
            let axis = a.transform.rotation.rotate(w.local_axis_a);
            let perp = cross_sv(1.0, axis);
            let d = (b.world_center() + r_b) - (a.world_center() + r_a);
            let s1 = crate::core::types::cross2(d + r_a, perp);
            let s2 = crate::core::types::cross2(r_b, perp);
            let k_perp = m_a + m_b + i_a * s1 * s1 + i_b * s2 * s2;
            let perp_mass = if k_perp > 0.0 { 1.0 / k_perp } else { 0.0 };
            let k_ang = i_a + i_b;
            let angular_mass = if k_ang > 0.0 { 1.0 / k_ang } else { 0.0 };

            let a1 = crate::core::types::cross2(d + r_a, axis);
            let a2 = crate::core::types::cross2(r_b, axis);
            let k_spring = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;
            let spring_mass = if k_spring > 0.0 { 1.0 / k_spring } else { 0.0 };
            let (spring_gamma, erp) = soft_params(if spring_mass > 0.0 { 1.0 / spring_mass } else { 0.0 }, w.frequency_hz, w.damping_ratio, dt);
            let translation = d.dot(axis);
            let spring_bias = translation * erp;

            ConstraintKind::Wheel {
                r_a,
                r_b,
                axis,
                perp,
                s1,
                s2,
                a1,
                a2,
                perp_mass,
                angular_mass,
                spring_mass,
                spring_gamma,
                spring_bias,
                motor_on: w.enable_motor,
                motor_speed: w.motor_speed,
                max_motor_impulse: w.max_motor_torque * dt,
            }
        }
        JointKind::Weld(w) => {
            let (r_a, r_b) = anchors(w.local_anchor_a, w.local_anchor_b, a, b);
            let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
            let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
            let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
            let point_mass = invert2(k11, k12, k22).unwrap_or([[0.0, 0.0], [0.0, 0.0]]);
            let k_ang = i_a + i_b;
            let angular_mass = if k_ang > 0.0 { 1.0 / k_ang } else { 0.0 };

            let soft = w.frequency_hz > 0.0;
            let (gamma, erp) = soft_params(if angular_mass > 0.0 { 1.0 / angular_mass } else { 0.0 }, w.frequency_hz, w.damping_ratio, dt);
            let c_point = (b.world_center() + r_b) - (a.world_center() + r_a);
            let c_angle = b.transform.rotation.angle() - a.transform.rotation.angle() - w.reference_angle;
            let (point_bias, angle_bias) = if soft { (c_point * erp, c_angle * erp) } else { (Vec2::ZERO, 0.0) };

            ConstraintKind::Weld { r_a, r_b, point_mass, angular_mass, gamma, point_bias, angle_bias, soft }
        }
        JointKind::Rope(r) => {
            let (r_a, r_b) = anchors(r.local_anchor_a, r.local_anchor_b, a, b);
            let u = (b.world_center() + r_b) - (a.world_center() + r_a);
            let length = u.length();
            let normal = if length > 1e-9 { u / length } else { Vec2::X };
            let cr_a = crate::core::types::cross2(r_a, normal);
            let cr_b = crate::core::types::cross2(r_b, normal);
            let k = m_a + m_b + i_a * cr_a * cr_a + i_b * cr_b * cr_b;
            let mass = if k > 0.0 { 1.0 / k } else { 0.0 };
            ConstraintKind::Rope { r_a, r_b, normal, mass, max_length: r.max_length, length }
        }
        JointKind::Friction(f) => {
            let (r_a, r_b) = anchors(f.local_anchor_a, f.local_anchor_b, a, b);
            let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
            let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
            let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
            let linear_mass = invert2(k11, k12, k22).unwrap_or([[0.0, 0.0], [0.0, 0.0]]);
            let k_ang = i_a + i_b;
            let angular_mass = if k_ang > 0.0 { 1.0 / k_ang } else { 0.0 };
            ConstraintKind::Friction {
                r_a,
                r_b,
                linear_mass,
                angular_mass,
                max_linear_impulse: f.max_force * dt,
                max_angular_impulse: f.max_torque * dt,
            }
        }
        JointKind::Motor(m) => {
            let r_a = a.transform.rotation.rotate(-a.local_center);
            let r_b = b.transform.rotation.rotate(-b.local_center);
            let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
            let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
            let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
            let linear_mass = invert2(k11, k12, k22).unwrap_or([[0.0, 0.0], [0.0, 0.0]]);
            let k_ang = i_a + i_b;
            let angular_mass = if k_ang > 0.0 { 1.0 / k_ang } else { 0.0 };
            let linear_error = (b.world_center() - a.world_center()) - a.transform.rotation.rotate(m.linear_offset);
            let angular_error = b.transform.rotation.angle() - a.transform.rotation.angle() - m.angular_offset;
            ConstraintKind::Motor {
                r_a,
                r_b,
                linear_mass,
                angular_mass,
                linear_error,
                angular_error,
                max_force: m.max_force,
                max_torque: m.max_torque,
                correction_factor: m.correction_factor,
            }
        }
        JointKind::Gear(_) => unreachable!("handled before this match"),
    };

    Some(JointConstraint { joint_id: joint.id, body_a: joint.body_a, body_b: joint.body_b, kind })
}

/// Builds the gear constraint's Jacobian from its two referent joints.
/// Only Revolute/Prismatic referents are supported (Box2D's own
/// restriction); any other pairing degenerates to `Inert`, logged as a
/// `NumericDegeneracy` by the caller.
fn build_gear(gear_id: JointId, j1: &Joint, j2: &Joint, ratio: f32, constant: f32, bodies: &Arena<Body>) -> Option<JointConstraint> {
    let (body_a, axis_a, r_a, coord1) = gear_leg(j1, bodies)?;
    let (body_b, axis_b, r_b, coord2) = gear_leg(j2, bodies)?;
    let (Some(a), Some(b)) = (bodies.get(body_a), bodies.get(body_b)) else { return None };

    let mass = match (&j1.kind, &j2.kind) {
        (JointKind::Revolute(_), JointKind::Revolute(_)) => {
            let k = a.inv_inertia + ratio * ratio * b.inv_inertia;
            if k > 0.0 { 1.0 / k } else { 0.0 }
        }
        _ => {
            let cr_a = crate::core::types::cross2(r_a, axis_a);
            let cr_b = crate::core::types::cross2(r_b, axis_b);
            let k = a.inv_mass + a.inv_inertia * cr_a * cr_a + ratio * ratio * (b.inv_mass + b.inv_inertia * cr_b * cr_b);
            if k > 0.0 { 1.0 / k } else { 0.0 }
        }
    };

    Some(JointConstraint {
        joint_id: gear_id,
        body_a,
        body_b,
        kind: ConstraintKind::Gear {
            body_c: j1.body_a,
            body_d: j2.body_a,
            axis_a,
            axis_b,
            r_a,
            r_b,
            r_c: Vec2::ZERO,
            r_d: Vec2::ZERO,
            ratio,
            mass,
            constant,
            coordinate1: coord1,
            coordinate2: coord2,
        },
    })
}

/// One referent joint's contribution to the gear constraint: the body
/// whose velocity the constraint reads (bodyB of the referent per Box2D
/// convention), its constraint axis, anchor, and current coordinate.
fn gear_leg(j: &Joint, bodies: &Arena<Body>) -> Option<(BodyId, Vec2, Vec2, f32)> {
    let b = bodies.get(j.body_b)?;
    match &j.kind {
        JointKind::Revolute(r) => Some((j.body_b, Vec2::ZERO, Vec2::ZERO, b.transform.rotation.angle() - bodies.get(j.body_a)?.transform.rotation.angle() - r.reference_angle)),
        JointKind::Prismatic(p) => {
            let axis = bodies.get(j.body_a)?.transform.rotation.rotate(p.local_axis_a);
            let r_b = b.transform.rotation.rotate(p.local_anchor_b - b.local_center);
            let d = (b.world_center() + r_b) - (bodies.get(j.body_a)?.world_center());
            Some((j.body_b, axis, r_b, d.dot(axis)))
        }
        _ => None,
    }
}

fn warm_start_one(c: &JointConstraint, joint: &Joint, bodies: &mut Arena<Body>) {
    let Some((a, b)) = bodies.get2_mut(c.body_a, c.body_b) else { return };
    match (&c.kind, &joint.kind) {
        (ConstraintKind::Distance { r_a, r_b, normal, .. }, JointKind::Distance(d)) => {
            apply_point_impulse(a, b, *r_a, *r_b, d.impulse * *normal);
        }
        (ConstraintKind::Revolute { r_a, r_b, .. }, JointKind::Revolute(r)) => {
            let axial = r.motor_impulse + r.lower_impulse - r.upper_impulse;
            apply_point_impulse(a, b, *r_a, *r_b, r.point_impulse);
            a.velocity.angular -= a.inv_inertia * axial;
            b.velocity.angular += b.inv_inertia * axial;
        }
        (ConstraintKind::Prismatic { axis, perp, s1, s2, a1, a2, .. }, JointKind::Prismatic(p)) => {
            let axial = p.motor_impulse + p.lower_impulse - p.upper_impulse;
            let impulse = p.perp_impulse * *perp + axial * *axis;
            a.velocity.linear -= a.inv_mass * impulse;
            a.velocity.angular -= a.inv_inertia * (p.perp_impulse * a1 + p.angular_impulse + axial * s1);
            b.velocity.linear += b.inv_mass * impulse;
            b.velocity.angular += b.inv_inertia * (p.perp_impulse * a2 + p.angular_impulse + axial * s2);
        }
        (ConstraintKind::Pulley { r_a, r_b, normal_a, normal_b, ratio, .. }, JointKind::Pulley(p)) => {
            apply_point_impulse(a, b, *r_a, *r_b, -p.impulse * *normal_a);
            apply_point_impulse(a, b, *r_a, *r_b, -p.impulse * *ratio * *normal_b);
        }
        (ConstraintKind::Mouse { r_b, .. }, JointKind::Mouse(m)) => {
            b.velocity.linear += b.inv_mass * m.impulse;
            b.velocity.angular += b.inv_inertia * crate::core::types::cross2(*r_b, m.impulse);
        }
        (ConstraintKind::Wheel { axis, perp, s1, s2, a1, a2, .. }, JointKind::Wheel(w)) => {
            let impulse = w.perp_impulse * *perp + w.spring_impulse * *axis;
            a.velocity.linear -= a.inv_mass * impulse;
            a.velocity.angular -= a.inv_inertia * (w.perp_impulse * a1 + w.motor_impulse + w.spring_impulse * s1);
            b.velocity.linear += b.inv_mass * impulse;
            b.velocity.angular += b.inv_inertia * (w.perp_impulse * a2 + w.motor_impulse + w.spring_impulse * s2);
        }
        (ConstraintKind::Weld { r_a, r_b, .. }, JointKind::Weld(w)) => {
            apply_point_impulse(a, b, *r_a, *r_b, w.point_impulse);
            a.velocity.angular -= a.inv_inertia * w.angle_impulse;
            b.velocity.angular += b.inv_inertia * w.angle_impulse;
        }
        (ConstraintKind::Rope { r_a, r_b, normal, .. }, JointKind::Rope(r)) => {
            apply_point_impulse(a, b, *r_a, *r_b, -r.impulse * *normal);
        }
        (ConstraintKind::Friction { r_a, r_b, .. }, JointKind::Friction(f)) => {
            apply_point_impulse(a, b, *r_a, *r_b, f.linear_impulse);
            a.velocity.angular -= a.inv_inertia * f.angular_impulse;
            b.velocity.angular += b.inv_inertia * f.angular_impulse;
        }
        (ConstraintKind::Motor { r_a, r_b, .. }, JointKind::Motor(m)) => {
            apply_point_impulse(a, b, *r_a, *r_b, m.linear_impulse);
            a.velocity.angular -= a.inv_inertia * m.angular_impulse;
            b.velocity.angular += b.inv_inertia * m.angular_impulse;
        }
        (ConstraintKind::Gear { axis_a, axis_b, r_a, r_b, ratio, .. }, JointKind::Gear(g)) => {
            if axis_a.length_squared() < 1e-9 {
                a.velocity.angular += a.inv_inertia * g.impulse;
            } else {
                a.velocity.linear += a.inv_mass * g.impulse * *axis_a;
                a.velocity.angular += a.inv_inertia * g.impulse * crate::core::types::cross2(*r_a, *axis_a);
            }
            if axis_b.length_squared() < 1e-9 {
                b.velocity.angular += b.inv_inertia * *ratio * g.impulse;
            } else {
                b.velocity.linear += b.inv_mass * *ratio * g.impulse * *axis_b;
                b.velocity.angular += b.inv_inertia * *ratio * g.impulse * crate::core::types::cross2(*r_b, *axis_b);
            }
        }
        _ => {}
    }
}

/// One velocity-iteration sweep over every joint in the island.
pub fn solve_velocity(constraints: &mut [JointConstraint], joints: &mut Arena<Joint>, bodies: &mut Arena<Body>, dt: f32) {
    for c in constraints.iter_mut() {
        let Some(joint) = joints.get_mut(c.joint_id) else { continue };
        let Some((a, b)) = bodies.get2_mut(c.body_a, c.body_b) else { continue };
        solve_one(c, joint, a, b, dt);
    }
}

fn solve_one(c: &JointConstraint, joint: &mut Joint, a: &mut Body, b: &mut Body, dt: f32) {
    match (&c.kind, &mut joint.kind) {
        (ConstraintKind::Distance { r_a, r_b, normal, mass, gamma, bias, soft, .. }, JointKind::Distance(d)) => {
            let cdot = relative_point_velocity(a, b, *r_a, *r_b).dot(*normal);
            let impulse = if *soft {
                -*mass * (cdot + *bias + *gamma * d.impulse)
            } else {
                -*mass * cdot
            };
            d.impulse += impulse;
            apply_point_impulse(a, b, *r_a, *r_b, impulse * *normal);
        }
        (
            ConstraintKind::Revolute { r_a, r_b, point_mass, axial_mass, motor_on, motor_speed, max_motor_impulse, limit_on, lower, upper, angle },
            JointKind::Revolute(r),
        ) => {
            if *motor_on {
                let cdot = b.velocity.angular - a.velocity.angular - motor_speed;
                let mut impulse = -axial_mass * cdot;
                let old = r.motor_impulse;
                r.motor_impulse = (old + impulse).clamp(-max_motor_impulse, *max_motor_impulse);
                impulse = r.motor_impulse - old;
                a.velocity.angular -= a.inv_inertia * impulse;
                b.velocity.angular += b.inv_inertia * impulse;
            }
            if *limit_on {
                let c_lower = angle - lower;
                let cdot = b.velocity.angular - a.velocity.angular;
                let impulse = -axial_mass * (cdot + (c_lower.min(0.0)) / dt.max(1e-6));
                let old = r.lower_impulse;
                r.lower_impulse = (old + impulse).max(0.0);
                let delta = r.lower_impulse - old;
                a.velocity.angular -= a.inv_inertia * delta;
                b.velocity.angular += b.inv_inertia * delta;

                let c_upper = upper - angle;
                let cdot = a.velocity.angular - b.velocity.angular;
                let impulse = -axial_mass * (cdot + (c_upper.min(0.0)) / dt.max(1e-6));
                let old = r.upper_impulse;
                r.upper_impulse = (old + impulse).max(0.0);
                let delta = r.upper_impulse - old;
                a.velocity.angular += a.inv_inertia * delta;
                b.velocity.angular -= b.inv_inertia * delta;
            }
            let cdot = relative_point_velocity(a, b, *r_a, *r_b);
            let impulse = -mat2_mul_vec(point_mass, cdot);
            r.point_impulse += impulse;
            apply_point_impulse(a, b, *r_a, *r_b, impulse);
        }
        (
            ConstraintKind::Prismatic { axis, perp, s1, s2, a1, a2, perp_mass, angular_mass, axial_mass, motor_on, motor_speed, max_motor_impulse, limit_on, lower, upper, translation },
            JointKind::Prismatic(p),
        ) => {
            if *motor_on {
                let cdot = axis.dot(b.velocity.linear - a.velocity.linear) + s2 * b.velocity.angular - s1 * a.velocity.angular - motor_speed;
                let mut impulse = -axial_mass * cdot;
                let old = p.motor_impulse;
                p.motor_impulse = (old + impulse).clamp(-max_motor_impulse, *max_motor_impulse);
                impulse = p.motor_impulse - old;
                let push = impulse * *axis;
                a.velocity.linear -= a.inv_mass * push;
                a.velocity.angular -= a.inv_inertia * impulse * s1;
                b.velocity.linear += b.inv_mass * push;
                b.velocity.angular += b.inv_inertia * impulse * s2;
            }
            if *limit_on {
                let c_lower = translation - lower;
                let cdot = axis.dot(b.velocity.linear - a.velocity.linear) + s2 * b.velocity.angular - s1 * a.velocity.angular;
                let impulse = -axial_mass * (cdot + c_lower.min(0.0) / dt.max(1e-6));
                let old = p.lower_impulse;
                p.lower_impulse = (old + impulse).max(0.0);
                let delta = p.lower_impulse - old;
                let push = delta * *axis;
                a.velocity.linear -= a.inv_mass * push;
                a.velocity.angular -= a.inv_inertia * delta * s1;
                b.velocity.linear += b.inv_mass * push;
                b.velocity.angular += b.inv_inertia * delta * s2;

                let c_upper = upper - translation;
                let cdot = axis.dot(a.velocity.linear - b.velocity.linear) + s1 * a.velocity.angular - s2 * b.velocity.angular;
                let impulse = -axial_mass * (cdot + c_upper.min(0.0) / dt.max(1e-6));
                let old = p.upper_impulse;
                p.upper_impulse = (old + impulse).max(0.0);
                let delta = p.upper_impulse - old;
                let push = delta * *axis;
                a.velocity.linear += a.inv_mass * push;
                a.velocity.angular += a.inv_inertia * delta * s1;
                b.velocity.linear -= b.inv_mass * push;
                b.velocity.angular -= b.inv_inertia * delta * s2;
            }

            let cdot_perp = perp.dot(b.velocity.linear - a.velocity.linear) + a2 * b.velocity.angular - a1 * a.velocity.angular;
            let impulse_perp = -perp_mass * cdot_perp;
            p.perp_impulse += impulse_perp;
            let push = impulse_perp * *perp;
            a.velocity.linear -= a.inv_mass * push;
            a.velocity.angular -= a.inv_inertia * impulse_perp * a1;
            b.velocity.linear += b.inv_mass * push;
            b.velocity.angular += b.inv_inertia * impulse_perp * a2;

            let cdot_ang = b.velocity.angular - a.velocity.angular;
            let impulse_ang = -angular_mass * cdot_ang;
            p.angular_impulse += impulse_ang;
            a.velocity.angular -= a.inv_inertia * impulse_ang;
            b.velocity.angular += b.inv_inertia * impulse_ang;
        }
        (ConstraintKind::Pulley { r_a, r_b, normal_a, normal_b, mass, ratio }, JointKind::Pulley(p)) => {
            let vp_a = a.velocity.linear + cross_sv(a.velocity.angular, *r_a);
            let vp_b = b.velocity.linear + cross_sv(b.velocity.angular, *r_b);
            let cdot = -normal_a.dot(vp_a) - ratio * normal_b.dot(vp_b);
            let impulse = -*mass * cdot;
            p.impulse += impulse;
            apply_point_impulse(a, b, *r_a, *r_b, -impulse * *normal_a);
            apply_point_impulse(a, b, *r_a, *r_b, -impulse * *ratio * *normal_b);
        }
        (ConstraintKind::Mouse { r_b, mass, gamma, bias, .. }, JointKind::Mouse(m)) => {
            let cdot = b.velocity.linear + cross_sv(b.velocity.angular, *r_b);
            let impulse = -mat2_mul_vec(mass, cdot + *bias + *gamma * m.impulse);
            let old = m.impulse;
            m.impulse += impulse;
            let max = c_mouse_max(c);
            if m.impulse.length_squared() > max * max {
                m.impulse = m.impulse.normalize_or_zero() * max;
            }
            let applied = m.impulse - old;
            b.velocity.linear += b.inv_mass * applied;
            b.velocity.angular += b.inv_inertia * crate::core::types::cross2(*r_b, applied);
        }
        (
            ConstraintKind::Wheel { axis, perp, s1, s2, a1, a2, perp_mass, angular_mass, spring_mass, spring_gamma, spring_bias, motor_on, motor_speed, max_motor_impulse },
            JointKind::Wheel(w),
        ) => {
            if w.frequency_hz > 0.0 {
                let cdot = axis.dot(b.velocity.linear - a.velocity.linear) + s2 * b.velocity.angular - s1 * a.velocity.angular;
                let impulse = -spring_mass * (cdot + *spring_bias + *spring_gamma * w.spring_impulse);
                w.spring_impulse += impulse;
                let push = impulse * *axis;
                a.velocity.linear -= a.inv_mass * push;
                a.velocity.angular -= a.inv_inertia * impulse * s1;
                b.velocity.linear += b.inv_mass * push;
                b.velocity.angular += b.inv_inertia * impulse * s2;
            }
            if *motor_on {
                let cdot = b.velocity.angular - a.velocity.angular - motor_speed;
                let mut impulse = -angular_mass * cdot;
                let old = w.motor_impulse;
                w.motor_impulse = (old + impulse).clamp(-max_motor_impulse, *max_motor_impulse);
                impulse = w.motor_impulse - old;
                a.velocity.angular -= a.inv_inertia * impulse;
                b.velocity.angular += b.inv_inertia * impulse;
            }
            let cdot_perp = perp.dot(b.velocity.linear - a.velocity.linear) + a2 * b.velocity.angular - a1 * a.velocity.angular;
            let impulse_perp = -perp_mass * cdot_perp;
            w.perp_impulse += impulse_perp;
            let push = impulse_perp * *perp;
            a.velocity.linear -= a.inv_mass * push;
            a.velocity.angular -= a.inv_inertia * impulse_perp * a1;
            b.velocity.linear += b.inv_mass * push;
            b.velocity.angular += b.inv_inertia * impulse_perp * a2;
        }
        (ConstraintKind::Weld { r_a, r_b, point_mass, angular_mass, gamma, point_bias, angle_bias, soft }, JointKind::Weld(w)) => {
            let cdot_ang = b.velocity.angular - a.velocity.angular;
            let impulse_ang = if *soft {
                -*angular_mass * (cdot_ang + *angle_bias + *gamma * w.angle_impulse)
            } else {
                -*angular_mass * cdot_ang
            };
            w.angle_impulse += impulse_ang;
            a.velocity.angular -= a.inv_inertia * impulse_ang;
            b.velocity.angular += b.inv_inertia * impulse_ang;

            let cdot = relative_point_velocity(a, b, *r_a, *r_b);
            let impulse = if *soft {
                -mat2_mul_vec(point_mass, cdot + *point_bias + *gamma * w.point_impulse)
            } else {
                -mat2_mul_vec(point_mass, cdot)
            };
            w.point_impulse += impulse;
            apply_point_impulse(a, b, *r_a, *r_b, impulse);
        }
        (ConstraintKind::Rope { r_a, r_b, normal, mass, max_length, length }, JointKind::Rope(r)) => {
            let c = length - max_length;
            let cdot = relative_point_velocity(a, b, *r_a, *r_b).dot(*normal);
            let bias = (c.max(0.0) / dt.max(1e-6)).min(crate::config::MAX_LINEAR_CORRECTION / dt.max(1e-6));
            let impulse = -*mass * (cdot + bias);
            let old = r.impulse;
            r.impulse = (old + impulse).max(0.0);
            let delta = r.impulse - old;
            apply_point_impulse(a, b, *r_a, *r_b, -delta * *normal);
        }
        (ConstraintKind::Friction { r_a, r_b, linear_mass, angular_mass, max_linear_impulse, max_angular_impulse }, JointKind::Friction(f)) => {
            let cdot_ang = b.velocity.angular - a.velocity.angular;
            let mut impulse_ang = -*angular_mass * cdot_ang;
            let old_ang = f.angular_impulse;
            f.angular_impulse = (old_ang + impulse_ang).clamp(-max_angular_impulse, *max_angular_impulse);
            impulse_ang = f.angular_impulse - old_ang;
            a.velocity.angular -= a.inv_inertia * impulse_ang;
            b.velocity.angular += b.inv_inertia * impulse_ang;

            let cdot = relative_point_velocity(a, b, *r_a, *r_b);
            let mut impulse = -mat2_mul_vec(linear_mass, cdot);
            let old_lin = f.linear_impulse;
            let mut new_lin = old_lin + impulse;
            if new_lin.length_squared() > max_linear_impulse * max_linear_impulse {
                new_lin = new_lin.normalize_or_zero() * *max_linear_impulse;
            }
            f.linear_impulse = new_lin;
            impulse = new_lin - old_lin;
            apply_point_impulse(a, b, *r_a, *r_b, impulse);
        }
        (ConstraintKind::Motor { r_a, r_b, linear_mass, angular_mass, linear_error, angular_error, max_force, max_torque, correction_factor }, JointKind::Motor(m)) => {
            let inv_dt = if dt > 1e-9 { 1.0 / dt } else { 0.0 };
            let cdot_ang = (b.velocity.angular - a.velocity.angular) + *correction_factor * inv_dt * angular_error;
            let mut impulse_ang = -*angular_mass * cdot_ang;
            let old_ang = m.angular_impulse;
            let max_ang_impulse = max_torque * dt;
            m.angular_impulse = (old_ang + impulse_ang).clamp(-max_ang_impulse, max_ang_impulse);
            impulse_ang = m.angular_impulse - old_ang;
            a.velocity.angular -= a.inv_inertia * impulse_ang;
            b.velocity.angular += b.inv_inertia * impulse_ang;

            let cdot = relative_point_velocity(a, b, *r_a, *r_b) + *correction_factor * inv_dt * *linear_error;
            let mut impulse = -mat2_mul_vec(linear_mass, cdot);
            let old_lin = m.linear_impulse;
            let mut new_lin = old_lin + impulse;
            let max_lin_impulse = max_force * dt;
            if new_lin.length_squared() > max_lin_impulse * max_lin_impulse {
                new_lin = new_lin.normalize_or_zero() * max_lin_impulse;
            }
            m.linear_impulse = new_lin;
            impulse = new_lin - old_lin;
            apply_point_impulse(a, b, *r_a, *r_b, impulse);
        }
        (ConstraintKind::Gear { body_c, body_d, axis_a, axis_b, r_a, r_b, ratio, mass, coordinate1, coordinate2, constant, .. }, JointKind::Gear(g)) => {
            let _ = (body_c, body_d, coordinate1, coordinate2, constant);
            let cdot = if axis_a.length_squared() < 1e-9 && axis_b.length_squared() < 1e-9 {
                a.velocity.angular + ratio * b.velocity.angular
            } else if axis_a.length_squared() < 1e-9 {
                a.velocity.angular + ratio * (axis_b.dot(b.velocity.linear) + crate::core::types::cross2(*r_b, *axis_b) * b.velocity.angular)
            } else if axis_b.length_squared() < 1e-9 {
                (axis_a.dot(a.velocity.linear) + crate::core::types::cross2(*r_a, *axis_a) * a.velocity.angular) + ratio * b.velocity.angular
            } else {
                (axis_a.dot(a.velocity.linear) + crate::core::types::cross2(*r_a, *axis_a) * a.velocity.angular)
                    + ratio * (axis_b.dot(b.velocity.linear) + crate::core::types::cross2(*r_b, *axis_b) * b.velocity.angular)
            };
            let impulse = -*mass * cdot;
            g.impulse += impulse;
            if axis_a.length_squared() < 1e-9 {
                a.velocity.angular += a.inv_inertia * impulse;
            } else {
                a.velocity.linear += a.inv_mass * impulse * *axis_a;
                a.velocity.angular += a.inv_inertia * impulse * crate::core::types::cross2(*r_a, *axis_a);
            }
            if axis_b.length_squared() < 1e-9 {
                b.velocity.angular += b.inv_inertia * *ratio * impulse;
            } else {
                b.velocity.linear += b.inv_mass * *ratio * impulse * *axis_b;
                b.velocity.angular += b.inv_inertia * *ratio * impulse * crate::core::types::cross2(*r_b, *axis_b);
            }
        }
        _ => {}
    }
}

fn c_mouse_max(c: &JointConstraint) -> f32 {
    match &c.kind {
        ConstraintKind::Mouse { max_impulse, .. } => *max_impulse,
        _ => 0.0,
    }
}

/// Position correction for joints modelling a genuinely rigid constraint.
/// Soft joints (a spring/drive by design) are excluded: their error is
/// already fed back at the velocity level via `bias`, and correcting them
/// again here would fight the spring. Returns the largest constraint
/// error magnitude seen, for the caller's convergence check.
pub fn solve_position(island_joints: &[JointId], joints: &Arena<Joint>, bodies: &mut Arena<Body>) -> f32 {
    let mut max_error = 0.0f32;
    for &joint_id in island_joints {
        let Some(joint) = joints.get(joint_id) else { continue };
        let Some((a0, b0)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
        let m_a = a0.inv_mass;
        let m_b = b0.inv_mass;
        let i_a = a0.inv_inertia;
        let i_b = b0.inv_inertia;
        drop(a0);
        drop(b0);

        let error = match &joint.kind {
            JointKind::Distance(d) if d.frequency_hz <= 0.0 => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(d.local_anchor_a, d.local_anchor_b, a, b);
                let u = (b.world_center() + r_b) - (a.world_center() + r_a);
                let length = u.length();
                let normal = if length > 1e-9 { u / length } else { Vec2::X };
                let c = (length - d.rest_length).clamp(-crate::config::MAX_LINEAR_CORRECTION, crate::config::MAX_LINEAR_CORRECTION);
                let cr_a = crate::core::types::cross2(r_a, normal);
                let cr_b = crate::core::types::cross2(r_b, normal);
                let k = m_a + m_b + i_a * cr_a * cr_a + i_b * cr_b * cr_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                push_point(a, b, r_a, r_b, impulse * normal);
                c.abs()
            }
            JointKind::Revolute(r) => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(r.local_anchor_a, r.local_anchor_b, a, b);
                let c = (b.world_center() + r_b) - (a.world_center() + r_a);
                let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
                let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
                let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
                let impulse = invert2(k11, k12, k22).map(|m| -mat2_mul_vec(&m, c)).unwrap_or(Vec2::ZERO);
                push_point(a, b, r_a, r_b, impulse);
                c.length()
            }
            JointKind::Prismatic(p) => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(p.local_anchor_a, p.local_anchor_b, a, b);
                let axis = a.transform.rotation.rotate(p.local_axis_a);
                let perp = cross_sv(1.0, axis);
                let d = (b.world_center() + r_b) - (a.world_center() + r_a);
                let c_perp = perp.dot(d);
                let c_ang = b.transform.rotation.angle() - a.transform.rotation.angle() - p.reference_angle;
                let a1 = crate::core::types::cross2(d + r_a, perp);
                let a2 = crate::core::types::cross2(r_b, perp);
                let k_perp = m_a + m_b + i_a * a1 * a1 + i_b * a2 * a2;
                let impulse_perp = if k_perp > 0.0 { -c_perp / k_perp } else { 0.0 };
                let push = impulse_perp * perp;
                let new_center_a = a.world_center() - m_a * push;
                let new_angle_a = a.transform.rotation.angle() - i_a * impulse_perp * a1;
                a.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_a);
                a.set_world_center(new_center_a);
                let new_center_b = b.world_center() + m_b * push;
                let new_angle_b = b.transform.rotation.angle() + i_b * impulse_perp * a2;
                b.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_b);
                b.set_world_center(new_center_b);

                let k_ang = i_a + i_b;
                let impulse_ang = if k_ang > 0.0 { -c_ang / k_ang } else { 0.0 };
                a.transform.rotation = crate::core::types::Rot2::from_angle(a.transform.rotation.angle() - i_a * impulse_ang);
                b.transform.rotation = crate::core::types::Rot2::from_angle(b.transform.rotation.angle() + i_b * impulse_ang);
                c_perp.abs().max(c_ang.abs())
            }
            JointKind::Pulley(p) => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(p.local_anchor_a, p.local_anchor_b, a, b);
                let u_a = (a.world_center() + r_a) - p.ground_anchor_a;
                let u_b = (b.world_center() + r_b) - p.ground_anchor_b;
                let len_a = u_a.length();
                let len_b = u_b.length();
                if len_a < 10.0 * crate::config::LINEAR_SLOP || len_b < 10.0 * crate::config::LINEAR_SLOP {
                    continue;
                }
                let normal_a = u_a / len_a;
                let normal_b = u_b / len_b;
                let c = (p.length_a + p.length_b) - (len_a + p.ratio * len_b);
                let cr_a = crate::core::types::cross2(r_a, normal_a);
                let cr_b = crate::core::types::cross2(r_b, normal_b);
                let k = m_a + p.ratio * p.ratio * m_b + i_a * cr_a * cr_a + p.ratio * p.ratio * i_b * cr_b * cr_b;
                let impulse = if k > 0.0 { c / k } else { 0.0 };
                push_point(a, b, r_a, r_b, -impulse * normal_a);
                push_point(a, b, r_a, r_b, -impulse * p.ratio * normal_b);
                c.abs()
            }
            JointKind::Weld(w) if w.frequency_hz <= 0.0 => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(w.local_anchor_a, w.local_anchor_b, a, b);
                let c_ang = b.transform.rotation.angle() - a.transform.rotation.angle() - w.reference_angle;
                let k_ang = i_a + i_b;
                let impulse_ang = if k_ang > 0.0 { -c_ang / k_ang } else { 0.0 };
                a.transform.rotation = crate::core::types::Rot2::from_angle(a.transform.rotation.angle() - i_a * impulse_ang);
                b.transform.rotation = crate::core::types::Rot2::from_angle(b.transform.rotation.angle() + i_b * impulse_ang);

                let (r_a, r_b) = anchors(w.local_anchor_a, w.local_anchor_b, a, b);
                let c_point = (b.world_center() + r_b) - (a.world_center() + r_a);
                let k11 = m_a + m_b + i_a * r_a.y * r_a.y + i_b * r_b.y * r_b.y;
                let k12 = -i_a * r_a.x * r_a.y - i_b * r_b.x * r_b.y;
                let k22 = m_a + m_b + i_a * r_a.x * r_a.x + i_b * r_b.x * r_b.x;
                let impulse = invert2(k11, k12, k22).map(|m| -mat2_mul_vec(&m, c_point)).unwrap_or(Vec2::ZERO);
                push_point(a, b, r_a, r_b, impulse);
                c_point.length().max(c_ang.abs())
            }
            JointKind::Rope(r) => {
                let Some((a, b)) = bodies.get2_mut(joint.body_a, joint.body_b) else { continue };
                let (r_a, r_b) = anchors(r.local_anchor_a, r.local_anchor_b, a, b);
                let u = (b.world_center() + r_b) - (a.world_center() + r_a);
                let length = u.length();
                let c = (length - r.max_length).clamp(0.0, crate::config::MAX_LINEAR_CORRECTION);
                if c <= 0.0 {
                    continue;
                }
                let normal = if length > 1e-9 { u / length } else { Vec2::X };
                let cr_a = crate::core::types::cross2(r_a, normal);
                let cr_b = crate::core::types::cross2(r_b, normal);
                let k = m_a + m_b + i_a * cr_a * cr_a + i_b * cr_b * cr_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                push_point(a, b, r_a, r_b, impulse * normal);
                c
            }
            _ => 0.0,
        };
        max_error = max_error.max(error);
    }
    max_error
}

fn push_point(a: &mut Body, b: &mut Body, r_a: Vec2, r_b: Vec2, impulse: Vec2) {
    let center_a = a.world_center() - a.inv_mass * impulse;
    let angle_a = a.transform.rotation.angle() - a.inv_inertia * crate::core::types::cross2(r_a, impulse);
    a.transform.rotation = crate::core::types::Rot2::from_angle(angle_a);
    a.set_world_center(center_a);

    let center_b = b.world_center() + b.inv_mass * impulse;
    let angle_b = b.transform.rotation.angle() + b.inv_inertia * crate::core::types::cross2(r_b, impulse);
    b.transform.rotation = crate::core::types::Rot2::from_angle(angle_b);
    b.set_world_center(center_b);
}
