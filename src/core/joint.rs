use glam::Vec2;

use crate::core::body::{BodyId, JointEdgeId, JointId};

/// Distance joint: holds two anchor points at a fixed (or soft) distance.
#[derive(Debug, Clone)]
pub struct DistanceJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub rest_length: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
    pub impulse: f32,
    pub gamma: f32,
    pub bias: f32,
}

impl DistanceJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, rest_length: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            rest_length,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            impulse: 0.0,
            gamma: 0.0,
            bias: 0.0,
        }
    }
}

/// Revolute joint: pins two bodies together at a point, leaving rotation
/// free (optionally motored and/or angle-limited).
#[derive(Debug, Clone)]
pub struct RevoluteJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_angle: f32,
    pub upper_angle: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub point_impulse: Vec2,
    pub motor_impulse: f32,
    pub lower_impulse: f32,
    pub upper_impulse: f32,
}

impl RevoluteJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, reference_angle: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle,
            enable_limit: false,
            lower_angle: 0.0,
            upper_angle: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            point_impulse: Vec2::ZERO,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
        }
    }
}

/// Prismatic joint: constrains relative rotation and motion perpendicular
/// to a shared local axis, leaving translation along that axis free.
#[derive(Debug, Clone)]
pub struct PrismaticJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub reference_angle: f32,
    pub enable_limit: bool,
    pub lower_translation: f32,
    pub upper_translation: f32,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_force: f32,
    /// (perpendicular impulse, angular impulse)
    pub perp_impulse: f32,
    pub angular_impulse: f32,
    pub motor_impulse: f32,
    pub lower_impulse: f32,
    pub upper_impulse: f32,
}

impl PrismaticJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, local_axis_a: Vec2, reference_angle: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            local_axis_a: local_axis_a.normalize_or_zero(),
            reference_angle,
            enable_limit: false,
            lower_translation: 0.0,
            upper_translation: 0.0,
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_force: 0.0,
            perp_impulse: 0.0,
            angular_impulse: 0.0,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
        }
    }
}

/// Pulley joint: `lengthA + ratio * lengthB = constant`, anchored to two
/// fixed ground points.
#[derive(Debug, Clone)]
pub struct PulleyJoint {
    pub ground_anchor_a: Vec2,
    pub ground_anchor_b: Vec2,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length_a: f32,
    pub length_b: f32,
    pub ratio: f32,
    pub impulse: f32,
}

impl PulleyJoint {
    pub fn new(
        ground_anchor_a: Vec2,
        ground_anchor_b: Vec2,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
        length_a: f32,
        length_b: f32,
        ratio: f32,
    ) -> Self {
        Self {
            ground_anchor_a,
            ground_anchor_b,
            local_anchor_a,
            local_anchor_b,
            length_a,
            length_b,
            ratio,
            impulse: 0.0,
        }
    }
}

/// Gear joint: couples the coordinates of two other joints (each a
/// Revolute or Prismatic) by `coord1 + ratio * coord2 = constant`. Must be
/// destroyed before either referent joint or either of their bodies.
#[derive(Debug, Clone)]
pub struct GearJoint {
    pub joint1: JointId,
    pub joint2: JointId,
    pub ratio: f32,
    pub constant: f32,
    pub impulse: f32,
}

impl GearJoint {
    pub fn new(joint1: JointId, joint2: JointId, ratio: f32, constant: f32) -> Self {
        Self {
            joint1,
            joint2,
            ratio,
            constant,
            impulse: 0.0,
        }
    }
}

/// Mouse joint: a soft spring pulling a single anchor point on bodyB
/// toward a moving world-space target. bodyA is conventionally a dummy
/// static/ground body.
#[derive(Debug, Clone)]
pub struct MouseJoint {
    pub local_anchor_b: Vec2,
    pub target: Vec2,
    pub max_force: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
    pub impulse: Vec2,
    pub gamma: f32,
    pub beta: f32,
}

impl MouseJoint {
    pub fn new(local_anchor_b: Vec2, target: Vec2, max_force: f32) -> Self {
        Self {
            local_anchor_b,
            target,
            max_force,
            frequency_hz: 5.0,
            damping_ratio: 0.7,
            impulse: Vec2::ZERO,
            gamma: 0.0,
            beta: 0.0,
        }
    }
}

/// Wheel joint: translation is free along a local axis (suspension
/// spring), perpendicular motion and (optionally) rotation are motored.
#[derive(Debug, Clone)]
pub struct WheelJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub local_axis_a: Vec2,
    pub enable_motor: bool,
    pub motor_speed: f32,
    pub max_motor_torque: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
    pub perp_impulse: f32,
    pub motor_impulse: f32,
    pub spring_impulse: f32,
}

impl WheelJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, local_axis_a: Vec2) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            local_axis_a: local_axis_a.normalize_or_zero(),
            enable_motor: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            perp_impulse: 0.0,
            motor_impulse: 0.0,
            spring_impulse: 0.0,
        }
    }
}

/// Weld joint: a soft rigid connection (point + angle), not truly rigid
/// since it is solved iteratively like every other joint here.
#[derive(Debug, Clone)]
pub struct WeldJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,
    pub frequency_hz: f32,
    pub damping_ratio: f32,
    pub point_impulse: Vec2,
    pub angle_impulse: f32,
    pub gamma: f32,
    pub bias: f32,
}

impl WeldJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, reference_angle: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle,
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            point_impulse: Vec2::ZERO,
            angle_impulse: 0.0,
            gamma: 0.0,
            bias: 0.0,
        }
    }
}

/// Rope joint: an inequality constraint capping the distance between two
/// anchors at `max_length` (push-only is not constrained; only stretching
/// past `max_length` is).
#[derive(Debug, Clone)]
pub struct RopeJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_length: f32,
    pub impulse: f32,
}

impl RopeJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, max_length: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            max_length,
            impulse: 0.0,
        }
    }
}

/// Friction joint: applies a top-down, velocity-independent linear and
/// angular friction between two bodies, bounded by `max_force`/`max_torque`.
#[derive(Debug, Clone)]
pub struct FrictionJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub max_force: f32,
    pub max_torque: f32,
    pub linear_impulse: Vec2,
    pub angular_impulse: f32,
}

impl FrictionJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, max_force: f32, max_torque: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            max_force,
            max_torque,
            linear_impulse: Vec2::ZERO,
            angular_impulse: 0.0,
        }
    }
}

/// Motor joint: drives bodyB toward a target pose relative to bodyA.
#[derive(Debug, Clone)]
pub struct MotorJoint {
    pub linear_offset: Vec2,
    pub angular_offset: f32,
    pub max_force: f32,
    pub max_torque: f32,
    pub correction_factor: f32,
    pub linear_impulse: Vec2,
    pub angular_impulse: f32,
}

impl MotorJoint {
    pub fn new(linear_offset: Vec2, angular_offset: f32, max_force: f32, max_torque: f32) -> Self {
        Self {
            linear_offset,
            angular_offset,
            max_force,
            max_torque,
            correction_factor: 0.3,
            linear_impulse: Vec2::ZERO,
            angular_impulse: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum JointKind {
    Distance(DistanceJoint),
    Revolute(RevoluteJoint),
    Prismatic(PrismaticJoint),
    Pulley(PulleyJoint),
    Gear(GearJoint),
    Mouse(MouseJoint),
    Wheel(WheelJoint),
    Weld(WeldJoint),
    Rope(RopeJoint),
    Friction(FrictionJoint),
    Motor(MotorJoint),
}

impl JointKind {
    pub fn name(&self) -> &'static str {
        match self {
            JointKind::Distance(_) => "distance",
            JointKind::Revolute(_) => "revolute",
            JointKind::Prismatic(_) => "prismatic",
            JointKind::Pulley(_) => "pulley",
            JointKind::Gear(_) => "gear",
            JointKind::Mouse(_) => "mouse",
            JointKind::Wheel(_) => "wheel",
            JointKind::Weld(_) => "weld",
            JointKind::Rope(_) => "rope",
            JointKind::Friction(_) => "friction",
            JointKind::Motor(_) => "motor",
        }
    }
}

/// Notified whenever a joint is destroyed, whether explicitly via
/// `World::destroy_joint` or implicitly because one of its bodies was
/// destroyed or a gear joint's referent joint was destroyed out from under
/// it. Lets callers drop their own handle before it dangles.
#[allow(unused_variables)]
pub trait JointListener: Send + Sync {
    fn joint_destroyed(&mut self, joint: &Joint) {}
}

/// A constraint between two bodies. Polymorphism is a tagged variant
/// (`JointKind`) rather than a vtable, dispatched by a `match` in the
/// solver so solver state stays in flat, cache-friendly arrays.
#[derive(Debug, Clone)]
pub struct Joint {
    pub id: JointId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub collide_connected: bool,
    pub user_data: u64,
    pub kind: JointKind,
    /// Intrusive joint-edge list nodes linking this joint into `body_a`'s
    /// and `body_b`'s edge lists respectively. Allocated by the world
    /// alongside the joint.
    pub edge_a: JointEdgeId,
    pub edge_b: JointEdgeId,
}

impl Joint {
    pub fn new(
        id: JointId,
        body_a: BodyId,
        body_b: BodyId,
        collide_connected: bool,
        kind: JointKind,
        edge_a: JointEdgeId,
        edge_b: JointEdgeId,
    ) -> Self {
        Self {
            id,
            body_a,
            body_b,
            collide_connected,
            user_data: 0,
            kind,
            edge_a,
            edge_b,
        }
    }
}

/// Definition used by `World::create_joint`. `kind` carries the
/// already-constructed per-kind geometric data (e.g. `DistanceJoint::new`);
/// the world only needs the two endpoint bodies and the bookkeeping flags.
#[derive(Debug, Clone)]
pub struct JointDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub collide_connected: bool,
    pub user_data: u64,
    pub kind: JointKind,
}

impl JointDef {
    pub fn new(body_a: BodyId, body_b: BodyId, kind: JointKind) -> Self {
        Self {
            body_a,
            body_b,
            collide_connected: false,
            user_data: 0,
            kind,
        }
    }
}
