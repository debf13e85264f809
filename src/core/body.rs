use serde::{Deserialize, Serialize};

use crate::core::types::{cross_sv, Rot2, Transform, Velocity};
use crate::utils::allocator::EntityId;

pub type BodyId = EntityId;
pub type FixtureId = EntityId;
pub type JointId = EntityId;
pub type ContactId = EntityId;
pub type ContactEdgeId = EntityId;
pub type JointEdgeId = EntityId;

/// A body's simulation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Zero mass, zero velocity; never moved by the solver.
    Static,
    /// Zero inverse mass; velocity is user-driven, still moves fixtures.
    Kinematic,
    /// Positive mass; fully simulated.
    Dynamic,
}

/// Behavioral flags tracked per body.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BodyFlags {
    pub awake: bool,
    pub sleep_allowed: bool,
    pub fixed_rotation: bool,
    pub bullet: bool,
    pub enabled: bool,
    pub island_processed: bool,
    pub toi_processed: bool,
}

impl Default for BodyFlags {
    fn default() -> Self {
        Self {
            awake: true,
            sleep_allowed: true,
            fixed_rotation: false,
            bullet: false,
            enabled: true,
            island_processed: false,
            toi_processed: false,
        }
    }
}

/// A node in a body's intrusive doubly linked list of contact edges. One
/// edge is allocated per contact, per endpoint body, so traversing a
/// body's contacts is O(degree) without the body owning a growable set.
#[derive(Debug, Clone, Copy)]
pub struct ContactEdge {
    pub other: BodyId,
    pub contact: ContactId,
    pub prev: Option<ContactEdgeId>,
    pub next: Option<ContactEdgeId>,
}

/// A node in a body's intrusive doubly linked list of joint edges.
#[derive(Debug, Clone, Copy)]
pub struct JointEdge {
    pub other: BodyId,
    pub joint: JointId,
    pub prev: Option<JointEdgeId>,
    pub next: Option<JointEdgeId>,
}

/// A rigid frame: the fundamental simulated entity. Fixtures, joint
/// edges, and contact edges reference a body by `BodyId`; the body does
/// not own fixtures by value, only by id, so destruction is a matter of
/// walking those ids and freeing them from their own pools.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub transform: Transform,
    pub velocity: Velocity,
    pub force: glam::Vec2,
    pub torque: f32,
    pub mass: f32,
    pub inv_mass: f32,
    pub inertia: f32,
    pub inv_inertia: f32,
    pub local_center: glam::Vec2,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub flags: BodyFlags,
    pub sleep_time: f32,
    pub fixtures: Vec<FixtureId>,
    pub contact_edge_head: Option<ContactEdgeId>,
    pub joint_edge_head: Option<JointEdgeId>,
    /// Opaque handle the caller maps to its own table; never a raw pointer.
    pub user_data: u64,
}

impl Body {
    pub fn new(id: BodyId, kind: BodyKind, transform: Transform) -> Self {
        let mut body = Self {
            id,
            kind,
            transform,
            velocity: Velocity::default(),
            force: glam::Vec2::ZERO,
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            local_center: glam::Vec2::ZERO,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            flags: BodyFlags::default(),
            sleep_time: 0.0,
            fixtures: Vec::new(),
            contact_edge_head: None,
            joint_edge_head: None,
            user_data: 0,
        };
        if kind == BodyKind::Dynamic {
            body.mass = 1.0;
            body.inv_mass = 1.0;
        }
        body
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, BodyKind::Static)
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic)
    }

    pub fn world_center(&self) -> glam::Vec2 {
        self.transform.apply(self.local_center)
    }

    /// Applies a force at the center of mass (no torque generated).
    pub fn apply_force(&mut self, force: glam::Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
    }

    /// Applies a force at a world-space point, generating torque about the
    /// center of mass.
    pub fn apply_force_at_point(&mut self, force: glam::Vec2, point: glam::Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.force += force;
        self.torque += crate::core::types::cross2(point - self.world_center(), force);
    }

    pub fn apply_torque(&mut self, torque: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.torque += torque;
    }

    pub fn apply_linear_impulse(&mut self, impulse: glam::Vec2, point: glam::Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.linear += self.inv_mass * impulse;
        self.velocity.angular +=
            self.inv_inertia * crate::core::types::cross2(point - self.world_center(), impulse);
        self.wake();
    }

    pub fn apply_linear_impulse_to_center(&mut self, impulse: glam::Vec2) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.linear += self.inv_mass * impulse;
        self.wake();
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        if !self.is_dynamic() {
            return;
        }
        self.velocity.angular += self.inv_inertia * impulse;
        self.wake();
    }

    pub fn wake(&mut self) {
        if !self.flags.awake {
            self.sleep_time = 0.0;
        }
        self.flags.awake = true;
    }

    pub fn sleep(&mut self) {
        self.flags.awake = false;
        self.sleep_time = 0.0;
        self.velocity.linear = glam::Vec2::ZERO;
        self.velocity.angular = 0.0;
    }

    pub fn clear_forces(&mut self) {
        self.force = glam::Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Recomputes mass, center of mass, and rotational inertia from the
    /// fixtures currently attached, per the supplied mass-data contributions
    /// (one per fixture, in body-local frame about the body origin). Static
    /// and kinematic bodies always end up with zero mass/inverse-mass.
    pub fn reset_mass_data(&mut self, contributions: &[crate::core::types::MassData]) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.local_center = glam::Vec2::ZERO;

        if !self.is_dynamic() {
            return;
        }

        let mut center = glam::Vec2::ZERO;
        for c in contributions {
            self.mass += c.mass;
            center += c.mass * c.center;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            center *= self.inv_mass;
        } else {
            // Box2D convention: a dynamic body with zero-mass fixtures
            // still needs to simulate, so it falls back to unit mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if !self.flags.fixed_rotation {
            let mut inertia = 0.0;
            for c in contributions {
                inertia += c.inertia;
                // Parallel axis theorem: shift contribution's inertia
                // (about its own center) back to the body's shared center.
                let offset = c.center - center;
                inertia += c.mass * offset.dot(offset);
            }
            inertia -= self.mass * center.dot(center);
            self.inertia = inertia.max(0.0);
            self.inv_inertia = if self.inertia > 0.0 {
                1.0 / self.inertia
            } else {
                0.0
            };
        }

        self.local_center = center;
    }

    /// Translates the body so that its world center of mass matches
    /// `center`, keeping rotation fixed. Used by the solver to write back
    /// state computed in center-of-mass coordinates.
    pub fn set_world_center(&mut self, center: glam::Vec2) {
        self.transform.position = center - self.transform.rotation.rotate(self.local_center);
    }

    pub fn set_transform(&mut self, position: glam::Vec2, angle: f32) {
        self.transform.position = position;
        self.transform.rotation = Rot2::from_angle(angle);
        self.wake();
    }

    pub fn linear_velocity_at(&self, world_point: glam::Vec2) -> glam::Vec2 {
        let r = world_point - self.world_center();
        self.velocity.linear + cross_sv(self.velocity.angular, r)
    }
}

/// Definition used by `World::create_body`.
#[derive(Debug, Clone)]
pub struct BodyDef {
    pub kind: BodyKind,
    pub transform: Transform,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    /// Enables CCD against other dynamic bodies (always CCD'd against
    /// static bodies regardless of this flag).
    pub bullet: bool,
    pub allow_sleep: bool,
    pub awake: bool,
    pub enabled: bool,
    pub user_data: u64,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            kind: BodyKind::Static,
            transform: Transform::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            fixed_rotation: false,
            bullet: false,
            allow_sleep: true,
            awake: true,
            enabled: true,
            user_data: 0,
        }
    }
}
