use serde::{Deserialize, Serialize};

/// Common math types re-exported for convenience.
pub use glam::Vec2;

/// A 2D rotation stored as a unit complex number `(cos, sin)` rather than a
/// bare angle, so composing rotations is a multiply instead of an
/// `atan2`/`sin`/`cos` round trip every step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rot2 {
    pub cos: f32,
    pub sin: f32,
}

impl Default for Rot2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot2 {
    pub const IDENTITY: Rot2 = Rot2 { cos: 1.0, sin: 0.0 };

    pub fn from_angle(angle: f32) -> Self {
        Self {
            cos: angle.cos(),
            sin: angle.sin(),
        }
    }

    pub fn angle(&self) -> f32 {
        self.sin.atan2(self.cos)
    }

    /// Rotates `v` by this rotation.
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        )
    }

    /// Rotates `v` by the inverse of this rotation.
    pub fn unrotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.cos * v.x + self.sin * v.y,
            -self.sin * v.x + self.cos * v.y,
        )
    }

    /// Composes two rotations: `self` followed by `other`.
    pub fn mul(&self, other: &Rot2) -> Rot2 {
        Rot2 {
            cos: self.cos * other.cos - self.sin * other.sin,
            sin: self.sin * other.cos + self.cos * other.sin,
        }
    }

    /// `self^-1 * other`, the relative rotation from self to other.
    pub fn inv_mul(&self, other: &Rot2) -> Rot2 {
        Rot2 {
            cos: self.cos * other.cos + self.sin * other.sin,
            sin: self.cos * other.sin - self.sin * other.cos,
        }
    }

    /// Integrates this rotation forward by an angular velocity over `dt`,
    /// renormalizing to correct for drift.
    pub fn integrate(&self, angular_velocity: f32, dt: f32) -> Rot2 {
        let delta = angular_velocity * dt;
        let raw = Rot2 {
            cos: self.cos - self.sin * delta,
            sin: self.sin + self.cos * delta,
        };
        raw.normalized()
    }

    pub fn normalized(&self) -> Rot2 {
        let mag = (self.cos * self.cos + self.sin * self.sin).sqrt();
        if mag < 1e-9 {
            return Rot2::IDENTITY;
        }
        Rot2 {
            cos: self.cos / mag,
            sin: self.sin / mag,
        }
    }
}

/// Position and orientation of a body or fixture frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: Rot2,
}

impl Transform {
    pub fn new(position: Vec2, rotation: Rot2) -> Self {
        Self { position, rotation }
    }

    /// Maps a point from this transform's local frame into world space.
    pub fn apply(&self, local_point: Vec2) -> Vec2 {
        self.rotation.rotate(local_point) + self.position
    }

    /// Maps a point from world space into this transform's local frame.
    pub fn apply_inverse(&self, world_point: Vec2) -> Vec2 {
        self.rotation.unrotate(world_point - self.position)
    }

    /// Maps a direction vector from local to world space (ignores translation).
    pub fn apply_vec(&self, local_vec: Vec2) -> Vec2 {
        self.rotation.rotate(local_vec)
    }

    pub fn apply_vec_inverse(&self, world_vec: Vec2) -> Vec2 {
        self.rotation.unrotate(world_vec)
    }
}

/// Linear and angular velocity of a rigid body, expressed at the center of
/// mass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct Velocity {
    pub linear: Vec2,
    pub angular: f32,
}

impl Velocity {
    /// Velocity of the material point at world-space offset `r` from the
    /// center of mass: `v + omega x r` specialized to 2D (`omega x r =
    /// omega * perp(r)`).
    pub fn point_velocity(&self, r: Vec2) -> Vec2 {
        self.linear + self.angular * Vec2::new(-r.y, r.x)
    }
}

/// Mass and inertia data about a body's own origin, matching the external
/// `{mass, center, I}` type the narrow-phase/mass-computation boundary
/// exchanges per spec section 6.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MassData {
    pub mass: f32,
    pub center: Vec2,
    pub inertia: f32,
}

impl Default for MassData {
    fn default() -> Self {
        Self {
            mass: 0.0,
            center: Vec2::ZERO,
            inertia: 0.0,
        }
    }
}

/// Combines two fixtures' friction coefficients: `sqrt(a * b)`.
pub fn mix_friction(a: f32, b: f32) -> f32 {
    (a * b).max(0.0).sqrt()
}

/// Combines two fixtures' restitution coefficients: `max(a, b)`.
pub fn mix_restitution(a: f32, b: f32) -> f32 {
    a.max(b)
}

/// 2D perpendicular-dot product, the 2D analogue of the cross-product
/// z-component: `a.x*b.y - a.y*b.x`.
pub fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Scalar-cross-vector: rotates `v` by +90 degrees and scales by `s`,
/// the 2D analogue of `s (as a z-axis vector) x v`.
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rot2_from_angle_round_trips() {
        let r = Rot2::from_angle(0.7);
        assert!((r.angle() - 0.7).abs() < 1e-5);
    }

    #[test]
    fn rot2_rotate_unrotate_round_trips() {
        let r = Rot2::from_angle(1.3);
        let v = Vec2::new(2.0, -1.0);
        let rotated = r.rotate(v);
        let back = r.unrotate(rotated);
        assert!((back - v).length() < 1e-5);
    }

    #[test]
    fn mix_friction_is_geometric_mean() {
        assert!((mix_friction(0.6, 0.2) - (0.12f32).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn mix_restitution_is_max() {
        assert_eq!(mix_restitution(0.3, 0.7), 0.7);
    }
}
