//! Per-body velocity and position integration: gravity and damping applied
//! to velocity, velocity applied to position, both clamped to avoid a
//! single step tunneling a body through the world.

use glam::Vec2;

use crate::config::{MAX_ROTATION, MAX_TRANSLATION};
use crate::core::body::Body;

/// Applies gravity (scaled per-body) and accumulated forces/torques to
/// velocity, then damps it. Force/torque accumulators are left untouched;
/// they persist across steps until the caller explicitly clears them via
/// `World::clear_forces`.
pub fn integrate_velocity(body: &mut Body, gravity: Vec2, dt: f32) {
    if !body.is_dynamic() {
        return;
    }

    let acceleration = gravity * body.gravity_scale + body.force * body.inv_mass;
    body.velocity.linear += acceleration * dt;
    body.velocity.angular += body.torque * body.inv_inertia * dt;

    body.velocity.linear *= 1.0 / (1.0 + dt * body.linear_damping);
    body.velocity.angular *= 1.0 / (1.0 + dt * body.angular_damping);
}

/// Integrates the body's center of mass and angle by one step's velocity,
/// clamping the displacement so a single step can't move a body further
/// than `MAX_TRANSLATION`/`MAX_ROTATION` (a safety valve against numerical
/// blow-ups, independent of CCD).
pub fn integrate_position(body: &mut Body, dt: f32) {
    if body.is_static() {
        return;
    }

    let mut translation = body.velocity.linear * dt;
    if translation.length_squared() > MAX_TRANSLATION * MAX_TRANSLATION {
        translation *= MAX_TRANSLATION / translation.length();
    }

    let mut rotation = body.velocity.angular * dt;
    if rotation.abs() > MAX_ROTATION {
        rotation *= MAX_ROTATION / rotation.abs();
    }

    let center = body.world_center() + translation;
    let angle = body.transform.rotation.angle() + rotation;
    body.transform.rotation = crate::core::types::Rot2::from_angle(angle);
    body.set_world_center(center);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyKind;
    use crate::core::types::Transform;

    #[test]
    fn static_body_ignores_gravity() {
        let mut body = Body::new(crate::utils::allocator::EntityId::default(), BodyKind::Static, Transform::default());
        integrate_velocity(&mut body, Vec2::new(0.0, -9.81), 1.0 / 60.0);
        assert_eq!(body.velocity.linear, Vec2::ZERO);
    }

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut body = Body::new(crate::utils::allocator::EntityId::default(), BodyKind::Dynamic, Transform::default());
        integrate_velocity(&mut body, Vec2::new(0.0, -9.81), 1.0 / 60.0);
        assert!(body.velocity.linear.y < 0.0);
    }

    #[test]
    fn damping_reduces_speed() {
        let mut body = Body::new(crate::utils::allocator::EntityId::default(), BodyKind::Dynamic, Transform::default());
        body.velocity.linear = Vec2::new(10.0, 0.0);
        body.linear_damping = 5.0;
        integrate_velocity(&mut body, Vec2::ZERO, 1.0 / 60.0);
        assert!(body.velocity.linear.x < 10.0);
    }
}
