//! Coulomb friction-cone helper shared by the contact velocity solver: the
//! tangent impulse at a manifold point is clamped to `friction * normal`
//! rather than solved as its own unbounded constraint.

/// Clamps a candidate tangent impulse to the friction cone given the
/// current normal impulse, returning the new accumulated impulse and the
/// delta to actually apply to the bodies.
pub fn clamp_tangent_impulse(friction: f32, normal_impulse: f32, old_tangent_impulse: f32, candidate_delta: f32) -> (f32, f32) {
    let max_friction = friction * normal_impulse;
    let new_impulse = (old_tangent_impulse + candidate_delta).clamp(-max_friction, max_friction);
    (new_impulse, new_impulse - old_tangent_impulse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_outside_cone() {
        let (new_impulse, delta) = clamp_tangent_impulse(0.5, 10.0, 0.0, 100.0);
        assert_eq!(new_impulse, 5.0);
        assert_eq!(delta, 5.0);
    }

    #[test]
    fn passes_through_inside_cone() {
        let (new_impulse, delta) = clamp_tangent_impulse(0.5, 10.0, 1.0, 2.0);
        assert_eq!(new_impulse, 3.0);
        assert_eq!(delta, 2.0);
    }
}
