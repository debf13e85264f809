//! Sequential-impulse contact solver: velocity constraints (normal +
//! friction-cone tangent, with restitution) and Baumgarte position
//! correction, operating island-by-island.

use glam::Vec2;

use crate::collision::contact::ContactManager;
use crate::collision::manifold::ManifoldType;
use crate::config::{BAUMGARTE, LINEAR_SLOP, MAX_LINEAR_CORRECTION, VELOCITY_THRESHOLD};
use crate::core::body::{Body, BodyId, ContactId};
use crate::core::fixture::Fixture;
use crate::core::types::{cross2, cross_sv, Transform};
use crate::dynamics::friction::clamp_tangent_impulse;
use crate::dynamics::island::Island;
use crate::utils::allocator::Arena;

struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

/// One contact's velocity constraint for this step, built from the
/// manifold as it stood after narrow-phase re-evaluation.
pub struct ContactVelocityConstraint {
    contact_id: ContactId,
    body_a: BodyId,
    body_b: BodyId,
    normal: Vec2,
    friction: f32,
    restitution: f32,
    tangent_speed: f32,
    points: Vec<VelocityConstraintPoint>,
    normal_impulses: Vec<f32>,
    tangent_impulses: Vec<f32>,
}

/// One contact's position constraint, re-evaluated against the current
/// (mid-solve) body transforms every position iteration rather than fixed
/// at init time, since positions move between iterations.
pub struct ContactPositionConstraint {
    body_a: BodyId,
    body_b: BodyId,
    manifold_type: ManifoldType,
    local_normal: Vec2,
    local_point: Vec2,
    local_points: Vec<Vec2>,
    radius_a: f32,
    radius_b: f32,
}

fn make_transform(center: Vec2, rotation: crate::core::types::Rot2, local_center: Vec2) -> Transform {
    Transform::new(center - rotation.rotate(local_center), rotation)
}

/// World-space normal, contact points, and separations for a manifold at
/// the given transforms, mirroring the narrow phase's reference-frame
/// convention: `FaceA`/`Circles` keep `A` as reference, `FaceB` keeps `B`.
fn world_manifold(
    manifold_type: ManifoldType,
    local_normal: Vec2,
    local_point: Vec2,
    local_points: &[Vec2],
    xf_a: &Transform,
    radius_a: f32,
    xf_b: &Transform,
    radius_b: f32,
) -> (Vec2, Vec<Vec2>, Vec<f32>) {
    if local_points.is_empty() {
        return (Vec2::X, Vec::new(), Vec::new());
    }

    match manifold_type {
        ManifoldType::Circles => {
            let point_a = xf_a.apply(local_point);
            let point_b = xf_b.apply(local_points[0]);
            let normal = if point_a.distance_squared(point_b) > 1e-18 {
                (point_b - point_a).normalize()
            } else {
                Vec2::X
            };
            let c_a = point_a + radius_a * normal;
            let c_b = point_b - radius_b * normal;
            (normal, vec![0.5 * (c_a + c_b)], vec![(c_b - c_a).dot(normal)])
        }
        ManifoldType::FaceA => {
            let normal = xf_a.apply_vec(local_normal);
            let plane_point = xf_a.apply(local_point);
            let mut points = Vec::with_capacity(local_points.len());
            let mut separations = Vec::with_capacity(local_points.len());
            for lp in local_points {
                let clip_point = xf_b.apply(*lp);
                let c_a = clip_point + (radius_a - (clip_point - plane_point).dot(normal)) * normal;
                let c_b = clip_point - radius_b * normal;
                points.push(0.5 * (c_a + c_b));
                separations.push((c_b - c_a).dot(normal));
            }
            (normal, points, separations)
        }
        ManifoldType::FaceB => {
            let normal = xf_b.apply_vec(local_normal);
            let plane_point = xf_b.apply(local_point);
            let mut points = Vec::with_capacity(local_points.len());
            let mut separations = Vec::with_capacity(local_points.len());
            for lp in local_points {
                let clip_point = xf_a.apply(*lp);
                let c_b = clip_point + (radius_b - (clip_point - plane_point).dot(normal)) * normal;
                let c_a = clip_point - radius_a * normal;
                points.push(0.5 * (c_a + c_b));
                separations.push((c_a - c_b).dot(normal));
            }
            // localNormal was the reference shape's (B's) outward normal; flip
            // so the solver's convention (normal points from A to B) holds.
            (-normal, points, separations)
        }
    }
}

/// Builds the velocity constraints for every touching, enabled, non-sensor
/// contact in the island, computing anchors/effective masses/restitution
/// bias from the bodies' state at the start of the velocity phase.
pub fn build_velocity_constraints(island: &Island, bodies: &Arena<Body>, fixtures: &Arena<Fixture>, contact_manager: &ContactManager) -> Vec<ContactVelocityConstraint> {
    let mut constraints = Vec::with_capacity(island.contacts.len());

    for &contact_id in &island.contacts {
        let Some(contact) = contact_manager.contacts.get(contact_id) else { continue };
        if !contact.touching || !contact.enabled || contact.is_sensor(fixtures) {
            continue;
        }
        let (Some(fa), Some(fb)) = (fixtures.get(contact.fixture_a), fixtures.get(contact.fixture_b)) else { continue };
        let (Some(body_a), Some(body_b)) = (bodies.get(contact.body_a), bodies.get(contact.body_b)) else { continue };

        let radius_a = fa.shape.skin_radius();
        let radius_b = fb.shape.skin_radius();
        let (normal, points, _) = world_manifold(
            contact.manifold.manifold_type,
            contact.manifold.local_normal,
            contact.manifold.local_point,
            &contact.manifold.points.iter().map(|p| p.local_point).collect::<Vec<_>>(),
            &body_a.transform,
            radius_a,
            &body_b.transform,
            radius_b,
        );

        let center_a = body_a.world_center();
        let center_b = body_b.world_center();
        let m_a = body_a.inv_mass;
        let m_b = body_b.inv_mass;
        let i_a = body_a.inv_inertia;
        let i_b = body_b.inv_inertia;
        let tangent = cross_sv(1.0, normal);

        let mut vc_points = Vec::with_capacity(points.len());
        let mut normal_impulses = Vec::with_capacity(points.len());
        let mut tangent_impulses = Vec::with_capacity(points.len());

        for (point, mp) in points.iter().zip(contact.manifold.points.iter()) {
            let r_a = *point - center_a;
            let r_b = *point - center_b;

            let rn_a = cross2(r_a, normal);
            let rn_b = cross2(r_b, normal);
            let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
            let normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

            let rt_a = cross2(r_a, tangent);
            let rt_b = cross2(r_b, tangent);
            let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
            let tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

            let rel_velocity = (body_b.velocity.linear + cross_sv(body_b.velocity.angular, r_b))
                - (body_a.velocity.linear + cross_sv(body_a.velocity.angular, r_a));
            let vn = rel_velocity.dot(normal);
            let velocity_bias = if vn < -VELOCITY_THRESHOLD { -contact.restitution * vn } else { 0.0 };

            vc_points.push(VelocityConstraintPoint { r_a, r_b, normal_mass, tangent_mass, velocity_bias });
            normal_impulses.push(mp.normal_impulse);
            tangent_impulses.push(mp.tangent_impulse);
        }

        constraints.push(ContactVelocityConstraint {
            contact_id,
            body_a: contact.body_a,
            body_b: contact.body_b,
            normal,
            friction: contact.friction,
            restitution: contact.restitution,
            tangent_speed: contact.tangent_speed,
            points: vc_points,
            normal_impulses,
            tangent_impulses,
        });
    }

    constraints
}

pub fn build_position_constraints(island: &Island, fixtures: &Arena<Fixture>, contact_manager: &ContactManager) -> Vec<ContactPositionConstraint> {
    let mut constraints = Vec::with_capacity(island.contacts.len());
    for &contact_id in &island.contacts {
        let Some(contact) = contact_manager.contacts.get(contact_id) else { continue };
        if !contact.touching || !contact.enabled || contact.is_sensor(fixtures) {
            continue;
        }
        let (Some(fa), Some(fb)) = (fixtures.get(contact.fixture_a), fixtures.get(contact.fixture_b)) else { continue };
        constraints.push(ContactPositionConstraint {
            body_a: contact.body_a,
            body_b: contact.body_b,
            manifold_type: contact.manifold.manifold_type,
            local_normal: contact.manifold.local_normal,
            local_point: contact.manifold.local_point,
            local_points: contact.manifold.points.iter().map(|p| p.local_point).collect(),
            radius_a: fa.shape.skin_radius(),
            radius_b: fb.shape.skin_radius(),
        });
    }
    constraints
}

/// Applies each point's warm-started normal/tangent impulse (carried over
/// from the previous step via `ContactManager::collide`'s feature matching)
/// to the bodies' velocities before the first velocity iteration.
pub fn warm_start(constraints: &[ContactVelocityConstraint], bodies: &mut Arena<Body>) {
    for vc in constraints {
        let Some((body_a, body_b)) = bodies.get2_mut(vc.body_a, vc.body_b) else { continue };
        for (i, p) in vc.points.iter().enumerate() {
            let impulse = vc.normal_impulses[i] * vc.normal + vc.tangent_impulses[i] * cross_sv(1.0, vc.normal);
            apply_pair_impulse(body_a, body_b, p.r_a, p.r_b, impulse);
        }
    }
}

fn apply_pair_impulse(body_a: &mut Body, body_b: &mut Body, r_a: Vec2, r_b: Vec2, impulse: Vec2) {
    body_a.velocity.linear -= body_a.inv_mass * impulse;
    body_a.velocity.angular -= body_a.inv_inertia * cross2(r_a, impulse);
    body_b.velocity.linear += body_b.inv_mass * impulse;
    body_b.velocity.angular += body_b.inv_inertia * cross2(r_b, impulse);
}

/// One sequential-impulse sweep over every point: tangent (friction-cone
/// clamped against the *current* normal impulse) first, then normal
/// (clamped to non-negative), matching the standard ordering that lets
/// friction see an up-to-date normal impulse within the same iteration.
pub fn solve_velocity_constraints(constraints: &mut [ContactVelocityConstraint], bodies: &mut Arena<Body>) {
    for vc in constraints {
        let Some((body_a, body_b)) = bodies.get2_mut(vc.body_a, vc.body_b) else { continue };
        let tangent = cross_sv(1.0, vc.normal);

        for i in 0..vc.points.len() {
            let p = &vc.points[i];
            let rel_velocity = (body_b.velocity.linear + cross_sv(body_b.velocity.angular, p.r_b))
                - (body_a.velocity.linear + cross_sv(body_a.velocity.angular, p.r_a));
            let vt = rel_velocity.dot(tangent) - vc.tangent_speed;
            let candidate = -vt * p.tangent_mass;
            let (new_impulse, delta) = clamp_tangent_impulse(vc.friction, vc.normal_impulses[i], vc.tangent_impulses[i], candidate);
            vc.tangent_impulses[i] = new_impulse;
            apply_pair_impulse(body_a, body_b, p.r_a, p.r_b, delta * tangent);
        }

        for i in 0..vc.points.len() {
            let p = &vc.points[i];
            let rel_velocity = (body_b.velocity.linear + cross_sv(body_b.velocity.angular, p.r_b))
                - (body_a.velocity.linear + cross_sv(body_a.velocity.angular, p.r_a));
            let vn = rel_velocity.dot(vc.normal);
            let candidate = p.normal_mass * (-vn + p.velocity_bias);
            let new_impulse = (vc.normal_impulses[i] + candidate).max(0.0);
            let delta = new_impulse - vc.normal_impulses[i];
            vc.normal_impulses[i] = new_impulse;
            apply_pair_impulse(body_a, body_b, p.r_a, p.r_b, delta * vc.normal);
        }
    }
}

/// Writes each constraint's final accumulated impulses back into the
/// contact's manifold points, both to warm-start next step and to report
/// via `PostSolve`.
pub fn store_impulses(constraints: &[ContactVelocityConstraint], contact_manager: &mut ContactManager) -> Vec<(ContactId, crate::collision::contact::ContactImpulse)> {
    let mut reports = Vec::with_capacity(constraints.len());
    for vc in constraints {
        if let Some(contact) = contact_manager.contacts.get_mut(vc.contact_id) {
            for (i, mp) in contact.manifold.points.iter_mut().enumerate() {
                mp.normal_impulse = vc.normal_impulses[i];
                mp.tangent_impulse = vc.tangent_impulses[i];
            }
        }
        let mut impulse = crate::collision::contact::ContactImpulse::default();
        impulse.count = vc.points.len();
        for i in 0..vc.points.len() {
            impulse.normal_impulses[i] = vc.normal_impulses[i];
            impulse.tangent_impulses[i] = vc.tangent_impulses[i];
        }
        reports.push((vc.contact_id, impulse));
    }
    reports
}

/// One sequential sweep of Baumgarte position correction over every
/// contact point, each re-evaluated against the bodies' *current* (mid-
/// sweep) transforms. Returns the minimum separation seen, so the caller
/// can stop iterating once contacts are resolved to within slop.
pub fn solve_position_constraints(constraints: &[ContactPositionConstraint], bodies: &mut Arena<Body>) -> f32 {
    let mut min_separation = 0.0f32;

    for pc in constraints {
        let Some((body_a, body_b)) = bodies.get2_mut(pc.body_a, pc.body_b) else { continue };
        let m_a = body_a.inv_mass;
        let m_b = body_b.inv_mass;
        let i_a = body_a.inv_inertia;
        let i_b = body_b.inv_inertia;

        for j in 0..pc.local_points.len() {
            let center_a = body_a.world_center();
            let center_b = body_b.world_center();
            let xf_a = make_transform(center_a, body_a.transform.rotation, body_a.local_center);
            let xf_b = make_transform(center_b, body_b.transform.rotation, body_b.local_center);

            let (normal, points, separations) = world_manifold(
                pc.manifold_type,
                pc.local_normal,
                pc.local_point,
                std::slice::from_ref(&pc.local_points[j]),
                &xf_a,
                pc.radius_a,
                &xf_b,
                pc.radius_b,
            );
            if points.is_empty() {
                continue;
            }
            let point = points[0];
            let separation = separations[0];
            min_separation = min_separation.min(separation);

            let correction = (BAUMGARTE * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);

            let r_a = point - center_a;
            let r_b = point - center_b;
            let rn_a = cross2(r_a, normal);
            let rn_b = cross2(r_b, normal);
            let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
            let impulse = if k > 0.0 { -correction / k } else { 0.0 };
            let p = impulse * normal;

            let new_center_a = center_a - m_a * p;
            let new_angle_a = body_a.transform.rotation.angle() - i_a * cross2(r_a, p);
            body_a.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_a);
            body_a.set_world_center(new_center_a);

            let new_center_b = center_b + m_b * p;
            let new_angle_b = body_b.transform.rotation.angle() + i_b * cross2(r_b, p);
            body_b.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_b);
            body_b.set_world_center(new_center_b);
        }
    }

    min_separation
}

/// Same position-correction sweep, restricted to the single pair touched
/// by a time-of-impact event, and only ever moving the two bodies named in
/// `movable` (the conservative-advancement pass leaves every other body in
/// the pair's island fixed for this sub-step).
pub fn solve_toi_position_constraint(pc: &ContactPositionConstraint, bodies: &mut Arena<Body>, movable_a: bool, movable_b: bool) -> f32 {
    let Some((body_a, body_b)) = bodies.get2_mut(pc.body_a, pc.body_b) else { return 0.0 };
    let m_a = if movable_a { body_a.inv_mass } else { 0.0 };
    let m_b = if movable_b { body_b.inv_mass } else { 0.0 };
    let i_a = if movable_a { body_a.inv_inertia } else { 0.0 };
    let i_b = if movable_b { body_b.inv_inertia } else { 0.0 };

    let mut min_separation = 0.0f32;
    for j in 0..pc.local_points.len() {
        let center_a = body_a.world_center();
        let center_b = body_b.world_center();
        let xf_a = make_transform(center_a, body_a.transform.rotation, body_a.local_center);
        let xf_b = make_transform(center_b, body_b.transform.rotation, body_b.local_center);

        let (normal, points, separations) = world_manifold(
            pc.manifold_type,
            pc.local_normal,
            pc.local_point,
            std::slice::from_ref(&pc.local_points[j]),
            &xf_a,
            pc.radius_a,
            &xf_b,
            pc.radius_b,
        );
        if points.is_empty() {
            continue;
        }
        let point = points[0];
        let separation = separations[0];
        min_separation = min_separation.min(separation);

        let correction = (crate::config::TOI_BAUMGARTE * (separation + LINEAR_SLOP)).clamp(-MAX_LINEAR_CORRECTION, 0.0);

        let r_a = point - center_a;
        let r_b = point - center_b;
        let rn_a = cross2(r_a, normal);
        let rn_b = cross2(r_b, normal);
        let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
        let impulse = if k > 0.0 { -correction / k } else { 0.0 };
        let p = impulse * normal;

        if movable_a {
            let new_center_a = center_a - m_a * p;
            let new_angle_a = body_a.transform.rotation.angle() - i_a * cross2(r_a, p);
            body_a.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_a);
            body_a.set_world_center(new_center_a);
        }
        if movable_b {
            let new_center_b = center_b + m_b * p;
            let new_angle_b = body_b.transform.rotation.angle() + i_b * cross2(r_b, p);
            body_b.transform.rotation = crate::core::types::Rot2::from_angle(new_angle_b);
            body_b.set_world_center(new_center_b);
        }
    }
    min_separation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::body::BodyKind;
    use crate::core::types::Transform;

    #[test]
    fn resting_box_on_ground_has_zero_penetration_after_correction() {
        let mut bodies = Arena::new();
        let ground = bodies.insert(Body::new(crate::utils::allocator::EntityId::default(), BodyKind::Static, Transform::default()));
        let mut dynamic_body = Body::new(crate::utils::allocator::EntityId::default(), BodyKind::Dynamic, Transform::new(Vec2::new(0.0, 0.95), crate::core::types::Rot2::IDENTITY));
        dynamic_body.mass = 1.0;
        dynamic_body.inv_mass = 1.0;
        dynamic_body.inertia = 1.0;
        dynamic_body.inv_inertia = 1.0;
        let dynamic = bodies.insert(dynamic_body);

        let pc = ContactPositionConstraint {
            body_a: ground,
            body_b: dynamic,
            manifold_type: ManifoldType::FaceA,
            local_normal: Vec2::Y,
            local_point: Vec2::new(0.0, 0.5),
            local_points: vec![Vec2::new(-0.5, -0.5), Vec2::new(0.5, -0.5)],
            radius_a: 0.0,
            radius_b: 0.0,
        };

        let mut separation = -1.0;
        for _ in 0..20 {
            separation = solve_position_constraints(std::slice::from_ref(&pc), &mut bodies);
            if separation > -3.0 * LINEAR_SLOP {
                break;
            }
        }
        assert!(separation > -3.0 * LINEAR_SLOP);
    }
}
