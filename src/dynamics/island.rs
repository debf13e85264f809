//! Island construction: groups awake bodies into connected components via
//! contact and joint edges so the solver can process each independently
//! (and so sleeping/waking operates on a whole component at once).

use std::collections::HashSet;

use crate::collision::contact::ContactManager;
use crate::core::body::{Body, BodyId, ContactId, JointId};
use crate::core::fixture::Fixture;
use crate::core::joint::Joint;
use crate::utils::allocator::Arena;

/// One connected component of the contact/joint graph, in stable DFS order.
#[derive(Debug, Default, Clone)]
pub struct Island {
    pub bodies: Vec<BodyId>,
    pub contacts: Vec<ContactId>,
    pub joints: Vec<JointId>,
}

/// Builds every island for this step. `body_order` fixes the seed order
/// (and so, transitively, the DFS order within each island) so that two
/// runs with identical API call histories produce identical islands.
pub fn build_islands(
    bodies: &mut Arena<Body>,
    fixtures: &Arena<Fixture>,
    contact_manager: &ContactManager,
    joints: &Arena<Joint>,
    joint_edges: &Arena<crate::core::body::JointEdge>,
    body_order: &[BodyId],
) -> Vec<Island> {
    for &id in body_order {
        if let Some(b) = bodies.get_mut(id) {
            b.flags.island_processed = false;
        }
    }

    let mut islands = Vec::new();

    for &seed in body_order {
        let seed_ok = bodies
            .get(seed)
            .map(|b| !b.is_static() && b.flags.awake && b.flags.enabled && !b.flags.island_processed)
            .unwrap_or(false);
        if !seed_ok {
            continue;
        }

        let mut island = Island::default();
        let mut stack = vec![seed];
        if let Some(b) = bodies.get_mut(seed) {
            b.flags.island_processed = true;
        }
        let mut seen_contacts = HashSet::new();
        let mut seen_joints = HashSet::new();

        while let Some(body_id) = stack.pop() {
            island.bodies.push(body_id);

            let is_static = bodies.get(body_id).map(|b| b.is_static()).unwrap_or(true);
            if is_static {
                // Static bodies bound the search; they don't propagate.
                continue;
            }
            if let Some(b) = bodies.get_mut(body_id) {
                b.wake();
            }

            let mut edge = bodies.get(body_id).and_then(|b| b.contact_edge_head);
            while let Some(edge_id) = edge {
                let Some(ce) = contact_manager.contact_edges.get(edge_id).copied() else {
                    break;
                };
                edge = ce.next;

                if seen_contacts.contains(&ce.contact) {
                    continue;
                }
                let Some(contact) = contact_manager.contacts.get(ce.contact) else {
                    continue;
                };
                if !contact.touching || !contact.enabled || contact.is_sensor(fixtures) {
                    continue;
                }
                seen_contacts.insert(ce.contact);
                island.contacts.push(ce.contact);

                let other_processed = bodies.get(ce.other).map(|b| b.flags.island_processed).unwrap_or(true);
                if other_processed {
                    continue;
                }
                if let Some(b) = bodies.get_mut(ce.other) {
                    b.flags.island_processed = true;
                }
                stack.push(ce.other);
            }

            let mut jedge = bodies.get(body_id).and_then(|b| b.joint_edge_head);
            while let Some(edge_id) = jedge {
                let Some(je) = joint_edges.get(edge_id).copied() else {
                    break;
                };
                jedge = je.next;

                if seen_joints.contains(&je.joint) {
                    continue;
                }
                if joints.get(je.joint).is_none() {
                    continue;
                }
                let other_enabled = bodies.get(je.other).map(|b| b.flags.enabled).unwrap_or(false);
                if !other_enabled {
                    continue;
                }
                seen_joints.insert(je.joint);
                island.joints.push(je.joint);

                let other_processed = bodies.get(je.other).map(|b| b.flags.island_processed).unwrap_or(true);
                if other_processed {
                    continue;
                }
                if let Some(b) = bodies.get_mut(je.other) {
                    b.flags.island_processed = true;
                }
                stack.push(je.other);
            }
        }

        for &bid in &island.bodies {
            if bodies.get(bid).map(|b| b.is_static()).unwrap_or(false) {
                if let Some(b) = bodies.get_mut(bid) {
                    b.flags.island_processed = false;
                }
            }
        }

        islands.push(island);
    }

    islands
}

/// Advances (or resets) each body's sleep timer for this island, and puts
/// the whole island to sleep once every body has been under the velocity
/// tolerances for `TIME_TO_SLEEP` seconds straight.
pub fn update_sleep(island: &Island, bodies: &mut Arena<Body>, dt: f32, allow_sleep: bool) {
    use crate::config::{ANGULAR_SLEEP_TOLERANCE, LINEAR_SLEEP_TOLERANCE, TIME_TO_SLEEP};

    let lin_tol_sq = LINEAR_SLEEP_TOLERANCE * LINEAR_SLEEP_TOLERANCE;
    let ang_tol_sq = ANGULAR_SLEEP_TOLERANCE * ANGULAR_SLEEP_TOLERANCE;
    let mut min_sleep_time = f32::MAX;

    for &id in &island.bodies {
        let Some(b) = bodies.get_mut(id) else { continue };
        if b.is_static() {
            continue;
        }
        let under_tolerance = b.flags.sleep_allowed
            && b.velocity.angular * b.velocity.angular <= ang_tol_sq
            && b.velocity.linear.length_squared() <= lin_tol_sq;
        if !under_tolerance {
            b.sleep_time = 0.0;
        } else {
            b.sleep_time += dt;
        }
        min_sleep_time = min_sleep_time.min(b.sleep_time);
    }

    if allow_sleep && min_sleep_time >= TIME_TO_SLEEP {
        for &id in &island.bodies {
            if let Some(b) = bodies.get_mut(id) {
                if !b.is_static() {
                    b.sleep();
                }
            }
        }
    }
}
