//! Contacts: the persistent record of a potentially-touching fixture pair,
//! and the manager that creates/destroys them from broad-phase pair
//! activity and re-evaluates their manifolds every step.

use crate::collision::broadphase::BroadPhase;
use crate::collision::manifold::Manifold;
use crate::collision::narrowphase;
use crate::core::body::{Body, BodyId, ContactEdge, ContactEdgeId, ContactId, FixtureId, JointEdge};
use crate::core::fixture::{Filter, Fixture};
use crate::core::joint::Joint;
use crate::core::types::{mix_friction, mix_restitution};
use crate::utils::allocator::{Arena, EntityId};

/// Buffered per-point normal/tangent impulses handed to `PostSolve` after
/// the velocity solve, since the solver works in flat island-local arrays
/// and contacts only get a read-only summary afterward.
#[derive(Debug, Clone, Default)]
pub struct ContactImpulse {
    pub normal_impulses: [f32; crate::config::MAX_MANIFOLD_POINTS],
    pub tangent_impulses: [f32; crate::config::MAX_MANIFOLD_POINTS],
    pub count: usize,
}

/// Callback for fixture-pair filtering finer than category/mask/group,
/// e.g. gameplay rules ("arrows ignore their own archer").
pub trait ContactFilter: Send + Sync {
    fn should_collide(&self, fixture_a: FixtureId, fixture_b: FixtureId) -> bool;
}

/// Notifications fired during `World::step`. All methods are no-ops by
/// default; implement only the ones you need.
#[allow(unused_variables)]
pub trait ContactListener: Send + Sync {
    fn begin_contact(&mut self, contact: &Contact) {}
    fn end_contact(&mut self, contact: &Contact) {}
    /// Called just before the contact is solved, with the manifold as it
    /// stood at the end of the previous step. May call
    /// `contact.set_enabled(false)` to skip solving this contact this step.
    fn pre_solve(&mut self, contact: &mut Contact, old_manifold: &Manifold) {}
    fn post_solve(&mut self, contact: &Contact, impulse: &ContactImpulse) {}
}

/// A potentially-touching pair of fixtures. Created when their broad-phase
/// proxies first overlap, destroyed when they separate (by fattened AABB)
/// or stop passing filtering; re-evaluated every step in between.
#[derive(Debug, Clone)]
pub struct Contact {
    pub id: ContactId,
    pub fixture_a: FixtureId,
    pub fixture_b: FixtureId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub edge_a: ContactEdgeId,
    pub edge_b: ContactEdgeId,
    pub manifold: Manifold,
    /// True once the current manifold has at least one point.
    pub touching: bool,
    /// User/listener-settable latch; when false the contact is skipped by
    /// the solver this step without affecting `touching` or the manifold.
    pub enabled: bool,
    pub friction: f32,
    pub restitution: f32,
    /// Added to the tangent-direction target velocity (conveyor belts).
    pub tangent_speed: f32,
    pub toi_count: u32,
}

impl Contact {
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Overrides the mixed friction computed at creation time, e.g. from a
    /// `PreSolve` listener implementing a material-specific rule.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Overrides the mixed restitution computed at creation time.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn set_tangent_speed(&mut self, speed: f32) {
        self.tangent_speed = speed;
    }

    pub fn is_sensor(&self, fixtures: &Arena<Fixture>) -> bool {
        fixtures.get(self.fixture_a).map(|f| f.is_sensor).unwrap_or(false)
            || fixtures.get(self.fixture_b).map(|f| f.is_sensor).unwrap_or(false)
    }
}

fn pack_fixture_id(id: FixtureId) -> u64 {
    ((id.generation() as u64) << 32) | (id.index() as u64 & 0xFFFF_FFFF)
}

fn unpack_fixture_id(packed: u64) -> FixtureId {
    EntityId::new((packed & 0xFFFF_FFFF) as usize, (packed >> 32) as u32)
}

fn bodies_should_collide(a: &Body, b: &Body) -> bool {
    a.is_dynamic() || b.is_dynamic()
}

/// Walks `body`'s joint-edge list for one connecting it to `other` with
/// `collide_connected == false`; such a joint vetoes contact creation
/// between the pair for as long as it exists.
fn joint_forbids_collision(body: &Body, other: BodyId, joints: &Arena<Joint>, joint_edges: &Arena<JointEdge>) -> bool {
    let mut edge = body.joint_edge_head;
    while let Some(edge_id) = edge {
        let Some(je) = joint_edges.get(edge_id) else { break };
        if je.other == other {
            if let Some(joint) = joints.get(je.joint) {
                if !joint.collide_connected {
                    return true;
                }
            }
        }
        edge = je.next;
    }
    false
}

/// Owns the broad phase and the set of live contacts, and drives the
/// create/destroy/re-evaluate lifecycle each step.
pub struct ContactManager {
    pub broad_phase: BroadPhase,
    pub contacts: Arena<Contact>,
    pub contact_edges: Arena<ContactEdge>,
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactManager {
    pub fn new() -> Self {
        Self {
            broad_phase: BroadPhase::new(),
            contacts: Arena::new(),
            contact_edges: Arena::new(),
        }
    }

    pub fn create_proxy(&mut self, fixture: &mut Fixture, body: &Body) {
        let aabb = fixture.shape.compute_aabb(&body.transform);
        let proxy = self.broad_phase.create_proxy(aabb, pack_fixture_id(fixture.id));
        fixture.proxy_id = Some(proxy);
    }

    pub fn destroy_proxy(&mut self, fixture: &mut Fixture) {
        if let Some(proxy) = fixture.proxy_id.take() {
            self.broad_phase.destroy_proxy(proxy);
        }
    }

    /// Refreshes a fixture's broad-phase AABB after its body has moved.
    pub fn synchronize_fixture(&mut self, fixture: &Fixture, body: &Body, displacement: glam::Vec2) {
        if let Some(proxy) = fixture.proxy_id {
            let aabb = fixture.shape.compute_aabb(&body.transform);
            self.broad_phase.move_proxy(proxy, aabb, displacement);
        }
    }

    fn contact_exists(&self, bodies: &Arena<Body>, start_body: BodyId, fixture_a: FixtureId, fixture_b: FixtureId) -> bool {
        let Some(body) = bodies.get(start_body) else {
            return false;
        };
        let mut edge = body.contact_edge_head;
        while let Some(edge_id) = edge {
            let Some(ce) = self.contact_edges.get(edge_id) else {
                break;
            };
            if let Some(contact) = self.contacts.get(ce.contact) {
                let matches = (contact.fixture_a == fixture_a && contact.fixture_b == fixture_b)
                    || (contact.fixture_a == fixture_b && contact.fixture_b == fixture_a);
                if matches {
                    return true;
                }
            }
            edge = ce.next;
        }
        false
    }

    fn create_contact(&mut self, fixtures: &Arena<Fixture>, fixture_a: FixtureId, fixture_b: FixtureId, bodies: &mut Arena<Body>) -> Option<ContactId> {
        let fa = fixtures.get(fixture_a)?;
        let fb = fixtures.get(fixture_b)?;
        let body_a = fa.body;
        let body_b = fb.body;
        let friction = mix_friction(fa.friction, fb.friction);
        let restitution = mix_restitution(fa.restitution, fb.restitution);

        let contact_id = self.contacts.insert(Contact {
            id: EntityId::default(),
            fixture_a,
            fixture_b,
            body_a,
            body_b,
            edge_a: EntityId::default(),
            edge_b: EntityId::default(),
            manifold: Manifold::empty(),
            touching: false,
            enabled: true,
            friction,
            restitution,
            tangent_speed: 0.0,
            toi_count: 0,
        });

        let head_a = bodies.get(body_a).and_then(|b| b.contact_edge_head);
        let head_b = bodies.get(body_b).and_then(|b| b.contact_edge_head);

        let edge_a = self.contact_edges.insert(ContactEdge {
            other: body_b,
            contact: contact_id,
            prev: None,
            next: head_a,
        });
        let edge_b = self.contact_edges.insert(ContactEdge {
            other: body_a,
            contact: contact_id,
            prev: None,
            next: head_b,
        });

        if let Some(next_id) = head_a {
            if let Some(next) = self.contact_edges.get_mut(next_id) {
                next.prev = Some(edge_a);
            }
        }
        if let Some(next_id) = head_b {
            if let Some(next) = self.contact_edges.get_mut(next_id) {
                next.prev = Some(edge_b);
            }
        }
        if let Some(b) = bodies.get_mut(body_a) {
            b.contact_edge_head = Some(edge_a);
        }
        if let Some(b) = bodies.get_mut(body_b) {
            b.contact_edge_head = Some(edge_b);
        }

        if let Some(c) = self.contacts.get_mut(contact_id) {
            c.id = contact_id;
            c.edge_a = edge_a;
            c.edge_b = edge_b;
        }

        Some(contact_id)
    }

    /// Walks newly-overlapping broad-phase pairs and creates contacts for
    /// the ones that pass filtering; attaches the new contact's edges into
    /// both bodies' intrusive edge lists.
    pub fn find_new_contacts(
        &mut self,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        joints: &Arena<Joint>,
        joint_edges: &Arena<JointEdge>,
        filter: Option<&dyn ContactFilter>,
    ) {
        let mut pairs = Vec::new();
        self.broad_phase.update_pairs(|a, b| pairs.push((a, b)));

        for (raw_a, raw_b) in pairs {
            let fixture_a = unpack_fixture_id(raw_a);
            let fixture_b = unpack_fixture_id(raw_b);

            let (Some(fa), Some(fb)) = (fixtures.get(fixture_a), fixtures.get(fixture_b)) else {
                continue;
            };
            if fa.body == fb.body {
                continue;
            }
            let (Some(body_a), Some(body_b)) = (bodies.get(fa.body), bodies.get(fb.body)) else {
                continue;
            };
            if !bodies_should_collide(body_a, body_b) {
                continue;
            }
            if joint_forbids_collision(body_a, fb.body, joints, joint_edges) {
                continue;
            }
            if !Filter::should_collide(&fa.filter, &fb.filter) {
                continue;
            }
            if let Some(f) = filter {
                if !f.should_collide(fixture_a, fixture_b) {
                    continue;
                }
            }
            if self.contact_exists(bodies, fa.body, fixture_a, fixture_b) {
                continue;
            }

            self.create_contact(fixtures, fixture_a, fixture_b, bodies);
        }
    }

    /// Re-evaluates every live contact's manifold: re-checks filtering
    /// (destroying contacts that no longer pass), runs the narrow phase for
    /// contacts with at least one awake endpoint, warm-start-matches the new
    /// manifold against the old one, and fires `BeginContact`/`EndContact`/
    /// `PreSolve`.
    pub fn collide(
        &mut self,
        bodies: &mut Arena<Body>,
        fixtures: &Arena<Fixture>,
        joints: &Arena<Joint>,
        joint_edges: &Arena<JointEdge>,
        filter: Option<&dyn ContactFilter>,
        mut listener: Option<&mut dyn ContactListener>,
    ) {
        let ids: Vec<ContactId> = self.contacts.ids().collect();
        let mut to_destroy = Vec::new();

        for id in ids {
            let Some(contact) = self.contacts.get(id) else {
                continue;
            };
            let fixture_a = contact.fixture_a;
            let fixture_b = contact.fixture_b;
            let (Some(fa), Some(fb)) = (fixtures.get(fixture_a), fixtures.get(fixture_b)) else {
                to_destroy.push(id);
                continue;
            };
            let (Some(body_a), Some(body_b)) = (bodies.get(fa.body), bodies.get(fb.body)) else {
                to_destroy.push(id);
                continue;
            };

            if !bodies_should_collide(body_a, body_b) || !Filter::should_collide(&fa.filter, &fb.filter) {
                to_destroy.push(id);
                continue;
            }
            if joint_forbids_collision(body_a, fb.body, joints, joint_edges) {
                to_destroy.push(id);
                continue;
            }
            if let Some(f) = filter {
                if !f.should_collide(fixture_a, fixture_b) {
                    to_destroy.push(id);
                    continue;
                }
            }

            if !body_a.flags.enabled || !body_b.flags.enabled {
                continue;
            }
            let active_a = body_a.flags.awake;
            let active_b = body_b.flags.awake;
            if !active_a && !active_b {
                continue;
            }

            let old_manifold = contact.manifold.clone();
            let was_touching = contact.touching;

            let mut new_manifold = narrowphase::collide(&fa.shape, &body_a.transform, &fb.shape, &body_b.transform);
            for point in &mut new_manifold.points {
                if let Some(old) = old_manifold.points.iter().find(|p| p.id == point.id) {
                    point.normal_impulse = old.normal_impulse;
                    point.tangent_impulse = old.tangent_impulse;
                }
            }
            let now_touching = !new_manifold.points.is_empty();

            if let Some(c) = self.contacts.get_mut(id) {
                c.manifold = new_manifold;
                c.touching = now_touching;
            }

            if now_touching && !was_touching {
                if let Some(l) = listener.as_deref_mut() {
                    if let Some(c) = self.contacts.get(id) {
                        l.begin_contact(c);
                    }
                }
            } else if !now_touching && was_touching {
                if let Some(l) = listener.as_deref_mut() {
                    if let Some(c) = self.contacts.get(id) {
                        l.end_contact(c);
                    }
                }
            }

            if now_touching {
                if let Some(l) = listener.as_deref_mut() {
                    if let Some(c) = self.contacts.get_mut(id) {
                        l.pre_solve(c, &old_manifold);
                    }
                }
            }
        }

        for id in to_destroy {
            if let Some(contact) = self.contacts.get(id) {
                if contact.touching {
                    if let Some(l) = listener.as_deref_mut() {
                        l.end_contact(contact);
                    }
                }
            }
            self.destroy(id, bodies);
        }
    }

    /// Tears down a contact: unlinks both edges from their bodies' lists
    /// and frees the edges and the contact from their arenas.
    pub fn destroy(&mut self, id: ContactId, bodies: &mut Arena<Body>) -> Option<Contact> {
        let contact = self.contacts.remove(id)?;
        self.unlink_edge(bodies, contact.body_a, contact.edge_a);
        self.unlink_edge(bodies, contact.body_b, contact.edge_b);
        self.contact_edges.remove(contact.edge_a);
        self.contact_edges.remove(contact.edge_b);
        Some(contact)
    }

    fn unlink_edge(&mut self, bodies: &mut Arena<Body>, owner: BodyId, edge_id: ContactEdgeId) {
        let Some(edge) = self.contact_edges.get(edge_id).copied() else {
            return;
        };
        match edge.prev {
            Some(prev_id) => {
                if let Some(prev) = self.contact_edges.get_mut(prev_id) {
                    prev.next = edge.next;
                }
            }
            None => {
                if let Some(b) = bodies.get_mut(owner) {
                    b.contact_edge_head = edge.next;
                }
            }
        }
        if let Some(next_id) = edge.next {
            if let Some(next) = self.contact_edges.get_mut(next_id) {
                next.prev = edge.prev;
            }
        }
    }

    /// Ids of every contact touching `fixture`, e.g. when its owning
    /// fixture is about to be destroyed.
    pub fn contacts_for_fixture(&self, fixture: FixtureId) -> Vec<ContactId> {
        self.contacts
            .ids()
            .filter(|id| {
                self.contacts
                    .get(*id)
                    .map(|c| c.fixture_a == fixture || c.fixture_b == fixture)
                    .unwrap_or(false)
            })
            .collect()
    }
}
