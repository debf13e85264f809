//! `World`: owns every body, fixture, and joint, and drives the per-step
//! simulation pipeline — contact update, island solve, then TOI
//! sub-stepping — described in sections 4.1 and 4.4 of the design.

use std::collections::{HashMap, HashSet, VecDeque};

use glam::Vec2;

use crate::collision::ccd::{toi, DistanceProxy, Sweep, ToiInput, ToiState};
use crate::collision::contact::{ContactFilter, ContactImpulse, ContactListener, ContactManager};
use crate::collision::queries::{self, QueryCallback, RayCastCallback, RayCastInput};
use crate::config::{WorldConfig, LINEAR_SLOP, MAX_SUB_STEPS};
use crate::core::body::{Body, BodyDef, BodyId, ContactId, FixtureId, JointEdge, JointEdgeId, JointId};
use crate::core::fixture::{Fixture, FixtureDef};
use crate::core::joint::{Joint, JointDef, JointKind, JointListener};
use crate::core::shapes::{Aabb, Shape};
use crate::core::types::MassData;
use crate::dynamics::{
    build_islands, build_joint_constraints, build_position_constraints, build_velocity_constraints, compute_fixture_aabbs,
    integrate_position, integrate_velocity, solve_joint_position_constraints, solve_joint_velocity_constraints,
    solve_position_constraints, solve_toi_position_constraint, solve_velocity_constraints, store_impulses, update_sleep, warm_start,
    Island,
};
use crate::error::{PhysicsError, Result};
use crate::utils::allocator::{Arena, EntityId};
use crate::utils::{warn_if_frame_budget_exceeded, PhysicsProfiler, ScopedTimer};

/// Number of position-correction iterations run per TOI sub-step, a
/// smaller budget than the discrete solve's since only two bodies move.
const TOI_POSITION_ITERATIONS: u32 = 4;

/// Upper bound on how many bodies a TOI mini-island may pull in via BFS,
/// mirroring the discrete solver's resource caps.
const MAX_TOI_ISLAND_BODIES: usize = 32;

/// Top-level simulation container. Owns the body/fixture/joint pools, the
/// contact manager (which in turn owns the broad phase), and per-step
/// bookkeeping (the re-entrancy lock, creation-order seed list, profiler).
pub struct World {
    bodies: Arena<Body>,
    fixtures: Arena<Fixture>,
    joints: Arena<Joint>,
    joint_edges: Arena<JointEdge>,
    contact_manager: ContactManager,
    gravity: Vec2,
    allow_sleep: bool,
    locked: bool,
    /// Fixes DFS seed order (and so, transitively, per-island DFS order)
    /// to creation order, independent of arena slot reuse after deletion.
    body_order: Vec<BodyId>,
    listener: Option<Box<dyn ContactListener>>,
    filter: Option<Box<dyn ContactFilter>>,
    joint_listener: Option<Box<dyn JointListener>>,
    profiler: PhysicsProfiler,
    /// Counts numerically degenerate configurations recovered from
    /// locally (failed TOI queries); diagnostic only.
    last_degeneracy: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            bodies: Arena::new(),
            fixtures: Arena::new(),
            joints: Arena::new(),
            joint_edges: Arena::new(),
            contact_manager: ContactManager::new(),
            gravity: config.gravity,
            allow_sleep: config.allow_sleep,
            locked: false,
            body_order: Vec::new(),
            listener: None,
            filter: None,
            joint_listener: None,
            profiler: PhysicsProfiler::default(),
            last_degeneracy: 0,
        }
    }

    fn check_unlocked(&self) -> Result<()> {
        if self.locked {
            log::error!("world mutation attempted while locked (mid-step)");
            return Err(PhysicsError::InvalidState("world is locked during step".into()));
        }
        Ok(())
    }

    // ---- creation / destruction -----------------------------------------

    pub fn create_body(&mut self, def: BodyDef) -> Result<BodyId> {
        self.check_unlocked()?;

        let mut body = Body::new(EntityId::default(), def.kind, def.transform);
        body.linear_damping = def.linear_damping;
        body.angular_damping = def.angular_damping;
        body.gravity_scale = def.gravity_scale;
        body.flags.fixed_rotation = def.fixed_rotation;
        body.flags.bullet = def.bullet;
        body.flags.sleep_allowed = def.allow_sleep;
        body.flags.awake = def.awake;
        body.flags.enabled = def.enabled;
        body.user_data = def.user_data;

        let id = self.bodies.insert(body);
        self.bodies.get_mut(id).expect("just inserted").id = id;
        self.body_order.push(id);
        log::debug!("created body {id:?} kind={:?}", def.kind);
        Ok(id)
    }

    pub fn destroy_body(&mut self, id: BodyId) -> Result<()> {
        self.check_unlocked()?;
        if self.bodies.get(id).is_none() {
            return Err(PhysicsError::InvalidArgument("unknown body".into()));
        }

        // Joints first: their destruction cascades to any gear joint that
        // referenced them (see `destroy_joint_internal`).
        let mut joints_to_destroy = Vec::new();
        let mut edge = self.bodies.get(id).and_then(|b| b.joint_edge_head);
        while let Some(edge_id) = edge {
            let Some(je) = self.joint_edges.get(edge_id).copied() else { break };
            edge = je.next;
            joints_to_destroy.push(je.joint);
        }
        for jid in joints_to_destroy {
            self.destroy_joint_internal(jid);
        }

        let mut contacts_to_destroy = Vec::new();
        let mut cedge = self.bodies.get(id).and_then(|b| b.contact_edge_head);
        while let Some(edge_id) = cedge {
            let Some(ce) = self.contact_manager.contact_edges.get(edge_id).copied() else { break };
            cedge = ce.next;
            contacts_to_destroy.push(ce.contact);
        }
        for cid in contacts_to_destroy {
            self.fire_end_contact_and_destroy(cid);
        }

        let fixture_ids: Vec<FixtureId> = self.bodies.get(id).map(|b| b.fixtures.clone()).unwrap_or_default();
        for fid in fixture_ids {
            if let Some(f) = self.fixtures.get_mut(fid) {
                self.contact_manager.destroy_proxy(f);
            }
            self.fixtures.remove(fid);
        }

        self.bodies.remove(id);
        self.body_order.retain(|&b| b != id);
        log::debug!("destroyed body {id:?}");
        Ok(())
    }

    pub fn create_fixture(&mut self, body_id: BodyId, shape: Shape, def: FixtureDef) -> Result<FixtureId> {
        self.check_unlocked()?;
        if def.density < 0.0 {
            return Err(PhysicsError::InvalidArgument("fixture density must be >= 0".into()));
        }
        if self.bodies.get(body_id).is_none() {
            return Err(PhysicsError::InvalidArgument("unknown body".into()));
        }

        let id = self.fixtures.insert(Fixture::new(EntityId::default(), body_id, shape, &def));
        {
            let fixture = self.fixtures.get_mut(id).expect("just inserted");
            fixture.id = id;
        }
        {
            let fixture = self.fixtures.get_mut(id).expect("just inserted");
            let body = self.bodies.get(body_id).expect("checked above");
            self.contact_manager.create_proxy(fixture, body);
        }
        self.bodies.get_mut(body_id).expect("checked above").fixtures.push(id);
        self.reset_mass_data(body_id);
        Ok(id)
    }

    pub fn destroy_fixture(&mut self, id: FixtureId) -> Result<()> {
        self.check_unlocked()?;
        let Some(body_id) = self.fixtures.get(id).map(|f| f.body) else {
            return Err(PhysicsError::InvalidArgument("unknown fixture".into()));
        };

        for cid in self.contact_manager.contacts_for_fixture(id) {
            self.fire_end_contact_and_destroy(cid);
        }

        if let Some(f) = self.fixtures.get_mut(id) {
            self.contact_manager.destroy_proxy(f);
        }
        self.fixtures.remove(id);
        if let Some(b) = self.bodies.get_mut(body_id) {
            b.fixtures.retain(|&f| f != id);
        }
        self.reset_mass_data(body_id);
        Ok(())
    }

    fn reset_mass_data(&mut self, body_id: BodyId) {
        let Some(body) = self.bodies.get(body_id) else { return };
        let contributions: Vec<MassData> = body
            .fixtures
            .iter()
            .filter_map(|&fid| self.fixtures.get(fid))
            .map(|f| f.shape.mass_data(f.density))
            .collect();
        if let Some(body) = self.bodies.get_mut(body_id) {
            body.reset_mass_data(&contributions);
        }
    }

    pub fn create_joint(&mut self, def: JointDef) -> Result<JointId> {
        self.check_unlocked()?;
        if def.body_a == def.body_b {
            return Err(PhysicsError::InvalidArgument("joint cannot connect a body to itself".into()));
        }
        if self.bodies.get(def.body_a).is_none() || self.bodies.get(def.body_b).is_none() {
            return Err(PhysicsError::InvalidArgument("unknown body".into()));
        }
        if let JointKind::Gear(g) = &def.kind {
            if self.joints.get(g.joint1).is_none() || self.joints.get(g.joint2).is_none() {
                return Err(PhysicsError::InvalidArgument("gear joint referent does not exist".into()));
            }
        }

        let joint_id = self.joints.insert(Joint::new(
            EntityId::default(),
            def.body_a,
            def.body_b,
            def.collide_connected,
            def.kind,
            EntityId::default(),
            EntityId::default(),
        ));

        let head_a = self.bodies.get(def.body_a).and_then(|b| b.joint_edge_head);
        let head_b = self.bodies.get(def.body_b).and_then(|b| b.joint_edge_head);
        let edge_a = self.joint_edges.insert(JointEdge { other: def.body_b, joint: joint_id, prev: None, next: head_a });
        let edge_b = self.joint_edges.insert(JointEdge { other: def.body_a, joint: joint_id, prev: None, next: head_b });
        if let Some(next_id) = head_a {
            if let Some(n) = self.joint_edges.get_mut(next_id) {
                n.prev = Some(edge_a);
            }
        }
        if let Some(next_id) = head_b {
            if let Some(n) = self.joint_edges.get_mut(next_id) {
                n.prev = Some(edge_b);
            }
        }
        if let Some(b) = self.bodies.get_mut(def.body_a) {
            b.joint_edge_head = Some(edge_a);
            b.wake();
        }
        if let Some(b) = self.bodies.get_mut(def.body_b) {
            b.joint_edge_head = Some(edge_b);
            b.wake();
        }
        if let Some(j) = self.joints.get_mut(joint_id) {
            j.id = joint_id;
            j.edge_a = edge_a;
            j.edge_b = edge_b;
        }

        if !def.collide_connected {
            let pair_contacts: Vec<ContactId> = self
                .contact_manager
                .contacts
                .ids()
                .filter(|&cid| {
                    self.contact_manager
                        .contacts
                        .get(cid)
                        .map(|c| (c.body_a == def.body_a && c.body_b == def.body_b) || (c.body_a == def.body_b && c.body_b == def.body_a))
                        .unwrap_or(false)
                })
                .collect();
            for cid in pair_contacts {
                self.fire_end_contact_and_destroy(cid);
            }
        }

        log::debug!("created joint {joint_id:?}");
        Ok(joint_id)
    }

    pub fn destroy_joint(&mut self, id: JointId) -> Result<()> {
        self.check_unlocked()?;
        if self.joints.get(id).is_none() {
            return Err(PhysicsError::InvalidArgument("unknown joint".into()));
        }
        self.destroy_joint_internal(id);
        Ok(())
    }

    /// Unlinks and frees a joint. Any gear joint whose `joint1`/`joint2`
    /// named this one is auto-destroyed in turn rather than left dangling.
    fn destroy_joint_internal(&mut self, id: JointId) {
        let Some(joint) = self.joints.get(id).cloned() else { return };

        let dependents: Vec<JointId> = self
            .joints
            .ids()
            .filter(|&gid| gid != id)
            .filter(|&gid| matches!(self.joints.get(gid).map(|j| &j.kind), Some(JointKind::Gear(g)) if g.joint1 == id || g.joint2 == id))
            .collect();
        for gid in dependents {
            log::warn!("auto-destroying gear joint {gid:?}: its referent joint {id:?} was destroyed");
            self.destroy_joint_internal(gid);
        }

        self.unlink_joint_edge(joint.body_a, joint.edge_a);
        self.unlink_joint_edge(joint.body_b, joint.edge_b);
        self.joint_edges.remove(joint.edge_a);
        self.joint_edges.remove(joint.edge_b);
        self.joints.remove(id);

        if let Some(l) = self.joint_listener.as_deref_mut() {
            l.joint_destroyed(&joint);
        }
    }

    fn unlink_joint_edge(&mut self, owner: BodyId, edge_id: JointEdgeId) {
        let Some(edge) = self.joint_edges.get(edge_id).copied() else { return };
        match edge.prev {
            Some(prev_id) => {
                if let Some(prev) = self.joint_edges.get_mut(prev_id) {
                    prev.next = edge.next;
                }
            }
            None => {
                if let Some(b) = self.bodies.get_mut(owner) {
                    b.joint_edge_head = edge.next;
                }
            }
        }
        if let Some(next_id) = edge.next {
            if let Some(next) = self.joint_edges.get_mut(next_id) {
                next.prev = edge.prev;
            }
        }
    }

    fn fire_end_contact_and_destroy(&mut self, cid: ContactId) {
        if let Some(contact) = self.contact_manager.contacts.get(cid) {
            if contact.touching {
                if let Some(l) = self.listener.as_deref_mut() {
                    l.end_contact(contact);
                }
            }
        }
        self.contact_manager.destroy(cid, &mut self.bodies);
    }

    // ---- world-level accessors -------------------------------------------

    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    pub fn set_allow_sleep(&mut self, allow: bool) {
        self.allow_sleep = allow;
    }

    pub fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listener = Some(listener);
    }

    pub fn clear_contact_listener(&mut self) {
        self.listener = None;
    }

    pub fn set_contact_filter(&mut self, filter: Box<dyn ContactFilter>) {
        self.filter = Some(filter);
    }

    pub fn clear_contact_filter(&mut self) {
        self.filter = None;
    }

    pub fn set_joint_listener(&mut self, listener: Box<dyn JointListener>) {
        self.joint_listener = Some(listener);
    }

    pub fn clear_joint_listener(&mut self) {
        self.joint_listener = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn last_degeneracy_count(&self) -> u64 {
        self.last_degeneracy
    }

    pub fn profiler(&self) -> &PhysicsProfiler {
        &self.profiler
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    pub fn fixture(&self, id: FixtureId) -> Option<&Fixture> {
        self.fixtures.get(id)
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.ids()
    }

    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.iter()
    }

    pub fn contact_count(&self) -> usize {
        self.contact_manager.contacts.len()
    }

    pub fn clear_forces(&mut self) {
        for body in self.bodies.iter_mut() {
            body.clear_forces();
        }
    }

    pub fn query_aabb(&self, aabb: Aabb, callback: &mut dyn QueryCallback) {
        queries::query_aabb(&self.contact_manager.broad_phase, aabb, callback);
    }

    pub fn ray_cast(&self, p1: Vec2, p2: Vec2, callback: &mut dyn RayCastCallback) {
        queries::ray_cast(&self.contact_manager.broad_phase, &self.fixtures, &self.bodies, RayCastInput { p1, p2 }, callback);
    }

    // ---- simulation --------------------------------------------------------

    /// Advances the world by one discrete step: contact update, per-island
    /// velocity/position solve and sleep evaluation, then the TOI
    /// sub-stepping phase. Does not clear forces; call
    /// [`World::clear_forces`] explicitly once per step as the caller sees
    /// fit.
    pub fn step(&mut self, dt: f32, velocity_iterations: u32, position_iterations: u32) {
        if self.locked {
            log::error!("World::step called re-entrantly; ignored");
            return;
        }
        if dt <= 0.0 {
            return;
        }

        self.locked = true;
        self.profiler.reset();
        let frame_start = std::time::Instant::now();

        {
            let _t = ScopedTimer::new("contact_manager.find_new_contacts");
            self.contact_manager
                .find_new_contacts(&mut self.bodies, &self.fixtures, &self.joints, &self.joint_edges, self.filter.as_deref());
        }
        {
            let _t = ScopedTimer::new("contact_manager.collide");
            self.contact_manager.collide(
                &mut self.bodies,
                &self.fixtures,
                &self.joints,
                &self.joint_edges,
                self.filter.as_deref(),
                self.listener.as_deref_mut(),
            );
        }

        self.profiler.body_count = self.bodies.len();
        self.profiler.contact_count = self.contact_manager.contacts.len();

        let islands = {
            let _t = ScopedTimer::new("build_islands");
            build_islands(&mut self.bodies, &self.fixtures, &self.contact_manager, &self.joints, &self.joint_edges, &self.body_order)
        };
        self.profiler.active_island_count = islands.len();

        let mut reports: Vec<(ContactId, ContactImpulse)> = Vec::new();
        let mut moved_fixtures: HashSet<FixtureId> = HashSet::new();
        let mut sweeps: HashMap<BodyId, Sweep> = HashMap::new();

        {
            let _t = ScopedTimer::new("solve_islands");
            for island in &islands {
                self.solve_island(island, dt, velocity_iterations, position_iterations, &mut reports, &mut sweeps);
                for &bid in &island.bodies {
                    if let Some(body) = self.bodies.get(bid) {
                        moved_fixtures.extend(body.fixtures.iter().copied());
                    }
                }
            }
        }

        {
            let _t = ScopedTimer::new("synchronize_proxies");
            let moved_ids: Vec<FixtureId> = moved_fixtures.into_iter().collect();
            let aabbs = compute_fixture_aabbs(&moved_ids, &self.fixtures, &self.bodies);
            for (fid, aabb) in aabbs {
                let Some(fixture) = self.fixtures.get(fid) else { continue };
                let Some(proxy) = fixture.proxy_id else { continue };
                let displacement = sweeps.get(&fixture.body).map(|s| s.c - s.c0).unwrap_or(Vec2::ZERO);
                self.contact_manager.broad_phase.move_proxy(proxy, aabb, displacement);
            }
        }

        {
            let _t = ScopedTimer::new("solve_toi");
            let toi_reports = self.solve_toi(&mut sweeps);
            reports.extend(toi_reports);
        }

        self.locked = false;

        for (cid, impulse) in &reports {
            if let Some(contact) = self.contact_manager.contacts.get(*cid) {
                if let Some(l) = self.listener.as_deref_mut() {
                    l.post_solve(contact, impulse);
                }
            }
        }

        self.profiler.total_frame_time = frame_start.elapsed();
        self.profiler.report();
        // A step is meant to keep up with its own timestep in a real-time
        // caller's loop; flag it if the solve itself took longer than that.
        warn_if_frame_budget_exceeded(self.profiler.total_frame_time, dt * 1000.0);
    }

    fn solve_island(
        &mut self,
        island: &Island,
        dt: f32,
        velocity_iterations: u32,
        position_iterations: u32,
        reports: &mut Vec<(ContactId, ContactImpulse)>,
        sweeps: &mut HashMap<BodyId, Sweep>,
    ) {
        for &bid in &island.bodies {
            if let Some(body) = self.bodies.get_mut(bid) {
                integrate_velocity(body, self.gravity, dt);
            }
        }

        let mut joint_constraints = build_joint_constraints(&island.joints, &self.joints, &mut self.bodies, dt);
        let mut velocity_constraints = build_velocity_constraints(island, &self.bodies, &self.fixtures, &self.contact_manager);
        warm_start(&velocity_constraints, &mut self.bodies);

        for _ in 0..velocity_iterations {
            solve_joint_velocity_constraints(&mut joint_constraints, &mut self.joints, &mut self.bodies, dt);
            solve_velocity_constraints(&mut velocity_constraints, &mut self.bodies);
        }

        for &bid in &island.bodies {
            if let Some(body) = self.bodies.get(bid) {
                sweeps.insert(
                    bid,
                    Sweep {
                        local_center: body.local_center,
                        c0: body.world_center(),
                        a0: body.transform.rotation.angle(),
                        c: body.world_center(),
                        a: body.transform.rotation.angle(),
                    },
                );
            }
        }

        for &bid in &island.bodies {
            if let Some(body) = self.bodies.get_mut(bid) {
                integrate_position(body, dt);
            }
        }

        let position_constraints = build_position_constraints(island, &self.fixtures, &self.contact_manager);
        for _ in 0..position_iterations {
            let joint_error = solve_joint_position_constraints(&island.joints, &self.joints, &mut self.bodies);
            let contact_error = solve_position_constraints(&position_constraints, &mut self.bodies);
            if joint_error <= LINEAR_SLOP && contact_error >= -3.0 * LINEAR_SLOP {
                break;
            }
        }

        for &bid in &island.bodies {
            if let Some(body) = self.bodies.get(bid) {
                if let Some(sweep) = sweeps.get_mut(&bid) {
                    sweep.c = body.world_center();
                    sweep.a = body.transform.rotation.angle();
                }
            }
        }

        update_sleep(island, &mut self.bodies, dt, self.allow_sleep);

        reports.extend(store_impulses(&velocity_constraints, &mut self.contact_manager));
    }

    /// Repeatedly finds the contact with the smallest global time of
    /// impact among TOI-eligible pairs, advances its two bodies to that
    /// time, and resolves a small mini-island around them, until no
    /// eligible contact reports `alpha < 1` or the sub-step cap is hit.
    fn solve_toi(&mut self, sweeps: &mut HashMap<BodyId, Sweep>) -> Vec<(ContactId, ContactImpulse)> {
        for &bid in &self.body_order {
            if let Some(b) = self.bodies.get_mut(bid) {
                b.flags.toi_processed = false;
            }
        }

        let mut reports = Vec::new();

        for _ in 0..MAX_SUB_STEPS {
            let Some((contact_id, alpha)) = self.find_min_toi(sweeps) else { break };
            if alpha >= 1.0 {
                break;
            }

            let Some(contact) = self.contact_manager.contacts.get(contact_id) else { continue };
            let (anchor_a, anchor_b) = (contact.body_a, contact.body_b);

            for bid in [anchor_a, anchor_b] {
                let Some(sweep) = sweeps.get(&bid).copied() else { continue };
                if let Some(body) = self.bodies.get_mut(bid) {
                    if body.is_dynamic() {
                        body.transform = sweep.transform_at(alpha);
                    }
                }
            }

            let island_reports = self.solve_toi_island(anchor_a, anchor_b);
            reports.extend(island_reports);

            // Remaining sweep for the two advanced bodies now runs from
            // their just-corrected pose to the original step-end pose.
            for bid in [anchor_a, anchor_b] {
                if let Some(body) = self.bodies.get(bid) {
                    if let Some(sweep) = sweeps.get_mut(&bid) {
                        sweep.c0 = body.world_center();
                        sweep.a0 = body.transform.rotation.angle();
                    }
                }
            }
        }

        reports
    }

    fn find_min_toi(&mut self, sweeps: &HashMap<BodyId, Sweep>) -> Option<(ContactId, f32)> {
        let mut min_alpha = 1.0f32;
        let mut min_contact = None;

        let contact_ids: Vec<ContactId> = self.contact_manager.contacts.ids().collect();
        for cid in contact_ids {
            let Some(contact) = self.contact_manager.contacts.get(cid) else { continue };
            if !contact.enabled || !contact.touching || contact.is_sensor(&self.fixtures) {
                continue;
            }
            let (Some(body_a), Some(body_b)) = (self.bodies.get(contact.body_a), self.bodies.get(contact.body_b)) else { continue };
            if !body_a.flags.enabled || !body_b.flags.enabled {
                continue;
            }
            if !body_a.flags.awake && !body_b.flags.awake {
                continue;
            }
            if body_a.flags.toi_processed && body_b.flags.toi_processed {
                continue;
            }
            if !toi_eligible(body_a, body_b) {
                continue;
            }

            let (Some(fa), Some(fb)) = (self.fixtures.get(contact.fixture_a), self.fixtures.get(contact.fixture_b)) else { continue };
            let sweep_a = sweeps.get(&contact.body_a).copied().unwrap_or_else(|| rest_sweep(body_a));
            let sweep_b = sweeps.get(&contact.body_b).copied().unwrap_or_else(|| rest_sweep(body_b));

            let output = toi(&ToiInput {
                proxy_a: DistanceProxy::from_shape(&fa.shape),
                sweep_a,
                proxy_b: DistanceProxy::from_shape(&fb.shape),
                sweep_b,
                t_max: 1.0,
            });

            let alpha = match output.state {
                ToiState::Touching => output.t,
                ToiState::Overlapped => 0.0,
                ToiState::Separated => 1.0,
                ToiState::Failed | ToiState::Unknown => {
                    self.last_degeneracy += 1;
                    log::warn!("TOI query degenerate for contact {cid:?}; treating as separated this step");
                    1.0
                }
            };

            if alpha < min_alpha {
                min_alpha = alpha;
                min_contact = Some(cid);
            }
        }

        min_contact.map(|cid| (cid, min_alpha))
    }

    /// Builds a mini-island by BFS from `anchor_a`/`anchor_b` across
    /// touching contacts, position-corrects it (only the two anchors
    /// actually move) and runs one velocity solve so their post-correction
    /// velocities stay consistent with touching neighbors.
    fn solve_toi_island(&mut self, anchor_a: BodyId, anchor_b: BodyId) -> Vec<(ContactId, ContactImpulse)> {
        let mut island_bodies = vec![anchor_a, anchor_b];
        let mut island_contacts = Vec::new();
        let mut seen_bodies: HashSet<BodyId> = [anchor_a, anchor_b].into_iter().collect();
        let mut seen_contacts: HashSet<ContactId> = HashSet::new();
        let mut queue: VecDeque<BodyId> = [anchor_a, anchor_b].into_iter().collect();

        while let Some(bid) = queue.pop_front() {
            if island_bodies.len() >= MAX_TOI_ISLAND_BODIES {
                log::warn!("TOI island body cap reached at {bid:?}; remaining neighbors dropped this sub-step");
                break;
            }
            let mut edge = self.bodies.get(bid).and_then(|b| b.contact_edge_head);
            while let Some(edge_id) = edge {
                let Some(ce) = self.contact_manager.contact_edges.get(edge_id).copied() else { break };
                edge = ce.next;
                if seen_contacts.contains(&ce.contact) {
                    continue;
                }
                let Some(contact) = self.contact_manager.contacts.get(ce.contact) else { continue };
                if !contact.touching || !contact.enabled || contact.is_sensor(&self.fixtures) {
                    continue;
                }
                seen_contacts.insert(ce.contact);
                island_contacts.push(ce.contact);

                if !seen_bodies.contains(&ce.other) {
                    if let Some(other) = self.bodies.get(ce.other) {
                        if !other.is_static() {
                            seen_bodies.insert(ce.other);
                            island_bodies.push(ce.other);
                            queue.push_back(ce.other);
                        }
                    }
                }
            }
        }

        for &bid in &island_bodies {
            if let Some(b) = self.bodies.get_mut(bid) {
                b.flags.toi_processed = true;
            }
        }

        let toi_island = Island { bodies: island_bodies, contacts: island_contacts.clone(), joints: Vec::new() };
        let position_constraints = build_position_constraints(&toi_island, &self.fixtures, &self.contact_manager);

        for _ in 0..TOI_POSITION_ITERATIONS {
            let mut min_separation = 0.0f32;
            for (pc, &cid) in position_constraints.iter().zip(island_contacts.iter()) {
                let Some(contact) = self.contact_manager.contacts.get(cid) else { continue };
                let movable_a = contact.body_a == anchor_a || contact.body_a == anchor_b;
                let movable_b = contact.body_b == anchor_a || contact.body_b == anchor_b;
                min_separation = min_separation.min(solve_toi_position_constraint(pc, &mut self.bodies, movable_a, movable_b));
            }
            if min_separation >= -1.5 * LINEAR_SLOP {
                break;
            }
        }

        let mut velocity_constraints = build_velocity_constraints(&toi_island, &self.bodies, &self.fixtures, &self.contact_manager);
        warm_start(&velocity_constraints, &mut self.bodies);
        solve_velocity_constraints(&mut velocity_constraints, &mut self.bodies);
        store_impulses(&velocity_constraints, &mut self.contact_manager)
    }
}

fn rest_sweep(body: &Body) -> Sweep {
    Sweep {
        local_center: body.local_center,
        c0: body.world_center(),
        a0: body.transform.rotation.angle(),
        c: body.world_center(),
        a: body.transform.rotation.angle(),
    }
}

/// TOI eligibility, taken literally: dynamic-vs-static is always a
/// candidate, dynamic-bullet-vs-any-dynamic is always a candidate, every
/// other pairing (including anything involving a kinematic body) never is.
fn toi_eligible(a: &Body, b: &Body) -> bool {
    let static_dynamic = (a.is_static() && b.is_dynamic()) || (b.is_static() && a.is_dynamic());
    let bullet_dynamic = (a.flags.bullet && b.is_dynamic()) || (b.flags.bullet && a.is_dynamic());
    static_dynamic || bullet_dynamic
}
