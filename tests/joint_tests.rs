use std::sync::{Arc, Mutex};

use glam::Vec2;
use impulse2d::core::joint::{DistanceJoint, Joint, JointListener, RevoluteJoint, RopeJoint, WeldJoint};
use impulse2d::core::shapes::Shape;
use impulse2d::{BodyDef, BodyKind, FixtureDef, JointDef, JointKind, Transform, World, WorldConfig};

fn at(position: Vec2) -> Transform {
    Transform { position, ..Default::default() }
}

fn make_world() -> World {
    World::new(WorldConfig { gravity: Vec2::ZERO, ..Default::default() })
}

fn add_dynamic_circle(world: &mut World, position: Vec2) -> impulse2d::BodyId {
    let body = world.create_body(BodyDef { kind: BodyKind::Dynamic, transform: at(position), ..Default::default() }).unwrap();
    world.create_fixture(body, Shape::Circle { center: Vec2::ZERO, radius: 0.3 }, FixtureDef { density: 1.0, ..Default::default() }).unwrap();
    body
}

#[test]
fn revolute_motor_spins_wheel_up_to_target_speed() {
    let mut world = make_world();
    let dt = 1.0 / 60.0;

    let base = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let wheel = add_dynamic_circle(&mut world, Vec2::ZERO);

    let mut revolute = RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0);
    revolute.enable_motor = true;
    revolute.motor_speed = 10.0;
    revolute.max_motor_torque = 5.0;
    world.create_joint(JointDef::new(base, wheel, JointKind::Revolute(revolute))).unwrap();

    for _ in 0..180 {
        world.step(dt, 8, 3);
    }

    let speed = world.body(wheel).unwrap().velocity.angular;
    assert!(speed > 0.0 && speed <= 10.5, "motor should spin up toward its target speed, got {speed}");
}

#[test]
fn revolute_limit_keeps_angle_within_bounds() {
    let mut world = make_world();
    let dt = 1.0 / 60.0;

    let base = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let arm = add_dynamic_circle(&mut world, Vec2::ZERO);

    let mut revolute = RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0);
    revolute.enable_limit = true;
    revolute.lower_angle = -0.5;
    revolute.upper_angle = 0.5;
    world.create_joint(JointDef::new(base, arm, JointKind::Revolute(revolute))).unwrap();

    world.body_mut(arm).unwrap().velocity.angular = 5.0;
    for _ in 0..60 {
        world.step(dt, 8, 3);
    }

    let angle = world.body(arm).unwrap().transform.rotation.angle();
    assert!(angle <= 0.6, "angle {angle} exceeded the upper limit of 0.5 by more than slop allows");
}

#[test]
fn weld_joint_holds_bodies_rigidly_together() {
    let mut world = make_world();
    let dt = 1.0 / 60.0;

    let base = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let link = add_dynamic_circle(&mut world, Vec2::new(1.0, 0.0));

    let weld = WeldJoint::new(Vec2::new(1.0, 0.0), Vec2::ZERO, 0.0);
    world.create_joint(JointDef::new(base, link, JointKind::Weld(weld))).unwrap();

    world.body_mut(link).unwrap().velocity.linear = Vec2::new(10.0, 10.0);
    world.body_mut(link).unwrap().velocity.angular = 5.0;

    for _ in 0..60 {
        world.step(dt, 8, 3);
    }

    let pos = world.body(link).unwrap().world_center();
    assert!((pos - Vec2::new(1.0, 0.0)).length() < 0.1, "weld joint should hold the link near its anchor, pos = {pos:?}");
}

#[test]
fn distance_joint_maintains_rest_length() {
    let mut world = World::new(WorldConfig::default());
    let dt = 1.0 / 60.0;

    let anchor = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let bob = add_dynamic_circle(&mut world, Vec2::new(3.0, 0.0));

    let distance = DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 3.0);
    world.create_joint(JointDef::new(anchor, bob, JointKind::Distance(distance))).unwrap();

    for _ in 0..240 {
        world.step(dt, 8, 3);
    }

    let dist = world.body(bob).unwrap().world_center().length();
    assert!((dist - 3.0).abs() < 0.2, "distance joint should hold bob at its rest length under gravity, dist = {dist}");
}

#[test]
fn rope_joint_caps_distance_but_allows_slack() {
    let mut world = make_world();
    let dt = 1.0 / 60.0;

    let anchor = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let bob = add_dynamic_circle(&mut world, Vec2::new(0.5, 0.0));

    let rope = RopeJoint::new(Vec2::ZERO, Vec2::ZERO, 2.0);
    world.create_joint(JointDef::new(anchor, bob, JointKind::Rope(rope))).unwrap();

    world.body_mut(bob).unwrap().velocity.linear = Vec2::new(50.0, 0.0);
    for _ in 0..60 {
        world.step(dt, 8, 3);
    }

    let dist = world.body(bob).unwrap().world_center().length();
    assert!(dist <= 2.2, "rope joint should cap the distance near max_length, dist = {dist}");
}

#[test]
fn destroying_a_joint_unlinks_it_from_both_bodies() {
    let mut world = make_world();
    let a = world.create_body(BodyDef { kind: BodyKind::Dynamic, ..Default::default() }).unwrap();
    let b = add_dynamic_circle(&mut world, Vec2::new(2.0, 0.0));

    let distance = DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 2.0);
    let joint_id = world.create_joint(JointDef::new(a, b, JointKind::Distance(distance))).unwrap();

    world.destroy_joint(joint_id).unwrap();
    assert!(world.joint(joint_id).is_none());

    // Bodies themselves must still destroy cleanly with no dangling edges.
    world.destroy_body(a).unwrap();
    world.destroy_body(b).unwrap();
}

#[test]
fn destroying_a_referent_joint_auto_destroys_its_gear_joint() {
    use impulse2d::core::joint::GearJoint;

    let mut world = make_world();
    let base = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let wheel1 = add_dynamic_circle(&mut world, Vec2::ZERO);
    let wheel2 = add_dynamic_circle(&mut world, Vec2::new(2.0, 0.0));

    let j1 = world.create_joint(JointDef::new(base, wheel1, JointKind::Revolute(RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0)))).unwrap();
    let j2 = world
        .create_joint(JointDef::new(base, wheel2, JointKind::Revolute(RevoluteJoint::new(Vec2::new(2.0, 0.0), Vec2::ZERO, 0.0))))
        .unwrap();
    let gear = world.create_joint(JointDef::new(wheel1, wheel2, JointKind::Gear(GearJoint::new(j1, j2, 1.0, 0.0)))).unwrap();

    world.destroy_joint(j1).unwrap();

    assert!(world.joint(gear).is_none(), "gear joint should be auto-destroyed when its referent joint is destroyed");
}

#[test]
fn joined_bodies_with_collide_connected_false_never_contact() {
    let mut world = make_world();

    let a = add_dynamic_circle(&mut world, Vec2::ZERO);
    let b = add_dynamic_circle(&mut world, Vec2::new(0.2, 0.0));

    let distance = DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 0.2);
    let mut def = JointDef::new(a, b, JointKind::Distance(distance));
    def.collide_connected = false;
    world.create_joint(def).unwrap();

    for _ in 0..30 {
        world.step(1.0 / 60.0, 8, 3);
    }

    assert_eq!(world.contact_count(), 0, "bodies joined with collide_connected = false must never generate a contact");
}

struct RecordingJointListener {
    destroyed: Arc<Mutex<Vec<u64>>>,
}

impl JointListener for RecordingJointListener {
    fn joint_destroyed(&mut self, joint: &Joint) {
        self.destroyed.lock().unwrap().push(joint.id.index() as u64);
    }
}

#[test]
fn joint_listener_is_notified_on_explicit_destroy() {
    let mut world = make_world();
    let destroyed = Arc::new(Mutex::new(Vec::new()));
    world.set_joint_listener(Box::new(RecordingJointListener { destroyed: destroyed.clone() }));

    let a = world.create_body(BodyDef { kind: BodyKind::Dynamic, ..Default::default() }).unwrap();
    let b = add_dynamic_circle(&mut world, Vec2::new(2.0, 0.0));
    let joint_id = world.create_joint(JointDef::new(a, b, JointKind::Distance(DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 2.0)))).unwrap();

    world.destroy_joint(joint_id).unwrap();

    assert_eq!(destroyed.lock().unwrap().len(), 1, "listener should fire exactly once for an explicit destroy");
}

#[test]
fn joint_listener_is_notified_when_a_gear_joints_referent_is_destroyed() {
    use impulse2d::core::joint::GearJoint;

    let mut world = make_world();
    let destroyed = Arc::new(Mutex::new(Vec::new()));
    world.set_joint_listener(Box::new(RecordingJointListener { destroyed: destroyed.clone() }));

    let base = world.create_body(BodyDef { kind: BodyKind::Static, ..Default::default() }).unwrap();
    let wheel1 = add_dynamic_circle(&mut world, Vec2::ZERO);
    let wheel2 = add_dynamic_circle(&mut world, Vec2::new(2.0, 0.0));

    let j1 = world.create_joint(JointDef::new(base, wheel1, JointKind::Revolute(RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0)))).unwrap();
    let j2 = world
        .create_joint(JointDef::new(base, wheel2, JointKind::Revolute(RevoluteJoint::new(Vec2::new(2.0, 0.0), Vec2::ZERO, 0.0))))
        .unwrap();
    world.create_joint(JointDef::new(wheel1, wheel2, JointKind::Gear(GearJoint::new(j1, j2, 1.0, 0.0)))).unwrap();

    world.destroy_joint(j1).unwrap();

    // The referent joint and the gear joint it orphaned should both be reported.
    assert_eq!(destroyed.lock().unwrap().len(), 2, "listener should fire for both the destroyed joint and its orphaned gear joint");
}
