//! impulse2d – a 2D rigid-body physics engine.
//!
//! Box2D-family architecture: bodies/fixtures/joints live in generational
//! arenas, a dynamic AABB tree broad phase feeds a persistent contact
//! graph, islands are solved with sequential impulses, and a
//! conservative-advancement TOI pass sweeps for tunneling after the
//! discrete solve.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::Vec2;

pub use collision::broadphase::{BroadPhase, ProxyId};
pub use collision::contact::{Contact, ContactFilter, ContactImpulse, ContactListener};
pub use collision::manifold::{Manifold, ManifoldPoint};
pub use collision::narrowphase::collide;
pub use collision::queries::{QueryCallback, RayCastCallback, RayCastInput};
pub use config::WorldConfig;
pub use core::{
    Aabb, Body, BodyDef, BodyFlags, BodyId, BodyKind, Filter, Fixture, FixtureDef, FixtureId, Joint, JointDef, JointId, JointKind,
    JointListener, MassData, Polygon, Rot2, Shape, Transform, Velocity,
};
pub use error::{PhysicsError, Result};
pub use utils::allocator::{Arena, EntityId, GenerationalId};
pub use world::World;
