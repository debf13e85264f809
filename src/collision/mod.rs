//! Collision detection: broad-phase, narrow-phase, contact manifolds,
//! persistent contacts, spatial queries, and continuous collision (TOI).

pub mod broadphase;
pub mod ccd;
pub mod contact;
pub mod manifold;
pub mod narrowphase;
pub mod queries;

pub use broadphase::{BroadPhase, ProxyId};
pub use ccd::{toi, ToiInput, ToiOutput, ToiState};
pub use contact::{Contact, ContactFilter, ContactImpulse, ContactListener, ContactManager};
pub use manifold::{ContactFeature, FeatureType, Manifold, ManifoldPoint, ManifoldType};
pub use queries::{QueryCallback, RayCastCallback, RayCastInput};
