//! Entity data model: bodies, fixtures, joints, and the shared math types
//! they're built from.

pub mod body;
pub mod fixture;
pub mod joint;
pub mod shapes;
pub mod types;

pub use body::{Body, BodyDef, BodyFlags, BodyId, BodyKind, ContactEdge, ContactId, JointEdge, JointId};
pub use fixture::{Filter, Fixture, FixtureDef, FixtureId};
pub use joint::{Joint, JointDef, JointKind, JointListener};
pub use shapes::{Aabb, Polygon, Shape};
pub use types::{MassData, Rot2, Transform, Velocity};
