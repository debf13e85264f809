//! Simulation dynamics modules: integration, islands, and the contact and
//! joint constraint solvers.

pub mod friction;
pub mod integrator;
pub mod island;
pub mod joint_solver;
pub mod parallel;
pub mod solver;

pub use friction::clamp_tangent_impulse;
pub use integrator::{integrate_position, integrate_velocity};
pub use island::{build_islands, update_sleep, Island};
pub use joint_solver::{build_and_warm_start as build_joint_constraints, solve_position as solve_joint_position_constraints, solve_velocity as solve_joint_velocity_constraints, JointConstraint};
pub use parallel::compute_fixture_aabbs;
pub use solver::{
    build_position_constraints, build_velocity_constraints, solve_position_constraints, solve_toi_position_constraint, solve_velocity_constraints, store_impulses, warm_start,
    ContactPositionConstraint, ContactVelocityConstraint,
};
