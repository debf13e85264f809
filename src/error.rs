//! Error kinds for the world's mutating operations.
//!
//! Matches section 7 of the design: synchronous failures are reported by
//! kind rather than by distinct exception types, and most kinds have a
//! well-defined local recovery rather than aborting the simulation.

use thiserror::Error;

/// Errors produced by `World` operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// A definition was nonsensical (negative density, a joint naming the
    /// same body twice, etc). Fails synchronously without mutating state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation was attempted while the world is locked (mid-`step`).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A numerically degenerate configuration was hit inside the solver
    /// (singular pulley ratio, zero-length distance joint, divergence).
    /// Recovered from locally; reported for diagnostics only.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A hard resource limit was hit (island body count, pool exhaustion).
    /// Fatal for the in-flight step: it is aborted cleanly at the last
    /// sub-step boundary, leaving world state consistent.
    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;
