//! Global configuration constants for the impulse2d engine.

/// Default gravity vector applied in the physics world (Y-up).
pub const DEFAULT_GRAVITY: [f32; 2] = [0.0, -9.81];

/// Default integration timestep (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;

/// Default velocity constraint iterations per step.
pub const DEFAULT_VELOCITY_ITERATIONS: u32 = 8;

/// Default position-correction iterations per step.
pub const DEFAULT_POSITION_ITERATIONS: u32 = 3;

/// Default damping applied to linear velocity.
pub const DEFAULT_LINEAR_DAMPING: f32 = 0.0;

/// Default damping applied to angular velocity.
pub const DEFAULT_ANGULAR_DAMPING: f32 = 0.0;

/// Fattening margin added to broad-phase AABBs so small motions don't
/// force a tree update every step.
pub const AABB_MARGIN: f32 = 0.1;

/// Multiplier applied to a body's displacement this step when predicting
/// how far to extend a fattened AABB, so fast bodies don't need a
/// re-insertion the very next step.
pub const AABB_PREDICTION_FACTOR: f32 = 4.0;

/// Linear slop: allowed penetration, kept to avoid jitter from the
/// position solver fighting floating point error.
pub const LINEAR_SLOP: f32 = 0.005;

/// Angular slop, radians.
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * std::f32::consts::PI;

/// Radius of the skin wrapped around polygon cores (Box2D-style "rounded"
/// polygons) used to keep the narrow-phase numerically well-conditioned.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Minimum approach velocity before restitution is applied at all; below
/// this, a contact is treated as resting and restitution is suppressed
/// to avoid jitter.
pub const VELOCITY_THRESHOLD: f32 = 1.0;

/// Maximum linear displacement allowed in a single step, to avoid
/// tunneling and numerical blow-up from a single huge impulse.
pub const MAX_TRANSLATION: f32 = 2.0;

/// Maximum angular displacement allowed in a single step.
pub const MAX_ROTATION: f32 = 0.5 * std::f32::consts::PI;

/// Baumgarte stabilization factor used by the discrete position solver.
pub const BAUMGARTE: f32 = 0.2;

/// Baumgarte factor used during TOI sub-stepping (stiffer, since TOI
/// islands only run a handful of iterations).
pub const TOI_BAUMGARTE: f32 = 0.75;

/// Maximum per-iteration position correction, to avoid large corrections
/// from deeply overlapping shapes causing an explosive response.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Below this linear speed (squared you compare against its square) a
/// body is a sleep candidate.
pub const LINEAR_SLEEP_TOLERANCE: f32 = 0.01;

/// Below this angular speed (radians/sec) a body is a sleep candidate.
pub const ANGULAR_SLEEP_TOLERANCE: f32 = 2.0 / 180.0 * std::f32::consts::PI;

/// Seconds an island must stay under the sleep tolerances before bodies
/// are actually put to sleep.
pub const TIME_TO_SLEEP: f32 = 0.5;

/// Maximum points in a single contact manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum vertices in a convex polygon shape.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Conservative-advancement root-find iteration cap per TOI query.
pub const MAX_TOI_ROOT_ITERS: u32 = 50;

/// Outer conservative-advancement iteration cap per TOI query.
pub const MAX_TOI_ITERS: u32 = 20;

/// Cap on the number of TOI sub-steps performed within one `World::step`.
pub const MAX_SUB_STEPS: u32 = 8;

/// Tunable knobs a `World` can be constructed with; defaults mirror the
/// constants above.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct WorldConfig {
    pub gravity: glam::Vec2,
    pub velocity_iterations: u32,
    pub position_iterations: u32,
    pub allow_sleep: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: glam::Vec2::from(DEFAULT_GRAVITY),
            velocity_iterations: DEFAULT_VELOCITY_ITERATIONS,
            position_iterations: DEFAULT_POSITION_ITERATIONS,
            allow_sleep: true,
        }
    }
}
