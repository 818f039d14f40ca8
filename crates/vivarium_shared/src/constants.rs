//! # Simulation Timing Constants
//!
//! Defaults for the fixed-timestep clock. The simulation context can override
//! all of them from configuration; these are the values used when it doesn't.

// =============================================================================
// FIXED-STEP CLOCK
// =============================================================================

/// Solver tick rate (sub-steps per simulated second).
pub const STEP_HZ: u32 = 60;

/// Duration of one solver sub-step in seconds.
pub const STEP_SIZE: f64 = 1.0 / STEP_HZ as f64;

/// Maximum solver sub-steps per rendered frame.
///
/// Remaining accumulated time is discarded once this cap is reached.
pub const MAX_STEPS: u32 = 5;

/// Ceiling applied to a single frame delta, in seconds.
pub const MAX_FRAME_TIME: f64 = 0.1;

// =============================================================================
// NUMERIC GUARDS
// =============================================================================

/// Smallest dimension handed to the solver for strictly-positive sizes.
pub const MIN_DIMENSION: f32 = 1.0e-4;

/// Default gravity (metres per second squared, -Y up).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];
