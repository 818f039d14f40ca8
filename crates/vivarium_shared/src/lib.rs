//! # Vivarium Shared
//!
//! Common types used by the stores, the solver adapter and the simulation
//! context.
//!
//! ## Rule
//!
//! This crate must NEVER depend on a solver. Handles are opaque integers here;
//! only the solver that issued them knows what they mean.

#![deny(unsafe_code)]

pub mod constants;
pub mod handles;
pub mod math;
pub mod sanitize;

pub use constants::{MAX_FRAME_TIME, MAX_STEPS, MIN_DIMENSION, STEP_HZ, STEP_SIZE};
pub use handles::{BodyHandle, ColliderHandle, JointHandle};
pub use math::{Quat, Vec3};
pub use sanitize::{finite_or_zero, finite_quat, finite_vec3, positive_or_epsilon, positive_vec3};
