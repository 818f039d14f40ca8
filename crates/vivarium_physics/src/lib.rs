//! # Vivarium Physics
//!
//! Drives and wraps an external rigid-body solver. [`RapierSolver`] is the
//! production backend; [`ReferenceSolver`] is a small deterministic stand-in
//! for tests.
//!
//! ## Frame Order
//!
//! ```text
//! kinematic targets ─> stepper (0..N sub-steps, drain events each) ─> transform sync ─> flush
//! ```
//!
//! ## Rules
//!
//! 1. **Check before call** - Every solver call on a stored handle is preceded
//!    by an existence check; stale handles are routine, not exceptional
//! 2. **Sanitize before call** - Non-finite numbers never reach the solver
//! 3. **Defer delivery** - Collision events reach subscribers only after the
//!    whole stepping loop

#![deny(unsafe_code)]

pub mod bodies;
pub mod error;
pub mod events;
pub mod interaction;
pub mod materials;
pub mod rapier;
pub mod reference;
pub mod registry;
pub mod shapes;
pub mod solver;
pub mod stepper;

pub use bodies::{BodyRecord, BodyTable};
pub use error::{PhysicsError, PhysicsResult, SolverError};
pub use events::{CollisionBridge, CollisionEvent, CollisionListener};
pub use interaction::{GrabController, SpringTuning};
pub use materials::{Material, MaterialTable, DEFAULT_MATERIAL};
pub use rapier::RapierSolver;
pub use reference::ReferenceSolver;
pub use registry::HandleRegistry;
pub use shapes::{
    attach_collider, blueprint, create_body, resolve_mass, rescaled_mass, BodyBlueprint,
    BodyRequest, MassProperties, ShapeDesc, SpawnedBody,
};
pub use solver::{
    BodyDesc, BodyKind, ColliderDesc, ColliderShape, RawContactEvent, Solver, SpringJointDesc,
};
pub use stepper::{FrameStats, PhysicsStepper, StepStats};
