//! # Vivarium
//!
//! Real-time simulation substrate: sparse-set ECS storage driving a
//! fixed-timestep rigid-body solver (rapier3d by default).
//!
//! ## Crates
//!
//! - `vivarium_shared` - math, handles, timing constants, sanitizers
//! - `vivarium_core` - entities, sparse sets, SoA component stores
//! - `vivarium_physics` - solver seam, stepper, registry, events, grab, shapes
//! - `vivarium` - the [`Simulation`] context, frame systems, configuration
//!
//! ## Example
//!
//! ```rust
//! use vivarium::{Simulation, SimulationConfig};
//! use vivarium::physics::{BodyKind, BodyRequest, ShapeDesc};
//! use vivarium::shared::Vec3;
//!
//! let mut sim = Simulation::new(&SimulationConfig::default())?;
//! let crate_box = sim.create_entity();
//! sim.spawn_body(
//!     crate_box,
//!     &BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic)
//!         .with_material("wood")
//!         .at(Vec3::new(0.0, 5.0, 0.0)),
//! )?;
//!
//! for _ in 0..60 {
//!     sim.frame(16.7);
//! }
//! sim.for_each_render_pose(|entity, position, _rotation| {
//!     println!("{entity} at {position:?}");
//! });
//! # Ok::<(), vivarium::SimulationError>(())
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod simulation;
pub mod systems;

/// Re-export of the storage crate.
pub use vivarium_core as core;
/// Re-export of the physics crate.
pub use vivarium_physics as physics;
/// Re-export of the shared types crate.
pub use vivarium_shared as shared;

pub use config::{MaterialDef, PhysicsConfig, SimulationConfig, SteeringConfig};
pub use error::{ConfigError, SimulationError, SimulationResult};
pub use simulation::Simulation;
pub use systems::Impact;
