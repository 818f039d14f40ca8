//! # Vivarium Core
//!
//! Sparse-set entity storage for a fixed-timestep physics simulation.
//!
//! ## Architecture Rules
//!
//! 1. **Dense iteration** - Every store packs live data at the front
//! 2. **Struct-of-arrays** - Hot components split into per-field columns
//! 3. **No solver knowledge** - Bodies are referenced by opaque handles only
//!
//! ## Example
//!
//! ```rust
//! use vivarium_core::{Transform, World};
//! use vivarium_shared::Vec3;
//!
//! let mut world = World::new(1024);
//! let crate_box = world.create_entity();
//! world.transforms.insert(crate_box, Transform::from_position(Vec3::new(0.0, 2.0, 0.0)));
//! assert!(world.transforms.contains(crate_box));
//! ```

#![deny(unsafe_code)]

pub mod ecs;

pub use ecs::stores::{
    Agent, AgentColumnsMut, AgentState, AgentStore, Integrity, IntegrityStore, KinematicStore,
    KinematicTarget, PhysicsProps, PhysicsPropsStore, Projectile, ProjectileStore, RenderHandle,
    RigidBodyStore, Transform, TransformStore,
};
pub use ecs::{ComponentsMut, EntityAllocator, EntityId, SparseIndex, SparseSet, World};
