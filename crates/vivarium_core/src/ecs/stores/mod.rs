//! # Component Stores
//!
//! One struct-of-arrays store per hot component. Each store owns a
//! [`SparseIndex`](super::sparse_set::SparseIndex) and keeps one flat column
//! per field, index-aligned with the dense entity array.

mod agent;
mod integrity;
mod kinematic;
mod physics_props;
mod projectile;
mod rigid_body;
mod transform;

pub use agent::{Agent, AgentColumnsMut, AgentState, AgentStore};
pub use integrity::{Integrity, IntegrityStore};
pub use kinematic::{KinematicStore, KinematicTarget};
pub use physics_props::{PhysicsProps, PhysicsPropsStore};
pub use projectile::{Projectile, ProjectileStore};
pub use rigid_body::RigidBodyStore;
pub use transform::{Transform, TransformStore};

/// Opaque renderer-side handle. The simulation only stores and returns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);
