//! # Frame Systems
//!
//! Free functions over disjoint `World` stores, run by
//! [`crate::Simulation::frame`] in a fixed order:
//!
//! ```text
//! steering ─> kinematic push ─> [step] ─> transform sync ─> [flush] ─> damage ─> lifetimes
//! ```

pub mod damage;
pub mod projectiles;
pub mod steering;
pub mod sync;

pub use damage::{resolve_impacts, Impact};
pub use projectiles::expire_projectiles;
pub use steering::update_agents;
pub use sync::{push_kinematic_targets, sync_transforms};
