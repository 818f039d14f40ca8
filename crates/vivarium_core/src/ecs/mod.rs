//! # Entity Component System
//!
//! Sparse-set ECS with struct-of-arrays component stores.
//!
//! ## Design Philosophy
//!
//! - Entity IDs are bare `u32` indices recycled LIFO, no generation counter
//! - Every store maps entities to dense slots through a [`SparseIndex`]
//! - Hot components keep one flat `Vec` per field
//! - Removal is swap-remove, so iteration order is not stable

mod entity;
mod sparse_set;
pub mod stores;
mod world;

pub use entity::{EntityAllocator, EntityId};
pub use sparse_set::{Slot, SparseIndex, SparseSet, ABSENT};
pub use world::{ComponentsMut, World};
