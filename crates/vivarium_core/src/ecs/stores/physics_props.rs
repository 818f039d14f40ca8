//! Surface and bulk material properties per entity.

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Material response of a simulated body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsProps {
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Bounciness in `[0, 1]`.
    pub restitution: f32,
    /// Mass per unit volume (kg/m³).
    pub density: f32,
}

impl Default for PhysicsProps {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.3,
            density: 1000.0,
        }
    }
}

/// SoA storage for [`PhysicsProps`].
#[derive(Debug, Default)]
pub struct PhysicsPropsStore {
    index: SparseIndex,
    friction: Vec<f32>,
    restitution: Vec<f32>,
    density: Vec<f32>,
}

impl PhysicsPropsStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: SparseIndex::with_capacity(capacity),
            friction: Vec::with_capacity(capacity),
            restitution: Vec::with_capacity(capacity),
            density: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites `entity`'s properties.
    pub fn insert(&mut self, entity: EntityId, props: PhysicsProps) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.friction[i] = props.friction;
                self.restitution[i] = props.restitution;
                self.density[i] = props.density;
            }
            Slot::Appended(_) => {
                self.friction.push(props.friction);
                self.restitution.push(props.restitution);
                self.density.push(props.density);
            }
        }
    }

    /// Returns `entity`'s properties.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<PhysicsProps> {
        let i = self.index.dense_index(entity)?;
        Some(PhysicsProps {
            friction: self.friction[i],
            restitution: self.restitution[i],
            density: self.density[i],
        })
    }

    /// Overwrites only the density. Returns `false` if absent.
    pub fn set_density(&mut self, entity: EntityId, density: f32) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.density[i] = density;
        true
    }

    /// Removes `entity`. Returns `false` if absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        self.friction.swap_remove(i);
        self.restitution.swap_remove(i);
        self.density.swap_remove(i);
        true
    }

    /// O(1) presence check.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains(entity)
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Dense entity array.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        self.index.entities()
    }

    /// Dense density column.
    #[inline]
    #[must_use]
    pub fn densities(&self) -> &[f32] {
        &self.density
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        self.friction.clear();
        self.restitution.clear();
        self.density.clear();
    }
}
