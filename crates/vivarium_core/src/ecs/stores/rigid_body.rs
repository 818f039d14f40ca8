//! Entity → solver body handle.
//!
//! An entry is valid only while the referenced handle exists in the live
//! solver world. After a solver reset every entry is stale and the store must
//! be cleared before the next step.

use vivarium_shared::BodyHandle;

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// SoA storage for solver body handles.
#[derive(Debug, Default)]
pub struct RigidBodyStore {
    index: SparseIndex,
    handles: Vec<BodyHandle>,
}

impl RigidBodyStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: SparseIndex::with_capacity(capacity),
            handles: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites `entity`'s body handle.
    pub fn insert(&mut self, entity: EntityId, handle: BodyHandle) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => self.handles[i] = handle,
            Slot::Appended(_) => self.handles.push(handle),
        }
    }

    /// Returns `entity`'s body handle.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<BodyHandle> {
        self.index.dense_index(entity).map(|i| self.handles[i])
    }

    /// Removes `entity`, returning the handle it held.
    pub fn remove(&mut self, entity: EntityId) -> Option<BodyHandle> {
        let i = self.index.swap_remove(entity)?;
        Some(self.handles.swap_remove(i))
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

    /// Dense handle column, index-aligned with [`RigidBodyStore::entities`].
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &[BodyHandle] {
        &self.handles
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_stay_aligned() {
        let mut store = RigidBodyStore::with_capacity(2);
        for i in 0..3 {
            store.insert(EntityId::from_raw(i), BodyHandle::from_raw(u64::from(i) + 100));
        }
        assert_eq!(store.remove(EntityId::from_raw(0)), Some(BodyHandle::from_raw(100)));
        for (e, h) in store.entities().iter().zip(store.handles()) {
            assert_eq!(h.to_raw(), u64::from(e.index()) + 100);
        }
    }
}
