//! # Handle Registry
//!
//! Bidirectional map between solver body handles and entity IDs.
//! Populated on body creation, erased on removal and on full world reset.

use std::collections::HashMap;

use vivarium_core::EntityId;
use vivarium_shared::BodyHandle;

/// Solver handle ↔ entity ID map.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    by_handle: HashMap<BodyHandle, EntityId>,
    by_entity: HashMap<EntityId, BodyHandle>,
}

impl HandleRegistry {
    /// Creates a registry with room for `capacity` pairs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_handle: HashMap::with_capacity(capacity),
            by_entity: HashMap::with_capacity(capacity),
        }
    }

    /// Maps `handle` ↔ `entity`, dropping any previous pairing of either side.
    pub fn insert(&mut self, handle: BodyHandle, entity: EntityId) {
        if let Some(old_entity) = self.by_handle.insert(handle, entity) {
            self.by_entity.remove(&old_entity);
        }
        if let Some(old_handle) = self.by_entity.insert(entity, handle) {
            if old_handle != handle {
                self.by_handle.remove(&old_handle);
            }
        }
    }

    /// Entity owning `handle`.
    #[inline]
    #[must_use]
    pub fn entity(&self, handle: BodyHandle) -> Option<EntityId> {
        self.by_handle.get(&handle).copied()
    }

    /// Body handle of `entity`.
    #[inline]
    #[must_use]
    pub fn handle(&self, entity: EntityId) -> Option<BodyHandle> {
        self.by_entity.get(&entity).copied()
    }

    /// Erases the pair containing `handle`.
    pub fn remove_handle(&mut self, handle: BodyHandle) -> Option<EntityId> {
        let entity = self.by_handle.remove(&handle)?;
        self.by_entity.remove(&entity);
        Some(entity)
    }

    /// Erases the pair containing `entity`.
    pub fn remove_entity(&mut self, entity: EntityId) -> Option<BodyHandle> {
        let handle = self.by_entity.remove(&entity)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Forgets every pair.
    pub fn clear(&mut self) {
        self.by_handle.clear();
        self.by_entity.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_directions() {
        let mut registry = HandleRegistry::default();
        let h = BodyHandle::from_raw(10);
        let e = EntityId::from_raw(2);
        registry.insert(h, e);
        assert_eq!(registry.entity(h), Some(e));
        assert_eq!(registry.handle(e), Some(h));
        assert_eq!(registry.remove_entity(e), Some(h));
        assert!(registry.entity(h).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reinsert_replaces_stale_pairs() {
        let mut registry = HandleRegistry::default();
        let e = EntityId::from_raw(0);
        registry.insert(BodyHandle::from_raw(1), e);
        registry.insert(BodyHandle::from_raw(2), e);
        assert_eq!(registry.len(), 1);
        assert!(registry.entity(BodyHandle::from_raw(1)).is_none());
        assert_eq!(registry.handle(e), Some(BodyHandle::from_raw(2)));
    }
}
