//! # Sparse-Set Storage
//!
//! Entity → dense-slot lookup shared by every store.
//!
//! - `sparse[entity]` → dense index, or [`ABSENT`]
//! - `dense[i]`       → entity occupying slot `i`
//! - field arrays     → index-aligned with `dense`
//!
//! Insertion appends. Removal moves the last slot into the hole across every
//! dense array (`Vec::swap_remove`) and marks the sparse slot absent, so add,
//! remove and lookup are O(1) and live data stays packed. Iteration order is
//! not stable across removals.

use super::entity::EntityId;

/// Sparse slot marker for "not in this store".
pub const ABSENT: u32 = u32::MAX;

/// Outcome of [`SparseIndex::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The entity was already present at this dense index; overwrite fields.
    Existing(usize),
    /// A new dense slot was appended at this index; push fields.
    Appended(usize),
}

/// The index half of a sparse set: no component data, only the mapping.
///
/// SoA stores pair one of these with any number of field vectors. Callers
/// must keep every field vector the same length as [`SparseIndex::entities`].
#[derive(Debug, Default, Clone)]
pub struct SparseIndex {
    sparse: Vec<u32>,
    dense: Vec<EntityId>,
}

impl SparseIndex {
    /// Creates an index with room for `capacity` entities before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: vec![ABSENT; capacity],
            dense: Vec::with_capacity(capacity),
        }
    }

    /// Number of entities present.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if no entity is present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Dense capacity before the next reallocation.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// Dense slot of `entity`, if present.
    #[inline]
    #[must_use]
    pub fn dense_index(&self, entity: EntityId) -> Option<usize> {
        match self.sparse.get(entity.slot()) {
            Some(&i) if i != ABSENT => Some(i as usize),
            _ => None,
        }
    }

    /// O(1) presence check.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Dense entity array, index-aligned with the field arrays.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.dense
    }

    /// Maps `entity` to a dense slot, appending one if needed.
    ///
    /// Returns `None` for [`EntityId::NULL`], which is never stored.
    pub fn insert(&mut self, entity: EntityId) -> Option<Slot> {
        if entity.is_null() {
            return None;
        }
        if let Some(i) = self.dense_index(entity) {
            return Some(Slot::Existing(i));
        }
        self.grow_sparse(entity.slot());
        let i = self.dense.len();
        self.dense.push(entity);
        self.sparse[entity.slot()] = i as u32;
        Some(Slot::Appended(i))
    }

    /// Unmaps `entity`, moving the last entity into its dense slot.
    ///
    /// Returns the vacated dense index; callers must `swap_remove` that index
    /// from every field array.
    pub fn swap_remove(&mut self, entity: EntityId) -> Option<usize> {
        let i = self.dense_index(entity)?;
        self.dense.swap_remove(i);
        if let Some(&moved) = self.dense.get(i) {
            self.sparse[moved.slot()] = i as u32;
        }
        self.sparse[entity.slot()] = ABSENT;
        Some(i)
    }

    /// Forgets every entity. Keeps allocations.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
    }

    /// Geometric growth: double, or reach `slot + 1`, whichever is larger.
    fn grow_sparse(&mut self, slot: usize) {
        if slot < self.sparse.len() {
            return;
        }
        let new_len = (self.sparse.len() * 2).max(slot + 1);
        self.sparse.resize(new_len, ABSENT);
    }
}

/// Generic sparse-set component store.
///
/// Used for infrequently iterated, larger payloads (names, render handles)
/// where splitting fields into separate arrays isn't worth it.
#[derive(Debug, Clone)]
pub struct SparseSet<T> {
    index: SparseIndex,
    values: Vec<T>,
}

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: SparseIndex::default(),
            values: Vec::new(),
        }
    }

    /// Creates a store with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: SparseIndex::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites the value for `entity`. No-op for the null entity.
    pub fn insert(&mut self, entity: EntityId, value: T) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => self.values[i] = value,
            Slot::Appended(_) => self.values.push(value),
        }
    }

    /// Returns the value for `entity`, if present.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.index.dense_index(entity).map(|i| &self.values[i])
    }

    /// Returns the value for `entity` mutably, if present.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.index.dense_index(entity).map(|i| &mut self.values[i])
    }

    /// O(1) presence check.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains(entity)
    }

    /// Removes and returns the value for `entity`. No-op if absent.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let i = self.index.swap_remove(entity)?;
        Some(self.values.swap_remove(i))
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

    /// Dense value array, index-aligned with [`SparseSet::entities`].
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Linear walk over the dense arrays.
    pub fn for_each<F: FnMut(EntityId, &T)>(&self, mut visit: F) {
        for (entity, value) in self.index.entities().iter().zip(&self.values) {
            visit(*entity, value);
        }
    }

    /// Linear mutable walk over the dense arrays.
    pub fn for_each_mut<F: FnMut(EntityId, &mut T)>(&mut self, mut visit: F) {
        for (entity, value) in self.index.entities().iter().zip(self.values.iter_mut()) {
            visit(*entity, value);
        }
    }

    /// Iterates `(entity, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.index.entities().iter().copied().zip(self.values.iter())
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        self.values.clear();
    }
}
