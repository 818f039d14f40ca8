//! # Entity Management
//!
//! Entities are bare integer identifiers. They carry no data and no
//! generation counter; they only key into component stores.
//!
//! IDs are recycled with stack discipline: the most recently freed ID is the
//! next one handed out, and only an empty free list advances the counter.

/// Unique identifier for an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Wraps a raw index.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the raw index as a `usize` for array addressing.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }

    /// Null/invalid entity ID. Never handed out by the allocator.
    pub const NULL: Self = Self(u32::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Entity ID allocator with a LIFO free list.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    /// Next never-used ID.
    next: u32,
    /// Freed IDs; the top of the stack is reused first.
    free: Vec<u32>,
    /// Liveness by ID.
    alive: Vec<bool>,
    /// Number of live IDs.
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates an allocator with room for `capacity` IDs before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next: 0,
            free: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            alive_count: 0,
        }
    }

    /// Hands out an ID: the most recently freed one, else a fresh one.
    pub fn allocate(&mut self) -> EntityId {
        let index = if let Some(index) = self.free.pop() {
            index
        } else {
            let index = self.next;
            self.next += 1;
            self.alive.push(false);
            index
        };
        self.alive[index as usize] = true;
        self.alive_count += 1;
        EntityId(index)
    }

    /// Returns an ID to the free list.
    ///
    /// Returns `false` if the ID is not currently live.
    pub fn free(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.alive[id.slot()] = false;
        self.alive_count -= 1;
        self.free.push(id.0);
        true
    }

    /// Checks if an ID is currently live.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.alive.get(id.slot()).copied().unwrap_or(false)
    }

    /// Number of live IDs.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Iterates live IDs in ascending order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| EntityId(i as u32))
    }

    /// Forgets every ID and restarts the counter at zero. Keeps allocations.
    pub fn clear(&mut self) {
        self.next = 0;
        self.free.clear();
        self.alive.clear();
        self.alive_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_monotonic() {
        let mut alloc = EntityAllocator::default();
        assert_eq!(alloc.allocate().index(), 0);
        assert_eq!(alloc.allocate().index(), 1);
        assert_eq!(alloc.allocate().index(), 2);
        assert_eq!(alloc.alive_count(), 3);
    }

    #[test]
    fn test_most_recently_freed_is_reused_first() {
        let mut alloc = EntityAllocator::default();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let _c = alloc.allocate();

        assert!(alloc.free(a));
        assert!(alloc.free(b));

        assert_eq!(alloc.allocate(), b);
        assert_eq!(alloc.allocate(), a);
        assert_eq!(alloc.allocate().index(), 3);
    }

    #[test]
    fn test_double_free_is_rejected() {
        let mut alloc = EntityAllocator::default();
        let a = alloc.allocate();
        assert!(alloc.free(a));
        assert!(!alloc.free(a));
        assert!(!alloc.free(EntityId::from_raw(99)));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn test_clear_restarts_counter() {
        let mut alloc = EntityAllocator::default();
        for _ in 0..5 {
            alloc.allocate();
        }
        alloc.clear();
        assert_eq!(alloc.alive_count(), 0);
        assert_eq!(alloc.allocate().index(), 0);
    }
}
