//! Projectile payloads and lifetimes.

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Value view of a projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Damage dealt on a registered hit.
    pub damage: f32,
    /// Impulse payload compared against the target's damage threshold.
    pub impulse: f32,
    /// Remaining lifetime in seconds.
    pub lifetime: f32,
    /// Entity that fired the projectile.
    pub owner: EntityId,
}

/// SoA storage for [`Projectile`].
#[derive(Debug, Default)]
pub struct ProjectileStore {
    index: SparseIndex,
    damage: Vec<f32>,
    impulse: Vec<f32>,
    lifetime: Vec<f32>,
    owner: Vec<EntityId>,
}

impl ProjectileStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: SparseIndex::with_capacity(capacity),
            damage: Vec::with_capacity(capacity),
            impulse: Vec::with_capacity(capacity),
            lifetime: Vec::with_capacity(capacity),
            owner: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites `entity`'s projectile data.
    pub fn insert(&mut self, entity: EntityId, value: Projectile) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.damage[i] = value.damage;
                self.impulse[i] = value.impulse;
                self.lifetime[i] = value.lifetime;
                self.owner[i] = value.owner;
            }
            Slot::Appended(_) => {
                self.damage.push(value.damage);
                self.impulse.push(value.impulse);
                self.lifetime.push(value.lifetime);
                self.owner.push(value.owner);
            }
        }
    }

    /// Returns `entity`'s projectile data.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<Projectile> {
        let i = self.index.dense_index(entity)?;
        Some(Projectile {
            damage: self.damage[i],
            impulse: self.impulse[i],
            lifetime: self.lifetime[i],
            owner: self.owner[i],
        })
    }

    /// Counts every lifetime down by `dt` seconds.
    ///
    /// Entities whose lifetime reaches zero are appended to `expired`; they
    /// stay in the store until the caller destroys them.
    pub fn tick_lifetimes(&mut self, dt: f32, expired: &mut Vec<EntityId>) {
        for (lifetime, &entity) in self.lifetime.iter_mut().zip(self.index.entities()) {
            *lifetime -= dt;
            if *lifetime <= 0.0 {
                expired.push(entity);
            }
        }
    }

    /// Removes `entity`. Returns `false` if absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        self.damage.swap_remove(i);
        self.impulse.swap_remove(i);
        self.lifetime.swap_remove(i);
        self.owner.swap_remove(i);
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

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        self.damage.clear();
        self.impulse.clear();
        self.lifetime.clear();
        self.owner.clear();
    }
}
