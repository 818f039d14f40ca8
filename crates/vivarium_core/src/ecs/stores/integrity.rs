//! Health and last-impact bookkeeping.
//!
//! The impact point and velocity are kept for reactive effects and audio;
//! the simulation itself never reads them back.

use vivarium_shared::Vec3;

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Value view of an entity's integrity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Integrity {
    /// Current health.
    pub health: f32,
    /// Health ceiling.
    pub max_health: f32,
    /// Minimum impulse that registers as damage.
    pub damage_threshold: f32,
    /// World point of the last registered impact.
    pub last_impact_point: Vec3,
    /// Velocity of the impactor at the last registered impact.
    pub last_impact_velocity: Vec3,
}

impl Integrity {
    /// Full-health integrity with the given ceiling and threshold.
    #[must_use]
    pub const fn new(max_health: f32, damage_threshold: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            damage_threshold,
            last_impact_point: Vec3::ZERO,
            last_impact_velocity: Vec3::ZERO,
        }
    }
}

/// SoA storage for [`Integrity`].
#[derive(Debug, Default)]
pub struct IntegrityStore {
    index: SparseIndex,
    health: Vec<f32>,
    max_health: Vec<f32>,
    threshold: Vec<f32>,
    impact_x: Vec<f32>,
    impact_y: Vec<f32>,
    impact_z: Vec<f32>,
    impact_vx: Vec<f32>,
    impact_vy: Vec<f32>,
    impact_vz: Vec<f32>,
}

impl IntegrityStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let col = || Vec::with_capacity(capacity);
        Self {
            index: SparseIndex::with_capacity(capacity),
            health: col(),
            max_health: col(),
            threshold: col(),
            impact_x: col(),
            impact_y: col(),
            impact_z: col(),
            impact_vx: col(),
            impact_vy: col(),
            impact_vz: col(),
        }
    }

    /// Inserts or overwrites `entity`'s integrity.
    pub fn insert(&mut self, entity: EntityId, value: Integrity) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.health[i] = value.health;
                self.max_health[i] = value.max_health;
                self.threshold[i] = value.damage_threshold;
                self.write_impact(i, value.last_impact_point, value.last_impact_velocity);
            }
            Slot::Appended(_) => {
                self.health.push(value.health);
                self.max_health.push(value.max_health);
                self.threshold.push(value.damage_threshold);
                self.impact_x.push(value.last_impact_point.x);
                self.impact_y.push(value.last_impact_point.y);
                self.impact_z.push(value.last_impact_point.z);
                self.impact_vx.push(value.last_impact_velocity.x);
                self.impact_vy.push(value.last_impact_velocity.y);
                self.impact_vz.push(value.last_impact_velocity.z);
            }
        }
    }

    /// Returns `entity`'s integrity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<Integrity> {
        let i = self.index.dense_index(entity)?;
        Some(Integrity {
            health: self.health[i],
            max_health: self.max_health[i],
            damage_threshold: self.threshold[i],
            last_impact_point: Vec3::new(self.impact_x[i], self.impact_y[i], self.impact_z[i]),
            last_impact_velocity: Vec3::new(self.impact_vx[i], self.impact_vy[i], self.impact_vz[i]),
        })
    }

    /// Current health of `entity`.
    #[must_use]
    pub fn health(&self, entity: EntityId) -> Option<f32> {
        self.index.dense_index(entity).map(|i| self.health[i])
    }

    /// Damage threshold of `entity`.
    #[must_use]
    pub fn damage_threshold(&self, entity: EntityId) -> Option<f32> {
        self.index.dense_index(entity).map(|i| self.threshold[i])
    }

    /// Applies an impact if `impulse` reaches the entity's threshold.
    ///
    /// Health saturates at zero. The impact point and velocity are recorded
    /// only for impacts that register. Returns the remaining health when the
    /// impact registered, `None` otherwise (absent entity or below threshold).
    pub fn apply_impact(
        &mut self,
        entity: EntityId,
        damage: f32,
        impulse: f32,
        point: Vec3,
        velocity: Vec3,
    ) -> Option<f32> {
        let i = self.index.dense_index(entity)?;
        if impulse < self.threshold[i] {
            return None;
        }
        self.health[i] = (self.health[i] - damage.max(0.0)).max(0.0);
        self.write_impact(i, point, velocity);
        Some(self.health[i])
    }

    /// Removes `entity`. Returns `false` if absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        for col in self.columns_mut() {
            col.swap_remove(i);
        }
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

    /// Dense health column.
    #[inline]
    #[must_use]
    pub fn healths(&self) -> &[f32] {
        &self.health
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        for col in self.columns_mut() {
            col.clear();
        }
    }

    fn columns_mut(&mut self) -> [&mut Vec<f32>; 9] {
        [
            &mut self.health,
            &mut self.max_health,
            &mut self.threshold,
            &mut self.impact_x,
            &mut self.impact_y,
            &mut self.impact_z,
            &mut self.impact_vx,
            &mut self.impact_vy,
            &mut self.impact_vz,
        ]
    }

    #[inline]
    fn write_impact(&mut self, i: usize, point: Vec3, velocity: Vec3) {
        self.impact_x[i] = point.x;
        self.impact_y[i] = point.y;
        self.impact_z[i] = point.z;
        self.impact_vx[i] = velocity.x;
        self.impact_vy[i] = velocity.y;
        self.impact_vz[i] = velocity.z;
    }
}
