//! Kinematic controller targets.
//!
//! Written by game logic, consumed by the kinematic push before stepping.

use vivarium_shared::{Quat, Vec3};

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Desired pose for a kinematic body on the next solver step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KinematicTarget {
    /// Target world position.
    pub position: Vec3,
    /// Target world rotation.
    pub rotation: Quat,
}

/// SoA storage for [`KinematicTarget`].
#[derive(Debug, Default)]
pub struct KinematicStore {
    index: SparseIndex,
    tx: Vec<f32>,
    ty: Vec<f32>,
    tz: Vec<f32>,
    rx: Vec<f32>,
    ry: Vec<f32>,
    rz: Vec<f32>,
    rw: Vec<f32>,
}

impl KinematicStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let col = || Vec::with_capacity(capacity);
        Self {
            index: SparseIndex::with_capacity(capacity),
            tx: col(),
            ty: col(),
            tz: col(),
            rx: col(),
            ry: col(),
            rz: col(),
            rw: col(),
        }
    }

    /// Inserts or overwrites `entity`'s target.
    pub fn insert(&mut self, entity: EntityId, target: KinematicTarget) {
        let KinematicTarget { position: p, rotation: r } = target;
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.tx[i] = p.x;
                self.ty[i] = p.y;
                self.tz[i] = p.z;
                self.rx[i] = r.x;
                self.ry[i] = r.y;
                self.rz[i] = r.z;
                self.rw[i] = r.w;
            }
            Slot::Appended(_) => {
                self.tx.push(p.x);
                self.ty.push(p.y);
                self.tz.push(p.z);
                self.rx.push(r.x);
                self.ry.push(r.y);
                self.rz.push(r.z);
                self.rw.push(r.w);
            }
        }
    }

    /// Returns `entity`'s target.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<KinematicTarget> {
        self.index.dense_index(entity).map(|i| self.target_at(i))
    }

    /// Updates only the target position. Returns `false` if absent.
    pub fn set_position(&mut self, entity: EntityId, position: Vec3) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.tx[i] = position.x;
        self.ty[i] = position.y;
        self.tz[i] = position.z;
        true
    }

    /// Removes `entity`. Returns `false` if absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        for col in [
            &mut self.tx,
            &mut self.ty,
            &mut self.tz,
            &mut self.rx,
            &mut self.ry,
            &mut self.rz,
            &mut self.rw,
        ] {
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

    /// Linear walk over every target.
    pub fn for_each<F: FnMut(EntityId, KinematicTarget)>(&self, mut visit: F) {
        for (i, &entity) in self.index.entities().iter().enumerate() {
            visit(entity, self.target_at(i));
        }
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        for col in [
            &mut self.tx,
            &mut self.ty,
            &mut self.tz,
            &mut self.rx,
            &mut self.ry,
            &mut self.rz,
            &mut self.rw,
        ] {
            col.clear();
        }
    }

    #[inline]
    fn target_at(&self, i: usize) -> KinematicTarget {
        KinematicTarget {
            position: Vec3::new(self.tx[i], self.ty[i], self.tz[i]),
            rotation: Quat::new(self.rx[i], self.ry[i], self.rz[i], self.rw[i]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_position_keeps_rotation() {
        let mut store = KinematicStore::with_capacity(2);
        let e = EntityId::from_raw(4);
        let rot = Quat::from_axis_angle(Vec3::Y, 0.5);
        store.insert(e, KinematicTarget { position: Vec3::ZERO, rotation: rot });

        assert!(store.set_position(e, Vec3::new(1.0, 2.0, 3.0)));
        let target = store.get(e).unwrap();
        assert_eq!(target.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(target.rotation, rot);
    }

    #[test]
    fn test_for_each_after_remove() {
        let mut store = KinematicStore::with_capacity(2);
        for i in 0..4 {
            store.insert(
                EntityId::from_raw(i),
                KinematicTarget { position: Vec3::splat(i as f32), rotation: Quat::IDENTITY },
            );
        }
        store.remove(EntityId::from_raw(1));

        let mut seen = Vec::new();
        store.for_each(|e, t| {
            assert_eq!(t.position, Vec3::splat(e.index() as f32));
            seen.push(e.index());
        });
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 2, 3]);
    }
}
