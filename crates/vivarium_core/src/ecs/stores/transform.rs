//! # Transform Store
//!
//! Current pose, scale and a shadow "previous pose" per entity, each field in
//! its own flat array.
//!
//! The previous pose exists only for render interpolation. Setters touch the
//! current buffers only; previous changes exclusively through
//! [`TransformStore::snapshot_all`] and [`TransformStore::snapshot_pose`].
//! That is what keeps interpolation stable when the solver runs several
//! sub-steps inside one rendered frame.

use vivarium_shared::{Quat, Vec3};

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Value view of one entity's transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World position.
    pub position: Vec3,
    /// World rotation (unit quaternion).
    pub rotation: Quat,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// Transform at `position` with identity rotation and unit scale.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::from_position(Vec3::ZERO);
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// SoA transform storage with interpolation support.
#[derive(Debug, Default)]
pub struct TransformStore {
    index: SparseIndex,

    // Current pose
    px: Vec<f32>,
    py: Vec<f32>,
    pz: Vec<f32>,
    rx: Vec<f32>,
    ry: Vec<f32>,
    rz: Vec<f32>,
    rw: Vec<f32>,

    // Scale
    sx: Vec<f32>,
    sy: Vec<f32>,
    sz: Vec<f32>,

    // Previous pose (interpolation only)
    prev_px: Vec<f32>,
    prev_py: Vec<f32>,
    prev_pz: Vec<f32>,
    prev_rx: Vec<f32>,
    prev_ry: Vec<f32>,
    prev_rz: Vec<f32>,
    prev_rw: Vec<f32>,
}

impl TransformStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let col = || Vec::with_capacity(capacity);
        Self {
            index: SparseIndex::with_capacity(capacity),
            px: col(),
            py: col(),
            pz: col(),
            rx: col(),
            ry: col(),
            rz: col(),
            rw: col(),
            sx: col(),
            sy: col(),
            sz: col(),
            prev_px: col(),
            prev_py: col(),
            prev_pz: col(),
            prev_rx: col(),
            prev_ry: col(),
            prev_rz: col(),
            prev_rw: col(),
        }
    }

    /// Inserts or overwrites `entity`'s transform.
    ///
    /// A new entry starts with its previous pose equal to the given pose, so
    /// it doesn't interpolate in from the origin. Overwriting an existing
    /// entry leaves its previous pose alone, like every other setter.
    pub fn insert(&mut self, entity: EntityId, transform: Transform) {
        let Transform {
            position: p,
            rotation: r,
            scale: s,
        } = transform;
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.write_pose(i, p, r);
                self.sx[i] = s.x;
                self.sy[i] = s.y;
                self.sz[i] = s.z;
            }
            Slot::Appended(_) => {
                self.px.push(p.x);
                self.py.push(p.y);
                self.pz.push(p.z);
                self.rx.push(r.x);
                self.ry.push(r.y);
                self.rz.push(r.z);
                self.rw.push(r.w);
                self.sx.push(s.x);
                self.sy.push(s.y);
                self.sz.push(s.z);
                self.prev_px.push(p.x);
                self.prev_py.push(p.y);
                self.prev_pz.push(p.z);
                self.prev_rx.push(r.x);
                self.prev_ry.push(r.y);
                self.prev_rz.push(r.z);
                self.prev_rw.push(r.w);
            }
        }
    }

    /// Removes `entity`. Returns `false` if it had no transform.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        for col in [
            &mut self.px,
            &mut self.py,
            &mut self.pz,
            &mut self.rx,
            &mut self.ry,
            &mut self.rz,
            &mut self.rw,
            &mut self.sx,
            &mut self.sy,
            &mut self.sz,
            &mut self.prev_px,
            &mut self.prev_py,
            &mut self.prev_pz,
            &mut self.prev_rx,
            &mut self.prev_ry,
            &mut self.prev_rz,
            &mut self.prev_rw,
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

    /// Number of entities with a transform.
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

    /// Current transform of `entity`.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<Transform> {
        let i = self.index.dense_index(entity)?;
        Some(Transform {
            position: self.position_at(i),
            rotation: self.rotation_at(i),
            scale: Vec3::new(self.sx[i], self.sy[i], self.sz[i]),
        })
    }

    /// Current position of `entity`.
    #[must_use]
    pub fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.index.dense_index(entity).map(|i| self.position_at(i))
    }

    /// Current rotation of `entity`.
    #[must_use]
    pub fn rotation(&self, entity: EntityId) -> Option<Quat> {
        self.index.dense_index(entity).map(|i| self.rotation_at(i))
    }

    /// Scale of `entity`.
    #[must_use]
    pub fn scale(&self, entity: EntityId) -> Option<Vec3> {
        self.index
            .dense_index(entity)
            .map(|i| Vec3::new(self.sx[i], self.sy[i], self.sz[i]))
    }

    /// Previous-snapshot pose of `entity`.
    #[must_use]
    pub fn previous_pose(&self, entity: EntityId) -> Option<(Vec3, Quat)> {
        let i = self.index.dense_index(entity)?;
        Some((
            Vec3::new(self.prev_px[i], self.prev_py[i], self.prev_pz[i]),
            Quat::new(self.prev_rx[i], self.prev_ry[i], self.prev_rz[i], self.prev_rw[i]),
        ))
    }

    /// Sets the current position. Returns `false` if absent.
    pub fn set_position(&mut self, entity: EntityId, position: Vec3) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.px[i] = position.x;
        self.py[i] = position.y;
        self.pz[i] = position.z;
        true
    }

    /// Sets the current rotation. Returns `false` if absent.
    pub fn set_rotation(&mut self, entity: EntityId, rotation: Quat) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.rx[i] = rotation.x;
        self.ry[i] = rotation.y;
        self.rz[i] = rotation.z;
        self.rw[i] = rotation.w;
        true
    }

    /// Sets the current position and rotation. Returns `false` if absent.
    pub fn set_pose(&mut self, entity: EntityId, position: Vec3, rotation: Quat) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.write_pose(i, position, rotation);
        true
    }

    /// Sets the scale. Returns `false` if absent.
    pub fn set_scale(&mut self, entity: EntityId, scale: Vec3) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.sx[i] = scale.x;
        self.sy[i] = scale.y;
        self.sz[i] = scale.z;
        true
    }

    /// Copies current pose into previous pose for every entity.
    ///
    /// Call once before advancing the solver.
    pub fn snapshot_all(&mut self) {
        self.prev_px.copy_from_slice(&self.px);
        self.prev_py.copy_from_slice(&self.py);
        self.prev_pz.copy_from_slice(&self.pz);
        self.prev_rx.copy_from_slice(&self.rx);
        self.prev_ry.copy_from_slice(&self.ry);
        self.prev_rz.copy_from_slice(&self.rz);
        self.prev_rw.copy_from_slice(&self.rw);
    }

    /// Copies current pose into previous pose for one entity.
    ///
    /// Used on spawn/teleport to avoid an interpolation pop.
    pub fn snapshot_pose(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.prev_px[i] = self.px[i];
        self.prev_py[i] = self.py[i];
        self.prev_pz[i] = self.pz[i];
        self.prev_rx[i] = self.rx[i];
        self.prev_ry[i] = self.ry[i];
        self.prev_rz[i] = self.rz[i];
        self.prev_rw[i] = self.rw[i];
        true
    }

    /// Interpolated pose of a single entity.
    ///
    /// `alpha` is clamped to `[0, 1]`; 0 is the previous snapshot, 1 the
    /// current pose.
    #[must_use]
    pub fn interpolated(&self, entity: EntityId, alpha: f32) -> Option<(Vec3, Quat)> {
        let i = self.index.dense_index(entity)?;
        Some(self.blend_at(i, clamp_alpha(alpha)))
    }

    /// Walks every entity with its interpolated world pose.
    ///
    /// Position is lerped component-wise, rotation is NLerped (always
    /// renormalized). Values are passed by copy; nothing is allocated.
    pub fn for_each_interpolated<F>(&self, alpha: f32, mut visit: F)
    where
        F: FnMut(EntityId, Vec3, Quat),
    {
        let alpha = clamp_alpha(alpha);
        for (i, &entity) in self.index.entities().iter().enumerate() {
            let (position, rotation) = self.blend_at(i, alpha);
            visit(entity, position, rotation);
        }
    }

    /// Drops every entry. Keeps allocations.
    pub fn clear(&mut self) {
        self.index.clear();
        for col in [
            &mut self.px,
            &mut self.py,
            &mut self.pz,
            &mut self.rx,
            &mut self.ry,
            &mut self.rz,
            &mut self.rw,
            &mut self.sx,
            &mut self.sy,
            &mut self.sz,
            &mut self.prev_px,
            &mut self.prev_py,
            &mut self.prev_pz,
            &mut self.prev_rx,
            &mut self.prev_ry,
            &mut self.prev_rz,
            &mut self.prev_rw,
        ] {
            col.clear();
        }
    }

    #[inline]
    fn position_at(&self, i: usize) -> Vec3 {
        Vec3::new(self.px[i], self.py[i], self.pz[i])
    }

    #[inline]
    fn rotation_at(&self, i: usize) -> Quat {
        Quat::new(self.rx[i], self.ry[i], self.rz[i], self.rw[i])
    }

    #[inline]
    fn write_pose(&mut self, i: usize, p: Vec3, r: Quat) {
        self.px[i] = p.x;
        self.py[i] = p.y;
        self.pz[i] = p.z;
        self.rx[i] = r.x;
        self.ry[i] = r.y;
        self.rz[i] = r.z;
        self.rw[i] = r.w;
    }

    #[inline]
    fn blend_at(&self, i: usize, alpha: f32) -> (Vec3, Quat) {
        let prev_p = Vec3::new(self.prev_px[i], self.prev_py[i], self.prev_pz[i]);
        let prev_r = Quat::new(self.prev_rx[i], self.prev_ry[i], self.prev_rz[i], self.prev_rw[i]);
        (
            prev_p.lerp(self.position_at(i), alpha),
            prev_r.nlerp(self.rotation_at(i), alpha),
        )
    }
}

#[inline]
fn clamp_alpha(alpha: f32) -> f32 {
    if alpha.is_nan() {
        1.0
    } else {
        alpha.clamp(0.0, 1.0)
    }
}
