//! # Body Side Table
//!
//! Per-handle bookkeeping the solver has no place for: the base shape, the
//! material, whether mass was explicit, and the mass at scale one. Runtime
//! rescaling needs all of it.

use std::collections::HashMap;

use tracing::debug;
use vivarium_shared::{BodyHandle, ColliderHandle, Vec3};

use crate::error::{PhysicsError, PhysicsResult};
use crate::materials::Material;
use crate::shapes::{
    attach_collider, scaled_properties, BodyBlueprint, BodyRequest, MassProperties, ShapeDesc,
    SpawnedBody,
};
use crate::solver::{ColliderDesc, Solver};

/// Bookkeeping for one solver body.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyRecord {
    /// Shape at scale one.
    pub base_shape: ShapeDesc,
    /// Resolved material.
    pub material: Material,
    /// Explicit mass override from the request.
    pub mass_override: Option<f32>,
    /// Mass properties at scale one.
    pub base: MassProperties,
    /// Mass properties at the current scale.
    pub current: MassProperties,
    /// Current scale.
    pub scale: Vec3,
    /// Live collider.
    pub collider: ColliderHandle,
}

impl BodyRecord {
    /// Builds the record for a freshly spawned body.
    #[must_use]
    pub fn new(request: &BodyRequest, blueprint: &BodyBlueprint, spawned: &SpawnedBody) -> Self {
        Self {
            base_shape: request.shape.clone(),
            material: blueprint.material,
            mass_override: request.mass,
            base: blueprint.base,
            current: blueprint.scaled,
            scale: request.scale,
            collider: spawned.collider,
        }
    }
}

/// Side table keyed by body handle.
#[derive(Debug, Default)]
pub struct BodyTable {
    records: HashMap<BodyHandle, BodyRecord>,
}

impl BodyTable {
    /// Stores the record for `body`.
    pub fn insert(&mut self, body: BodyHandle, record: BodyRecord) {
        self.records.insert(body, record);
    }

    /// Record of `body`.
    #[must_use]
    pub fn get(&self, body: BodyHandle) -> Option<&BodyRecord> {
        self.records.get(&body)
    }

    /// Drops the record of `body`.
    pub fn remove(&mut self, body: BodyHandle) -> Option<BodyRecord> {
        self.records.remove(&body)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forgets every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Regenerates the collider of `body` at a new scale.
    ///
    /// Colliders are immutable, so the old one is removed and a new one built
    /// from the base shape times `scale`. Mass follows the volume change when
    /// it was explicit, otherwise density is reapplied.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::StaleHandle`] if the body or its record is gone (the
    /// record is dropped), or the shape/solver error of the new collider.
    pub fn rescale<S: Solver + ?Sized>(
        &mut self,
        solver: &mut S,
        body: BodyHandle,
        scale: Vec3,
    ) -> PhysicsResult<MassProperties> {
        if !solver.contains_body(body) {
            self.records.remove(&body);
            return Err(PhysicsError::StaleHandle(body));
        }
        let Some(record) = self.records.get_mut(&body) else {
            return Err(PhysicsError::StaleHandle(body));
        };

        let shape = record.base_shape.scaled(scale);
        let collider_shape = shape.collider_shape()?;
        let props = scaled_properties(&record.base, record.mass_override.is_some(), shape.volume());

        solver.remove_collider(record.collider);
        let (collider, _) = attach_collider(
            solver,
            body,
            &ColliderDesc {
                shape: collider_shape,
                friction: props.friction,
                restitution: props.restitution,
                mass: props.mass,
            },
        )?;

        record.collider = collider;
        record.current = props;
        record.scale = scale;
        debug!(%body, shape = shape.kind_name(), mass = props.mass, "body rescaled");
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialTable;
    use crate::reference::ReferenceSolver;
    use crate::shapes::{blueprint, create_body};
    use crate::solver::BodyKind;

    fn spawn(solver: &mut ReferenceSolver, table: &mut BodyTable, request: &BodyRequest) -> BodyHandle {
        let bp = blueprint(request, &MaterialTable::builtin()).unwrap();
        let spawned = create_body(solver, &bp).unwrap();
        table.insert(spawned.body, BodyRecord::new(request, &bp, &spawned));
        spawned.body
    }

    #[test]
    fn test_rescale_reapplies_density() {
        let mut solver = ReferenceSolver::default();
        let mut table = BodyTable::default();
        let request = BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic).with_material("wood");
        let body = spawn(&mut solver, &mut table, &request);
        assert!((solver.body_mass(body).unwrap() - 700.0).abs() < 1e-3);

        let props = table.rescale(&mut solver, body, Vec3::splat(2.0)).unwrap();
        assert!((props.mass - 5600.0).abs() < 1e-2);
        assert!((solver.body_mass(body).unwrap() - 5600.0).abs() < 1e-2);
        assert_eq!(solver.collider_count(), 1);
    }

    #[test]
    fn test_rescale_scales_explicit_mass() {
        let mut solver = ReferenceSolver::default();
        let mut table = BodyTable::default();
        let request = BodyRequest::new(ShapeDesc::Sphere { radius: 0.5 }, BodyKind::Dynamic).with_mass(10.0);
        let body = spawn(&mut solver, &mut table, &request);

        let props = table.rescale(&mut solver, body, Vec3::new(1.0, 3.0, 2.0)).unwrap();
        // Sphere radius follows the largest component: volume × 27.
        assert!((props.mass - 270.0).abs() < 1e-2);
        assert_eq!(table.get(body).unwrap().scale, Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_rescale_stale_body() {
        let mut solver = ReferenceSolver::default();
        let mut table = BodyTable::default();
        let request = BodyRequest::new(ShapeDesc::Box { size: Vec3::ONE }, BodyKind::Dynamic);
        let body = spawn(&mut solver, &mut table, &request);
        solver.reset();

        assert_eq!(table.rescale(&mut solver, body, Vec3::ONE), Err(PhysicsError::StaleHandle(body)));
        assert!(table.is_empty());
    }
}
