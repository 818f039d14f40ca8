//! # ECS World
//!
//! Owns the entity allocator and every component store.
//!
//! The world knows nothing about the physics solver. Destroying an entity
//! here only strips its components and recycles its ID; releasing solver
//! objects is the caller's job and must happen first, while the
//! entity → handle mapping still exists.

use tracing::info;

use super::entity::{EntityAllocator, EntityId};
use super::sparse_set::SparseSet;
use super::stores::{
    AgentStore, IntegrityStore, KinematicStore, PhysicsPropsStore, ProjectileStore, RenderHandle,
    RigidBodyStore, TransformStore,
};

/// The ECS World: entity lifecycle plus component storage.
///
/// Stores are public fields so systems can borrow disjoint stores at once.
pub struct World {
    entities: EntityAllocator,

    // =========================================================================
    // Component Stores
    // =========================================================================
    /// Pose, scale and previous pose.
    pub transforms: TransformStore,
    /// Friction, restitution, density.
    pub physics_props: PhysicsPropsStore,
    /// Kinematic pose targets.
    pub kinematic: KinematicStore,
    /// Entity → solver body handle.
    pub rigid_bodies: RigidBodyStore,
    /// Health and impact bookkeeping.
    pub integrity: IntegrityStore,
    /// Projectile payloads.
    pub projectiles: ProjectileStore,
    /// Steering agents.
    pub agents: AgentStore,
    /// Debug names.
    pub names: SparseSet<String>,
    /// Renderer handles.
    pub render_handles: SparseSet<RenderHandle>,
}

impl World {
    /// Creates a world with every store pre-sized for `capacity` entities.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Expected peak entity count. Stores grow past it if needed.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(capacity),
            transforms: TransformStore::with_capacity(capacity),
            physics_props: PhysicsPropsStore::with_capacity(capacity),
            kinematic: KinematicStore::with_capacity(capacity),
            rigid_bodies: RigidBodyStore::with_capacity(capacity),
            integrity: IntegrityStore::with_capacity(capacity),
            projectiles: ProjectileStore::with_capacity(capacity),
            agents: AgentStore::with_capacity(capacity),
            names: SparseSet::new(),
            render_handles: SparseSet::new(),
        }
    }

    /// Allocates an entity ID. The most recently destroyed ID is reused first.
    pub fn create_entity(&mut self) -> EntityId {
        self.entities.allocate()
    }

    /// Removes `entity` from every store, then recycles its ID.
    ///
    /// Returns `false` (and touches nothing) if `entity` is not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.strip_components(entity);
        self.entities.free(entity)
    }

    /// Checks if `entity` is currently alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Iterates live entities in ascending ID order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter_alive()
    }

    /// Drops every entity and component and restarts ID allocation at zero.
    pub fn clear(&mut self) {
        let dropped = self.entities.alive_count();
        self.entities.clear();
        self.transforms.clear();
        self.physics_props.clear();
        self.kinematic.clear();
        self.rigid_bodies.clear();
        self.integrity.clear();
        self.projectiles.clear();
        self.agents.clear();
        self.names.clear();
        self.render_handles.clear();
        info!(dropped, "world cleared");
    }

    fn strip_components(&mut self, entity: EntityId) {
        self.transforms.remove(entity);
        self.physics_props.remove(entity);
        self.kinematic.remove(entity);
        self.rigid_bodies.remove(entity);
        self.integrity.remove(entity);
        self.projectiles.remove(entity);
        self.agents.remove(entity);
        self.names.remove(entity);
        self.render_handles.remove(entity);
    }
}

/// Mutable borrows of every component store except the solver-facing one.
///
/// Owners that pair a world with a solver hand this out instead of the
/// world itself, so callers can edit components but can neither destroy
/// entities nor unlink bodies behind the solver's back.
pub struct ComponentsMut<'w> {
    /// Pose, scale and previous pose.
    pub transforms: &'w mut TransformStore,
    /// Friction, restitution, density.
    pub physics_props: &'w mut PhysicsPropsStore,
    /// Kinematic pose targets.
    pub kinematic: &'w mut KinematicStore,
    /// Health and impact bookkeeping.
    pub integrity: &'w mut IntegrityStore,
    /// Projectile payloads.
    pub projectiles: &'w mut ProjectileStore,
    /// Steering agents.
    pub agents: &'w mut AgentStore,
    /// Debug names.
    pub names: &'w mut SparseSet<String>,
    /// Renderer handles.
    pub render_handles: &'w mut SparseSet<RenderHandle>,
}

impl World {
    /// Borrows the component stores without entity lifecycle or body links.
    pub fn components_mut(&mut self) -> ComponentsMut<'_> {
        ComponentsMut {
            transforms: &mut self.transforms,
            physics_props: &mut self.physics_props,
            kinematic: &mut self.kinematic,
            integrity: &mut self.integrity,
            projectiles: &mut self.projectiles,
            agents: &mut self.agents,
            names: &mut self.names,
            render_handles: &mut self.render_handles,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(1024)
    }
}
