//! # Simulation Context
//!
//! One value owns everything a running simulation needs: the World, the
//! solver, the handle registry, the stepper, the collision bridge, the grab
//! controller and the body side table. Nothing is global, so several
//! simulations can live side by side (tests rely on it).
//!
//! ## Frame Pipeline
//!
//! ```text
//! 1. steering           agents update targets and kinematic poses
//! 2. kinematic push     targets handed to the solver
//! 3. accumulate         frame delta banked, clamped
//! 4. snapshot           previous pose = current pose (only if a step is due)
//! 5. step loop          solver.step() + event drain, 0..=max_steps times
//! 6. transform sync     solver poses into current buffers
//! 7. flush              collision events reach listeners and channels
//! 8. damage             projectile hits applied, spent projectiles destroyed
//! 9. lifetimes          expired projectiles destroyed
//! ```

use crossbeam_channel::Receiver;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use vivarium_core::{ComponentsMut, EntityId, KinematicTarget, PhysicsProps, Transform, World};
use vivarium_physics::{
    blueprint, create_body, BodyKind, BodyRecord, BodyRequest, BodyTable, CollisionBridge,
    CollisionEvent, FrameStats, GrabController, HandleRegistry, MassProperties, MaterialTable,
    PhysicsError, PhysicsStepper, RapierSolver, ReferenceSolver, Solver, StepStats,
};
use vivarium_shared::{finite_vec3, BodyHandle, JointHandle, Quat, Vec3};

use crate::config::{SimulationConfig, SteeringConfig};
use crate::error::{SimulationError, SimulationResult};
use crate::systems::{
    expire_projectiles, push_kinematic_targets, resolve_impacts, sync_transforms, update_agents,
    Impact,
};

/// The simulation context.
pub struct Simulation<S: Solver = RapierSolver> {
    world: World,
    solver: S,
    registry: HandleRegistry,
    bodies: BodyTable,
    stepper: PhysicsStepper,
    bridge: CollisionBridge,
    grab: GrabController,
    materials: MaterialTable,
    steering: SteeringConfig,
    rng: ChaCha8Rng,
    threat: Option<Vec3>,
    stats: StepStats,

    // Per-frame scratch
    impacts: Vec<Impact>,
    spent: Vec<EntityId>,
    expired: Vec<EntityId>,
}

impl Simulation<RapierSolver> {
    /// Creates a simulation backed by the rapier3d solver.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Config`] if `config` fails validation.
    pub fn new(config: &SimulationConfig) -> SimulationResult<Self> {
        Self::with_solver(config, RapierSolver::new(config.physics.gravity))
    }
}

impl Simulation<ReferenceSolver> {
    /// Creates a simulation backed by the deterministic reference solver.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Config`] if `config` fails validation.
    pub fn with_reference_solver(config: &SimulationConfig) -> SimulationResult<Self> {
        Self::with_solver(config, ReferenceSolver::new(config.physics.gravity))
    }
}

impl<S: Solver> Simulation<S> {
    /// Creates a simulation around an existing solver.
    ///
    /// The solver's gravity and timestep are overwritten from `config`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Config`] if `config` fails validation.
    pub fn with_solver(config: &SimulationConfig, solver: S) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self::build(config, solver))
    }

    /// Assembles the context from a config already known to be valid.
    fn build(config: &SimulationConfig, mut solver: S) -> Self {
        let physics = &config.physics;
        let stepper = PhysicsStepper::new(physics.step_hz, physics.max_steps, physics.max_frame_time);
        solver.set_gravity(finite_vec3(physics.gravity));
        solver.set_timestep(stepper.step_size() as f32);

        Self {
            world: World::new(config.capacity),
            solver,
            registry: HandleRegistry::with_capacity(config.capacity),
            bodies: BodyTable::default(),
            stepper,
            bridge: CollisionBridge::new(physics.event_capacity),
            grab: GrabController::new(config.grab),
            materials: config.material_table(),
            steering: config.steering.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            threat: None,
            stats: StepStats::default(),
            impacts: Vec::new(),
            spent: Vec::new(),
            expired: Vec::new(),
        }
    }

    // =========================================================================
    // Entities and bodies
    // =========================================================================

    /// Allocates an entity.
    pub fn create_entity(&mut self) -> EntityId {
        self.world.create_entity()
    }

    /// Creates a solver body for `entity` and wires it into every store.
    ///
    /// Writes the transform (with a matching previous pose), physics props
    /// and, for kinematic bodies, an initial kinematic target. A body the
    /// entity already had is released first.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::UnknownEntity`] if `entity` is not alive
    /// - [`SimulationError::Physics`] for unknown materials, shape contract
    ///   violations and solver rejections; nothing is left behind
    pub fn spawn_body(&mut self, entity: EntityId, request: &BodyRequest) -> SimulationResult<BodyHandle> {
        if !self.world.is_alive(entity) {
            return Err(SimulationError::UnknownEntity(entity));
        }
        let bp = blueprint(request, &self.materials)?;
        let spawned = create_body(&mut self.solver, &bp)?;
        self.release_body(entity);

        let body = spawned.body;
        let (position, rotation) = (bp.body.position, bp.body.rotation);
        self.world
            .transforms
            .insert(entity, Transform { position, rotation, scale: finite_vec3(request.scale) });
        self.world.transforms.snapshot_pose(entity);
        self.world.physics_props.insert(
            entity,
            PhysicsProps {
                friction: bp.scaled.friction,
                restitution: bp.scaled.restitution,
                density: bp.scaled.density,
            },
        );
        if bp.body.kind == BodyKind::KinematicPositionBased {
            self.world.kinematic.insert(entity, KinematicTarget { position, rotation });
        }

        self.registry.insert(body, entity);
        self.world.rigid_bodies.insert(entity, body);
        self.bodies.insert(body, BodyRecord::new(request, &bp, &spawned));

        debug!(
            %entity,
            %body,
            shape = request.shape.kind_name(),
            kind = ?bp.body.kind,
            mass = bp.scaled.mass,
            fallback = spawned.used_fallback,
            "body spawned"
        );
        Ok(body)
    }

    /// Removes `entity`'s solver body, keeping the entity and its other
    /// components. Returns `false` if it had none.
    pub fn remove_body(&mut self, entity: EntityId) -> bool {
        self.release_body(entity).is_some()
    }

    /// Releases the solver body, then strips every component and recycles
    /// the ID. Returns `false` if `entity` is not alive.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.world.is_alive(entity) {
            return false;
        }
        self.release_body(entity);
        self.world.destroy_entity(entity)
    }

    /// Regenerates `entity`'s collider at a new scale.
    ///
    /// Mass follows the volume ratio when it was explicit, otherwise density
    /// is reapplied. The transform scale and stored density follow.
    ///
    /// # Errors
    ///
    /// [`SimulationError::NoRigidBody`] if `entity` has no body, or the
    /// physics error of the rebuild. A stale body is unlinked from the entity.
    pub fn rescale_body(&mut self, entity: EntityId, scale: Vec3) -> SimulationResult<MassProperties> {
        let body = self.body_of(entity)?;
        let props = match self.bodies.rescale(&mut self.solver, body, scale) {
            Ok(props) => props,
            Err(err @ PhysicsError::StaleHandle(_)) => {
                self.release_body(entity);
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        self.world.transforms.set_scale(entity, finite_vec3(scale));
        self.world.physics_props.set_density(entity, props.density);
        Ok(props)
    }

    /// Sets the linear velocity of `entity`'s dynamic body. Non-finite
    /// components become zero.
    ///
    /// # Errors
    ///
    /// [`SimulationError::NoRigidBody`] if `entity` has no body, or
    /// [`PhysicsError::NotDynamic`] if the body is fixed or kinematic.
    pub fn set_linear_velocity(&mut self, entity: EntityId, velocity: Vec3) -> SimulationResult<()> {
        let body = self.body_of(entity)?;
        if self.solver.set_linear_velocity(body, finite_vec3(velocity)) {
            Ok(())
        } else {
            Err(PhysicsError::NotDynamic(body).into())
        }
    }

    fn body_of(&self, entity: EntityId) -> SimulationResult<BodyHandle> {
        if !self.world.is_alive(entity) {
            return Err(SimulationError::UnknownEntity(entity));
        }
        self.world
            .rigid_bodies
            .get(entity)
            .ok_or(SimulationError::NoRigidBody(entity))
    }

    /// Unlinks and removes `entity`'s body. Ends the grab if it held it.
    fn release_body(&mut self, entity: EntityId) -> Option<BodyHandle> {
        let body = self.world.rigid_bodies.remove(entity)?;
        self.registry.remove_handle(body);
        self.bodies.remove(body);
        if self.grab.target() == Some(body) {
            self.grab.end_grab(&mut self.solver);
        }
        if self.solver.contains_body(body) {
            self.solver.remove_body(body);
        }
        debug!(%entity, %body, "body removed");
        Some(body)
    }

    // =========================================================================
    // World settings
    // =========================================================================

    /// Sets world gravity. Non-finite components become zero.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.solver.set_gravity(finite_vec3(gravity));
    }

    /// Current world gravity.
    #[must_use]
    pub fn gravity(&self) -> Vec3 {
        self.solver.gravity()
    }

    /// Sets the point steering agents flee from.
    pub fn set_threat(&mut self, threat: Option<Vec3>) {
        self.threat = threat.filter(|t| t.is_finite());
    }

    // =========================================================================
    // Grab
    // =========================================================================

    /// Grabs `entity` at the world-space `anchor`.
    ///
    /// # Errors
    ///
    /// [`SimulationError::NoRigidBody`], or the grab controller's error.
    pub fn start_grab(&mut self, entity: EntityId, anchor: Vec3) -> SimulationResult<JointHandle> {
        let body = self.body_of(entity)?;
        Ok(self.grab.start_grab(&mut self.solver, body, anchor)?)
    }

    /// Moves the hand toward `position` on the next sub-step.
    pub fn move_hand(&mut self, position: Vec3) -> bool {
        self.grab.move_hand(&mut self.solver, position)
    }

    /// Releases the current grab.
    pub fn end_grab(&mut self) {
        self.grab.end_grab(&mut self.solver);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Tears down the solver world.
    ///
    /// Every body, collider and joint is freed, and every table that held a
    /// solver handle is cleared in the same call so nothing can observe a
    /// dangling one. Entities and their non-physics components survive.
    pub fn reset_physics(&mut self) {
        let bodies = self.registry.len();
        self.solver.reset();
        self.stepper.reset();
        self.registry.clear();
        self.bodies.clear();
        self.grab.reset();
        self.bridge.clear();
        self.world.rigid_bodies.clear();
        self.impacts.clear();
        info!(bodies, "physics world reset");
    }

    /// Resets physics and drops every entity.
    pub fn clear(&mut self) {
        self.reset_physics();
        self.world.clear();
        self.stats = StepStats::default();
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Runs one rendered frame.
    ///
    /// # Arguments
    ///
    /// * `delta_ms` - Wall time since the previous frame, in milliseconds
    pub fn frame(&mut self, delta_ms: f64) -> FrameStats {
        let dt = self.frame_seconds(delta_ms);

        update_agents(&mut self.world, dt, self.threat, &self.steering, &mut self.rng);
        push_kinematic_targets(&self.world, &mut self.solver);

        self.stepper.accumulate(delta_ms);
        if self.stepper.steps_due() > 0 {
            self.world.transforms.snapshot_all();
        }

        let bridge = &mut self.bridge;
        let registry = &self.registry;
        let mut stats = self.stepper.run(&mut self.solver, |solver| {
            bridge.drain_from(solver, registry);
        });

        if stats.substeps > 0 {
            sync_transforms(&mut self.world, &self.registry, &self.solver);
        }
        stats.events_flushed = self.bridge.flush();

        resolve_impacts(
            &mut self.world,
            &self.solver,
            self.bridge.delivered(),
            &mut self.spent,
            &mut self.impacts,
        );
        let spent = std::mem::take(&mut self.spent);
        for &projectile in &spent {
            self.destroy_entity(projectile);
        }
        self.spent = spent;

        expire_projectiles(&mut self.world, dt, &mut self.expired);
        let expired = std::mem::take(&mut self.expired);
        for &projectile in &expired {
            self.destroy_entity(projectile);
        }
        self.expired = expired;

        self.stats.record(&stats);
        stats
    }

    /// Frame delta in seconds, clamped like the stepper clamps it.
    fn frame_seconds(&self, delta_ms: f64) -> f32 {
        let seconds = delta_ms / 1000.0;
        if seconds.is_finite() && seconds > 0.0 {
            seconds.min(self.stepper.max_frame_time()) as f32
        } else {
            0.0
        }
    }

    // =========================================================================
    // Rendering and events
    // =========================================================================

    /// Interpolation factor for the current frame.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.stepper.alpha()
    }

    /// Visits every transform with its interpolated pose.
    pub fn for_each_render_pose<F>(&self, visit: F)
    where
        F: FnMut(EntityId, Vec3, Quat),
    {
        self.world.transforms.for_each_interpolated(self.alpha(), visit);
    }

    /// Registers a collision callback, run at flush time.
    pub fn on_collision<F>(&mut self, listener: F)
    where
        F: FnMut(&CollisionEvent) + 'static,
    {
        self.bridge.add_listener(listener);
    }

    /// Opens a bounded channel of flushed collision events.
    #[must_use]
    pub fn subscribe(&mut self) -> Receiver<CollisionEvent> {
        self.bridge.subscribe()
    }

    /// Events delivered by the last frame.
    #[must_use]
    pub fn collisions(&self) -> &[CollisionEvent] {
        self.bridge.delivered()
    }

    /// Hits registered by the last frame.
    #[must_use]
    pub fn impacts(&self) -> &[Impact] {
        &self.impacts
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The ECS world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The component stores, mutably.
    ///
    /// Entity lifecycle and body links stay behind the context methods, so
    /// nothing done through the view can orphan a solver body.
    pub fn components_mut(&mut self) -> ComponentsMut<'_> {
        self.world.components_mut()
    }

    /// The solver.
    #[must_use]
    pub const fn solver(&self) -> &S {
        &self.solver
    }

    /// Handle ↔ entity map.
    #[must_use]
    pub const fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// Side-table record of `entity`'s body.
    #[must_use]
    pub fn body_record(&self, entity: EntityId) -> Option<&BodyRecord> {
        self.world.rigid_bodies.get(entity).and_then(|body| self.bodies.get(body))
    }

    /// The grab controller.
    #[must_use]
    pub const fn grab(&self) -> &GrabController {
        &self.grab
    }

    /// The fixed-step clock.
    #[must_use]
    pub const fn stepper(&self) -> &PhysicsStepper {
        &self.stepper
    }

    /// Totals over every frame so far.
    #[must_use]
    pub const fn stats(&self) -> &StepStats {
        &self.stats
    }

    /// Material table in use.
    #[must_use]
    pub const fn materials(&self) -> &MaterialTable {
        &self.materials
    }
}

impl<S: Solver + Default> Default for Simulation<S> {
    fn default() -> Self {
        Self::build(&SimulationConfig::default(), S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vivarium_core::Integrity;
    use vivarium_physics::ShapeDesc;

    fn boxed(size: f32) -> ShapeDesc {
        ShapeDesc::Box { size: Vec3::splat(size) }
    }

    fn reference() -> Simulation<ReferenceSolver> {
        Simulation::with_reference_solver(&SimulationConfig::default()).unwrap()
    }

    #[test]
    fn test_spawn_wires_every_store() {
        let mut sim = reference();
        let e = sim.create_entity();
        let body = sim
            .spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic).at(Vec3::new(0.0, 4.0, 0.0)))
            .unwrap();

        let world = sim.world();
        assert_eq!(world.rigid_bodies.get(e), Some(body));
        assert_eq!(sim.registry().entity(body), Some(e));
        assert_eq!(world.transforms.position(e), Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(world.transforms.previous_pose(e).map(|(p, _)| p), Some(Vec3::new(0.0, 4.0, 0.0)));
        assert_eq!(world.physics_props.get(e).unwrap().density, 1000.0);
        assert!(!world.kinematic.contains(e));
        assert_eq!(sim.body_record(e).unwrap().current.mass, 1000.0);
    }

    #[test]
    fn test_spawn_on_dead_entity_fails() {
        let mut sim = reference();
        let e = sim.create_entity();
        sim.destroy_entity(e);
        let err = sim.spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic)).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownEntity(_)));
        assert_eq!(sim.solver().body_count(), 0);
    }

    #[test]
    fn test_unknown_material_leaves_nothing_behind() {
        let mut sim = reference();
        let e = sim.create_entity();
        let err = sim
            .spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic).with_material("unobtainium"))
            .unwrap_err();
        assert!(matches!(err, SimulationError::Physics(PhysicsError::UnknownMaterial(_))));
        assert_eq!(sim.solver().body_count(), 0);
        assert!(!sim.world().transforms.contains(e));
    }

    #[test]
    fn test_kinematic_spawn_seeds_target() {
        let mut sim = reference();
        let e = sim.create_entity();
        sim.spawn_body(
            e,
            &BodyRequest::new(boxed(1.0), BodyKind::KinematicPositionBased).at(Vec3::new(1.0, 0.5, 2.0)),
        )
        .unwrap();
        assert_eq!(sim.world().kinematic.get(e).unwrap().position, Vec3::new(1.0, 0.5, 2.0));
    }

    #[test]
    fn test_destroying_grabbed_entity_ends_grab() {
        let mut sim = reference();
        let e = sim.create_entity();
        sim.spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic)).unwrap();
        sim.start_grab(e, Vec3::new(0.0, 0.5, 0.0)).unwrap();
        assert!(sim.grab().is_grabbing());

        assert!(sim.destroy_entity(e));
        assert!(!sim.grab().is_grabbing());
        assert!(sim.registry().is_empty());
        // Only the hand is left.
        assert_eq!(sim.solver().body_count(), 1);
    }

    #[test]
    fn test_grab_without_body_fails() {
        let mut sim = reference();
        let e = sim.create_entity();
        assert!(matches!(
            sim.start_grab(e, Vec3::ZERO),
            Err(SimulationError::NoRigidBody(_))
        ));
    }

    #[test]
    fn test_rescale_updates_transform_and_density() {
        let mut sim = reference();
        let e = sim.create_entity();
        sim.spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic).with_mass(10.0))
            .unwrap();

        let props = sim.rescale_body(e, Vec3::splat(2.0)).unwrap();
        assert!((props.mass - 80.0).abs() < 1e-3);
        assert_eq!(sim.world().transforms.scale(e), Some(Vec3::splat(2.0)));
        assert_eq!(sim.world().physics_props.get(e).unwrap().density, 10.0);
    }

    #[test]
    fn test_set_gravity_sanitizes() {
        let mut sim = reference();
        sim.set_gravity(Vec3::new(f32::NAN, -1.0, 0.0));
        assert_eq!(sim.gravity(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_frame_without_due_step_keeps_previous_pose() {
        let mut sim = reference();
        let e = sim.create_entity();
        sim.spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic).at(Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();

        let stats = sim.frame(5.0);
        assert_eq!(stats.substeps, 0);
        assert_eq!(sim.world().transforms.position(e), Some(Vec3::new(0.0, 10.0, 0.0)));

        let stats = sim.frame(15.0);
        assert_eq!(stats.substeps, 1);
        let (previous, _) = sim.world().transforms.previous_pose(e).unwrap();
        let current = sim.world().transforms.position(e).unwrap();
        assert_eq!(previous, Vec3::new(0.0, 10.0, 0.0));
        assert!(current.y < 10.0);
        assert_eq!(sim.stats().frames, 2);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.steering.wander_chance = f32::NAN;
        assert!(matches!(Simulation::new(&config), Err(SimulationError::Config(_))));

        let mut config = SimulationConfig::default();
        config.physics.step_hz = 0;
        assert!(matches!(
            Simulation::with_reference_solver(&config),
            Err(SimulationError::Config(_))
        ));
    }

    #[test]
    fn test_component_view_cannot_orphan_bodies() {
        let mut sim = reference();
        let e = sim.create_entity();
        let body = sim.spawn_body(e, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic)).unwrap();
        sim.components_mut().integrity.insert(e, Integrity::new(10.0, 1.0));
        sim.components_mut().names.insert(e, "crate".to_owned());
        assert_eq!(sim.world().integrity.health(e), Some(10.0));

        // Destroying through the context releases the body before the ID is recycled.
        assert!(sim.destroy_entity(e));
        let reused = sim.create_entity();
        assert_eq!(reused.index(), e.index());
        assert!(!sim.solver().contains_body(body));
        assert_eq!(sim.registry().entity(body), None);
        assert_eq!(sim.registry().handle(reused), None);
        assert!(sim.world().names.get(reused).is_none());
    }

    #[test]
    fn test_non_finite_scale_is_sanitized() {
        let mut sim = reference();
        let e = sim.create_entity();
        let request = BodyRequest::new(boxed(1.0), BodyKind::Dynamic).scaled(Vec3::new(f32::NAN, 1.0, f32::INFINITY));
        sim.spawn_body(e, &request).unwrap();

        let scale = sim.world().transforms.scale(e).unwrap();
        assert!(scale.is_finite());
        assert_eq!(scale.y, 1.0);
    }

    #[test]
    fn test_velocity_only_for_dynamic_bodies() {
        let mut sim = reference();
        let dynamic = sim.create_entity();
        let body = sim.spawn_body(dynamic, &BodyRequest::new(boxed(1.0), BodyKind::Dynamic)).unwrap();
        let fixed = sim.create_entity();
        sim.spawn_body(fixed, &BodyRequest::new(boxed(1.0), BodyKind::Fixed).at(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();

        sim.set_linear_velocity(dynamic, Vec3::new(f32::NAN, 0.0, -3.0)).unwrap();
        assert_eq!(sim.solver().body_linear_velocity(body), Some(Vec3::new(0.0, 0.0, -3.0)));
        assert!(matches!(
            sim.set_linear_velocity(fixed, Vec3::ONE),
            Err(SimulationError::Physics(PhysicsError::NotDynamic(_)))
        ));
        let bare = sim.create_entity();
        assert!(matches!(
            sim.set_linear_velocity(bare, Vec3::ONE),
            Err(SimulationError::NoRigidBody(_))
        ));
    }
}
