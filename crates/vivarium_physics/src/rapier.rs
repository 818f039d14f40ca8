//! # Rapier Backend
//!
//! [`Solver`] over a `rapier3d` physics pipeline. This is the production
//! backend; [`ReferenceSolver`](crate::ReferenceSolver) stays as the small
//! deterministic double for tests.
//!
//! ## Handles
//!
//! Rapier's arena handles restart from zero when the sets are rebuilt, so
//! they never leave this module. Every body, collider and joint gets a
//! monotonic id instead, kept in lookup tables and stamped into the body's
//! `user_data` so contact events can be translated back without a scan.
//!
//! ## Events
//!
//! Colliders are created with collision events enabled. The pipeline pushes
//! them into a crossbeam channel during `step()`; `drain_collision_events`
//! empties it. Events whose collider is already gone are skipped.

use std::collections::HashMap;

use crossbeam_channel::Receiver;
use rapier3d::na::{DMatrix, Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude as rapier;
use tracing::debug;
use vivarium_shared::constants::DEFAULT_GRAVITY;
use vivarium_shared::{BodyHandle, ColliderHandle, JointHandle, Quat, Vec3, STEP_SIZE};

use crate::error::SolverError;
use crate::solver::{
    BodyDesc, BodyKind, ColliderDesc, ColliderShape, RawContactEvent, Solver, SpringJointDesc,
};

/// Every set the pipeline steps over. Rebuilt wholesale on reset.
struct Sets {
    islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    bodies: rapier::RigidBodySet,
    colliders: rapier::ColliderSet,
    impulse_joints: rapier::ImpulseJointSet,
    multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,
}

impl Sets {
    fn new() -> Self {
        Self {
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
        }
    }
}

/// `rapier3d`-backed implementation of [`Solver`].
pub struct RapierSolver {
    gravity: Vector3<f32>,
    params: rapier::IntegrationParameters,
    pipeline: rapier::PhysicsPipeline,
    sets: Sets,
    collector: rapier::ChannelEventCollector,
    collision_events: Receiver<rapier::CollisionEvent>,

    bodies: HashMap<BodyHandle, rapier::RigidBodyHandle>,
    colliders: HashMap<ColliderHandle, rapier::ColliderHandle>,
    joints: HashMap<JointHandle, rapier::ImpulseJointHandle>,
    next_id: u64,
    steps_taken: u64,
}

impl RapierSolver {
    /// Creates an empty world with the given gravity and a 1/60 s step.
    #[must_use]
    pub fn new(gravity: Vec3) -> Self {
        let (collision_send, collision_events) = crossbeam_channel::unbounded();
        // Contact force events are never enabled on our colliders.
        let (force_send, _) = crossbeam_channel::unbounded();
        let mut params = rapier::IntegrationParameters::default();
        params.dt = STEP_SIZE as f32;

        Self {
            gravity: to_vector(gravity),
            params,
            pipeline: rapier::PhysicsPipeline::new(),
            sets: Sets::new(),
            collector: rapier::ChannelEventCollector::new(collision_send, force_send),
            collision_events,
            bodies: HashMap::new(),
            colliders: HashMap::new(),
            joints: HashMap::new(),
            next_id: 1,
            steps_taken: 0,
        }
    }

    /// Number of live bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of live colliders.
    #[must_use]
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Number of live joints.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Checks if `joint` is live.
    #[must_use]
    pub fn contains_joint(&self, joint: JointHandle) -> bool {
        self.joints.contains_key(&joint)
    }

    /// Total `step()` calls over the solver's lifetime, resets included.
    #[must_use]
    pub const fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Current fixed step in seconds.
    #[must_use]
    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    fn issue(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn body(&self, body: BodyHandle) -> Option<&rapier::RigidBody> {
        self.bodies.get(&body).and_then(|raw| self.sets.bodies.get(*raw))
    }

    fn body_mut(&mut self, body: BodyHandle) -> Option<&mut rapier::RigidBody> {
        let raw = *self.bodies.get(&body)?;
        self.sets.bodies.get_mut(raw)
    }

    /// Our handle for the body owning `collider`.
    fn owner(&self, collider: rapier::ColliderHandle) -> Option<BodyHandle> {
        let parent = self.sets.colliders.get(collider)?.parent()?;
        let body = self.sets.bodies.get(parent)?;
        u64::try_from(body.user_data).ok().map(BodyHandle::from_raw)
    }

    /// Drops table entries whose rapier object went away with a body.
    fn prune_attachments(&mut self) {
        let colliders = &self.sets.colliders;
        self.colliders.retain(|_, raw| colliders.get(*raw).is_some());
        let joints = &self.sets.impulse_joints;
        self.joints.retain(|_, raw| joints.get(*raw).is_some());
    }
}

impl Default for RapierSolver {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_GRAVITY))
    }
}

impl Solver for RapierSolver {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle::from_raw(self.issue());
        let builder = match desc.kind {
            BodyKind::Dynamic => rapier::RigidBodyBuilder::dynamic(),
            BodyKind::Fixed => rapier::RigidBodyBuilder::fixed(),
            BodyKind::KinematicPositionBased => rapier::RigidBodyBuilder::kinematic_position_based(),
        };
        let body = builder
            .position(to_isometry(desc.position, desc.rotation))
            .user_data(u128::from(handle.to_raw()))
            .build();
        let raw = self.sets.bodies.insert(body);
        self.bodies.insert(handle, raw);
        handle
    }

    fn create_collider(
        &mut self,
        body: BodyHandle,
        desc: &ColliderDesc,
    ) -> Result<ColliderHandle, SolverError> {
        let Some(&parent) = self.bodies.get(&body) else {
            return Err(SolverError::UnknownBody(body));
        };
        if !(desc.mass.is_finite() && desc.mass >= 0.0) {
            return Err(SolverError::InvalidShape(format!("collider mass {}", desc.mass)));
        }
        let collider = collider_builder(&desc.shape)?
            .friction(desc.friction)
            .restitution(desc.restitution)
            .mass(desc.mass)
            .active_events(rapier::ActiveEvents::COLLISION_EVENTS)
            .build();

        let raw = self
            .sets
            .colliders
            .insert_with_parent(collider, parent, &mut self.sets.bodies);
        let handle = ColliderHandle::from_raw(self.issue());
        self.colliders.insert(handle, raw);
        Ok(handle)
    }

    fn remove_collider(&mut self, collider: ColliderHandle) -> bool {
        let Some(raw) = self.colliders.remove(&collider) else {
            return false;
        };
        let sets = &mut self.sets;
        sets.colliders
            .remove(raw, &mut sets.islands, &mut sets.bodies, true)
            .is_some()
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        let Some(raw) = self.bodies.remove(&body) else {
            return false;
        };
        let sets = &mut self.sets;
        let removed = sets
            .bodies
            .remove(
                raw,
                &mut sets.islands,
                &mut sets.colliders,
                &mut sets.impulse_joints,
                &mut sets.multibody_joints,
                true,
            )
            .is_some();
        self.prune_attachments();
        removed
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.body(body).is_some()
    }

    fn body_kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.body(body).map(|rb| match rb.body_type() {
            rapier::RigidBodyType::Dynamic => BodyKind::Dynamic,
            rapier::RigidBodyType::Fixed => BodyKind::Fixed,
            rapier::RigidBodyType::KinematicPositionBased
            | rapier::RigidBodyType::KinematicVelocityBased => BodyKind::KinematicPositionBased,
        })
    }

    fn body_mass(&self, body: BodyHandle) -> Option<f32> {
        let rb = self.body(body)?;
        Some(
            rb.colliders()
                .iter()
                .filter_map(|c| self.sets.colliders.get(*c))
                .map(rapier::Collider::mass)
                .sum(),
        )
    }

    fn body_pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        self.body(body)
            .map(|rb| (from_vector(rb.translation()), from_rotation(rb.rotation())))
    }

    fn body_linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.body(body).map(|rb| from_vector(rb.linvel()))
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        match self.body_mut(body) {
            Some(rb) if rb.is_dynamic() => {
                rb.set_linvel(to_vector(velocity), true);
                true
            }
            _ => false,
        }
    }

    fn set_body_pose(&mut self, body: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        let Some(rb) = self.body_mut(body) else {
            return false;
        };
        let pose = to_isometry(position, rotation);
        rb.set_position(pose, true);
        rb.set_linvel(Vector3::zeros(), true);
        rb.set_angvel(Vector3::zeros(), true);
        if rb.is_kinematic() {
            rb.set_next_kinematic_position(pose);
        }
        true
    }

    fn set_next_kinematic_pose(
        &mut self,
        body: BodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> bool {
        match self.body_mut(body) {
            Some(rb) if rb.is_kinematic() => {
                rb.set_next_kinematic_position(to_isometry(position, rotation));
                rb.wake_up(true);
                true
            }
            _ => false,
        }
    }

    fn set_next_kinematic_translation(&mut self, body: BodyHandle, position: Vec3) -> bool {
        match self.body_mut(body) {
            Some(rb) if rb.is_kinematic() => {
                rb.set_next_kinematic_translation(to_vector(position));
                rb.wake_up(true);
                true
            }
            _ => false,
        }
    }

    fn create_spring_joint(&mut self, desc: &SpringJointDesc) -> Result<JointHandle, SolverError> {
        let mut ends = [None, None];
        for (slot, body) in ends.iter_mut().zip([desc.body1, desc.body2]) {
            match self.bodies.get(&body) {
                Some(raw) => *slot = Some(*raw),
                None => return Err(SolverError::UnknownBody(body)),
            }
        }
        let [Some(body1), Some(body2)] = ends else {
            return Err(SolverError::JointRejected("joint ends unresolved".into()));
        };
        if desc.body1 == desc.body2 {
            return Err(SolverError::JointRejected("joint needs two distinct bodies".into()));
        }
        let params = [desc.rest_length, desc.stiffness, desc.damping];
        if params.iter().any(|p| !p.is_finite() || *p < 0.0)
            || !desc.local_anchor1.is_finite()
            || !desc.local_anchor2.is_finite()
        {
            return Err(SolverError::JointRejected(format!(
                "invalid spring parameters: rest {} stiffness {} damping {}",
                desc.rest_length, desc.stiffness, desc.damping
            )));
        }

        let joint = rapier::SpringJointBuilder::new(desc.rest_length, desc.stiffness, desc.damping)
            .local_anchor1(to_point(desc.local_anchor1))
            .local_anchor2(to_point(desc.local_anchor2))
            .build();
        let raw = self.sets.impulse_joints.insert(body1, body2, joint, true);
        let handle = JointHandle::from_raw(self.issue());
        self.joints.insert(handle, raw);
        Ok(handle)
    }

    fn remove_joint(&mut self, joint: JointHandle) -> Result<(), SolverError> {
        let raw = self.joints.remove(&joint).ok_or(SolverError::UnknownJoint(joint))?;
        self.sets
            .impulse_joints
            .remove(raw, true)
            .map(|_| ())
            .ok_or(SolverError::UnknownJoint(joint))
    }

    fn step(&mut self) {
        let sets = &mut self.sets;
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut sets.islands,
            &mut sets.broad_phase,
            &mut sets.narrow_phase,
            &mut sets.bodies,
            &mut sets.colliders,
            &mut sets.impulse_joints,
            &mut sets.multibody_joints,
            &mut sets.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.steps_taken += 1;
    }

    fn drain_collision_events(&mut self, sink: &mut dyn FnMut(RawContactEvent)) {
        for event in self.collision_events.try_iter() {
            let (Some(body_a), Some(body_b)) = (self.owner(event.collider1()), self.owner(event.collider2()))
            else {
                continue;
            };
            sink(RawContactEvent { body_a, body_b, started: event.started() });
        }
    }

    fn for_each_active_body(&self, visit: &mut dyn FnMut(BodyHandle, Vec3, Quat)) {
        for (_, rb) in self.sets.bodies.iter() {
            if rb.is_fixed() {
                continue;
            }
            if let Ok(raw) = u64::try_from(rb.user_data) {
                visit(BodyHandle::from_raw(raw), from_vector(rb.translation()), from_rotation(rb.rotation()));
            }
        }
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
    }

    fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    fn set_timestep(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.params.dt = dt;
        }
    }

    fn reset(&mut self) {
        let bodies = self.bodies.len();
        self.sets = Sets::new();
        self.pipeline = rapier::PhysicsPipeline::new();
        self.collision_events.try_iter().for_each(drop);
        self.bodies.clear();
        self.colliders.clear();
        self.joints.clear();
        debug!(bodies, "rapier world rebuilt");
    }
}

// =============================================================================
// Conversions
// =============================================================================

fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_point(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::try_new(Quaternion::new(q.w, q.x, q.y, q.z), f32::EPSILON)
        .unwrap_or_else(UnitQuaternion::identity)
}

fn from_rotation(q: &UnitQuaternion<f32>) -> Quat {
    let c = q.quaternion().coords;
    Quat::new(c.x, c.y, c.z, c.w)
}

fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::new(position.x, position.y, position.z), to_rotation(rotation))
}

/// Rapier builder for a validated shape.
fn collider_builder(shape: &ColliderShape) -> Result<rapier::ColliderBuilder, SolverError> {
    shape.local_bounds()?;
    let builder = match shape {
        ColliderShape::Cuboid { half_extents: h } => rapier::ColliderBuilder::cuboid(h.x, h.y, h.z),
        ColliderShape::Ball { radius } => rapier::ColliderBuilder::ball(*radius),
        ColliderShape::Cylinder { half_height, radius } => {
            rapier::ColliderBuilder::cylinder(*half_height, *radius)
        }
        ColliderShape::Cone { half_height, radius } => rapier::ColliderBuilder::cone(*half_height, *radius),
        ColliderShape::Capsule { half_height, radius } => {
            rapier::ColliderBuilder::capsule_y(*half_height, *radius)
        }
        ColliderShape::ConvexHull { points } => {
            let points: Vec<Point3<f32>> = points.iter().copied().map(to_point).collect();
            rapier::ColliderBuilder::convex_hull(&points)
                .ok_or_else(|| SolverError::DegenerateShape("convex hull has no volume".into()))?
        }
        ColliderShape::Heightfield { rows, cols, heights, scale } => {
            rapier::ColliderBuilder::heightfield(DMatrix::from_row_slice(*rows, *cols, heights), to_vector(*scale))
        }
        ColliderShape::TriMesh { vertices, indices } => {
            let vertices: Vec<Point3<f32>> = vertices.iter().copied().map(to_point).collect();
            rapier::ColliderBuilder::trimesh(vertices, indices.clone())
        }
    };
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(solver: &mut RapierSolver, kind: BodyKind, position: Vec3, shape: ColliderShape, mass: f32) -> BodyHandle {
        let body = solver.create_body(&BodyDesc { kind, position, rotation: Quat::IDENTITY });
        solver
            .create_collider(body, &ColliderDesc { shape, friction: 0.5, restitution: 0.0, mass })
            .unwrap();
        body
    }

    fn cube(half: f32) -> ColliderShape {
        ColliderShape::Cuboid { half_extents: Vec3::splat(half) }
    }

    fn ground(solver: &mut RapierSolver) -> BodyHandle {
        spawn(
            solver,
            BodyKind::Fixed,
            Vec3::new(0.0, -0.5, 0.0),
            ColliderShape::Cuboid { half_extents: Vec3::new(10.0, 0.5, 10.0) },
            0.0,
        )
    }

    #[test]
    fn test_gravity_moves_dynamic_only() {
        let mut solver = RapierSolver::default();
        let floor = ground(&mut solver);
        let ball = spawn(&mut solver, BodyKind::Dynamic, Vec3::new(0.0, 20.0, 0.0), ColliderShape::Ball { radius: 0.5 }, 1.0);

        for _ in 0..30 {
            solver.step();
        }
        let (position, _) = solver.body_pose(ball).unwrap();
        assert!(position.y < 19.5, "ball at {position:?}");
        assert_eq!(solver.body_pose(floor).unwrap().0, Vec3::new(0.0, -0.5, 0.0));
        assert_eq!(solver.steps_taken(), 30);
    }

    #[test]
    fn test_box_lands_and_reports_contact() {
        let mut solver = RapierSolver::default();
        let floor = ground(&mut solver);
        let crate_box = spawn(&mut solver, BodyKind::Dynamic, Vec3::new(0.0, 2.0, 0.0), cube(0.5), 10.0);

        let mut started = Vec::new();
        for _ in 0..180 {
            solver.step();
            solver.drain_collision_events(&mut |event| {
                if event.started {
                    started.push((event.body_a, event.body_b));
                }
            });
        }

        let (position, _) = solver.body_pose(crate_box).unwrap();
        assert!((position.y - 0.5).abs() < 0.05, "box at {position:?}");
        assert!(started
            .iter()
            .any(|&(a, b)| (a, b) == (floor, crate_box) || (a, b) == (crate_box, floor)));
    }

    #[test]
    fn test_kinematic_reaches_next_pose() {
        let mut solver = RapierSolver::default();
        let mover = spawn(&mut solver, BodyKind::KinematicPositionBased, Vec3::ZERO, cube(0.5), 0.0);

        assert!(solver.set_next_kinematic_translation(mover, Vec3::new(1.0, 0.0, 0.0)));
        solver.step();
        let (position, _) = solver.body_pose(mover).unwrap();
        assert!(position.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-4);

        let dynamic = spawn(&mut solver, BodyKind::Dynamic, Vec3::new(5.0, 0.0, 0.0), cube(0.5), 1.0);
        assert!(!solver.set_next_kinematic_translation(dynamic, Vec3::ZERO));
        assert!(!solver.set_linear_velocity(mover, Vec3::ONE));
    }

    #[test]
    fn test_body_mass_sums_colliders() {
        let mut solver = RapierSolver::default();
        let body = spawn(&mut solver, BodyKind::Dynamic, Vec3::ZERO, cube(0.5), 7.0);
        assert!((solver.body_mass(body).unwrap() - 7.0).abs() < 1e-3);
        assert_eq!(solver.body_kind(body), Some(BodyKind::Dynamic));
    }

    #[test]
    fn test_malformed_shapes_are_rejected() {
        let mut solver = RapierSolver::default();
        let body = solver.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        let flat = ColliderShape::ConvexHull {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)],
        };
        let err = solver
            .create_collider(body, &ColliderDesc { shape: flat, friction: 0.5, restitution: 0.0, mass: 1.0 })
            .unwrap_err();
        assert!(matches!(err, SolverError::DegenerateShape(_)));

        let bad_mesh = ColliderShape::TriMesh { vertices: vec![Vec3::ZERO, Vec3::X], indices: vec![[0, 1, 2]] };
        let err = solver
            .create_collider(body, &ColliderDesc { shape: bad_mesh, friction: 0.5, restitution: 0.0, mass: 0.0 })
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidShape(_)));
        assert_eq!(solver.collider_count(), 0);
    }

    #[test]
    fn test_spring_holds_body_against_gravity() {
        let mut solver = RapierSolver::default();
        let hand = solver.create_body(&BodyDesc {
            kind: BodyKind::KinematicPositionBased,
            position: Vec3::new(0.0, 3.0, 0.0),
            rotation: Quat::IDENTITY,
        });
        let ball = spawn(&mut solver, BodyKind::Dynamic, Vec3::ZERO, ColliderShape::Ball { radius: 0.2 }, 1.0);
        let joint = solver
            .create_spring_joint(&SpringJointDesc {
                body1: hand,
                body2: ball,
                local_anchor1: Vec3::ZERO,
                local_anchor2: Vec3::ZERO,
                rest_length: 0.0,
                stiffness: 100.0,
                damping: 20.0,
            })
            .unwrap();

        for _ in 0..180 {
            solver.step();
        }
        let (position, _) = solver.body_pose(ball).unwrap();
        assert!(position.y > 1.0, "ball fell to {position:?}");

        assert!(solver.remove_joint(joint).is_ok());
        assert!(matches!(solver.remove_joint(joint), Err(SolverError::UnknownJoint(_))));
    }

    #[test]
    fn test_remove_body_drops_attachments() {
        let mut solver = RapierSolver::default();
        let a = spawn(&mut solver, BodyKind::Dynamic, Vec3::ZERO, cube(0.5), 1.0);
        let b = spawn(&mut solver, BodyKind::Dynamic, Vec3::new(3.0, 0.0, 0.0), cube(0.5), 1.0);
        solver
            .create_spring_joint(&SpringJointDesc {
                body1: a,
                body2: b,
                local_anchor1: Vec3::ZERO,
                local_anchor2: Vec3::ZERO,
                rest_length: 1.0,
                stiffness: 10.0,
                damping: 1.0,
            })
            .unwrap();

        assert!(solver.remove_body(a));
        assert!(!solver.remove_body(a));
        assert_eq!(solver.body_count(), 1);
        assert_eq!(solver.collider_count(), 1);
        assert_eq!(solver.joint_count(), 0);
    }

    #[test]
    fn test_reset_never_reissues_handles() {
        let mut solver = RapierSolver::default();
        let before = spawn(&mut solver, BodyKind::Dynamic, Vec3::ZERO, cube(0.5), 1.0);
        solver.step();
        solver.reset();

        assert!(!solver.contains_body(before));
        assert_eq!(solver.body_count(), 0);
        let after = spawn(&mut solver, BodyKind::Dynamic, Vec3::ZERO, cube(0.5), 1.0);
        assert_ne!(before, after);
        assert!(solver.contains_body(after));
        assert_eq!(solver.steps_taken(), 1);
    }
}
