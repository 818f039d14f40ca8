//! # Reference Solver
//!
//! Deterministic in-crate [`Solver`]. Tests run on it where exact dynamics
//! matter; production worlds use [`RapierSolver`](crate::RapierSolver).
//!
//! ## Model
//!
//! - Translational dynamics only; rotation changes by teleport or kinematic target
//! - Semi-implicit Euler with gravity
//! - Springs are integrated implicitly per body, so any stiffness stays stable
//! - Contacts are world-space AABB overlaps, resolved along the axis of least
//!   penetration with restitution and Coulomb friction
//!
//! Broad phase is a plain O(n²) pair sweep. Iteration is over `BTreeMap`s keyed
//! by handle, so two solvers fed the same calls produce bit-identical results.

use std::collections::{BTreeMap, BTreeSet};

use vivarium_shared::constants::DEFAULT_GRAVITY;
use vivarium_shared::{BodyHandle, ColliderHandle, JointHandle, Quat, Vec3, STEP_SIZE};

use crate::error::SolverError;
use crate::solver::{
    BodyDesc, BodyKind, ColliderDesc, ColliderShape, RawContactEvent, Solver, SpringJointDesc,
};

/// Contact skin: boxes closer than this count as touching.
const CONTACT_SKIN: f32 = 1.0e-3;

/// Lengths below this have no usable direction.
const EPSILON: f32 = 1.0e-6;

#[derive(Debug)]
struct Body {
    kind: BodyKind,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
    next_pose: Option<(Vec3, Quat)>,
    mass: f32,
    friction: f32,
    restitution: f32,
    colliders: Vec<ColliderHandle>,
}

#[derive(Debug, Clone, Copy)]
struct Collider {
    body: BodyHandle,
    local_min: Vec3,
    local_max: Vec3,
    mass: f32,
}

/// Implicit spring terms accumulated for one body during a step.
#[derive(Debug, Default, Clone, Copy)]
struct SpringTerm {
    force: Vec3,
    stiffness: f32,
    damping: f32,
}

/// Collision proxy for one body during the contact pass.
#[derive(Debug, Clone, Copy)]
struct Proxy {
    handle: BodyHandle,
    kind: BodyKind,
    center: Vec3,
    half: Vec3,
}

/// Deterministic reference implementation of [`Solver`].
#[derive(Debug)]
pub struct ReferenceSolver {
    bodies: BTreeMap<BodyHandle, Body>,
    colliders: BTreeMap<ColliderHandle, Collider>,
    joints: BTreeMap<JointHandle, SpringJointDesc>,
    contacts: BTreeSet<(BodyHandle, BodyHandle)>,
    events: Vec<RawContactEvent>,
    gravity: Vec3,
    dt: f32,
    next_id: u64,
    steps_taken: u64,

    // Per-step scratch, reused to keep stepping allocation-free.
    spring_terms: BTreeMap<BodyHandle, SpringTerm>,
    proxies: Vec<Proxy>,
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
}

impl ReferenceSolver {
    /// Creates an empty world with the given gravity and a 1/60 s step.
    #[must_use]
    pub fn new(gravity: Vec3) -> Self {
        Self {
            bodies: BTreeMap::new(),
            colliders: BTreeMap::new(),
            joints: BTreeMap::new(),
            contacts: BTreeSet::new(),
            events: Vec::new(),
            gravity,
            dt: STEP_SIZE as f32,
            next_id: 1,
            steps_taken: 0,
            spring_terms: BTreeMap::new(),
            proxies: Vec::new(),
            touching: BTreeSet::new(),
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
    pub const fn timestep(&self) -> f32 {
        self.dt
    }

    /// Local bounds of the collider, if live.
    #[must_use]
    pub fn collider_bounds(&self, collider: ColliderHandle) -> Option<(Vec3, Vec3)> {
        self.colliders.get(&collider).map(|c| (c.local_min, c.local_max))
    }

    fn issue(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn integrate_kinematic(&mut self) {
        let inv_dt = 1.0 / self.dt;
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::KinematicPositionBased {
                continue;
            }
            match body.next_pose.take() {
                Some((position, rotation)) => {
                    body.velocity = (position - body.position) * inv_dt;
                    body.position = position;
                    body.rotation = rotation;
                }
                None => body.velocity = Vec3::ZERO,
            }
        }
    }

    fn accumulate_springs(&mut self) {
        self.spring_terms.clear();
        for joint in self.joints.values() {
            let (Some(a), Some(b)) = (self.bodies.get(&joint.body1), self.bodies.get(&joint.body2))
            else {
                continue;
            };
            let anchor_a = a.position + a.rotation.rotate(joint.local_anchor1);
            let anchor_b = b.position + b.rotation.rotate(joint.local_anchor2);
            let mut stretch = anchor_a - anchor_b;
            let len = stretch.length();
            if joint.rest_length > 0.0 && len > EPSILON {
                stretch = stretch * ((len - joint.rest_length) / len);
            }

            if b.kind == BodyKind::Dynamic {
                let term = self.spring_terms.entry(joint.body2).or_default();
                term.force += stretch * joint.stiffness + a.velocity * joint.damping;
                term.stiffness += joint.stiffness;
                term.damping += joint.damping;
            }
            if a.kind == BodyKind::Dynamic {
                let term = self.spring_terms.entry(joint.body1).or_default();
                term.force += -stretch * joint.stiffness + b.velocity * joint.damping;
                term.stiffness += joint.stiffness;
                term.damping += joint.damping;
            }
        }
    }

    fn integrate_dynamic(&mut self) {
        let dt = self.dt;
        for (handle, body) in &mut self.bodies {
            if body.kind != BodyKind::Dynamic {
                continue;
            }
            let inv_mass = if body.mass > 0.0 { 1.0 / body.mass } else { 1.0 };
            let mut velocity = body.velocity + self.gravity * dt;
            let mut denom = 1.0;
            if let Some(term) = self.spring_terms.get(handle) {
                velocity += term.force * (dt * inv_mass);
                denom += dt * (term.stiffness * dt + term.damping) * inv_mass;
            }
            body.velocity = velocity * (1.0 / denom);
            body.position += body.velocity * dt;
        }
    }

    fn gather_proxies(&mut self) {
        self.proxies.clear();
        for (&handle, body) in &self.bodies {
            let mut bounds: Option<(Vec3, Vec3)> = None;
            for collider in body.colliders.iter().filter_map(|c| self.colliders.get(c)) {
                let (min, max) = world_bounds(body, collider);
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(min), hi.max(max)),
                    None => (min, max),
                });
            }
            if let Some((min, max)) = bounds {
                self.proxies.push(Proxy {
                    handle,
                    kind: body.kind,
                    center: (min + max) * 0.5,
                    half: (max - min) * 0.5,
                });
            }
        }
    }

    fn resolve_contacts(&mut self) {
        self.gather_proxies();
        self.touching.clear();

        for i in 0..self.proxies.len() {
            for j in (i + 1)..self.proxies.len() {
                let (a, b) = (self.proxies[i], self.proxies[j]);
                if a.kind != BodyKind::Dynamic && b.kind != BodyKind::Dynamic {
                    continue;
                }
                let gap = (b.center - a.center).abs();
                let overlap = a.half + b.half - gap;
                if overlap.x < -CONTACT_SKIN || overlap.y < -CONTACT_SKIN || overlap.z < -CONTACT_SKIN {
                    continue;
                }
                self.touching.insert((a.handle, b.handle));
                if overlap.x > 0.0 && overlap.y > 0.0 && overlap.z > 0.0 {
                    let (shift_a, shift_b) = self.separate(a, b, overlap);
                    self.proxies[i].center += shift_a;
                    self.proxies[j].center += shift_b;
                }
            }
        }

        for &(a, b) in self.touching.difference(&self.contacts) {
            self.events.push(RawContactEvent { body_a: a, body_b: b, started: true });
        }
        for &(a, b) in self.contacts.difference(&self.touching) {
            self.events.push(RawContactEvent { body_a: a, body_b: b, started: false });
        }
        std::mem::swap(&mut self.contacts, &mut self.touching);
    }

    /// Pushes a penetrating pair apart and applies the contact impulse.
    /// Returns the positional shift applied to each side.
    fn separate(&mut self, a: Proxy, b: Proxy, overlap: Vec3) -> (Vec3, Vec3) {
        let delta = b.center - a.center;
        let (depth, normal) = if overlap.x <= overlap.y && overlap.x <= overlap.z {
            (overlap.x, Vec3::X * delta.x.signum())
        } else if overlap.y <= overlap.z {
            (overlap.y, Vec3::Y * delta.y.signum())
        } else {
            (overlap.z, Vec3::Z * delta.z.signum())
        };

        let Some(body_a) = self.bodies.get(&a.handle) else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        let Some(body_b) = self.bodies.get(&b.handle) else {
            return (Vec3::ZERO, Vec3::ZERO);
        };
        let wa = inverse_mass(body_a);
        let wb = inverse_mass(body_b);
        let total = wa + wb;
        if total <= 0.0 {
            return (Vec3::ZERO, Vec3::ZERO);
        }

        let shift_a = normal * (-depth * wa / total);
        let shift_b = normal * (depth * wb / total);

        let relative = body_b.velocity - body_a.velocity;
        let approach = relative.dot(normal);
        let restitution = 0.5 * (body_a.restitution + body_b.restitution);
        let friction = 0.5 * (body_a.friction + body_b.friction);
        let (mut va, mut vb) = (body_a.velocity, body_b.velocity);

        if approach < 0.0 {
            let j = -(1.0 + restitution) * approach / total;
            va -= normal * (j * wa);
            vb += normal * (j * wb);

            let tangent = relative - normal * approach;
            let slip = tangent.length();
            if slip > EPSILON {
                let jt = (slip / total).min(friction * j);
                let dir = tangent * (1.0 / slip);
                va += dir * (jt * wa);
                vb -= dir * (jt * wb);
            }
        }

        if let Some(body) = self.bodies.get_mut(&a.handle) {
            body.position += shift_a;
            body.velocity = va;
        }
        if let Some(body) = self.bodies.get_mut(&b.handle) {
            body.position += shift_b;
            body.velocity = vb;
        }
        (shift_a, shift_b)
    }
}

impl Default for ReferenceSolver {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_GRAVITY))
    }
}

impl Solver for ReferenceSolver {
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle::from_raw(self.issue());
        self.bodies.insert(
            handle,
            Body {
                kind: desc.kind,
                position: desc.position,
                rotation: desc.rotation.normalize(),
                velocity: Vec3::ZERO,
                next_pose: None,
                mass: 0.0,
                friction: 0.5,
                restitution: 0.0,
                colliders: Vec::new(),
            },
        );
        handle
    }

    fn create_collider(
        &mut self,
        body: BodyHandle,
        desc: &ColliderDesc,
    ) -> Result<ColliderHandle, SolverError> {
        if !self.bodies.contains_key(&body) {
            return Err(SolverError::UnknownBody(body));
        }
        if !(desc.mass.is_finite() && desc.mass >= 0.0) {
            return Err(SolverError::InvalidShape(format!("collider mass {}", desc.mass)));
        }
        let (local_min, local_max) = desc.shape.local_bounds()?;

        let handle = ColliderHandle::from_raw(self.issue());
        self.colliders.insert(handle, Collider { body, local_min, local_max, mass: desc.mass });
        if let Some(parent) = self.bodies.get_mut(&body) {
            parent.mass += desc.mass;
            parent.friction = desc.friction;
            parent.restitution = desc.restitution;
            parent.colliders.push(handle);
        }
        Ok(handle)
    }

    fn remove_collider(&mut self, collider: ColliderHandle) -> bool {
        let Some(removed) = self.colliders.remove(&collider) else {
            return false;
        };
        if let Some(parent) = self.bodies.get_mut(&removed.body) {
            parent.mass = (parent.mass - removed.mass).max(0.0);
            parent.colliders.retain(|c| *c != collider);
        }
        true
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        let Some(removed) = self.bodies.remove(&body) else {
            return false;
        };
        for collider in &removed.colliders {
            self.colliders.remove(collider);
        }
        self.joints.retain(|_, j| j.body1 != body && j.body2 != body);
        self.contacts.retain(|(a, b)| *a != body && *b != body);
        true
    }

    fn contains_body(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(&body)
    }

    fn body_kind(&self, body: BodyHandle) -> Option<BodyKind> {
        self.bodies.get(&body).map(|b| b.kind)
    }

    fn body_mass(&self, body: BodyHandle) -> Option<f32> {
        self.bodies.get(&body).map(|b| b.mass)
    }

    fn body_pose(&self, body: BodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies.get(&body).map(|b| (b.position, b.rotation))
    }

    fn body_linear_velocity(&self, body: BodyHandle) -> Option<Vec3> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.kind == BodyKind::Dynamic => {
                b.velocity = velocity;
                true
            }
            _ => false,
        }
    }

    fn set_body_pose(&mut self, body: BodyHandle, position: Vec3, rotation: Quat) -> bool {
        let Some(b) = self.bodies.get_mut(&body) else {
            return false;
        };
        b.position = position;
        b.rotation = rotation.normalize();
        b.velocity = Vec3::ZERO;
        b.next_pose = None;
        true
    }

    fn set_next_kinematic_pose(
        &mut self,
        body: BodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.kind == BodyKind::KinematicPositionBased => {
                b.next_pose = Some((position, rotation.normalize()));
                true
            }
            _ => false,
        }
    }

    fn set_next_kinematic_translation(&mut self, body: BodyHandle, position: Vec3) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) if b.kind == BodyKind::KinematicPositionBased => {
                let rotation = b.next_pose.map_or(b.rotation, |(_, r)| r);
                b.next_pose = Some((position, rotation));
                true
            }
            _ => false,
        }
    }

    fn create_spring_joint(&mut self, desc: &SpringJointDesc) -> Result<JointHandle, SolverError> {
        for body in [desc.body1, desc.body2] {
            if !self.bodies.contains_key(&body) {
                return Err(SolverError::UnknownBody(body));
            }
        }
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
        let handle = JointHandle::from_raw(self.issue());
        self.joints.insert(handle, *desc);
        Ok(handle)
    }

    fn remove_joint(&mut self, joint: JointHandle) -> Result<(), SolverError> {
        self.joints
            .remove(&joint)
            .map(|_| ())
            .ok_or(SolverError::UnknownJoint(joint))
    }

    fn step(&mut self) {
        self.integrate_kinematic();
        self.accumulate_springs();
        self.integrate_dynamic();
        self.resolve_contacts();
        self.steps_taken += 1;
    }

    fn drain_collision_events(&mut self, sink: &mut dyn FnMut(RawContactEvent)) {
        for event in self.events.drain(..) {
            sink(event);
        }
    }

    fn for_each_active_body(&self, visit: &mut dyn FnMut(BodyHandle, Vec3, Quat)) {
        for (&handle, body) in &self.bodies {
            if body.kind != BodyKind::Fixed {
                visit(handle, body.position, body.rotation);
            }
        }
    }

    fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
    }

    fn gravity(&self) -> Vec3 {
        self.gravity
    }

    fn set_timestep(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.dt = dt;
        }
    }

    fn reset(&mut self) {
        self.bodies.clear();
        self.colliders.clear();
        self.joints.clear();
        self.contacts.clear();
        self.events.clear();
        self.spring_terms.clear();
        self.proxies.clear();
        self.touching.clear();
    }
}

// =============================================================================
// Geometry helpers
// =============================================================================

fn inverse_mass(body: &Body) -> f32 {
    match body.kind {
        BodyKind::Dynamic if body.mass > 0.0 => 1.0 / body.mass,
        BodyKind::Dynamic => 1.0,
        BodyKind::Fixed | BodyKind::KinematicPositionBased => 0.0,
    }
}

/// World-space AABB of a collider on `body`.
fn world_bounds(body: &Body, collider: &Collider) -> (Vec3, Vec3) {
    let local_center = (collider.local_min + collider.local_max) * 0.5;
    let local_half = (collider.local_max - collider.local_min) * 0.5;
    let center = body.position + body.rotation.rotate(local_center);
    let half = body.rotation.rotate(Vec3::X).abs() * local_half.x
        + body.rotation.rotate(Vec3::Y).abs() * local_half.y
        + body.rotation.rotate(Vec3::Z).abs() * local_half.z;
    (center - half, center + half)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic_box(solver: &mut ReferenceSolver, position: Vec3, mass: f32) -> BodyHandle {
        let body = solver.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            position,
            rotation: Quat::IDENTITY,
        });
        solver
            .create_collider(
                body,
                &ColliderDesc {
                    shape: ColliderShape::Cuboid { half_extents: Vec3::splat(0.5) },
                    friction: 0.5,
                    restitution: 0.0,
                    mass,
                },
            )
            .unwrap();
        body
    }

    fn ground(solver: &mut ReferenceSolver) -> BodyHandle {
        let body = solver.create_body(&BodyDesc {
            kind: BodyKind::Fixed,
            position: Vec3::new(0.0, -0.5, 0.0),
            rotation: Quat::IDENTITY,
        });
        solver
            .create_collider(
                body,
                &ColliderDesc {
                    shape: ColliderShape::Cuboid { half_extents: Vec3::new(50.0, 0.5, 50.0) },
                    friction: 0.8,
                    restitution: 0.0,
                    mass: 0.0,
                },
            )
            .unwrap();
        body
    }

    #[test]
    fn test_gravity_integrates_dynamic_only() {
        let mut solver = ReferenceSolver::default();
        let falling = dynamic_box(&mut solver, Vec3::new(0.0, 10.0, 0.0), 1.0);
        let fixed = solver.create_body(&BodyDesc {
            kind: BodyKind::Fixed,
            position: Vec3::new(5.0, 10.0, 0.0),
            rotation: Quat::IDENTITY,
        });

        solver.step();

        assert!(solver.body_pose(falling).unwrap().0.y < 10.0);
        assert_eq!(solver.body_pose(fixed).unwrap().0.y, 10.0);
        assert_eq!(solver.steps_taken(), 1);
    }

    #[test]
    fn test_box_comes_to_rest_on_ground() {
        let mut solver = ReferenceSolver::default();
        ground(&mut solver);
        let crate_box = dynamic_box(&mut solver, Vec3::new(0.0, 2.0, 0.0), 10.0);

        for _ in 0..240 {
            solver.step();
        }

        let (position, _) = solver.body_pose(crate_box).unwrap();
        assert!((position.y - 0.5).abs() < 0.05, "resting height {}", position.y);
        assert!(solver.body_linear_velocity(crate_box).unwrap().length() < 0.5);
    }

    #[test]
    fn test_contact_events_start_and_stop() {
        let mut solver = ReferenceSolver::default();
        let floor = ground(&mut solver);
        let crate_box = dynamic_box(&mut solver, Vec3::new(0.0, 0.6, 0.0), 1.0);

        let mut events = Vec::new();
        for _ in 0..30 {
            solver.step();
        }
        solver.drain_collision_events(&mut |e| events.push(e));
        assert_eq!(events.len(), 1);
        assert!(events[0].started);
        assert_eq!((events[0].body_a, events[0].body_b), (floor, crate_box));

        events.clear();
        solver.set_body_pose(crate_box, Vec3::new(0.0, 20.0, 0.0), Quat::IDENTITY);
        solver.step();
        solver.drain_collision_events(&mut |e| events.push(e));
        assert_eq!(events.len(), 1);
        assert!(!events[0].started);
    }

    #[test]
    fn test_kinematic_follows_next_pose() {
        let mut solver = ReferenceSolver::default();
        let hand = solver.create_body(&BodyDesc {
            kind: BodyKind::KinematicPositionBased,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        assert!(solver.set_next_kinematic_translation(hand, Vec3::new(1.0, 2.0, 3.0)));
        solver.step();
        assert_eq!(solver.body_pose(hand).unwrap().0, Vec3::new(1.0, 2.0, 3.0));
        assert!(solver.body_linear_velocity(hand).unwrap().length() > 0.0);

        // No pending target: stays put.
        solver.step();
        assert_eq!(solver.body_pose(hand).unwrap().0, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(solver.body_linear_velocity(hand).unwrap(), Vec3::ZERO);
    }

    #[test]
    fn test_stiff_spring_stays_stable() {
        let mut solver = ReferenceSolver::new(Vec3::ZERO);
        let hand = solver.create_body(&BodyDesc {
            kind: BodyKind::KinematicPositionBased,
            position: Vec3::new(0.0, 5.0, 0.0),
            rotation: Quat::IDENTITY,
        });
        let light = dynamic_box(&mut solver, Vec3::ZERO, 0.01);
        let k = 2_000_000.0;
        solver
            .create_spring_joint(&SpringJointDesc {
                body1: hand,
                body2: light,
                local_anchor1: Vec3::ZERO,
                local_anchor2: Vec3::ZERO,
                rest_length: 0.0,
                stiffness: k,
                damping: 2.0 * (k * 0.01_f32).sqrt(),
            })
            .unwrap();

        for _ in 0..120 {
            solver.step();
        }
        let (position, _) = solver.body_pose(light).unwrap();
        assert!(position.is_finite());
        assert!(position.distance(Vec3::new(0.0, 5.0, 0.0)) < 0.01);
    }

    #[test]
    fn test_degenerate_hull_is_rejected() {
        let mut solver = ReferenceSolver::default();
        let body = solver.create_body(&BodyDesc {
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        let flat = ColliderShape::ConvexHull {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(1.0, 0.0, 1.0)],
        };
        let few = ColliderShape::ConvexHull { points: vec![Vec3::ZERO, Vec3::X] };
        for shape in [flat, few] {
            let result = solver.create_collider(
                body,
                &ColliderDesc { shape, friction: 0.5, restitution: 0.0, mass: 1.0 },
            );
            assert!(matches!(result, Err(SolverError::DegenerateShape(_))));
        }
    }

    #[test]
    fn test_remove_body_drops_joints_and_colliders() {
        let mut solver = ReferenceSolver::default();
        let a = dynamic_box(&mut solver, Vec3::ZERO, 1.0);
        let b = dynamic_box(&mut solver, Vec3::X * 3.0, 1.0);
        let joint = solver
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

        assert!(solver.remove_body(b));
        assert!(!solver.contains_joint(joint));
        assert_eq!(solver.collider_count(), 1);
        assert_eq!(solver.remove_joint(joint), Err(SolverError::UnknownJoint(joint)));
        assert!(!solver.remove_body(b));
    }

    #[test]
    fn test_reset_invalidates_old_handles() {
        let mut solver = ReferenceSolver::default();
        let old = dynamic_box(&mut solver, Vec3::ZERO, 1.0);
        solver.reset();
        assert!(!solver.contains_body(old));
        let fresh = dynamic_box(&mut solver, Vec3::ZERO, 1.0);
        assert_ne!(old, fresh);
        assert!(solver.body_pose(old).is_none());
    }
}
