//! # Grab/Drag Interaction
//!
//! One persistent kinematic "hand" body drags a dynamic body through a
//! zero-rest-length spring.
//!
//! The hand is created lazily and revalidated before every use, because a
//! solver reset silently invalidates it. Spring constants are derived from
//! the grabbed body's mass so the grip is critically damped at any mass.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vivarium_shared::{BodyHandle, JointHandle, Quat, Vec3};

use crate::error::{PhysicsError, PhysicsResult};
use crate::solver::{BodyDesc, BodyKind, Solver, SpringJointDesc};

/// Mass → spring constant mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringTuning {
    /// Stiffness per kilogram of grabbed mass.
    pub stiffness_per_kg: f32,
    /// Stiffness floor.
    pub min_stiffness: f32,
    /// Stiffness ceiling.
    pub max_stiffness: f32,
}

impl SpringTuning {
    /// Stiffness and critical damping for a body of `mass` kg.
    ///
    /// `k = clamp(stiffness_per_kg · m, min, max)`, `d = 2·√(k·m)`.
    #[must_use]
    pub fn tune(&self, mass: f32) -> (f32, f32) {
        let mass = if mass.is_finite() { mass.max(0.0) } else { 0.0 };
        let stiffness = (self.stiffness_per_kg * mass).clamp(self.min_stiffness, self.max_stiffness);
        let damping = 2.0 * (stiffness * mass).sqrt();
        (stiffness, damping)
    }
}

impl Default for SpringTuning {
    fn default() -> Self {
        Self {
            stiffness_per_kg: 120.0,
            min_stiffness: 100.0,
            max_stiffness: 2_000_000.0,
        }
    }
}

/// Grab/drag state machine.
#[derive(Debug, Default)]
pub struct GrabController {
    hand: Option<BodyHandle>,
    joint: Option<JointHandle>,
    target: Option<BodyHandle>,
    local_anchor: Vec3,
    tuning: SpringTuning,
}

impl GrabController {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(tuning: SpringTuning) -> Self {
        Self { tuning, ..Self::default() }
    }

    /// Attaches the hand to `target` at the world-space `anchor`.
    ///
    /// Any previous grab is released first. The anchor is stored in the
    /// target's local frame, so the grip stays on the same surface point
    /// as the body rotates.
    ///
    /// # Errors
    ///
    /// - [`PhysicsError::NonFiniteAnchor`] for NaN/infinite anchors
    /// - [`PhysicsError::StaleHandle`] if `target` is gone
    /// - [`PhysicsError::NotDynamic`] for fixed or kinematic targets
    /// - [`PhysicsError::Solver`] if the solver rejects the joint
    pub fn start_grab<S: Solver + ?Sized>(
        &mut self,
        solver: &mut S,
        target: BodyHandle,
        anchor: Vec3,
    ) -> PhysicsResult<JointHandle> {
        if !anchor.is_finite() {
            return Err(PhysicsError::NonFiniteAnchor);
        }
        self.end_grab(solver);

        match solver.body_kind(target) {
            None => return Err(PhysicsError::StaleHandle(target)),
            Some(BodyKind::Dynamic) => {}
            Some(_) => return Err(PhysicsError::NotDynamic(target)),
        }
        let Some((position, rotation)) = solver.body_pose(target) else {
            return Err(PhysicsError::StaleHandle(target));
        };

        let hand = self.ensure_hand(solver);
        solver.set_body_pose(hand, anchor, Quat::IDENTITY);

        let local_anchor = rotation.inverse().rotate(anchor - position);
        let mass = solver.body_mass(target).unwrap_or(0.0);
        let (stiffness, damping) = self.tuning.tune(mass);

        let joint = solver
            .create_spring_joint(&SpringJointDesc {
                body1: hand,
                body2: target,
                local_anchor1: Vec3::ZERO,
                local_anchor2: local_anchor,
                rest_length: 0.0,
                stiffness,
                damping,
            })
            .map_err(|err| {
                warn!(%target, %err, "grab joint rejected");
                PhysicsError::from(err)
            })?;

        self.joint = Some(joint);
        self.target = Some(target);
        self.local_anchor = local_anchor;
        debug!(%target, mass, stiffness, damping, "grab started");
        Ok(joint)
    }

    /// Sets where the hand will be after the next sub-step.
    ///
    /// Returns `false` (and drops the joint reference) if the hand no longer
    /// exists. Non-finite positions are ignored.
    pub fn move_hand<S: Solver + ?Sized>(&mut self, solver: &mut S, position: Vec3) -> bool {
        let Some(hand) = self.hand else {
            return false;
        };
        if !solver.contains_body(hand) {
            self.hand = None;
            self.joint = None;
            self.target = None;
            return false;
        }
        if !position.is_finite() {
            return false;
        }
        solver.set_next_kinematic_translation(hand, position)
    }

    /// Releases the current grab. Solver errors are swallowed.
    pub fn end_grab<S: Solver + ?Sized>(&mut self, solver: &mut S) {
        self.target = None;
        let Some(joint) = self.joint.take() else {
            return;
        };
        match solver.remove_joint(joint) {
            Ok(()) => debug!(%joint, "grab ended"),
            Err(err) => debug!(%joint, %err, "grab joint already gone"),
        }
    }

    /// Forgets the hand and joint without touching the solver.
    ///
    /// Called when the solver world is torn down.
    pub fn reset(&mut self) {
        self.hand = None;
        self.joint = None;
        self.target = None;
        self.local_anchor = Vec3::ZERO;
    }

    /// Returns `true` while a joint is held.
    #[inline]
    #[must_use]
    pub const fn is_grabbing(&self) -> bool {
        self.joint.is_some()
    }

    /// Body currently grabbed.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> Option<BodyHandle> {
        self.target
    }

    /// Hand body, if created.
    #[inline]
    #[must_use]
    pub const fn hand(&self) -> Option<BodyHandle> {
        self.hand
    }

    /// Current joint, if grabbing.
    #[inline]
    #[must_use]
    pub const fn joint(&self) -> Option<JointHandle> {
        self.joint
    }

    /// Grip point in the target's local frame.
    #[inline]
    #[must_use]
    pub const fn local_anchor(&self) -> Vec3 {
        self.local_anchor
    }

    /// Active spring tuning.
    #[inline]
    #[must_use]
    pub const fn tuning(&self) -> SpringTuning {
        self.tuning
    }

    fn ensure_hand<S: Solver + ?Sized>(&mut self, solver: &mut S) -> BodyHandle {
        if let Some(hand) = self.hand.filter(|h| solver.contains_body(*h)) {
            return hand;
        }
        let hand = solver.create_body(&BodyDesc {
            kind: BodyKind::KinematicPositionBased,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        });
        self.hand = Some(hand);
        hand
    }
}
