//! Steering agents.
//!
//! Hot loop data for the steering system: a planar target, speed, behavior
//! state, wander heading and a decision countdown.

use crate::ecs::entity::EntityId;
use crate::ecs::sparse_set::{Slot, SparseIndex};

/// Agent behavior state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum AgentState {
    /// Standing still until the decision timer runs out.
    #[default]
    Idle = 0,
    /// Walking along the current heading.
    Wander = 1,
    /// Running directly away from a threat.
    Flee = 2,
}

/// Value view of an agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Agent {
    /// Target position X.
    pub target_x: f32,
    /// Target position Z.
    pub target_z: f32,
    /// Movement speed (units per second).
    pub speed: f32,
    /// Behavior state.
    pub state: AgentState,
    /// Wander heading in radians around +Y (0 = +Z).
    pub heading: f32,
    /// Seconds until the next decision.
    pub decision_timer: f32,
}

impl Agent {
    /// Idle agent at `(x, z)` deciding after `decision_timer` seconds.
    #[must_use]
    pub const fn idle(x: f32, z: f32, speed: f32, decision_timer: f32) -> Self {
        Self {
            target_x: x,
            target_z: z,
            speed,
            state: AgentState::Idle,
            heading: 0.0,
            decision_timer,
        }
    }
}

/// Mutable column views for the steering hot loop.
///
/// All slices have the same length and are index-aligned with `entities`.
pub struct AgentColumnsMut<'a> {
    /// Dense entity array.
    pub entities: &'a [EntityId],
    /// Target X column.
    pub target_x: &'a mut [f32],
    /// Target Z column.
    pub target_z: &'a mut [f32],
    /// Speed column.
    pub speed: &'a [f32],
    /// Behavior state column.
    pub state: &'a mut [AgentState],
    /// Heading column.
    pub heading: &'a mut [f32],
    /// Decision countdown column.
    pub decision_timer: &'a mut [f32],
}

/// SoA storage for [`Agent`].
#[derive(Debug, Default)]
pub struct AgentStore {
    index: SparseIndex,
    target_x: Vec<f32>,
    target_z: Vec<f32>,
    speed: Vec<f32>,
    state: Vec<AgentState>,
    heading: Vec<f32>,
    decision_timer: Vec<f32>,
}

impl AgentStore {
    /// Creates a store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: SparseIndex::with_capacity(capacity),
            target_x: Vec::with_capacity(capacity),
            target_z: Vec::with_capacity(capacity),
            speed: Vec::with_capacity(capacity),
            state: Vec::with_capacity(capacity),
            heading: Vec::with_capacity(capacity),
            decision_timer: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites `entity`'s agent data.
    pub fn insert(&mut self, entity: EntityId, value: Agent) {
        let Some(slot) = self.index.insert(entity) else {
            return;
        };
        match slot {
            Slot::Existing(i) => {
                self.target_x[i] = value.target_x;
                self.target_z[i] = value.target_z;
                self.speed[i] = value.speed;
                self.state[i] = value.state;
                self.heading[i] = value.heading;
                self.decision_timer[i] = value.decision_timer;
            }
            Slot::Appended(_) => {
                self.target_x.push(value.target_x);
                self.target_z.push(value.target_z);
                self.speed.push(value.speed);
                self.state.push(value.state);
                self.heading.push(value.heading);
                self.decision_timer.push(value.decision_timer);
            }
        }
    }

    /// Returns `entity`'s agent data.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<Agent> {
        let i = self.index.dense_index(entity)?;
        Some(Agent {
            target_x: self.target_x[i],
            target_z: self.target_z[i],
            speed: self.speed[i],
            state: self.state[i],
            heading: self.heading[i],
            decision_timer: self.decision_timer[i],
        })
    }

    /// Forces `entity` into `state`. Returns `false` if absent.
    pub fn set_state(&mut self, entity: EntityId, state: AgentState) -> bool {
        let Some(i) = self.index.dense_index(entity) else {
            return false;
        };
        self.state[i] = state;
        true
    }

    /// Column views for hot-loop iteration.
    pub fn columns_mut(&mut self) -> AgentColumnsMut<'_> {
        AgentColumnsMut {
            entities: self.index.entities(),
            target_x: &mut self.target_x,
            target_z: &mut self.target_z,
            speed: &self.speed,
            state: &mut self.state,
            heading: &mut self.heading,
            decision_timer: &mut self.decision_timer,
        }
    }

    /// Removes `entity`. Returns `false` if absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(i) = self.index.swap_remove(entity) else {
            return false;
        };
        self.target_x.swap_remove(i);
        self.target_z.swap_remove(i);
        self.speed.swap_remove(i);
        self.state.swap_remove(i);
        self.heading.swap_remove(i);
        self.decision_timer.swap_remove(i);
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
        self.target_x.clear();
        self.target_z.clear();
        self.speed.clear();
        self.state.clear();
        self.heading.clear();
        self.decision_timer.clear();
    }
}
