//! # Collision Bridge
//!
//! Translates solver contact events into entity pairs and defers delivery.
//!
//! ```text
//! ┌──────────┐ drain per sub-step ┌──────────┐  flush once per frame  ┌─────────────┐
//! │  Solver  │───────────────────>│ pending  │───────────────────────>│ listeners   │
//! └──────────┘   (via registry)   └──────────┘                        │ channels    │
//!                                                                     │ delivered() │
//!                                                                     └─────────────┘
//! ```
//!
//! Nothing is delivered while the solver is stepping, so subscribers are free
//! to mutate the world when they see an event.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;
use vivarium_core::EntityId;
use vivarium_shared::BodyHandle;

use crate::registry::HandleRegistry;
use crate::solver::Solver;

/// Contact start/stop between two entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionEvent {
    /// First entity.
    pub entity_a: EntityId,
    /// Second entity.
    pub entity_b: EntityId,
    /// Solver body of `entity_a`.
    pub body_a: BodyHandle,
    /// Solver body of `entity_b`.
    pub body_b: BodyHandle,
    /// `true` on contact start, `false` on contact end.
    pub started: bool,
}

impl CollisionEvent {
    /// The other entity of the pair, if `entity` is part of it.
    #[must_use]
    pub fn other(&self, entity: EntityId) -> Option<EntityId> {
        if self.entity_a == entity {
            Some(self.entity_b)
        } else if self.entity_b == entity {
            Some(self.entity_a)
        } else {
            None
        }
    }
}

/// Boxed collision listener.
pub type CollisionListener = Box<dyn FnMut(&CollisionEvent)>;

/// Buffers translated collision events and flushes them at a safe point.
pub struct CollisionBridge {
    pending: Vec<CollisionEvent>,
    delivered: Vec<CollisionEvent>,
    listeners: Vec<CollisionListener>,
    channels: Vec<Sender<CollisionEvent>>,
    channel_capacity: usize,
    unmapped: u64,
    dropped: u64,
}

impl CollisionBridge {
    /// Creates a bridge.
    ///
    /// # Arguments
    ///
    /// * `channel_capacity` - Bound of each subscriber channel.
    ///   Events beyond it are dropped and counted.
    #[must_use]
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            pending: Vec::with_capacity(64),
            delivered: Vec::with_capacity(64),
            listeners: Vec::new(),
            channels: Vec::new(),
            channel_capacity: channel_capacity.max(1),
            unmapped: 0,
            dropped: 0,
        }
    }

    /// Registers a callback invoked for every event at flush time.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&CollisionEvent) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Opens a bounded channel that receives every flushed event.
    ///
    /// Dropping the receiver unsubscribes at the next flush.
    #[must_use]
    pub fn subscribe(&mut self) -> Receiver<CollisionEvent> {
        let (sender, receiver) = bounded(self.channel_capacity);
        self.channels.push(sender);
        receiver
    }

    /// Drains the solver's event queue into the pending buffer.
    ///
    /// Called after every sub-step. Events on bodies the registry doesn't
    /// know (hand bodies, bodies removed mid-frame) are skipped.
    /// Returns the number of events buffered.
    pub fn drain_from<S: Solver + ?Sized>(&mut self, solver: &mut S, registry: &HandleRegistry) -> usize {
        let before = self.pending.len();
        let pending = &mut self.pending;
        let unmapped = &mut self.unmapped;
        solver.drain_collision_events(&mut |raw| {
            match (registry.entity(raw.body_a), registry.entity(raw.body_b)) {
                (Some(entity_a), Some(entity_b)) => pending.push(CollisionEvent {
                    entity_a,
                    entity_b,
                    body_a: raw.body_a,
                    body_b: raw.body_b,
                    started: raw.started,
                }),
                _ => *unmapped += 1,
            }
        });
        self.pending.len() - before
    }

    /// Delivers every pending event to listeners and channels.
    ///
    /// The flushed events stay readable through [`Self::delivered`] until the
    /// next flush. Returns the number of events delivered.
    pub fn flush(&mut self) -> usize {
        self.delivered.clear();
        std::mem::swap(&mut self.pending, &mut self.delivered);

        for event in &self.delivered {
            for listener in &mut self.listeners {
                listener(event);
            }
        }

        let mut dropped = 0_u64;
        self.channels.retain(|sender| {
            for event in &self.delivered {
                match sender.try_send(*event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => dropped += 1,
                    Err(TrySendError::Disconnected(_)) => return false,
                }
            }
            true
        });
        if dropped > 0 {
            warn!(dropped, "collision channel full, events dropped");
            self.dropped += dropped;
        }

        self.delivered.len()
    }

    /// Events delivered by the last flush.
    #[inline]
    #[must_use]
    pub fn delivered(&self) -> &[CollisionEvent] {
        &self.delivered
    }

    /// Events waiting for the next flush.
    #[inline]
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Solver events skipped because a side was not registered.
    #[inline]
    #[must_use]
    pub const fn unmapped_count(&self) -> u64 {
        self.unmapped
    }

    /// Events dropped on full subscriber channels.
    #[inline]
    #[must_use]
    pub const fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Number of live channel subscribers as of the last flush.
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.channels.len()
    }

    /// Discards pending and delivered events. Subscribers stay registered.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.delivered.clear();
    }
}

impl Default for CollisionBridge {
    fn default() -> Self {
        Self::new(1024)
    }
}
