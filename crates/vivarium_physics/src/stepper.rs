//! # Physics Stepper
//!
//! Fixed-timestep accumulator decoupling the solver clock from the render
//! clock.
//!
//! ## Per frame
//!
//! 1. Frame delta (ms) → seconds, clamped to `max_frame_time`
//! 2. Added to the accumulator
//! 3. While a full step is banked: `solver.step()`, then the per-step callback
//! 4. After `max_steps` sub-steps with time still banked, the rest is discarded
//!
//! [`PhysicsStepper::alpha`] is the fractional progress toward the next step.

use tracing::warn;
use vivarium_shared::{MAX_FRAME_TIME, MAX_STEPS, STEP_HZ};

use crate::solver::Solver;

/// What one frame of stepping did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Solver sub-steps run.
    pub substeps: u32,
    /// Seconds discarded by the sub-step cap.
    pub dropped_time: f64,
    /// Collision events delivered after stepping.
    pub events_flushed: usize,
    /// Interpolation factor left for rendering.
    pub alpha: f32,
}

/// Running totals over many frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepStats {
    /// Frames recorded.
    pub frames: u64,
    /// Sub-steps over all frames.
    pub substeps: u64,
    /// Frames that hit the sub-step cap.
    pub capped_frames: u64,
    /// Seconds discarded over all frames.
    pub dropped_time: f64,
    /// Collision events delivered over all frames.
    pub events_flushed: u64,
}

impl StepStats {
    /// Records one frame.
    pub fn record(&mut self, frame: &FrameStats) {
        self.frames += 1;
        self.substeps += u64::from(frame.substeps);
        self.events_flushed += frame.events_flushed as u64;
        if frame.dropped_time > 0.0 {
            self.capped_frames += 1;
            self.dropped_time += frame.dropped_time;
        }
    }

    /// Average sub-steps per frame.
    #[must_use]
    pub fn avg_substeps(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.substeps as f64 / self.frames as f64
    }

    /// Fraction of frames that hit the cap.
    #[must_use]
    pub fn capped_ratio(&self) -> f64 {
        if self.frames == 0 {
            return 0.0;
        }
        self.capped_frames as f64 / self.frames as f64
    }
}

/// Fixed-timestep accumulator.
#[derive(Clone, Debug)]
pub struct PhysicsStepper {
    accumulator: f64,
    step_size: f64,
    max_steps: u32,
    max_frame_time: f64,
}

impl PhysicsStepper {
    /// Creates a stepper.
    ///
    /// # Arguments
    ///
    /// * `step_hz` - Sub-steps per simulated second (zero is treated as one)
    /// * `max_steps` - Sub-step cap per frame (zero is treated as one)
    /// * `max_frame_time` - Ceiling on a single frame delta, in seconds
    #[must_use]
    pub fn new(step_hz: u32, max_steps: u32, max_frame_time: f64) -> Self {
        let max_frame_time = if max_frame_time.is_finite() && max_frame_time > 0.0 {
            max_frame_time
        } else {
            MAX_FRAME_TIME
        };
        Self {
            accumulator: 0.0,
            step_size: 1.0 / f64::from(step_hz.max(1)),
            max_steps: max_steps.max(1),
            max_frame_time,
        }
    }

    /// Banks a frame delta. Non-finite or negative deltas bank nothing.
    ///
    /// # Arguments
    ///
    /// * `delta_ms` - Wall time since the previous frame, in milliseconds
    pub fn accumulate(&mut self, delta_ms: f64) {
        let seconds = delta_ms / 1000.0;
        if seconds.is_finite() && seconds > 0.0 {
            self.accumulator += seconds.min(self.max_frame_time);
        }
    }

    /// Sub-steps the next [`Self::run`] will perform.
    #[must_use]
    pub fn steps_due(&self) -> u32 {
        let banked = (self.accumulator / self.step_size).floor();
        if banked >= f64::from(self.max_steps) {
            self.max_steps
        } else {
            banked as u32
        }
    }

    /// Runs every banked sub-step.
    ///
    /// `after_step` runs once after each `solver.step()`, before the next one.
    pub fn run<S, F>(&mut self, solver: &mut S, mut after_step: F) -> FrameStats
    where
        S: Solver + ?Sized,
        F: FnMut(&mut S),
    {
        let mut substeps = 0;
        while self.accumulator >= self.step_size {
            if substeps == self.max_steps {
                let dropped_time = self.accumulator;
                self.accumulator = 0.0;
                warn!(
                    dropped_ms = dropped_time * 1000.0,
                    max_steps = self.max_steps,
                    "physics fell behind, discarding banked time"
                );
                return FrameStats { substeps, dropped_time, events_flushed: 0, alpha: 0.0 };
            }
            solver.step();
            after_step(solver);
            self.accumulator -= self.step_size;
            substeps += 1;
        }
        FrameStats { substeps, dropped_time: 0.0, events_flushed: 0, alpha: self.alpha() }
    }

    /// [`Self::accumulate`] followed by [`Self::run`].
    pub fn advance<S, F>(&mut self, delta_ms: f64, solver: &mut S, after_step: F) -> FrameStats
    where
        S: Solver + ?Sized,
        F: FnMut(&mut S),
    {
        self.accumulate(delta_ms);
        self.run(solver, after_step)
    }

    /// Fractional progress toward the next sub-step, in `[0, 1)`.
    #[inline]
    #[must_use]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step_size).clamp(0.0, 1.0) as f32
    }

    /// Banked time in seconds.
    #[inline]
    #[must_use]
    pub const fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Sub-step size in seconds.
    #[inline]
    #[must_use]
    pub const fn step_size(&self) -> f64 {
        self.step_size
    }

    /// Sub-step cap per frame.
    #[inline]
    #[must_use]
    pub const fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Ceiling on a single frame delta, in seconds.
    #[inline]
    #[must_use]
    pub const fn max_frame_time(&self) -> f64 {
        self.max_frame_time
    }

    /// Discards banked time.
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

impl Default for PhysicsStepper {
    fn default() -> Self {
        Self::new(STEP_HZ, MAX_STEPS, MAX_FRAME_TIME)
    }
}
