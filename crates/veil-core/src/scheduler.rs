//! Frame scheduler: drives one draw per display refresh.
//!
//! ```text
//!  Stopped ──start──▶ Running ──pause──▶ Paused
//!     ▲                 │  ▲               │
//!     └──────stop───────┘  └────resume─────┘
//!     ▲                                    │
//!     └────────────────stop────────────────┘
//! ```
//!
//! Elapsed time is an accumulator plus the length of the current running
//! stretch, so a hidden tab freezes the clock and a visible tab resumes it
//! from the frozen value instead of jumping by the wall-clock gap.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub i32);

/// Something that can schedule and cancel frame callbacks
/// (`requestAnimationFrame` in a browser).
pub trait FrameRequester {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// The scheduler. Timestamps are milliseconds on a monotonic clock
/// (`performance.now()`); elapsed time is reported in seconds.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    state: SchedulerState,
    pending: Option<FrameHandle>,
    /// Seconds accumulated by earlier running stretches.
    accumulated: f64,
    /// Timestamp at which the current running stretch began.
    stretch_start: f64,
    /// Last elapsed value handed out; never decreases.
    last_elapsed: f64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Stopped → Running. Resets elapsed time and requests the first frame.
    /// Returns `false` if the scheduler was not stopped.
    pub fn start(&mut self, now: f64, frames: &mut dyn FrameRequester) -> bool {
        if self.state != SchedulerState::Stopped {
            log::debug!("scheduler start ignored in {:?}", self.state);
            return false;
        }
        self.accumulated = 0.0;
        self.last_elapsed = 0.0;
        self.stretch_start = now;
        self.state = SchedulerState::Running;
        self.pending = Some(frames.request_frame());
        true
    }

    /// Handle a fired frame callback.
    ///
    /// Returns the elapsed seconds to render with, or `None` when the
    /// callback is stale (not the pending handle, paused, or stopped). On
    /// success the next frame is requested before returning.
    pub fn on_frame(
        &mut self,
        handle: FrameHandle,
        now: f64,
        frames: &mut dyn FrameRequester,
    ) -> Option<f32> {
        if self.state != SchedulerState::Running || self.pending != Some(handle) {
            log::trace!("dropping stale frame {handle:?} in {:?}", self.state);
            return None;
        }
        self.pending = None;

        let elapsed = self.elapsed_at(now);
        self.last_elapsed = elapsed;

        self.pending = Some(frames.request_frame());
        Some(elapsed as f32)
    }

    /// Running → Paused (tab hidden). Cancels the pending frame and freezes
    /// the clock.
    pub fn pause(&mut self, now: f64, frames: &mut dyn FrameRequester) {
        if self.state != SchedulerState::Running {
            return;
        }
        self.accumulated = self.elapsed_at(now);
        self.last_elapsed = self.accumulated;
        self.cancel_pending(frames);
        self.state = SchedulerState::Paused;
    }

    /// Paused → Running (tab visible). Elapsed time continues from where it
    /// was frozen.
    pub fn resume(&mut self, now: f64, frames: &mut dyn FrameRequester) {
        if self.state != SchedulerState::Paused {
            return;
        }
        self.stretch_start = now;
        self.state = SchedulerState::Running;
        self.pending = Some(frames.request_frame());
    }

    /// Any → Stopped. Cancels the pending frame. Idempotent.
    pub fn stop(&mut self, frames: &mut dyn FrameRequester) {
        self.cancel_pending(frames);
        self.state = SchedulerState::Stopped;
    }

    /// Elapsed seconds as of `now`, without side effects.
    pub fn elapsed_at(&self, now: f64) -> f64 {
        let running = match self.state {
            SchedulerState::Running => ((now - self.stretch_start) / 1000.0).max(0.0),
            SchedulerState::Paused | SchedulerState::Stopped => 0.0,
        };
        (self.accumulated + running).max(self.last_elapsed)
    }

    fn cancel_pending(&mut self, frames: &mut dyn FrameRequester) {
        if let Some(handle) = self.pending.take() {
            frames.cancel_frame(handle);
        }
    }
}
