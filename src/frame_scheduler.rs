//! Frame scheduling and timing utilities.
//!
//! Provides portable frame pacing without async/await or platform-specific
//! timers. The caller is responsible for sleeping/waiting between frames: a
//! standalone show loops `tick` until `idle`, a hosting daemon interleaves
//! `tick` with its own readiness loop and uses `status_due` to pace push
//! updates to subscribers.

use embassy_time::{Duration, Instant};

use crate::OutputDriver;
use crate::dispatcher::{Dispatcher, StatusSnapshot};

/// Default target frame rate (30 FPS).
pub const DEFAULT_FPS: u32 = 30;

/// Default frame duration based on target FPS.
pub const DEFAULT_FRAME_DURATION: Duration =
    Duration::from_millis(1000 / DEFAULT_FPS as u64);

/// Push-status cadence for hosting processes (5 Hz).
pub const STATUS_RATE_HZ: u64 = 5;

/// Result of a frame tick operation.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    /// The deadline for the next frame.
    pub next_deadline: Instant,
    /// How long to wait until the next frame (may be zero if behind schedule).
    pub sleep: Duration,
    /// Whether both active sets and the event queue are now empty.
    pub idle: bool,
    /// Whether a status push is due on the ~5 Hz cadence.
    pub status_due: bool,
}

/// Paces a [`Dispatcher`] at a fixed frame rate.
///
/// This scheduler:
/// - Tracks frame timing with drift correction
/// - Runs one dispatcher frame per tick
/// - Returns timing info so the caller can sleep appropriately
///
/// # Usage
///
/// ```ignore
/// let mut scheduler = FrameScheduler::new(dispatcher);
///
/// loop {
///     let result = scheduler.tick(now())?;
///     if result.idle {
///         break;
///     }
///     // Platform-specific sleep
///     sleep_ms(result.sleep.as_millis());
/// }
/// ```
pub struct FrameScheduler<
    O: OutputDriver,
    const MAX_LEDS: usize,
    const MAX_STRIPS: usize,
    const MAX_EFFECTS: usize,
> {
    dispatcher: Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>,
    next_frame: Instant,
    frame_duration: Duration,
    last_status_slot: u64,
}

impl<
    O: OutputDriver,
    const MAX_LEDS: usize,
    const MAX_STRIPS: usize,
    const MAX_EFFECTS: usize,
> FrameScheduler<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>
{
    /// Create a frame scheduler at the default frame rate.
    pub fn new(dispatcher: Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>) -> Self {
        Self::with_frame_duration(dispatcher, DEFAULT_FRAME_DURATION)
    }

    /// Create a frame scheduler with a custom frame duration.
    pub fn with_frame_duration(
        dispatcher: Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>,
        frame_duration: Duration,
    ) -> Self {
        Self {
            dispatcher,
            next_frame: Instant::from_millis(0),
            frame_duration,
            last_status_slot: 0,
        }
    }

    /// Process one frame and return timing information.
    ///
    /// Falling behind by more than two frames resets the deadline to `now`
    /// instead of bursting to catch up. Flush failures propagate.
    pub fn tick(&mut self, now: Instant) -> Result<FrameResult, O::Error> {
        // Drift correction: if we've fallen too far behind, reset to now.
        // This prevents catch-up bursts after long stalls.
        let max_drift_ms = self.frame_duration.as_millis() * 2;
        if now.as_millis() > self.next_frame.as_millis() + max_drift_ms {
            self.next_frame = now;
        }

        self.dispatcher.run_frame(now)?;

        self.next_frame += self.frame_duration;

        let sleep = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        let status_slot =
            (self.dispatcher.virtual_now().as_millis() * STATUS_RATE_HZ) / 1_000;
        let status_due = status_slot != self.last_status_slot;
        self.last_status_slot = status_slot;

        Ok(FrameResult {
            next_deadline: self.next_frame,
            sleep,
            idle: self.dispatcher.is_idle(),
            status_due,
        })
    }

    /// Target frame rate in frames per second.
    #[allow(clippy::cast_possible_truncation)]
    pub fn fps(&self) -> u32 {
        let frame_ms = self.frame_duration.as_millis();
        if frame_ms == 0 {
            return 0;
        }
        (1_000 / frame_ms) as u32
    }

    /// Snapshot dispatcher state, annotated with the pacing rate.
    pub fn status(&self) -> StatusSnapshot<MAX_EFFECTS> {
        let mut snapshot = self.dispatcher.status();
        snapshot.fps = Some(self.fps());
        snapshot
    }

    /// Get a reference to the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS> {
        &self.dispatcher
    }

    /// Get a mutable reference to the dispatcher.
    pub fn dispatcher_mut(
        &mut self,
    ) -> &mut Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS> {
        &mut self.dispatcher
    }
}
