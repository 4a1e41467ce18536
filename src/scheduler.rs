//! Virtual-time event queue
//!
//! Deferred dispatcher actions ordered by a logical clock anchored at the
//! start of a run. Actions due at the same instant fire in registration
//! order via a monotonically increasing sequence tie-breaker.

use core::cmp::Ordering;

use embassy_time::Duration;
use heapless::binary_heap::{BinaryHeap, Min};

use crate::color::Rgb;
use crate::effect::{EffectId, EffectSlot};
use crate::strip::StripId;

/// Maximum number of pending scheduled actions.
pub const EVENT_QUEUE_SIZE: usize = 32;

/// A deferred dispatcher operation.
#[derive(Debug, Clone)]
pub enum Action<const MAX_LEDS: usize> {
    /// Start a background effect on `strip`.
    StartBackground {
        strip: StripId,
        effect: EffectSlot<MAX_LEDS>,
    },
    /// Start a foreground or composite effect on `strip`.
    StartForeground {
        strip: StripId,
        effect: EffectSlot<MAX_LEDS>,
    },
    /// Stop an effect by handle.
    Stop(EffectId),
    /// Stop every effect and drop all pending actions.
    StopAll,
    /// Overwrite a strip's background with one color.
    ClearBackground { strip: StripId, color: Rgb },
}

/// The event queue rejected a new entry because it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleError;

/// An action with its place on the virtual clock.
#[derive(Debug, Clone)]
pub struct ScheduledAction<const MAX_LEDS: usize> {
    /// Virtual time the action becomes due.
    pub fire_at: Duration,
    /// Registration order tie-breaker.
    sequence: u32,
    /// The deferred operation.
    pub action: Action<MAX_LEDS>,
}

impl<const MAX_LEDS: usize> PartialEq for ScheduledAction<MAX_LEDS> {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.sequence == other.sequence
    }
}

impl<const MAX_LEDS: usize> Eq for ScheduledAction<MAX_LEDS> {}

impl<const MAX_LEDS: usize> PartialOrd for ScheduledAction<MAX_LEDS> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const MAX_LEDS: usize> Ord for ScheduledAction<MAX_LEDS> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fire_at, self.sequence).cmp(&(other.fire_at, other.sequence))
    }
}

/// Min-heap of scheduled actions ordered by `(fire_at, sequence)`.
pub struct EventQueue<const MAX_LEDS: usize> {
    heap: BinaryHeap<ScheduledAction<MAX_LEDS>, Min, EVENT_QUEUE_SIZE>,
    next_sequence: u32,
}

impl<const MAX_LEDS: usize> EventQueue<MAX_LEDS> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check whether no actions are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queue `action` to fire at virtual time `fire_at`.
    pub fn schedule(
        &mut self,
        fire_at: Duration,
        action: Action<MAX_LEDS>,
    ) -> Result<(), ScheduleError> {
        let entry = ScheduledAction {
            fire_at,
            sequence: self.next_sequence,
            action,
        };
        self.heap.push(entry).map_err(|_| ScheduleError)?;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        Ok(())
    }

    /// Pop the next action due at or before `virtual_now`.
    pub fn pop_due(&mut self, virtual_now: Duration) -> Option<ScheduledAction<MAX_LEDS>> {
        if self.heap.peek()?.fire_at.as_millis() > virtual_now.as_millis() {
            return None;
        }
        self.heap.pop()
    }

    /// Drop every pending action.
    pub fn clear(&mut self) {
        while self.heap.pop().is_some() {}
    }
}

impl<const MAX_LEDS: usize> Default for EventQueue<MAX_LEDS> {
    fn default() -> Self {
        Self::new()
    }
}
