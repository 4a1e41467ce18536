//! Row playback from an external source
//!
//! Plays pre-rendered rows of colors (typically decoded image rows) into the
//! background buffer, one row per frame interval. Decoding and resizing stay
//! outside the crate; the source is a plain function so no allocation is
//! needed.

use embassy_time::Duration;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;

const DEFAULT_ROW_INTERVAL_MS: u64 = 33;

/// Failure reported by a [`RowSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSourceError;

/// Supplies one row of colors per call.
///
/// Writes row `row` into `out` and returns `Ok(true)`, or `Ok(false)` once
/// the source is exhausted. `out` is the full strip width; sources with
/// narrower rows should leave the tail untouched.
pub type RowSource = fn(row: usize, out: &mut [Rgb]) -> Result<bool, RowSourceError>;

/// Plays rows from a [`RowSource`] into the background.
#[derive(Debug, Clone)]
pub struct PlaybackEffect {
    source: RowSource,
    row_interval: Duration,
    duration: Option<Duration>,
}

impl PlaybackEffect {
    /// Create a playback stepping one row per default interval.
    pub const fn new(source: RowSource) -> Self {
        Self {
            source,
            row_interval: Duration::from_millis(DEFAULT_ROW_INTERVAL_MS),
            duration: None,
        }
    }

    /// Set the time each row stays on the strip
    #[must_use]
    pub const fn with_row_interval(mut self, interval: Duration) -> Self {
        self.row_interval = interval;
        self
    }

    /// Stop after `duration` even if the source has more rows
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl Effect for PlaybackEffect {
    const ROLE: EffectRole = EffectRole::Background;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if self.row_interval.as_millis() == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if let Some(duration) = self.duration {
            if duration.as_millis() == 0 {
                return Err(ConfigError::ZeroDuration);
            }
        }
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        if let Some(duration) = self.duration {
            if elapsed.as_millis() >= duration.as_millis() {
                return Ok(StepResult::Complete);
            }
        }

        let row = (elapsed.as_millis() / self.row_interval.as_millis()) as usize;
        match (self.source)(row, frame) {
            Ok(true) => Ok(StepResult::Running),
            Ok(false) => Ok(StepResult::Complete),
            Err(error) => Err(EffectError::Source(error)),
        }
    }
}
