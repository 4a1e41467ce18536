//! Directional background wipes
//!
//! Fills the background buffer with one color over a fixed duration, in one
//! of four sweep directions.

use embassy_time::Duration;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;

const DEFAULT_DURATION_MS: u64 = 1_000;

/// Sweep direction of a [`WipeEffect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WipeDirection {
    /// First pixel to last
    LowHigh,
    /// Last pixel to first
    HighLow,
    /// Both ends towards the center
    OutsideIn,
    /// Center towards both ends
    InsideOut,
}

/// Fills a strip's background with a color over `duration`.
#[derive(Debug, Clone)]
pub struct WipeEffect {
    color: Rgb,
    direction: WipeDirection,
    duration: Duration,
    width: usize,
}

impl WipeEffect {
    /// Create a low-to-high wipe completing after one second.
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            direction: WipeDirection::LowHigh,
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
            width: 0,
        }
    }

    /// Set the sweep direction
    #[must_use]
    pub const fn with_direction(mut self, direction: WipeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set the total sweep duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of pixels covered at `elapsed`.
    #[allow(clippy::cast_possible_truncation)]
    fn covered(&self, elapsed: Duration) -> usize {
        if elapsed.as_millis() >= self.duration.as_millis() {
            return self.width;
        }
        let filled = (elapsed.as_millis() * self.width as u64)
            / self.duration.as_millis();
        (filled as usize).min(self.width)
    }
}

impl Effect for WipeEffect {
    const ROLE: EffectRole = EffectRole::Background;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if self.duration.as_millis() == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        self.width = width;
        Ok(())
    }

    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        let covered = self.covered(elapsed);
        let width = self.width;

        match self.direction {
            WipeDirection::LowHigh => {
                for pixel in &mut frame[..covered] {
                    *pixel = self.color;
                }
            }
            WipeDirection::HighLow => {
                for pixel in &mut frame[width - covered..] {
                    *pixel = self.color;
                }
            }
            WipeDirection::OutsideIn => {
                // Left side leads on odd pixel counts so the center lands last.
                let left = covered.div_ceil(2);
                let right = covered / 2;
                for pixel in &mut frame[..left] {
                    *pixel = self.color;
                }
                for pixel in &mut frame[width - right..] {
                    *pixel = self.color;
                }
            }
            WipeDirection::InsideOut => {
                let start = (width - covered) / 2;
                for pixel in &mut frame[start..start + covered] {
                    *pixel = self.color;
                }
            }
        }

        if covered >= width {
            Ok(StepResult::Complete)
        } else {
            Ok(StepResult::Running)
        }
    }
}
