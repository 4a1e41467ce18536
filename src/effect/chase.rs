//! Chasing dot group
//!
//! A group of dots running around the strip, wrapping at the ends. Runs
//! until stopped.

use embassy_time::Duration;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;

const DEFAULT_DOT_SIZE: usize = 3;
const DEFAULT_SPEED_PX_PER_SEC: u32 = 10;

/// Endless wrapping chase.
#[derive(Debug, Clone)]
pub struct ChaseEffect {
    color: Rgb,
    dot_size: usize,
    speed: u32,
    reverse: bool,
    width: usize,
}

impl ChaseEffect {
    /// Create a forward chase with default dot size and speed.
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            dot_size: DEFAULT_DOT_SIZE,
            speed: DEFAULT_SPEED_PX_PER_SEC,
            reverse: false,
            width: 0,
        }
    }

    /// Set the number of adjacent lit pixels
    #[must_use]
    pub const fn with_dot_size(mut self, dot_size: usize) -> Self {
        self.dot_size = dot_size;
        self
    }

    /// Set the travel speed in pixels per second
    #[must_use]
    pub const fn with_speed(mut self, pixels_per_second: u32) -> Self {
        self.speed = pixels_per_second;
        self
    }

    /// Run from the last pixel towards the first
    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

impl Effect for ChaseEffect {
    const ROLE: EffectRole = EffectRole::Foreground;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if width == 0 || self.dot_size == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if self.dot_size > width {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.width = width;
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        let travel =
            ((elapsed.as_millis() * u64::from(self.speed)) / 1_000) as usize;
        let position = if self.reverse {
            (self.width - (travel % self.width)) % self.width
        } else {
            travel % self.width
        };

        for offset in 0..self.dot_size {
            let index = (position + offset) % self.width;
            frame[index] = self.color;
        }

        Ok(StepResult::Running)
    }
}
