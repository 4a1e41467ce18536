//! Whole-background fade
//!
//! Captures the background at start and blends every pixel towards a target
//! color, hue along the shorter arc.

use embassy_time::Duration;
use heapless::Vec;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::{Rgb, interpolate};
use crate::math8::progress8;

const DEFAULT_DURATION_MS: u64 = 1_000;

/// Fades a strip's entire background to `target` over `duration`.
#[derive(Debug, Clone)]
pub struct FadeEffect<const MAX_LEDS: usize> {
    target: Rgb,
    duration: Duration,
    from: Vec<Rgb, MAX_LEDS>,
}

impl<const MAX_LEDS: usize> FadeEffect<MAX_LEDS> {
    /// Create a fade to `target` completing after one second.
    pub const fn new(target: Rgb) -> Self {
        Self {
            target,
            duration: Duration::from_millis(DEFAULT_DURATION_MS),
            from: Vec::new(),
        }
    }

    /// Set the fade duration
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

impl<const MAX_LEDS: usize> Effect for FadeEffect<MAX_LEDS> {
    const ROLE: EffectRole = EffectRole::Background;

    fn start(&mut self, width: usize, background: &[Rgb]) -> Result<(), ConfigError> {
        if self.duration.as_millis() == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        // Snapshot the starting colors; the blend runs per pixel from here.
        self.from.clear();
        let _ = self.from.extend_from_slice(background);
        Ok(())
    }

    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        let t = progress8(elapsed, self.duration);

        for (pixel, from) in frame.iter_mut().zip(self.from.iter()) {
            *pixel = interpolate(*from, self.target, t);
        }

        if elapsed.as_millis() >= self.duration.as_millis() {
            Ok(StepResult::Complete)
        } else {
            Ok(StepResult::Running)
        }
    }
}
