//! Deterministic sparkles
//!
//! Twinkles scattered across the strip. Placement and timing come from a
//! hash of pixel index and time bucket rather than a random generator, so a
//! given elapsed time always renders the same frame and pauses replay
//! cleanly.

use embassy_time::Duration;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;
use crate::math8::{ease_in_out_quad, scale8, triangle8};

const DEFAULT_DENSITY: u8 = 26; // roughly one pixel in ten lit per cycle
const DEFAULT_FADE_MS: u64 = 250;
const DEFAULT_SEED: u32 = 0x5eed_1e5;

/// Fading twinkles at pseudo-random positions.
#[derive(Debug, Clone)]
pub struct SparkleEffect {
    color: Rgb,
    density: u8,
    fade: Duration,
    duration: Option<Duration>,
    seed: u32,
}

impl SparkleEffect {
    /// Create an endless sparkle with default density and fade.
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            density: DEFAULT_DENSITY,
            fade: Duration::from_millis(DEFAULT_FADE_MS),
            duration: None,
            seed: DEFAULT_SEED,
        }
    }

    /// Set the fraction of pixels lit per cycle (0-255 = 0.0-1.0)
    #[must_use]
    pub const fn with_density(mut self, density: u8) -> Self {
        self.density = density;
        self
    }

    /// Set the fade-in time; fade-out takes the same span
    #[must_use]
    pub const fn with_fade(mut self, fade: Duration) -> Self {
        self.fade = fade;
        self
    }

    /// Stop after `duration` instead of running until stopped
    #[must_use]
    pub const fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the hash seed, decorrelating overlapping sparkle layers
    #[must_use]
    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Simple deterministic hash for sparkle placement (no floats)
    #[inline]
    const fn hash(x: u64) -> u32 {
        // SplitMix64-style mixing, then fold down to u32.
        let mut z = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        #[allow(clippy::cast_possible_truncation)]
        {
            (z ^ (z >> 31)) as u32
        }
    }
}

impl Effect for SparkleEffect {
    const ROLE: EffectRole = EffectRole::Foreground;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if self.fade.as_millis() == 0 {
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

        // One sparkle lifetime is fade-in plus fade-out.
        let lifetime_ms = self.fade.as_millis() * 2;
        let elapsed_ms = elapsed.as_millis();
        let seed = u64::from(self.seed) << 32;

        for (i, pixel) in frame.iter_mut().enumerate() {
            // Per-pixel phase offset so sparkles do not blink in unison.
            let offset = u64::from(Self::hash(seed ^ i as u64)) % lifetime_ms;
            let local_ms = elapsed_ms + offset;
            let cycle = local_ms / lifetime_ms;

            let roll = Self::hash(seed ^ (cycle << 20) ^ i as u64);
            if (roll & 0xFF) >= u32::from(self.density) {
                continue;
            }

            let phase = Duration::from_millis(local_ms % lifetime_ms);
            // Eased ramp up and back down over one lifetime.
            let level =
                ease_in_out_quad(triangle8(phase, Duration::from_millis(lifetime_ms)));
            *pixel = Rgb::new(
                scale8(self.color.r, level),
                scale8(self.color.g, level),
                scale8(self.color.b, level),
            );
        }

        Ok(StepResult::Running)
    }
}
