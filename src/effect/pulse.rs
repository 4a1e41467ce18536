//! Expanding pulse
//!
//! A gaussian-profiled pulse around a center pixel: rapid expansion, a short
//! settle, then slow and rapid decay. Overwrites the base paint by default;
//! additive blending over existing pixels is an explicit opt-in.

use embassy_time::Duration;
use libm::{expf, powf};

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;

const RAPID_EXPAND_MS: u64 = 700;
const SLOW_EXPAND_MS: u64 = 300;
const SLOW_DECAY_MS: u64 = 500;
const RAPID_DECAY_MS: u64 = 500;
const TOTAL_MS: u64 = RAPID_EXPAND_MS + SLOW_EXPAND_MS + SLOW_DECAY_MS + RAPID_DECAY_MS;

const DEFAULT_INITIAL_WIDTH: usize = 10;

/// One-shot pulse expanding and contracting around a center pixel.
#[derive(Debug, Clone)]
pub struct PulseEffect {
    center: Option<usize>,
    base_color: Rgb,
    max_color: Rgb,
    initial_width: usize,
    max_width: Option<usize>,
    additive: bool,
    // Captured at start
    center_px: usize,
    peak_width: usize,
    width: usize,
}

impl PulseEffect {
    /// Create a pulse centered on the strip with default colors and widths.
    pub const fn new() -> Self {
        Self {
            center: None,
            base_color: Rgb::new(0, 0, 255),
            max_color: Rgb::new(255, 255, 255),
            initial_width: DEFAULT_INITIAL_WIDTH,
            max_width: None,
            additive: false,
            center_px: 0,
            peak_width: 0,
            width: 0,
        }
    }

    /// Set the center pixel (defaults to the strip center)
    #[must_use]
    pub const fn with_center(mut self, center: usize) -> Self {
        self.center = Some(center);
        self
    }

    /// Set the color at rest and at full brightness
    #[must_use]
    pub const fn with_colors(mut self, base: Rgb, max: Rgb) -> Self {
        self.base_color = base;
        self.max_color = max;
        self
    }

    /// Set the width at the start of the pulse
    #[must_use]
    pub const fn with_initial_width(mut self, width: usize) -> Self {
        self.initial_width = width;
        self
    }

    /// Set the width at the peak of the pulse
    #[must_use]
    pub const fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Blend additively over existing pixels instead of overwriting
    #[must_use]
    pub const fn with_additive(mut self) -> Self {
        self.additive = true;
        self
    }

    /// Width and brightness envelope factors at `elapsed`.
    #[allow(clippy::cast_precision_loss)]
    fn envelope(elapsed_ms: u64) -> (f32, f32) {
        if elapsed_ms < RAPID_EXPAND_MS {
            let t = elapsed_ms as f32 / RAPID_EXPAND_MS as f32;
            (1.0 - expf(-3.0 * t), powf(t, 1.5))
        } else if elapsed_ms < RAPID_EXPAND_MS + SLOW_EXPAND_MS {
            let t = (elapsed_ms - RAPID_EXPAND_MS) as f32 / SLOW_EXPAND_MS as f32;
            (0.95 + 0.05 * t, 0.9 + 0.1 * t)
        } else if elapsed_ms < RAPID_EXPAND_MS + SLOW_EXPAND_MS + SLOW_DECAY_MS {
            let t = (elapsed_ms - RAPID_EXPAND_MS - SLOW_EXPAND_MS) as f32
                / SLOW_DECAY_MS as f32;
            (1.0, 1.0 - 0.3 * t)
        } else {
            let t = (elapsed_ms - RAPID_EXPAND_MS - SLOW_EXPAND_MS - SLOW_DECAY_MS)
                as f32
                / RAPID_DECAY_MS as f32;
            (1.0 - 0.5 * t, 0.7 * (1.0 - t) * (1.0 - t))
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn channel(base: u8, max: u8, brightness: f32) -> f32 {
        let value = f32::from(base) + (f32::from(max) - f32::from(base)) * brightness;
        value.clamp(0.0, 255.0)
    }
}

impl Default for PulseEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for PulseEffect {
    const ROLE: EffectRole = EffectRole::Foreground;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if width == 0 || self.initial_width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        let center = self.center.unwrap_or(width / 2);
        if center >= width {
            return Err(ConfigError::IndexOutOfRange);
        }
        let peak = self
            .max_width
            .unwrap_or(self.initial_width * 4)
            .min(width);
        if peak < self.initial_width {
            return Err(ConfigError::IndexOutOfRange);
        }
        self.center_px = center;
        self.peak_width = peak;
        self.width = width;
        Ok(())
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        let elapsed_ms = elapsed.as_millis();
        if elapsed_ms >= TOTAL_MS {
            return Ok(StepResult::Complete);
        }

        let (width_factor, brightness) = Self::envelope(elapsed_ms);

        let width_range = (self.peak_width - self.initial_width) as f32;
        let current_width = self.initial_width as f32 + width_range * width_factor;
        let half_width = current_width / 2.0;

        let r = Self::channel(self.base_color.r, self.max_color.r, brightness);
        let g = Self::channel(self.base_color.g, self.max_color.g, brightness);
        let b = Self::channel(self.base_color.b, self.max_color.b, brightness);

        for (i, pixel) in frame.iter_mut().enumerate() {
            let distance = (i as f32 - self.center_px as f32).abs();
            if distance > half_width {
                continue;
            }
            let intensity = if half_width > 0.0 {
                let d = distance / half_width;
                expf(-d * d)
            } else if distance == 0.0 {
                1.0
            } else {
                0.0
            };
            let lit = Rgb::new(
                (r * intensity) as u8,
                (g * intensity) as u8,
                (b * intensity) as u8,
            );
            if self.additive {
                pixel.r = pixel.r.saturating_add(lit.r);
                pixel.g = pixel.g.saturating_add(lit.g);
                pixel.b = pixel.b.saturating_add(lit.b);
            } else {
                *pixel = lit;
            }
        }

        Ok(StepResult::Running)
    }
}
