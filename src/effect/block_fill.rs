//! Block-by-block background fill
//!
//! Fills the strip in fixed-size blocks and requests a pause after each
//! completed block, so the fill lands in distinct visual chunks.

use embassy_time::Duration;

use super::{ConfigError, Effect, EffectError, EffectRole, StepResult};
use crate::color::Rgb;

const DEFAULT_SPEED_PX_PER_SEC: u32 = 30;
const DEFAULT_BLOCK_SIZE: usize = 10;
const DEFAULT_REST_MS: u64 = 500;

/// Fills a strip's background block by block, resting between blocks.
#[derive(Debug, Clone)]
pub struct BlockFillEffect {
    color: Rgb,
    block_size: usize,
    speed: u32,
    rest: Duration,
    width: usize,
    /// Block boundaries a rest has already been taken at.
    rested_blocks: usize,
}

impl BlockFillEffect {
    /// Create a block fill with the default block size, speed and rest.
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            block_size: DEFAULT_BLOCK_SIZE,
            speed: DEFAULT_SPEED_PX_PER_SEC,
            rest: Duration::from_millis(DEFAULT_REST_MS),
            width: 0,
            rested_blocks: 0,
        }
    }

    /// Set the block size in pixels
    #[must_use]
    pub const fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the fill speed in pixels per second
    #[must_use]
    pub const fn with_speed(mut self, pixels_per_second: u32) -> Self {
        self.speed = pixels_per_second;
        self
    }

    /// Set the rest taken after each completed block
    #[must_use]
    pub const fn with_rest(mut self, rest: Duration) -> Self {
        self.rest = rest;
        self
    }

    #[allow(clippy::cast_possible_truncation)]
    fn filled(&self, elapsed: Duration) -> usize {
        let filled = (elapsed.as_millis() * u64::from(self.speed)) / 1_000;
        (filled as usize).min(self.width)
    }
}

impl Effect for BlockFillEffect {
    const ROLE: EffectRole = EffectRole::Background;

    fn start(&mut self, width: usize, _background: &[Rgb]) -> Result<(), ConfigError> {
        if self.speed == 0 {
            return Err(ConfigError::ZeroSpeed);
        }
        if width == 0 || self.block_size == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        self.width = width;
        self.rested_blocks = 0;
        Ok(())
    }

    fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        let filled = self.filled(elapsed);
        for pixel in &mut frame[..filled] {
            *pixel = self.color;
        }

        if filled >= self.width {
            return Ok(StepResult::Complete);
        }

        // One rest per completed block boundary. `elapsed` excludes the rest
        // itself, so on resume the fill picks up exactly where it stopped.
        let completed_blocks = filled / self.block_size;
        if completed_blocks > self.rested_blocks && self.rest.as_millis() > 0 {
            self.rested_blocks = completed_blocks;
            return Ok(StepResult::Pause(self.rest));
        }

        Ok(StepResult::Running)
    }
}
