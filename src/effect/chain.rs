//! Effect sequencing
//!
//! A chain plays a queue of child effects end to end. The chain itself draws
//! nothing; the dispatcher starts the next child as soon as the previous one
//! leaves the active sets, so each child measures its own completion and the
//! chain never needs to know how.

use heapless::Vec;

use super::{BaseSlot, ConfigError, EffectId};
use crate::strip::StripId;

/// Maximum number of steps a chain can hold.
pub const CHAIN_STEPS: usize = 8;

/// One queued child effect: what to start and where.
///
/// Steps may target different strips, so a chain can move a sequence across
/// hardware.
#[derive(Debug, Clone)]
pub struct ChainStep<const MAX_LEDS: usize> {
    /// Target strip of the child effect.
    pub strip: StripId,
    /// The child effect to start.
    pub effect: BaseSlot<MAX_LEDS>,
}

/// Plays child effects one after another.
#[derive(Debug, Clone)]
pub struct ChainEffect<const MAX_LEDS: usize> {
    steps: Vec<ChainStep<MAX_LEDS>, CHAIN_STEPS>,
    cursor: usize,
    overflowed: bool,
    /// Child currently playing, tracked by the dispatcher.
    pub(crate) active_child: Option<EffectId>,
}

impl<const MAX_LEDS: usize> ChainEffect<MAX_LEDS> {
    /// Create an empty chain.
    pub const fn new() -> Self {
        Self {
            steps: Vec::new(),
            cursor: 0,
            overflowed: false,
            active_child: None,
        }
    }

    /// Append a child effect targeting `strip`.
    ///
    /// Appending beyond [`CHAIN_STEPS`] marks the chain invalid; the error
    /// surfaces when the chain is started.
    #[must_use]
    pub fn then(
        mut self,
        strip: StripId,
        effect: impl Into<BaseSlot<MAX_LEDS>>,
    ) -> Self {
        let step = ChainStep {
            strip,
            effect: effect.into(),
        };
        if self.steps.push(step).is_err() {
            self.overflowed = true;
        }
        self
    }

    /// Number of steps not yet started.
    pub fn remaining(&self) -> usize {
        self.steps.len() - self.cursor
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.overflowed {
            return Err(ConfigError::TooManySteps);
        }
        if self.steps.is_empty() {
            return Err(ConfigError::EmptyChain);
        }
        Ok(())
    }

    pub(crate) fn next_step(&mut self) -> Option<ChainStep<MAX_LEDS>> {
        let step = self.steps.get(self.cursor).cloned();
        if step.is_some() {
            self.cursor += 1;
        }
        step
    }
}

impl<const MAX_LEDS: usize> Default for ChainEffect<MAX_LEDS> {
    fn default() -> Self {
        Self::new()
    }
}
