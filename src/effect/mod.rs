//! Effect system with compile-time known effect variants
//!
//! All effects are stored in an enum to avoid heap allocations.
//! Each effect implements the `Effect` trait; the dispatcher decides from the
//! role tag whether a step receives the strip's background buffer or its live
//! buffer.

mod block_fill;
mod chain;
mod chase;
mod fade;
mod playback;
mod pulse;
mod sparkle;
mod wipe;

use embassy_time::Duration;

pub use block_fill::BlockFillEffect;
pub use chain::{CHAIN_STEPS, ChainEffect, ChainStep};
pub use chase::ChaseEffect;
pub use fade::FadeEffect;
pub use playback::{PlaybackEffect, RowSource, RowSourceError};
pub use pulse::PulseEffect;
pub use sparkle::SparkleEffect;
pub use wipe::{WipeDirection, WipeEffect};

use crate::color::Rgb;

const EFFECT_NAME_WIPE: &str = "wipe";
const EFFECT_NAME_FADE: &str = "fade";
const EFFECT_NAME_BLOCK_FILL: &str = "block_fill";
const EFFECT_NAME_PLAYBACK: &str = "playback";
const EFFECT_NAME_PULSE: &str = "pulse";
const EFFECT_NAME_SPARKLE: &str = "sparkle";
const EFFECT_NAME_CHASE: &str = "chase";
const EFFECT_NAME_CHAIN: &str = "chain";

/// Handle of an effect registered with a dispatcher.
///
/// Ids are assigned from a monotonically increasing counter and are never
/// reused within one dispatcher, so a stale handle simply stops matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(pub(crate) u32);

impl EffectId {
    /// Raw id value, e.g. for reporting over a control channel.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Which buffer an effect draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectRole {
    /// Mutates the strip's persistent background buffer.
    Background,
    /// Draws transient pixels onto the live buffer, recomputed every tick.
    Foreground,
    /// Draws nothing itself; sequences child effects.
    Composite,
}

/// Outcome of advancing an effect one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Still active; step again next tick.
    Running,
    /// Still active, but requests a pause before the next step.
    Pause(Duration),
    /// Terminal condition reached; remove from the active set.
    Complete,
}

/// Invalid parameters detected when an effect is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration or interval parameter was zero.
    ZeroDuration,
    /// A speed parameter was zero.
    ZeroSpeed,
    /// The target strip has no pixels, or the effect needs more than it has.
    ZeroWidth,
    /// A pixel index parameter lies outside the strip.
    IndexOutOfRange,
    /// A chain was started with no steps.
    EmptyChain,
    /// More steps were appended to a chain than it can hold.
    TooManySteps,
}

/// Runtime failure inside `step`, recovered per-effect by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectError {
    /// A playback row source failed.
    Source(RowSourceError),
}

/// Contract implemented by every effect kind.
pub trait Effect {
    /// Role deciding which buffer `step` receives.
    const ROLE: EffectRole;

    /// Validate parameters and capture state derived from the target strip.
    ///
    /// `background` is the strip's current background buffer, `width` pixels
    /// long. Called once, when the effect is registered.
    fn start(&mut self, width: usize, background: &[Rgb]) -> Result<(), ConfigError> {
        let _ = (width, background);
        Ok(())
    }

    /// Advance to `elapsed` and draw into `frame`.
    ///
    /// `elapsed` is the time since `start`, excluding any paused spans, so a
    /// step must be a pure function of `elapsed` plus captured state.
    /// `frame` is the strip's background buffer for background effects and
    /// its freshly base-painted live buffer for foreground effects.
    fn step(&mut self, elapsed: Duration, frame: &mut [Rgb])
    -> Result<StepResult, EffectError>;
}

/// Slot holding any of the drawing effect kinds.
#[derive(Debug, Clone)]
pub enum BaseSlot<const MAX_LEDS: usize> {
    /// Directional background fill
    Wipe(WipeEffect),
    /// Whole-background fade to a target color
    Fade(FadeEffect<MAX_LEDS>),
    /// Block-by-block background fill with rests between blocks
    BlockFill(BlockFillEffect),
    /// Row-by-row playback from an external source
    Playback(PlaybackEffect),
    /// Expanding and decaying pulse around a center pixel
    Pulse(PulseEffect),
    /// Random-looking twinkles
    Sparkle(SparkleEffect),
    /// Dot group running around the strip
    Chase(ChaseEffect),
}

impl<const MAX_LEDS: usize> BaseSlot<MAX_LEDS> {
    /// Role tag of the contained effect.
    pub fn role(&self) -> EffectRole {
        match self {
            Self::Wipe(_) => WipeEffect::ROLE,
            Self::Fade(_) => FadeEffect::<MAX_LEDS>::ROLE,
            Self::BlockFill(_) => BlockFillEffect::ROLE,
            Self::Playback(_) => PlaybackEffect::ROLE,
            Self::Pulse(_) => PulseEffect::ROLE,
            Self::Sparkle(_) => SparkleEffect::ROLE,
            Self::Chase(_) => ChaseEffect::ROLE,
        }
    }

    /// Stable effect name for status reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wipe(_) => EFFECT_NAME_WIPE,
            Self::Fade(_) => EFFECT_NAME_FADE,
            Self::BlockFill(_) => EFFECT_NAME_BLOCK_FILL,
            Self::Playback(_) => EFFECT_NAME_PLAYBACK,
            Self::Pulse(_) => EFFECT_NAME_PULSE,
            Self::Sparkle(_) => EFFECT_NAME_SPARKLE,
            Self::Chase(_) => EFFECT_NAME_CHASE,
        }
    }

    pub(crate) fn start(
        &mut self,
        width: usize,
        background: &[Rgb],
    ) -> Result<(), ConfigError> {
        match self {
            Self::Wipe(effect) => effect.start(width, background),
            Self::Fade(effect) => effect.start(width, background),
            Self::BlockFill(effect) => effect.start(width, background),
            Self::Playback(effect) => effect.start(width, background),
            Self::Pulse(effect) => effect.start(width, background),
            Self::Sparkle(effect) => effect.start(width, background),
            Self::Chase(effect) => effect.start(width, background),
        }
    }

    pub(crate) fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        match self {
            Self::Wipe(effect) => effect.step(elapsed, frame),
            Self::Fade(effect) => effect.step(elapsed, frame),
            Self::BlockFill(effect) => effect.step(elapsed, frame),
            Self::Playback(effect) => effect.step(elapsed, frame),
            Self::Pulse(effect) => effect.step(elapsed, frame),
            Self::Sparkle(effect) => effect.step(elapsed, frame),
            Self::Chase(effect) => effect.step(elapsed, frame),
        }
    }
}

/// Slot holding any effect kind, composites included.
#[derive(Debug, Clone)]
pub enum EffectSlot<const MAX_LEDS: usize> {
    /// One of the drawing effects
    Base(BaseSlot<MAX_LEDS>),
    /// Sequenced child effects
    Chain(ChainEffect<MAX_LEDS>),
}

impl<const MAX_LEDS: usize> EffectSlot<MAX_LEDS> {
    /// Role tag of the contained effect.
    pub fn role(&self) -> EffectRole {
        match self {
            Self::Base(slot) => slot.role(),
            Self::Chain(_) => EffectRole::Composite,
        }
    }

    /// Stable effect name for status reporting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Base(slot) => slot.name(),
            Self::Chain(_) => EFFECT_NAME_CHAIN,
        }
    }

    pub(crate) fn start(
        &mut self,
        width: usize,
        background: &[Rgb],
    ) -> Result<(), ConfigError> {
        match self {
            Self::Base(slot) => slot.start(width, background),
            Self::Chain(chain) => chain.validate(),
        }
    }

    pub(crate) fn step(
        &mut self,
        elapsed: Duration,
        frame: &mut [Rgb],
    ) -> Result<StepResult, EffectError> {
        match self {
            Self::Base(slot) => slot.step(elapsed, frame),
            // Chains draw nothing; the dispatcher advances them between
            // frames based on child liveness.
            Self::Chain(_) => {
                let _ = (elapsed, frame);
                Ok(StepResult::Running)
            }
        }
    }
}

impl<const MAX_LEDS: usize> From<WipeEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: WipeEffect) -> Self {
        Self::Wipe(effect)
    }
}

impl<const MAX_LEDS: usize> From<FadeEffect<MAX_LEDS>> for BaseSlot<MAX_LEDS> {
    fn from(effect: FadeEffect<MAX_LEDS>) -> Self {
        Self::Fade(effect)
    }
}

impl<const MAX_LEDS: usize> From<BlockFillEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: BlockFillEffect) -> Self {
        Self::BlockFill(effect)
    }
}

impl<const MAX_LEDS: usize> From<PlaybackEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: PlaybackEffect) -> Self {
        Self::Playback(effect)
    }
}

impl<const MAX_LEDS: usize> From<PulseEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: PulseEffect) -> Self {
        Self::Pulse(effect)
    }
}

impl<const MAX_LEDS: usize> From<SparkleEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: SparkleEffect) -> Self {
        Self::Sparkle(effect)
    }
}

impl<const MAX_LEDS: usize> From<ChaseEffect> for BaseSlot<MAX_LEDS> {
    fn from(effect: ChaseEffect) -> Self {
        Self::Chase(effect)
    }
}

impl<const MAX_LEDS: usize> From<WipeEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: WipeEffect) -> Self {
        Self::Base(BaseSlot::Wipe(effect))
    }
}

impl<const MAX_LEDS: usize> From<FadeEffect<MAX_LEDS>> for EffectSlot<MAX_LEDS> {
    fn from(effect: FadeEffect<MAX_LEDS>) -> Self {
        Self::Base(BaseSlot::Fade(effect))
    }
}

impl<const MAX_LEDS: usize> From<BlockFillEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: BlockFillEffect) -> Self {
        Self::Base(BaseSlot::BlockFill(effect))
    }
}

impl<const MAX_LEDS: usize> From<PlaybackEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: PlaybackEffect) -> Self {
        Self::Base(BaseSlot::Playback(effect))
    }
}

impl<const MAX_LEDS: usize> From<PulseEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: PulseEffect) -> Self {
        Self::Base(BaseSlot::Pulse(effect))
    }
}

impl<const MAX_LEDS: usize> From<SparkleEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: SparkleEffect) -> Self {
        Self::Base(BaseSlot::Sparkle(effect))
    }
}

impl<const MAX_LEDS: usize> From<ChaseEffect> for EffectSlot<MAX_LEDS> {
    fn from(effect: ChaseEffect) -> Self {
        Self::Base(BaseSlot::Chase(effect))
    }
}

impl<const MAX_LEDS: usize> From<ChainEffect<MAX_LEDS>> for EffectSlot<MAX_LEDS> {
    fn from(chain: ChainEffect<MAX_LEDS>) -> Self {
        Self::Chain(chain)
    }
}
