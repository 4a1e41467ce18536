#![no_std]

pub mod color;
pub mod command;
pub mod dispatcher;
pub mod effect;
pub mod frame_scheduler;
pub mod gamma;
pub mod math8;
pub mod scheduler;
pub mod strip;

pub use command::{
    Command, CommandChannel, CommandProcessor, CommandReceiver, CommandRejected,
    CommandSender,
};
pub use dispatcher::{
    Dispatcher, EffectStatus, StartError, StatusSnapshot, StripCapacityError,
};
pub use effect::{
    BaseSlot, BlockFillEffect, ChainEffect, ChainStep, ChaseEffect, ConfigError,
    Effect, EffectError, EffectId, EffectRole, EffectSlot, FadeEffect,
    PlaybackEffect, PulseEffect, RowSource, RowSourceError, SparkleEffect,
    StepResult, WipeDirection, WipeEffect,
};
pub use frame_scheduler::{
    DEFAULT_FPS, DEFAULT_FRAME_DURATION, FrameResult, FrameScheduler,
};
pub use gamma::{GammaCorrected, ws2812_gamma};
pub use scheduler::{Action, EventQueue, ScheduleError};
pub use strip::{Strip, StripId};

pub use color::{Hsv, Rgb, interpolate};
pub use math8::U8Adjuster;
pub use embassy_time::{Duration, Instant};

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The dispatcher is generic over this trait and issues exactly one
/// `write` per touched strip per frame.
pub trait OutputDriver {
    /// Transport failure surfaced from a flush.
    type Error;

    /// Write colors to the LED strip
    fn write(&mut self, colors: &[Rgb]) -> Result<(), Self::Error>;
}
