//! Remote-control boundary
//!
//! A hosting process (socket daemon, button handler, MQTT bridge) produces
//! [`Command`]s on its own threads or interrupt contexts; the frame loop
//! drains them between frames via [`CommandProcessor`]. Wire framing and
//! reply transport stay on the host's side of this boundary; state flows
//! back through the pull-based status snapshot.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Duration;
use heapless::Deque;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::OutputDriver;
use crate::color::Rgb;
use crate::dispatcher::Dispatcher;
use crate::effect::{EffectId, EffectSlot};
use crate::scheduler::Action;
use crate::strip::StripId;

/// One remote-control request.
#[derive(Debug, Clone)]
pub enum Command<const MAX_LEDS: usize> {
    /// Start a background effect on `strip`.
    StartBackground {
        strip: StripId,
        effect: EffectSlot<MAX_LEDS>,
    },
    /// Start a foreground or composite effect on `strip`.
    StartForeground {
        strip: StripId,
        effect: EffectSlot<MAX_LEDS>,
    },
    /// Stop one effect by handle.
    Stop(EffectId),
    /// Stop every effect and drop pending scheduled actions.
    StopAll,
    /// Stop everything and push black to every strip.
    Blackout,
    /// Pause one effect for a duration.
    Pause {
        effect: EffectId,
        duration: Duration,
    },
    /// Queue a deferred action on the virtual clock.
    Schedule {
        fire_at: Duration,
        action: Action<MAX_LEDS>,
    },
    /// Overwrite a strip's background with one color.
    ClearBackground { strip: StripId, color: Rgb },
}

/// The channel was full; the command is handed back.
#[derive(Debug)]
pub struct CommandRejected<const MAX_LEDS: usize>(pub Command<MAX_LEDS>);

/// Bounded command queue usable from interrupt or thread context.
///
/// Synchronized with critical sections, so it works on bare-metal targets
/// as well as under std (with the `critical-section/std` implementation).
pub struct CommandChannel<const MAX_LEDS: usize, const SIZE: usize> {
    inner: Mutex<RefCell<Deque<Command<MAX_LEDS>, SIZE>>>,
}

impl<const MAX_LEDS: usize, const SIZE: usize> CommandChannel<MAX_LEDS, SIZE> {
    /// Create a new empty channel.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Get a sender handle for this channel.
    pub const fn sender(&self) -> CommandSender<'_, MAX_LEDS, SIZE> {
        CommandSender { channel: self }
    }

    /// Get a receiver handle for this channel.
    pub const fn receiver(&self) -> CommandReceiver<'_, MAX_LEDS, SIZE> {
        CommandReceiver { channel: self }
    }

    fn try_send(
        &self,
        command: Command<MAX_LEDS>,
    ) -> Result<(), CommandRejected<MAX_LEDS>> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(CommandRejected)
        })
    }

    fn try_receive(&self) -> Option<Command<MAX_LEDS>> {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow(cs).borrow_mut();
            queue.pop_front()
        })
    }
}

impl<const MAX_LEDS: usize, const SIZE: usize> Default
    for CommandChannel<MAX_LEDS, SIZE>
{
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle for a [`CommandChannel`].
#[derive(Clone, Copy)]
pub struct CommandSender<'a, const MAX_LEDS: usize, const SIZE: usize> {
    channel: &'a CommandChannel<MAX_LEDS, SIZE>,
}

impl<const MAX_LEDS: usize, const SIZE: usize> CommandSender<'_, MAX_LEDS, SIZE> {
    /// Queue a command without blocking.
    ///
    /// Returns the command back when the channel is full.
    pub fn try_send(
        &self,
        command: Command<MAX_LEDS>,
    ) -> Result<(), CommandRejected<MAX_LEDS>> {
        self.channel.try_send(command)
    }
}

/// Consumer handle for a [`CommandChannel`].
#[derive(Clone, Copy)]
pub struct CommandReceiver<'a, const MAX_LEDS: usize, const SIZE: usize> {
    channel: &'a CommandChannel<MAX_LEDS, SIZE>,
}

impl<const MAX_LEDS: usize, const SIZE: usize> CommandReceiver<'_, MAX_LEDS, SIZE> {
    /// Take the next pending command, if any.
    pub fn try_receive(&self) -> Option<Command<MAX_LEDS>> {
        self.channel.try_receive()
    }
}

/// Drains pending commands into dispatcher calls.
///
/// Call [`CommandProcessor::process_pending`] once per frame, before the
/// tick. Failed commands are logged and dropped; the host observes outcomes
/// through the status snapshot, so one malformed request cannot stall the
/// queue.
pub struct CommandProcessor<'a, const MAX_LEDS: usize, const SIZE: usize> {
    commands: CommandReceiver<'a, MAX_LEDS, SIZE>,
}

impl<'a, const MAX_LEDS: usize, const SIZE: usize>
    CommandProcessor<'a, MAX_LEDS, SIZE>
{
    /// Create a processor draining `commands`.
    pub const fn new(commands: CommandReceiver<'a, MAX_LEDS, SIZE>) -> Self {
        Self { commands }
    }

    /// Apply all pending commands to `dispatcher` (non-blocking).
    ///
    /// Returns how many commands were applied. A blackout flush failure
    /// propagates, like any transport failure.
    pub fn process_pending<O, const MAX_STRIPS: usize, const MAX_EFFECTS: usize>(
        &mut self,
        dispatcher: &mut Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>,
    ) -> Result<usize, O::Error>
    where
        O: OutputDriver,
    {
        let mut applied = 0;
        while let Some(command) = self.commands.try_receive() {
            match command {
                Command::StartBackground { strip, effect } => {
                    if let Err(_error) =
                        dispatcher.run_background_effect(strip, effect)
                    {
                        #[cfg(feature = "esp32-log")]
                        println!(
                            "[CommandProcessor] start background failed: {:?}",
                            _error
                        );
                        continue;
                    }
                }
                Command::StartForeground { strip, effect } => {
                    if let Err(_error) =
                        dispatcher.run_foreground_effect(strip, effect)
                    {
                        #[cfg(feature = "esp32-log")]
                        println!(
                            "[CommandProcessor] start foreground failed: {:?}",
                            _error
                        );
                        continue;
                    }
                }
                Command::Stop(id) => {
                    dispatcher.stop_effect(id);
                }
                Command::StopAll => dispatcher.stop_all(),
                Command::Blackout => dispatcher.blackout()?,
                Command::Pause { effect, duration } => {
                    dispatcher.pause_effect(effect, duration);
                }
                Command::Schedule { fire_at, action } => {
                    if dispatcher.schedule(fire_at, action).is_err() {
                        #[cfg(feature = "esp32-log")]
                        println!("[CommandProcessor] event queue full");
                        continue;
                    }
                }
                Command::ClearBackground { strip, color } => {
                    if dispatcher.clear_background(strip, color).is_err() {
                        #[cfg(feature = "esp32-log")]
                        println!("[CommandProcessor] unknown strip");
                        continue;
                    }
                }
            }
            applied += 1;
        }
        Ok(applied)
    }
}
