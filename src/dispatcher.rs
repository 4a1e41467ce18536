//! Per-frame effect orchestration
//!
//! The dispatcher owns the strip arena and the active effect sets for one
//! run. Each frame it drains due scheduled actions, steps background effects
//! into their strips' background buffers, base-paints every touched strip,
//! steps foreground effects onto the live buffers, and flushes each touched
//! strip exactly once however many effects drew on it.
//!
//! All timing is virtual: the clock is anchored at the first frame and every
//! effect sees only its own elapsed time with paused spans excised, so a run
//! is reproducible from a synthetic sequence of instants.

use embassy_time::{Duration, Instant};
use heapless::Vec;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::OutputDriver;
use crate::color::Rgb;
use crate::effect::{
    BaseSlot, ChainStep, ConfigError, EffectId, EffectRole, EffectSlot, StepResult,
};
use crate::scheduler::{Action, EventQueue, ScheduleError};
use crate::strip::{Strip, StripId};

/// Why an effect could not be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    /// The strip id does not name a registered strip.
    UnknownStrip,
    /// The effect id does not name an active effect.
    UnknownEffect,
    /// The effect's role does not match the requested set.
    RoleMismatch,
    /// The target active set is full.
    Capacity,
    /// The effect rejected its parameters.
    Config(ConfigError),
}

impl From<ConfigError> for StartError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

/// The strip arena is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripCapacityError;

/// One active effect as reported by [`Dispatcher::status`].
#[derive(Debug, Clone)]
pub struct EffectStatus {
    pub id: EffectId,
    pub name: &'static str,
    pub role: EffectRole,
    pub strip: StripId,
    pub paused: bool,
}

/// Pull-based state snapshot for control surfaces.
#[derive(Debug, Clone)]
pub struct StatusSnapshot<const MAX_EFFECTS: usize> {
    /// Frames processed since the run started.
    pub frame_count: u64,
    /// Current position of the virtual clock.
    pub virtual_now: Duration,
    /// Scheduled actions not yet due.
    pub pending_events: usize,
    /// Active background effects.
    pub background: Vec<EffectStatus, MAX_EFFECTS>,
    /// Active foreground and composite effects.
    pub foreground: Vec<EffectStatus, MAX_EFFECTS>,
    /// Effects removed after a step failure.
    pub effect_faults: u32,
    /// Scheduled actions that failed to apply.
    pub action_faults: u32,
    /// Target frame rate, when a pacing wrapper is driving the run.
    pub fps: Option<u32>,
}

/// An effect registered with the dispatcher, with its pause bookkeeping.
///
/// All times are on the virtual clock. `started_at` shifts forward when a
/// pause ends, so `virtual_now - started_at` always excludes paused spans.
#[derive(Debug)]
struct ActiveEffect<const MAX_LEDS: usize> {
    id: EffectId,
    strip: StripId,
    slot: EffectSlot<MAX_LEDS>,
    started_at: Duration,
    pause_until: Option<Duration>,
    pause_started_at: Option<Duration>,
}

struct StripSlot<O, const MAX_LEDS: usize> {
    strip: Strip<MAX_LEDS>,
    output: O,
}

/// Frame-by-frame effect engine over a set of strips.
///
/// `MAX_LEDS` bounds strip width, `MAX_STRIPS` the arena, and `MAX_EFFECTS`
/// each of the two active sets.
pub struct Dispatcher<
    O: OutputDriver,
    const MAX_LEDS: usize,
    const MAX_STRIPS: usize,
    const MAX_EFFECTS: usize,
> {
    strips: Vec<StripSlot<O, MAX_LEDS>, MAX_STRIPS>,
    background: Vec<ActiveEffect<MAX_LEDS>, MAX_EFFECTS>,
    foreground: Vec<ActiveEffect<MAX_LEDS>, MAX_EFFECTS>,
    events: EventQueue<MAX_LEDS>,
    epoch: Option<Instant>,
    virtual_now: Duration,
    next_id: u32,
    frame_count: u64,
    effect_faults: u32,
    action_faults: u32,
}

impl<
    O: OutputDriver,
    const MAX_LEDS: usize,
    const MAX_STRIPS: usize,
    const MAX_EFFECTS: usize,
> Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>
{
    /// Create a dispatcher with no strips and nothing scheduled.
    pub const fn new() -> Self {
        Self {
            strips: Vec::new(),
            background: Vec::new(),
            foreground: Vec::new(),
            events: EventQueue::new(),
            epoch: None,
            virtual_now: Duration::from_millis(0),
            next_id: 1,
            frame_count: 0,
            effect_faults: 0,
            action_faults: 0,
        }
    }

    /// Register a strip and the driver that flushes it.
    pub fn add_strip(
        &mut self,
        strip: Strip<MAX_LEDS>,
        output: O,
    ) -> Result<StripId, StripCapacityError> {
        let id = StripId(self.strips.len());
        self.strips
            .push(StripSlot { strip, output })
            .map_err(|_| StripCapacityError)?;
        Ok(id)
    }

    /// Access a registered strip.
    pub fn strip(&self, id: StripId) -> Option<&Strip<MAX_LEDS>> {
        self.strips.get(id.index()).map(|entry| &entry.strip)
    }

    /// Mutably access a registered strip.
    pub fn strip_mut(&mut self, id: StripId) -> Option<&mut Strip<MAX_LEDS>> {
        self.strips.get_mut(id.index()).map(|entry| &mut entry.strip)
    }

    /// Start a background effect on `strip`.
    ///
    /// Configuration problems surface here, before the effect joins the
    /// active set.
    pub fn run_background_effect(
        &mut self,
        strip: StripId,
        effect: impl Into<EffectSlot<MAX_LEDS>>,
    ) -> Result<EffectId, StartError> {
        let slot = effect.into();
        if slot.role() != EffectRole::Background {
            return Err(StartError::RoleMismatch);
        }
        self.start_slot(strip, slot)
    }

    /// Start a foreground or composite effect on `strip`.
    ///
    /// Starting a chain immediately starts its first child.
    pub fn run_foreground_effect(
        &mut self,
        strip: StripId,
        effect: impl Into<EffectSlot<MAX_LEDS>>,
    ) -> Result<EffectId, StartError> {
        let slot = effect.into();
        match slot.role() {
            EffectRole::Foreground => self.start_slot(strip, slot),
            EffectRole::Composite => self.start_chain(strip, slot),
            EffectRole::Background => Err(StartError::RoleMismatch),
        }
    }

    /// Stop an effect immediately, paused or not.
    ///
    /// Its last writes stay on the strip until overwritten. Stopping a chain
    /// leaves the currently playing child to finish on its own.
    pub fn stop_effect(&mut self, id: EffectId) -> bool {
        let before = self.background.len() + self.foreground.len();
        self.background.retain(|effect| effect.id != id);
        self.foreground.retain(|effect| effect.id != id);
        before != self.background.len() + self.foreground.len()
    }

    /// Stop every effect and drop all pending scheduled actions.
    pub fn stop_all(&mut self) {
        self.background.clear();
        self.foreground.clear();
        self.events.clear();
    }

    /// Overwrite a strip's background buffer with one color.
    pub fn clear_background(
        &mut self,
        strip: StripId,
        color: Rgb,
    ) -> Result<(), StartError> {
        let entry = self
            .strips
            .get_mut(strip.index())
            .ok_or(StartError::UnknownStrip)?;
        entry.strip.set_background(color);
        Ok(())
    }

    /// Stop everything and push black to every strip.
    pub fn blackout(&mut self) -> Result<(), O::Error> {
        self.stop_all();
        for entry in &mut self.strips {
            entry.strip.blackout();
            entry.output.write(entry.strip.live())?;
        }
        Ok(())
    }

    /// Pause an effect for `duration` from the current virtual time.
    ///
    /// The effect's animation curve is unaffected: on resume its start time
    /// shifts forward by however long the pause actually lasted.
    pub fn pause_effect(&mut self, id: EffectId, duration: Duration) -> bool {
        let virtual_now = self.virtual_now;
        for effect in self
            .background
            .iter_mut()
            .chain(self.foreground.iter_mut())
        {
            if effect.id == id {
                if effect.pause_started_at.is_none() {
                    effect.pause_started_at = Some(virtual_now);
                }
                effect.pause_until = Some(virtual_now + duration);
                return true;
            }
        }
        false
    }

    /// Queue an action to fire at virtual time `fire_at`.
    pub fn schedule(
        &mut self,
        fire_at: Duration,
        action: Action<MAX_LEDS>,
    ) -> Result<(), ScheduleError> {
        self.events.schedule(fire_at, action)
    }

    /// Check whether both active sets and the event queue are empty.
    pub fn is_idle(&self) -> bool {
        self.background.is_empty()
            && self.foreground.is_empty()
            && self.events.is_empty()
    }

    /// Frames processed since the run started.
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Current position of the virtual clock.
    pub const fn virtual_now(&self) -> Duration {
        self.virtual_now
    }

    /// Snapshot the active sets and counters for a control surface.
    pub fn status(&self) -> StatusSnapshot<MAX_EFFECTS> {
        let mut background = Vec::new();
        for effect in &self.background {
            let _ = background.push(Self::describe(effect));
        }
        let mut foreground = Vec::new();
        for effect in &self.foreground {
            let _ = foreground.push(Self::describe(effect));
        }
        StatusSnapshot {
            frame_count: self.frame_count,
            virtual_now: self.virtual_now,
            pending_events: self.events.len(),
            background,
            foreground,
            effect_faults: self.effect_faults,
            action_faults: self.action_faults,
            fps: None,
        }
    }

    /// Process one frame of animation.
    ///
    /// Flush failures abort the tick and propagate; per-effect and
    /// per-action failures are logged, counted and contained.
    pub fn run_frame(&mut self, now: Instant) -> Result<(), O::Error> {
        let epoch = *self.epoch.get_or_insert(now);
        self.virtual_now = Duration::from_millis(
            now.as_millis().saturating_sub(epoch.as_millis()),
        );

        self.drain_due_actions();

        let mut touched = [false; MAX_STRIPS];
        let mut painted = [false; MAX_STRIPS];
        let mut completed_bg: Vec<EffectId, MAX_EFFECTS> = Vec::new();
        let mut completed_fg: Vec<EffectId, MAX_EFFECTS> = Vec::new();

        self.step_background(&mut touched, &mut completed_bg);

        // Base paint: every strip a background effect touched gets its
        // background replayed onto the live buffer before foreground draws.
        for (index, entry) in self.strips.iter_mut().enumerate() {
            if touched[index] {
                entry.strip.paint_background();
                painted[index] = true;
            }
        }

        self.advance_chains(&completed_bg, &mut completed_fg);
        self.step_foreground(&mut touched, &mut painted, &mut completed_fg);

        // One flush per touched strip, however many effects drew on it.
        for (index, entry) in self.strips.iter_mut().enumerate() {
            if touched[index] {
                entry.output.write(entry.strip.live())?;
            }
        }

        self.background
            .retain(|effect| !completed_bg.contains(&effect.id));
        self.foreground
            .retain(|effect| !completed_fg.contains(&effect.id));

        self.frame_count += 1;
        Ok(())
    }

    fn describe(effect: &ActiveEffect<MAX_LEDS>) -> EffectStatus {
        EffectStatus {
            id: effect.id,
            name: effect.slot.name(),
            role: effect.slot.role(),
            strip: effect.strip,
            paused: effect.pause_until.is_some(),
        }
    }

    /// Execute every scheduled action that is due.
    ///
    /// A failed action does not block the ones behind it.
    fn drain_due_actions(&mut self) {
        while let Some(entry) = self.events.pop_due(self.virtual_now) {
            if let Err(_error) = self.apply_action(entry.action) {
                self.action_faults += 1;
                #[cfg(feature = "esp32-log")]
                println!(
                    "[Dispatcher] scheduled action at {}ms failed: {:?}",
                    entry.fire_at.as_millis(),
                    _error
                );
            }
        }
    }

    fn apply_action(&mut self, action: Action<MAX_LEDS>) -> Result<(), StartError> {
        match action {
            Action::StartBackground { strip, effect } => {
                self.run_background_effect(strip, effect)?;
            }
            Action::StartForeground { strip, effect } => {
                self.run_foreground_effect(strip, effect)?;
            }
            Action::Stop(id) => {
                if !self.stop_effect(id) {
                    return Err(StartError::UnknownEffect);
                }
            }
            Action::StopAll => self.stop_all(),
            Action::ClearBackground { strip, color } => {
                self.clear_background(strip, color)?;
            }
        }
        Ok(())
    }

    fn start_slot(
        &mut self,
        strip: StripId,
        mut slot: EffectSlot<MAX_LEDS>,
    ) -> Result<EffectId, StartError> {
        let entry = self
            .strips
            .get_mut(strip.index())
            .ok_or(StartError::UnknownStrip)?;
        slot.start(entry.strip.width(), entry.strip.background())?;

        let id = EffectId(self.next_id);
        let role = slot.role();
        let effect = ActiveEffect {
            id,
            strip,
            slot,
            started_at: self.virtual_now,
            pause_until: None,
            pause_started_at: None,
        };
        let set = match role {
            EffectRole::Background => &mut self.background,
            EffectRole::Foreground | EffectRole::Composite => &mut self.foreground,
        };
        set.push(effect).map_err(|_| StartError::Capacity)?;
        self.next_id += 1;
        Ok(id)
    }

    fn start_base(
        &mut self,
        strip: StripId,
        effect: BaseSlot<MAX_LEDS>,
    ) -> Result<EffectId, StartError> {
        self.start_slot(strip, EffectSlot::Base(effect))
    }

    fn start_chain(
        &mut self,
        strip: StripId,
        slot: EffectSlot<MAX_LEDS>,
    ) -> Result<EffectId, StartError> {
        let EffectSlot::Chain(mut chain) = slot else {
            return Err(StartError::RoleMismatch);
        };
        if self.strips.get(strip.index()).is_none() {
            return Err(StartError::UnknownStrip);
        }
        chain.validate()?;

        // Starting a chain starts its first child right away.
        let step = chain
            .next_step()
            .ok_or(StartError::Config(ConfigError::EmptyChain))?;
        let child = self.start_base(step.strip, step.effect)?;
        chain.active_child = Some(child);

        let id = EffectId(self.next_id);
        let effect = ActiveEffect {
            id,
            strip,
            slot: EffectSlot::Chain(chain),
            started_at: self.virtual_now,
            pause_until: None,
            pause_started_at: None,
        };
        if self.foreground.push(effect).is_err() {
            // No orphaned child when the chain itself cannot register.
            self.stop_effect(child);
            return Err(StartError::Capacity);
        }
        self.next_id += 1;
        Ok(id)
    }

    /// Step every background effect into its strip's background buffer.
    fn step_background(
        &mut self,
        touched: &mut [bool; MAX_STRIPS],
        completed: &mut Vec<EffectId, MAX_EFFECTS>,
    ) {
        let virtual_now = self.virtual_now;
        let mut faults = 0u32;

        let Self {
            strips, background, ..
        } = self;
        for effect in background.iter_mut() {
            let Some(entry) = strips.get_mut(effect.strip.index()) else {
                continue;
            };
            touched[effect.strip.index()] = true;
            if !resume_if_due(effect, virtual_now) {
                continue;
            }
            let elapsed = elapsed_since(virtual_now, effect.started_at);
            match effect.slot.step(elapsed, entry.strip.background_mut()) {
                Ok(StepResult::Running) => {}
                Ok(StepResult::Pause(rest)) => {
                    effect.pause_until = Some(virtual_now + rest);
                    effect.pause_started_at = Some(virtual_now);
                }
                Ok(StepResult::Complete) => {
                    let _ = completed.push(effect.id);
                }
                Err(_error) => {
                    faults += 1;
                    let _ = completed.push(effect.id);
                    #[cfg(feature = "esp32-log")]
                    println!(
                        "[Dispatcher] background effect {} ({}) failed: {:?}",
                        effect.id.raw(),
                        effect.slot.name(),
                        _error
                    );
                }
            }
        }

        self.effect_faults += faults;
    }

    /// Start the next child of every chain whose current child is gone.
    fn advance_chains(
        &mut self,
        completed_bg: &Vec<EffectId, MAX_EFFECTS>,
        completed_fg: &mut Vec<EffectId, MAX_EFFECTS>,
    ) {
        let mut pending: Vec<(EffectId, ChainStep<MAX_LEDS>), MAX_EFFECTS> =
            Vec::new();

        for index in 0..self.foreground.len() {
            let effect = &self.foreground[index];
            let EffectSlot::Chain(chain) = &effect.slot else {
                continue;
            };
            let child_running = match chain.active_child {
                Some(child) => {
                    let in_bg = self.background.iter().any(|e| e.id == child)
                        && !completed_bg.contains(&child);
                    let in_fg = self.foreground.iter().any(|e| e.id == child)
                        && !completed_fg.contains(&child);
                    in_bg || in_fg
                }
                None => false,
            };
            if child_running {
                continue;
            }

            let chain_id = effect.id;
            if let EffectSlot::Chain(chain) = &mut self.foreground[index].slot {
                chain.active_child = None;
                match chain.next_step() {
                    Some(step) => {
                        let _ = pending.push((chain_id, step));
                    }
                    None => {
                        let _ = completed_fg.push(chain_id);
                    }
                }
            }
        }

        for (chain_id, step) in pending {
            match self.start_base(step.strip, step.effect) {
                Ok(child) => {
                    for effect in &mut self.foreground {
                        if effect.id == chain_id {
                            if let EffectSlot::Chain(chain) = &mut effect.slot {
                                chain.active_child = Some(child);
                            }
                        }
                    }
                }
                Err(_error) => {
                    // Skip the broken step; the chain moves on next frame.
                    self.effect_faults += 1;
                    #[cfg(feature = "esp32-log")]
                    println!(
                        "[Dispatcher] chain {} step failed to start: {:?}",
                        chain_id.raw(),
                        _error
                    );
                }
            }
        }
    }

    /// Step every foreground effect onto its strip's live buffer.
    ///
    /// Strips not already base-painted this tick get painted once before the
    /// first foreground draw, so stale foreground pixels never persist.
    fn step_foreground(
        &mut self,
        touched: &mut [bool; MAX_STRIPS],
        painted: &mut [bool; MAX_STRIPS],
        completed: &mut Vec<EffectId, MAX_EFFECTS>,
    ) {
        let virtual_now = self.virtual_now;
        let mut faults = 0u32;

        let Self {
            strips, foreground, ..
        } = self;
        for effect in foreground.iter_mut() {
            if matches!(effect.slot, EffectSlot::Chain(_)) {
                continue;
            }
            let Some(entry) = strips.get_mut(effect.strip.index()) else {
                continue;
            };
            if !painted[effect.strip.index()] {
                entry.strip.paint_background();
                painted[effect.strip.index()] = true;
            }
            touched[effect.strip.index()] = true;
            if !resume_if_due(effect, virtual_now) {
                continue;
            }
            let elapsed = elapsed_since(virtual_now, effect.started_at);
            match effect.slot.step(elapsed, entry.strip.live_mut()) {
                Ok(StepResult::Running) => {}
                Ok(StepResult::Pause(rest)) => {
                    effect.pause_until = Some(virtual_now + rest);
                    effect.pause_started_at = Some(virtual_now);
                }
                Ok(StepResult::Complete) => {
                    let _ = completed.push(effect.id);
                }
                Err(_error) => {
                    faults += 1;
                    let _ = completed.push(effect.id);
                    #[cfg(feature = "esp32-log")]
                    println!(
                        "[Dispatcher] foreground effect {} ({}) failed: {:?}",
                        effect.id.raw(),
                        effect.slot.name(),
                        _error
                    );
                }
            }
        }

        self.effect_faults += faults;
    }
}

impl<
    O: OutputDriver,
    const MAX_LEDS: usize,
    const MAX_STRIPS: usize,
    const MAX_EFFECTS: usize,
> Default for Dispatcher<O, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>
{
    fn default() -> Self {
        Self::new()
    }
}

/// Clear an elapsed pause and shift the effect's start time forward by the
/// span the pause actually lasted. Returns whether the effect should step.
fn resume_if_due<const MAX_LEDS: usize>(
    effect: &mut ActiveEffect<MAX_LEDS>,
    virtual_now: Duration,
) -> bool {
    match (effect.pause_until, effect.pause_started_at) {
        (Some(until), Some(started)) => {
            if virtual_now.as_millis() >= until.as_millis() {
                // Shift by the observed span, not the requested one: a tick
                // may run late and the curve must not notice.
                let actual = elapsed_since(virtual_now, started);
                effect.started_at = effect.started_at + actual;
                effect.pause_until = None;
                effect.pause_started_at = None;
                true
            } else {
                false
            }
        }
        _ => true,
    }
}

/// `virtual_now - earlier`, saturating at zero.
fn elapsed_since(virtual_now: Duration, earlier: Duration) -> Duration {
    Duration::from_millis(
        virtual_now.as_millis().saturating_sub(earlier.as_millis()),
    )
}
