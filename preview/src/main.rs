//! Desktop preview app for lightshow-engine
//!
//! Simulates two LED strips in a window and drives the dispatcher the way a
//! hosting daemon would: commands go through the command channel, frames are
//! paced by the frame scheduler against a synthetic clock, and the status
//! snapshot refreshes on the push cadence.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::Instant as StdInstant;

use eframe::egui::{self};
use lightshow_engine::{
    BlockFillEffect, ChainEffect, ChaseEffect, Command, CommandChannel,
    CommandProcessor, Dispatcher, Duration, FadeEffect, FrameScheduler, Instant,
    OutputDriver, PulseEffect, Rgb, SparkleEffect, StatusSnapshot, Strip, StripId,
    U8Adjuster, WipeDirection, WipeEffect, ws2812_gamma,
};

/// Maximum number of LEDs a strip buffer holds
const MAX_LEDS: usize = 64;

/// Simulated strip widths
const UPPER_WIDTH: usize = 60;
const LOWER_WIDTH: usize = 40;

const MAX_STRIPS: usize = 2;
const MAX_EFFECTS: usize = 8;
const COMMAND_QUEUE: usize = 16;

/// Size of each LED rectangle in pixels
const LED_SIZE: f32 = 12.0;

/// Gap between LEDs
const LED_GAP: f32 = 2.0;

/// Frame pacing for the simulated show
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Static command channel between the UI and the frame loop
static COMMANDS: CommandChannel<MAX_LEDS, COMMAND_QUEUE> = CommandChannel::new();

type PreviewDispatcher = Dispatcher<PreviewDriver, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>;
type PreviewScheduler = FrameScheduler<PreviewDriver, MAX_LEDS, MAX_STRIPS, MAX_EFFECTS>;

/// Output driver that keeps the last flushed frame for painting.
#[derive(Clone, Default)]
struct PreviewDriver {
    frame: Rc<RefCell<Vec<Rgb>>>,
}

impl OutputDriver for PreviewDriver {
    type Error = Infallible;

    fn write(&mut self, colors: &[Rgb]) -> Result<(), Self::Error> {
        let mut frame = self.frame.borrow_mut();
        frame.clear();
        frame.extend_from_slice(colors);
        Ok(())
    }
}

fn main() -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([980.0, 480.0])
            .with_title("Lightshow Preview"),
        ..Default::default()
    };

    eframe::run_native(
        "lightshow-preview",
        options,
        Box::new(|_cc| Ok(Box::new(PreviewApp::new()))),
    )
}

struct PreviewApp {
    scheduler: PreviewScheduler,
    processor: CommandProcessor<'static, MAX_LEDS, COMMAND_QUEUE>,
    upper: StripId,
    lower: StripId,
    upper_frame: Rc<RefCell<Vec<Rgb>>>,
    lower_frame: Rc<RefCell<Vec<Rgb>>>,
    status: StatusSnapshot<MAX_EFFECTS>,

    /// Synthetic time in milliseconds
    t_ms: u64,
    /// Next frame deadline on the synthetic clock
    next_tick_ms: u64,
    /// Wall-clock reference for delta time
    last_frame: StdInstant,
    /// Whether animation is playing
    playing: bool,
    /// Time scale multiplier (1.0 = realtime)
    time_scale: f32,
    /// Color used by the launch buttons (RGB)
    color: [u8; 3],
    /// Whether to apply WS2812 gamma correction at display time
    apply_gamma: bool,
}

impl PreviewApp {
    fn new() -> Self {
        let upper_driver = PreviewDriver::default();
        let lower_driver = PreviewDriver::default();
        let upper_frame = upper_driver.frame.clone();
        let lower_frame = lower_driver.frame.clone();

        let mut dispatcher = PreviewDispatcher::new();
        let upper = dispatcher
            .add_strip(Strip::new(UPPER_WIDTH), upper_driver)
            .expect("strip arena sized for two strips");
        let lower = dispatcher
            .add_strip(Strip::new(LOWER_WIDTH), lower_driver)
            .expect("strip arena sized for two strips");

        let scheduler = FrameScheduler::with_frame_duration(dispatcher, FRAME_DURATION);
        let status = scheduler.status();

        Self {
            scheduler,
            processor: CommandProcessor::new(COMMANDS.receiver()),
            upper,
            lower,
            upper_frame,
            lower_frame,
            status,
            t_ms: 0,
            next_tick_ms: 0,
            last_frame: StdInstant::now(),
            playing: true,
            time_scale: 1.0,
            color: [40, 120, 255],
            apply_gamma: false,
        }
    }

    fn selected_color(&self) -> Rgb {
        Rgb::new(self.color[0], self.color[1], self.color[2])
    }

    fn send(command: Command<MAX_LEDS>) {
        let _ = COMMANDS.sender().try_send(command);
    }

    /// Update synthetic time based on wall clock and time scale
    fn update_time(&mut self) {
        let now = StdInstant::now();
        let delta = now.duration_since(self.last_frame);
        self.last_frame = now;

        if self.playing {
            let delta_ms = delta.as_secs_f64() * 1000.0 * f64::from(self.time_scale);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let delta_ms = delta_ms.clamp(0.0, 1_000.0) as u64;
            self.t_ms = self.t_ms.wrapping_add(delta_ms);
        }
    }

    /// Drain commands and run any frames that have come due.
    fn run_pending_frames(&mut self) {
        self.processor
            .process_pending(self.scheduler.dispatcher_mut())
            .expect("preview driver cannot fail");

        while self.t_ms >= self.next_tick_ms {
            let now = Instant::from_millis(self.t_ms);
            let result = self
                .scheduler
                .tick(now)
                .expect("preview driver cannot fail");
            self.next_tick_ms = result.next_deadline.as_millis();
            if result.status_due {
                self.status = self.scheduler.status();
            }
            if result.idle {
                break;
            }
        }
    }

    fn launch_chain_demo(&self) {
        let color = self.selected_color();
        let chain: ChainEffect<MAX_LEDS> = ChainEffect::new()
            .then(
                self.upper,
                WipeEffect::new(color).with_duration(Duration::from_millis(1_500)),
            )
            .then(
                self.upper,
                FadeEffect::new(Rgb::new(0, 0, 0))
                    .with_duration(Duration::from_millis(1_500)),
            )
            .then(
                self.lower,
                WipeEffect::new(color)
                    .with_direction(WipeDirection::OutsideIn)
                    .with_duration(Duration::from_millis(1_500)),
            );
        Self::send(Command::StartForeground {
            strip: self.upper,
            effect: chain.into(),
        });
    }

    fn paint_strip(&self, ui: &mut egui::Ui, frame: &[Rgb], width: usize) {
        let led_pitch = LED_SIZE + LED_GAP;
        #[allow(clippy::cast_precision_loss)]
        let row_width = width as f32 * led_pitch;

        let (response, painter) = ui.allocate_painter(
            egui::vec2(row_width, led_pitch),
            egui::Sense::hover(),
        );
        let origin = response.rect.min;

        let adjust: Option<U8Adjuster> =
            if self.apply_gamma { Some(ws2812_gamma) } else { None };

        #[allow(clippy::cast_precision_loss)]
        for i in 0..width {
            let pixel = frame.get(i).copied().unwrap_or(Rgb::new(0, 0, 0));
            let pixel = match adjust {
                Some(adjust) => {
                    Rgb::new(adjust(pixel.r), adjust(pixel.g), adjust(pixel.b))
                }
                None => pixel,
            };
            let x = origin.x + i as f32 * led_pitch;
            let rect = egui::Rect::from_min_size(
                egui::pos2(x, origin.y),
                egui::vec2(LED_SIZE, LED_SIZE),
            );
            painter.rect_filled(
                rect,
                3.0,
                egui::Color32::from_rgb(pixel.r, pixel.g, pixel.b),
            );
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_time();
        self.run_pending_frames();

        // Request continuous repaint for animation
        ctx.request_repaint();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                // <PlaybackControls>
                if ui
                    .button(if self.playing { "⏸ Pause" } else { "▶ Play" })
                    .clicked()
                {
                    self.playing = !self.playing;
                }

                ui.add_space(8.0);

                let secs = self.t_ms / 1000;
                let ms = self.t_ms % 1000;
                ui.label(format!("Time: {secs}.{ms:03}s"));

                ui.add_space(8.0);

                ui.label("Speed:");
                ui.add(
                    egui::Slider::new(&mut self.time_scale, 0.1..=5.0)
                        .logarithmic(true),
                );

                ui.add_space(8.0);
                ui.checkbox(&mut self.apply_gamma, "WS2812 Gamma");
                // </PlaybackControls>
            });

            ui.add_space(8.0);

            ui.horizontal(|ui| {
                ui.label("Color:");
                ui.color_edit_button_srgb(&mut self.color);

                ui.add_space(12.0);

                let color = self.selected_color();
                if ui.button("Wipe").clicked() {
                    Self::send(Command::StartBackground {
                        strip: self.upper,
                        effect: WipeEffect::new(color)
                            .with_duration(Duration::from_millis(2_000))
                            .into(),
                    });
                }
                if ui.button("Fade to black").clicked() {
                    Self::send(Command::StartBackground {
                        strip: self.upper,
                        effect: FadeEffect::new(Rgb::new(0, 0, 0))
                            .with_duration(Duration::from_millis(2_000))
                            .into(),
                    });
                }
                if ui.button("Block fill").clicked() {
                    Self::send(Command::StartBackground {
                        strip: self.lower,
                        effect: BlockFillEffect::new(color)
                            .with_block_size(8)
                            .with_speed(40)
                            .into(),
                    });
                }
                if ui.button("Pulse").clicked() {
                    Self::send(Command::StartForeground {
                        strip: self.upper,
                        effect: PulseEffect::new()
                            .with_colors(color, Rgb::new(255, 255, 255))
                            .into(),
                    });
                }
                if ui.button("Sparkle 5s").clicked() {
                    Self::send(Command::StartForeground {
                        strip: self.upper,
                        effect: SparkleEffect::new(Rgb::new(255, 255, 255))
                            .with_duration(Duration::from_millis(5_000))
                            .into(),
                    });
                }
                if ui.button("Chase").clicked() {
                    Self::send(Command::StartForeground {
                        strip: self.lower,
                        effect: ChaseEffect::new(color).with_speed(25).into(),
                    });
                }
                if ui.button("Chain demo").clicked() {
                    self.launch_chain_demo();
                }

                ui.add_space(12.0);

                if ui.button("Stop all").clicked() {
                    Self::send(Command::StopAll);
                }
                if ui.button("Blackout").clicked() {
                    Self::send(Command::Blackout);
                }
            });

            ui.add_space(16.0);

            // === LED Display ===
            ui.label(format!("Upper strip ({UPPER_WIDTH} px)"));
            self.paint_strip(ui, &self.upper_frame.borrow(), UPPER_WIDTH);
            ui.add_space(8.0);
            ui.label(format!("Lower strip ({LOWER_WIDTH} px)"));
            self.paint_strip(ui, &self.lower_frame.borrow(), LOWER_WIDTH);

            ui.add_space(16.0);

            // === Status (refreshed on the push cadence) ===
            let status = &self.status;
            ui.label(format!(
                "frame {} | virtual {}ms | events {} | faults {}/{} | fps {:?}",
                status.frame_count,
                status.virtual_now.as_millis(),
                status.pending_events,
                status.effect_faults,
                status.action_faults,
                status.fps,
            ));
            for effect in status.background.iter().chain(status.foreground.iter()) {
                ui.label(format!(
                    "  #{} {} [{:?}] strip {}{}",
                    effect.id.raw(),
                    effect.name,
                    effect.role,
                    effect.strip.index(),
                    if effect.paused { " (paused)" } else { "" },
                ));
            }
        });
    }
}
