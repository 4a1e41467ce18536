mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embassy_time::{Duration, Instant};
    use lightshow_engine::{
        ChaseEffect, Dispatcher, EffectRole, OutputDriver, PlaybackEffect, Rgb,
        RowSourceError, SparkleEffect, StartError, Strip, StripCapacityError,
        WipeEffect,
    };

    const MAX_LEDS: usize = 16;
    const WIDTH: usize = 10;
    const BLUE: Rgb = Rgb::new(0, 0, 255);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLACK: Rgb = Rgb::new(0, 0, 0);

    type TestDispatcher = Dispatcher<SharedDriver, MAX_LEDS, 4, 8>;

    /// Records every flushed frame so tests can count and inspect writes.
    #[derive(Clone, Default)]
    struct SharedDriver {
        frames: Rc<RefCell<Vec<Vec<Rgb>>>>,
    }

    impl SharedDriver {
        fn new() -> (Self, Rc<RefCell<Vec<Vec<Rgb>>>>) {
            let driver = Self::default();
            let frames = driver.frames.clone();
            (driver, frames)
        }
    }

    impl OutputDriver for SharedDriver {
        type Error = &'static str;

        fn write(&mut self, colors: &[Rgb]) -> Result<(), Self::Error> {
            self.frames.borrow_mut().push(colors.to_vec());
            Ok(())
        }
    }

    struct FailingDriver;

    impl OutputDriver for FailingDriver {
        type Error = &'static str;

        fn write(&mut self, _colors: &[Rgb]) -> Result<(), Self::Error> {
            Err("transport down")
        }
    }

    fn tick_range(dispatcher: &mut TestDispatcher, from_ms: u64, to_ms: u64) {
        let mut ms = from_ms;
        while ms <= to_ms {
            dispatcher.run_frame(Instant::from_millis(ms)).unwrap();
            ms += 100;
        }
    }

    #[test]
    fn test_background_wipe_end_to_end() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(1_000)),
            )
            .unwrap();

        // Ten 0.1s steps after the anchoring frame at t=0.
        tick_range(&mut dispatcher, 0, 1_000);

        assert_eq!(dispatcher.strip(strip).unwrap().background(), &[BLUE; WIDTH]);
        let status = dispatcher.status();
        assert!(status.background.is_empty());
        assert!(dispatcher.is_idle());
        // Every frame flushed the touched strip exactly once.
        assert_eq!(frames.borrow().len(), 11);
        assert_eq!(frames.borrow().last().unwrap(), &[BLUE; WIDTH]);
    }

    #[test]
    fn test_idle_strips_are_not_flushed() {
        let mut dispatcher = TestDispatcher::new();
        let (driver_a, frames_a) = SharedDriver::new();
        let (driver_b, frames_b) = SharedDriver::new();
        let strip_a = dispatcher.add_strip(Strip::new(WIDTH), driver_a).unwrap();
        let _strip_b = dispatcher.add_strip(Strip::new(WIDTH), driver_b).unwrap();

        dispatcher
            .run_foreground_effect(strip_a, ChaseEffect::new(RED))
            .unwrap();

        tick_range(&mut dispatcher, 0, 200);

        assert_eq!(frames_a.borrow().len(), 3);
        assert!(frames_b.borrow().is_empty());
    }

    #[test]
    fn test_one_flush_per_strip_however_many_effects() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(5_000)),
            )
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, SparkleEffect::new(Rgb::new(255, 255, 255)))
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();

        tick_range(&mut dispatcher, 0, 400);

        assert_eq!(frames.borrow().len(), 5);
    }

    #[test]
    fn test_background_persists_under_foreground() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(1_000)),
            )
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, SparkleEffect::new(Rgb::new(255, 255, 255)))
            .unwrap();

        tick_range(&mut dispatcher, 0, 2_000);

        // The wipe is long gone; its background survives beneath the sparkle.
        assert!(dispatcher.status().background.is_empty());
        assert_eq!(dispatcher.strip(strip).unwrap().background(), &[BLUE; WIDTH]);
        for pixel in dispatcher.strip(strip).unwrap().live() {
            let is_sparkle = pixel.r == pixel.g && pixel.g == pixel.b;
            assert!(
                *pixel == BLUE || is_sparkle,
                "unexpected pixel {pixel:?}"
            );
        }
    }

    #[test]
    fn test_foreground_overwrites_in_registration_order() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(BLUE))
            .unwrap();

        dispatcher.run_frame(Instant::from_millis(0)).unwrap();

        // Both chases drew pixels 0-2; the later registration wins.
        assert_eq!(dispatcher.strip(strip).unwrap().pixel(0), Some(BLUE));
    }

    #[test]
    fn test_stop_effect_is_immediate_and_writes_persist() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        let wipe = dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(1_000)),
            )
            .unwrap();

        tick_range(&mut dispatcher, 0, 300);
        assert!(dispatcher.stop_effect(wipe));
        assert!(!dispatcher.stop_effect(wipe));

        let flushes_at_stop = frames.borrow().len();
        dispatcher.run_frame(Instant::from_millis(400)).unwrap();

        // No further steps, no further flushes, prior writes intact.
        assert!(dispatcher.status().background.is_empty());
        assert_eq!(frames.borrow().len(), flushes_at_stop);
        let background = dispatcher.strip(strip).unwrap().background();
        assert_eq!(&background[..3], &[BLUE; 3]);
        assert_eq!(&background[3..], &[BLACK; 7]);
    }

    #[test]
    fn test_stop_works_while_paused() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        let wipe = dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(1_000)),
            )
            .unwrap();

        tick_range(&mut dispatcher, 0, 300);
        assert!(dispatcher.pause_effect(wipe, Duration::from_millis(10_000)));
        assert!(dispatcher.stop_effect(wipe));
        dispatcher.run_frame(Instant::from_millis(400)).unwrap();
        assert!(dispatcher.is_idle());
    }

    fn broken_source(_row: usize, _out: &mut [Rgb]) -> Result<bool, RowSourceError> {
        Err(RowSourceError)
    }

    #[test]
    fn test_faulty_effect_is_removed_without_aborting_the_frame() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_background_effect(strip, PlaybackEffect::new(broken_source))
            .unwrap();
        dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(1_000)),
            )
            .unwrap();

        dispatcher.run_frame(Instant::from_millis(0)).unwrap();

        let status = dispatcher.status();
        assert_eq!(status.effect_faults, 1);
        assert_eq!(status.background.len(), 1);
        assert_eq!(status.background[0].name, "wipe");
        // The frame still completed and flushed.
        assert_eq!(frames.borrow().len(), 1);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let mut dispatcher: Dispatcher<FailingDriver, MAX_LEDS, 4, 8> =
            Dispatcher::new();
        let strip = dispatcher
            .add_strip(Strip::new(WIDTH), FailingDriver)
            .unwrap();
        dispatcher
            .run_background_effect(strip, WipeEffect::new(BLUE))
            .unwrap();

        assert_eq!(
            dispatcher.run_frame(Instant::from_millis(0)),
            Err("transport down")
        );
    }

    #[test]
    fn test_blackout_stops_everything_and_flushes_black() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher
            .run_background_effect(strip, WipeEffect::new(BLUE))
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();
        tick_range(&mut dispatcher, 0, 300);

        dispatcher.blackout().unwrap();

        assert!(dispatcher.is_idle());
        assert_eq!(frames.borrow().last().unwrap(), &[BLACK; WIDTH]);
        assert_eq!(dispatcher.strip(strip).unwrap().background(), &[BLACK; WIDTH]);
    }

    #[test]
    fn test_clear_background() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        dispatcher.clear_background(strip, GREEN).unwrap();
        assert_eq!(dispatcher.strip(strip).unwrap().background(), &[GREEN; WIDTH]);
    }

    #[test]
    fn test_role_mismatch_is_rejected_synchronously() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        assert_eq!(
            dispatcher.run_background_effect(strip, ChaseEffect::new(RED)),
            Err(StartError::RoleMismatch)
        );
        assert_eq!(
            dispatcher.run_foreground_effect(strip, WipeEffect::new(BLUE)),
            Err(StartError::RoleMismatch)
        );
    }

    #[test]
    fn test_unknown_strip_is_rejected() {
        let mut donor = TestDispatcher::new();
        let (driver_a, _) = SharedDriver::new();
        let (driver_b, _) = SharedDriver::new();
        donor.add_strip(Strip::new(WIDTH), driver_a).unwrap();
        let foreign = donor.add_strip(Strip::new(WIDTH), driver_b).unwrap();

        let mut dispatcher = TestDispatcher::new();
        let (driver, _) = SharedDriver::new();
        dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        assert_eq!(
            dispatcher.run_background_effect(foreign, WipeEffect::new(BLUE)),
            Err(StartError::UnknownStrip)
        );
    }

    #[test]
    fn test_strip_arena_capacity() {
        let mut dispatcher: Dispatcher<SharedDriver, MAX_LEDS, 2, 8> =
            Dispatcher::new();
        for _ in 0..2 {
            let (driver, _) = SharedDriver::new();
            dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();
        }
        let (driver, _) = SharedDriver::new();
        assert_eq!(
            dispatcher.add_strip(Strip::new(WIDTH), driver),
            Err(StripCapacityError)
        );
    }

    #[test]
    fn test_status_snapshot_reports_roles_and_pauses() {
        let mut dispatcher = TestDispatcher::new();
        let (driver, _frames) = SharedDriver::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), driver).unwrap();

        let wipe = dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(BLUE).with_duration(Duration::from_millis(5_000)),
            )
            .unwrap();
        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();
        dispatcher.pause_effect(wipe, Duration::from_millis(500));

        let status = dispatcher.status();
        assert_eq!(status.background.len(), 1);
        assert_eq!(status.background[0].role, EffectRole::Background);
        assert_eq!(status.background[0].name, "wipe");
        assert!(status.background[0].paused);
        assert_eq!(status.foreground.len(), 1);
        assert_eq!(status.foreground[0].role, EffectRole::Foreground);
        assert_eq!(status.foreground[0].name, "chase");
        assert!(!status.foreground[0].paused);
        assert_eq!(status.fps, None);
    }
}
