mod tests {
    use embassy_time::{Duration, Instant};
    use lightshow_engine::{
        ChaseEffect, Dispatcher, FrameScheduler, OutputDriver, Rgb, Strip,
        WipeEffect,
    };

    const MAX_LEDS: usize = 16;
    const WIDTH: usize = 10;
    const RED: Rgb = Rgb::new(255, 0, 0);

    type TestDispatcher = Dispatcher<NullDriver, MAX_LEDS, 4, 8>;
    type TestScheduler = FrameScheduler<NullDriver, MAX_LEDS, 4, 8>;

    struct NullDriver;

    impl OutputDriver for NullDriver {
        type Error = &'static str;

        fn write(&mut self, _colors: &[Rgb]) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn scheduler_with_chase() -> TestScheduler {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), NullDriver).unwrap();
        dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();
        FrameScheduler::with_frame_duration(dispatcher, Duration::from_millis(100))
    }

    #[test]
    fn test_tick_paces_to_the_frame_duration() {
        let mut scheduler = scheduler_with_chase();

        let result = scheduler.tick(Instant::from_millis(1_000)).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(1_100));
        assert_eq!(result.sleep, Duration::from_millis(100));
        assert!(!result.idle);

        // Waking a little late shrinks the next sleep instead of drifting.
        let result = scheduler.tick(Instant::from_millis(1_130)).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(1_200));
        assert_eq!(result.sleep, Duration::from_millis(70));
    }

    #[test]
    fn test_drift_correction_skips_the_backlog() {
        let mut scheduler = scheduler_with_chase();

        scheduler.tick(Instant::from_millis(1_000)).unwrap();
        // A long stall: more than two frames behind. The deadline resets to
        // now instead of bursting to catch up.
        let result = scheduler.tick(Instant::from_millis(2_000)).unwrap();
        assert_eq!(result.next_deadline, Instant::from_millis(2_100));
        assert_eq!(result.sleep, Duration::from_millis(100));
    }

    #[test]
    fn test_idle_once_effects_and_events_are_done() {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher.add_strip(Strip::new(WIDTH), NullDriver).unwrap();
        dispatcher
            .run_background_effect(
                strip,
                WipeEffect::new(RED).with_duration(Duration::from_millis(300)),
            )
            .unwrap();
        let mut scheduler =
            FrameScheduler::with_frame_duration(dispatcher, Duration::from_millis(100));

        let mut ms = 0;
        loop {
            let result = scheduler.tick(Instant::from_millis(ms)).unwrap();
            if result.idle {
                break;
            }
            ms += 100;
            assert!(ms <= 1_000, "never went idle");
        }
        assert_eq!(ms, 300);
    }

    #[test]
    fn test_status_cadence_is_five_hertz() {
        let mut scheduler = scheduler_with_chase();

        let mut due_count = 0;
        for ms in (0..1_000).step_by(50) {
            let result = scheduler.tick(Instant::from_millis(ms)).unwrap();
            if result.status_due {
                due_count += 1;
            }
        }
        // Crossing 200, 400, 600 and 800ms on the virtual clock.
        assert_eq!(due_count, 4);
    }

    #[test]
    fn test_status_reports_pacing_rate() {
        let scheduler = scheduler_with_chase();
        let status = scheduler.status();
        assert_eq!(status.fps, Some(10));
        assert_eq!(status.foreground.len(), 1);
    }
}
