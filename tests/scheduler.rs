mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    use embassy_time::{Duration, Instant};
    use lightshow_engine::scheduler::EVENT_QUEUE_SIZE;
    use lightshow_engine::{
        Action, ChaseEffect, Dispatcher, EventQueue, OutputDriver, Rgb, Strip,
        WipeEffect,
    };

    const MAX_LEDS: usize = 16;
    const WIDTH: usize = 10;
    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const BLACK: Rgb = Rgb::new(0, 0, 0);

    type TestDispatcher = Dispatcher<NullDriver, MAX_LEDS, 4, 8>;

    #[derive(Clone, Default)]
    struct NullDriver {
        writes: Rc<RefCell<Vec<usize>>>,
    }

    impl OutputDriver for NullDriver {
        type Error = &'static str;

        fn write(&mut self, colors: &[Rgb]) -> Result<(), Self::Error> {
            self.writes.borrow_mut().push(colors.len());
            Ok(())
        }
    }

    #[test]
    fn test_event_queue_orders_by_time_then_registration() {
        let mut donor = TestDispatcher::new();
        let s0 = donor.add_strip(Strip::new(WIDTH), NullDriver::default()).unwrap();
        let s1 = donor.add_strip(Strip::new(WIDTH), NullDriver::default()).unwrap();
        let s2 = donor.add_strip(Strip::new(WIDTH), NullDriver::default()).unwrap();

        let mut queue: EventQueue<MAX_LEDS> = EventQueue::new();
        queue
            .schedule(
                Duration::from_millis(300),
                Action::ClearBackground { strip: s0, color: RED },
            )
            .unwrap();
        queue
            .schedule(
                Duration::from_millis(100),
                Action::ClearBackground { strip: s1, color: RED },
            )
            .unwrap();
        queue
            .schedule(
                Duration::from_millis(300),
                Action::ClearBackground { strip: s2, color: RED },
            )
            .unwrap();

        assert!(queue.pop_due(Duration::from_millis(50)).is_none());

        let order: Vec<_> = core::iter::from_fn(|| {
            queue.pop_due(Duration::from_millis(300)).map(|entry| {
                match entry.action {
                    Action::ClearBackground { strip, .. } => strip,
                    _ => unreachable!(),
                }
            })
        })
        .collect();

        // Earliest first; equal fire times in registration order.
        assert_eq!(order, vec![s1, s0, s2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_queue_rejects_when_full() {
        let mut queue: EventQueue<MAX_LEDS> = EventQueue::new();
        for _ in 0..EVENT_QUEUE_SIZE {
            queue
                .schedule(Duration::from_millis(10), Action::StopAll)
                .unwrap();
        }
        assert!(
            queue
                .schedule(Duration::from_millis(10), Action::StopAll)
                .is_err()
        );
    }

    #[test]
    fn test_actions_fire_only_once_due() {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher
            .add_strip(Strip::new(WIDTH), NullDriver::default())
            .unwrap();

        dispatcher
            .schedule(
                Duration::from_millis(500),
                Action::ClearBackground { strip, color: GREEN },
            )
            .unwrap();

        dispatcher.run_frame(Instant::from_millis(0)).unwrap();
        dispatcher.run_frame(Instant::from_millis(400)).unwrap();
        assert_eq!(
            dispatcher.strip(strip).unwrap().background(),
            &[BLACK; WIDTH]
        );

        dispatcher.run_frame(Instant::from_millis(500)).unwrap();
        assert_eq!(
            dispatcher.strip(strip).unwrap().background(),
            &[GREEN; WIDTH]
        );
    }

    #[test]
    fn test_same_tick_actions_apply_in_registration_order() {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher
            .add_strip(Strip::new(WIDTH), NullDriver::default())
            .unwrap();

        // Both due the same tick; the second registration must win the strip.
        dispatcher
            .schedule(
                Duration::from_millis(200),
                Action::ClearBackground { strip, color: RED },
            )
            .unwrap();
        dispatcher
            .schedule(
                Duration::from_millis(200),
                Action::ClearBackground { strip, color: GREEN },
            )
            .unwrap();

        dispatcher.run_frame(Instant::from_millis(0)).unwrap();
        dispatcher.run_frame(Instant::from_millis(250)).unwrap();

        assert_eq!(
            dispatcher.strip(strip).unwrap().background(),
            &[GREEN; WIDTH]
        );
    }

    #[test]
    fn test_failed_action_does_not_block_later_actions() {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher
            .add_strip(Strip::new(WIDTH), NullDriver::default())
            .unwrap();

        // A handle that is already gone by the time the action fires.
        let stale = dispatcher
            .run_foreground_effect(strip, ChaseEffect::new(RED))
            .unwrap();
        dispatcher.stop_effect(stale);

        dispatcher
            .schedule(Duration::from_millis(100), Action::Stop(stale))
            .unwrap();
        dispatcher
            .schedule(
                Duration::from_millis(100),
                Action::ClearBackground { strip, color: GREEN },
            )
            .unwrap();

        dispatcher.run_frame(Instant::from_millis(0)).unwrap();
        dispatcher.run_frame(Instant::from_millis(100)).unwrap();

        let status = dispatcher.status();
        assert_eq!(status.action_faults, 1);
        assert_eq!(
            dispatcher.strip(strip).unwrap().background(),
            &[GREEN; WIDTH]
        );
    }

    #[test]
    fn test_scheduled_show_runs_to_idle() {
        let mut dispatcher = TestDispatcher::new();
        let strip = dispatcher
            .add_strip(Strip::new(WIDTH), NullDriver::default())
            .unwrap();

        dispatcher
            .schedule(
                Duration::from_millis(500),
                Action::StartBackground {
                    strip,
                    effect: WipeEffect::new(GREEN)
                        .with_duration(Duration::from_millis(1_000))
                        .into(),
                },
            )
            .unwrap();

        assert!(!dispatcher.is_idle());

        let mut ms = 0;
        while !dispatcher.is_idle() && ms <= 2_000 {
            dispatcher.run_frame(Instant::from_millis(ms)).unwrap();
            ms += 100;
        }

        // Started at 0.5s, ran for 1.0s.
        assert!(dispatcher.is_idle());
        assert_eq!(ms, 1_600);
        assert_eq!(
            dispatcher.strip(strip).unwrap().background(),
            &[GREEN; WIDTH]
        );
    }
}
