#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tether_core::Composition;

    use crate::host::{Document, MemoryHost, StorageArea, with_environment};
    use crate::prelude::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn stepper_clamps_then_walks_back() {
        let comp = Composition::new();
        let options = StepOptions::default().initial_step(10).max_step(5);
        let stepper = comp.compose(|| use_step(options));
        assert_eq!(stepper.current(), 5);

        for _ in 0..3 {
            stepper.go_to_previous_step();
        }
        assert_eq!(stepper.current(), 2);
    }

    #[test]
    fn counter_round_trip_through_local_storage() {
        init_logging();
        let host = MemoryHost::new();
        let comp = Composition::new();
        let counter = comp.compose(|| {
            with_environment(host.environment(), || use_local_storage("counter", 0))
        });

        assert_eq!(counter.value(), 0);
        assert_eq!(counter.error(), None);

        counter.update(|prev| prev + 5);
        assert_eq!(counter.value(), 5);
        assert_eq!(host.local.raw("counter").as_deref(), Some("5"));

        counter.remove();
        assert_eq!(counter.value(), 0);
        assert_eq!(host.local.raw("counter"), None);
    }

    #[test]
    fn three_consumers_share_one_scroll_lock() {
        init_logging();
        let host = MemoryHost::new();
        let consumers: Vec<Composition> = (0..3).map(|_| Composition::new()).collect();
        let locks: Vec<Rc<ScrollLock>> = consumers
            .iter()
            .map(|c| {
                c.compose(|| {
                    with_environment(host.environment(), || {
                        use_scroll_lock(ScrollLockOptions::default())
                    })
                })
            })
            .collect();

        for lock in &locks {
            lock.lock();
            assert_eq!(host.document.body_style("overflow"), "hidden");
        }

        locks[0].unlock();
        locks[1].unlock();
        assert_eq!(host.document.body_style("overflow"), "hidden");

        locks[2].unlock();
        assert_eq!(host.document.body_style("overflow"), "");
        assert_eq!(host.scroll_locks.active_locks(), 0);
    }

    #[test]
    fn disposing_consumers_in_any_order_balances_the_count() {
        let host = MemoryHost::new();
        host.document.set_body_style("overflow", "auto");
        let mut consumers: Vec<Composition> = (0..4).map(|_| Composition::new()).collect();
        for c in &consumers {
            c.compose(|| {
                with_environment(host.environment(), || {
                    let lock = use_scroll_lock(ScrollLockOptions::default().enabled(true));
                    // Extra locks from the same consumer must not add counts.
                    lock.lock();
                    lock.lock();
                })
            });
        }
        assert_eq!(host.scroll_locks.active_locks(), 4);

        let last = consumers.remove(1);
        for c in consumers {
            c.dispose();
            assert_eq!(host.document.body_style("overflow"), "hidden");
        }
        last.dispose();

        assert_eq!(host.scroll_locks.active_locks(), 0);
        assert_eq!(host.document.body_style("overflow"), "auto");
    }

    #[test]
    fn cross_tab_write_reaches_every_binding_of_the_key() {
        let host = MemoryHost::new();
        let a = Composition::new();
        let b = Composition::new();
        let compose = |comp: &Composition| {
            comp.compose(|| {
                with_environment(host.environment(), || {
                    use_read_local_storage("theme", String::from("light"))
                })
            })
        };
        let (ra, rb) = (compose(&a), compose(&b));

        host.local.external_set("theme", Some("\"dark\""));
        assert_eq!((ra.value(), rb.value()), ("dark".to_string(), "dark".to_string()));

        host.session.external_set("theme", Some("\"sepia\""));
        assert_eq!(ra.value(), "dark");

        a.dispose();
        host.local.external_set("theme", Some("\"light\""));
        assert_eq!((ra.value(), rb.value()), ("dark".to_string(), "light".to_string()));
    }

    #[test]
    fn hooks_are_inert_without_a_host() {
        let comp = Composition::new();
        let (stored, lock, size) = comp.compose(|| {
            (
                use_session_storage("k", 1u8),
                use_scroll_lock(ScrollLockOptions::default()),
                use_window_size(WindowSizeOptions::default()),
            )
        });

        stored.set(2);
        assert_eq!(stored.value(), 1);
        assert_eq!(stored.error(), None);
        assert_eq!(stored.area(), StorageArea::Session);
        assert_eq!(size.get(), tether_core::Size::default());

        lock.lock();
        assert!(lock.is_locked());
        comp.dispose();
        assert!(!lock.is_locked());
    }
}
