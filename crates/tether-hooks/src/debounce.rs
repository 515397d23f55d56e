use std::cell::Cell;
use std::rc::Rc;

use web_time::Duration;

use crate::host::{TimerHandle, Timers};

/// Coalesces bursts of calls: each [`Debouncer::call`] cancels the pending
/// one and schedules its own callback `delay` later. Without a delay or
/// without timers, callbacks run immediately. Dropping the debouncer cancels
/// whatever is pending.
pub struct Debouncer {
    timers: Option<Rc<dyn Timers>>,
    delay: Option<Duration>,
    pending: Rc<Cell<Option<TimerHandle>>>,
}

impl Debouncer {
    pub fn new(timers: Option<Rc<dyn Timers>>, delay: Option<Duration>) -> Self {
        Self {
            timers,
            delay,
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn call(&self, f: impl FnOnce() + 'static) {
        let (Some(timers), Some(delay)) = (self.timers.as_ref(), self.delay) else {
            f();
            return;
        };
        self.cancel();

        let pending = self.pending.clone();
        let handle = timers.set_timeout(
            delay,
            Box::new(move || {
                pending.set(None);
                f();
            }),
        );
        self.pending.set(Some(handle));
    }

    pub fn cancel(&self) {
        if let (Some(handle), Some(timers)) = (self.pending.take(), self.timers.as_ref()) {
            timers.clear_timeout(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
