use std::cell::Cell;
use std::rc::Rc;

use tether_core::{Rect, Vec2};

use crate::event_listener::use_event_listener;
use crate::host::{PointerDown, environment};

/// Laid-out bounds of an element, filled in by whoever renders it. `None`
/// while the element is not mounted.
#[derive(Clone, Debug, Default)]
pub struct ElementRef(Rc<Cell<Option<Rect>>>);

impl ElementRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bounds(&self, bounds: Option<Rect>) {
        self.0.set(bounds);
    }

    pub fn bounds(&self) -> Option<Rect> {
        self.0.get()
    }
}

/// True when `point` misses every target. An unmounted target counts as
/// "not outside", which suppresses the callback.
pub fn is_outside(targets: &[ElementRef], point: Vec2) -> bool {
    targets
        .iter()
        .all(|t| t.bounds().is_some_and(|r| !r.contains(point)))
}

/// Calls `handler` for pointer-downs that land outside all `targets`.
pub fn use_click_outside(targets: &[ElementRef], handler: impl Fn(&PointerDown) + 'static) {
    let env = environment();
    let targets = targets.to_vec();
    use_event_listener(&env.pointer_events, move |event: &PointerDown| {
        if is_outside(&targets, event.position) {
            handler(event);
        }
    });
}
