use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{Dispose, EventHub, remember_disposable};

struct Listener<E> {
    handler: RefCell<Rc<dyn Fn(&E)>>,
    subscription: RefCell<Option<Dispose>>,
}

/// Subscribes to `hub` once per composition. Each event goes to the handler
/// passed on the most recent pass, so closures may capture fresh state
/// without re-subscribing. Teardown unsubscribes.
pub fn use_event_listener<E: 'static>(hub: &EventHub<E>, handler: impl Fn(&E) + 'static) {
    let handler: Rc<dyn Fn(&E)> = Rc::new(handler);
    let listener = remember_disposable(
        || Listener {
            handler: RefCell::new(handler.clone()),
            subscription: RefCell::new(None),
        },
        |listener| {
            if let Some(sub) = listener.subscription.borrow_mut().take() {
                sub.run();
            }
        },
    );
    *listener.handler.borrow_mut() = handler;

    if listener.subscription.borrow().is_some() {
        return;
    }
    let weak = Rc::downgrade(&listener);
    let sub = hub.subscribe(move |event| {
        if let Some(listener) = weak.upgrade() {
            let handler = listener.handler.borrow().clone();
            handler(event);
        }
    });
    *listener.subscription.borrow_mut() = Some(sub);
}
