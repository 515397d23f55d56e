//! Typed notification channels.
//!
//! An [`EventHub`] is how the host tells hooks that something happened
//! outside the composition: a storage entry changed in another tab, the
//! window was resized, the pointer went down. Hooks subscribe once and keep
//! the returned [`Dispose`] so teardown removes the handler again.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::Dispose;

new_key_type! {
    pub struct HandlerId;
}

type Handler<E> = Rc<dyn Fn(&E)>;
type Handlers<E> = RefCell<SlotMap<HandlerId, Handler<E>>>;

pub struct EventHub<E> {
    handlers: Rc<Handlers<E>>,
}

impl<E> Clone for EventHub<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<E> Default for EventHub<E> {
    fn default() -> Self {
        Self {
            handlers: Rc::new(RefCell::new(SlotMap::with_key())),
        }
    }
}

impl<E: 'static> EventHub<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f`; running the returned guard unregisters it.
    pub fn subscribe(&self, f: impl Fn(&E) + 'static) -> Dispose {
        let id = self.handlers.borrow_mut().insert(Rc::new(f));
        let weak: Weak<Handlers<E>> = Rc::downgrade(&self.handlers);
        Dispose::new(move || {
            if let Some(handlers) = weak.upgrade() {
                handlers.borrow_mut().remove(id);
            }
        })
    }

    /// Delivers `event` to every handler registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let handlers: Vec<Handler<E>> = self.handlers.borrow().values().cloned().collect();
        for h in handlers {
            h(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}
