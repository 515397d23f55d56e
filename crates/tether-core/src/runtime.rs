use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::scope::{Scope, scoped_effect};
use crate::Dispose;

thread_local! {
    static CURRENT: RefCell<Option<Rc<RefCell<SlotTable>>>> = const { RefCell::new(None) };
}

#[derive(Default)]
struct SlotTable {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
}

/// One component instance: the remembered slots of its hooks plus the scope
/// that owns their cleanups.
///
/// Call [`Composition::compose`] every time the component is (re)built; the
/// Nth `remember` call of each pass sees the value created by the Nth call of
/// the first pass. [`Composition::dispose`] tears the instance down.
pub struct Composition {
    // Declared before `slots` so an implicit drop runs cleanups while the
    // remembered values are still alive.
    scope: Scope,
    slots: Rc<RefCell<SlotTable>>,
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Composition {
    pub fn new() -> Self {
        Self {
            scope: Scope::new(),
            slots: Rc::new(RefCell::new(SlotTable::default())),
        }
    }

    pub fn compose<R>(&self, f: impl FnOnce() -> R) -> R {
        self.slots.borrow_mut().cursor = 0;
        let prev = CURRENT.with(|c| c.borrow_mut().replace(self.slots.clone()));
        let _guard = ComposeGuard { prev };
        self.scope.run(f)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.borrow().slots.len()
    }

    /// Runs every registered cleanup, then drops the remembered values.
    pub fn dispose(self) {
        self.scope.clone().dispose();
        let table = std::mem::take(&mut *self.slots.borrow_mut());
        drop(table);
    }
}

struct ComposeGuard {
    prev: Option<Rc<RefCell<SlotTable>>>,
}

impl Drop for ComposeGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        CURRENT.with(|c| *c.borrow_mut() = prev);
    }
}

fn current_table() -> Option<Rc<RefCell<SlotTable>>> {
    CURRENT.with(|c| c.borrow().clone())
}

/// Slot-based remember (sequential composition only).
///
/// `init` runs without the slot table borrowed, but it must not call
/// `remember` itself.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    let Some(table) = current_table() else {
        log::debug!("remember called outside of a composition; value is not retained");
        return Rc::new(init());
    };

    let cursor = {
        let mut t = table.borrow_mut();
        let cursor = t.cursor;
        t.cursor += 1;
        if let Some(rc) = t.slots.get(cursor).and_then(|s| s.downcast_ref::<Rc<T>>()) {
            return rc.clone();
        }
        cursor
    };

    let rc: Rc<T> = Rc::new(init());
    let mut t = table.borrow_mut();
    if cursor < t.slots.len() {
        log::warn!(
            "remember: slot {} type changed; replacing. \
             Hooks must be called in the same order on every pass.",
            cursor
        );
        t.slots[cursor] = Box::new(rc.clone());
    } else {
        t.slots.push(Box::new(rc.clone()));
    }
    rc
}

/// Like [`remember`], but `on_dispose` runs against the value when the owning
/// composition is torn down. Only the first pass registers the cleanup.
pub fn remember_disposable<T: 'static>(
    init: impl FnOnce() -> T,
    on_dispose: impl FnOnce(&T) + 'static,
) -> Rc<T> {
    let mut created = false;
    let value = remember(|| {
        created = true;
        init()
    });
    if created {
        let v = value.clone();
        scoped_effect(move || Dispose::new(move || on_dispose(&v)));
    }
    value
}
