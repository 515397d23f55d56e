use std::cell::Cell;
use std::rc::Rc;

/// Cleanup guard. Clones share the same callback, which runs at most once
/// no matter how many clones call [`Dispose::run`].
#[derive(Clone, Default)]
pub struct Dispose(Rc<Cell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(Cell::new(Some(Box::new(f)))))
    }

    /// A guard with nothing to clean up.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn run(&self) {
        if let Some(f) = self.0.take() {
            f()
        }
    }

    pub fn is_pending(&self) -> bool {
        let f = self.0.take();
        let pending = f.is_some();
        self.0.set(f);
        pending
    }
}

impl std::fmt::Debug for Dispose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispose")
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Helper to register cleanup inside an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}
