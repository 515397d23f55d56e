//! # Scroll lock
//!
//! Any number of independent consumers can ask for the page to stop
//! scrolling. The [`ScrollLockRegistry`] counts them. The first holder that
//! brings a document snapshots the body's inline `overflow` and
//! `padding-right`, hides the overflow and pads for the vanished scrollbar;
//! the last unlock puts the snapshot back through that same document.
//! Other locks and unlocks only move the count.
//!
//! Each [`ScrollLock`] contributes at most one count, however often it is
//! locked, and gives it back when unlocked, dropped, or torn down with its
//! composition.
//!
//! ```rust
//! use tether_hooks::host::MemoryHost;
//! use tether_hooks::scroll_lock::ScrollLock;
//!
//! let host = MemoryHost::new();
//! let env = host.environment();
//! let (a, b) = (ScrollLock::new(&env, true), ScrollLock::new(&env, true));
//!
//! a.lock();
//! b.lock();
//! a.unlock();
//! assert!(host.scroll_locks.is_locked());
//! b.unlock();
//! assert!(!host.scroll_locks.is_locked());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_core::{Dispose, Signal, keyed_effect, remember_disposable, signal};

use crate::host::{Document, Environment, environment};

const OVERFLOW: &str = "overflow";
const PADDING_RIGHT: &str = "padding-right";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrollLockOptions {
    /// Lock on mount and whenever this flips to `true`; unlock when it
    /// flips to `false`.
    pub enabled: bool,
    /// Pad the body by the scrollbar width so content does not shift.
    pub preserve_scrollbar_width: bool,
}

impl Default for ScrollLockOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            preserve_scrollbar_width: true,
        }
    }
}

impl ScrollLockOptions {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn preserve_scrollbar_width(mut self, preserve: bool) -> Self {
        self.preserve_scrollbar_width = preserve;
        self
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    active: usize,
    snapshot: Option<StyleSnapshot>,
}

struct StyleSnapshot {
    document: Rc<dyn Document>,
    overflow: String,
    padding_right: String,
}

impl StyleSnapshot {
    fn restore(self) {
        self.document.set_body_style(OVERFLOW, &self.overflow);
        self.document.set_body_style(PADDING_RIGHT, &self.padding_right);
        log::debug!("scroll unlocked");
    }
}

impl std::fmt::Debug for StyleSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleSnapshot")
            .field("overflow", &self.overflow)
            .field("padding_right", &self.padding_right)
            .finish_non_exhaustive()
    }
}

thread_local! {
    static GLOBAL_REGISTRY: ScrollLockRegistry = ScrollLockRegistry::new();
}

/// Reference count of active scroll locks plus the style they replaced.
/// Clones share the same count.
#[derive(Clone, Debug, Default)]
pub struct ScrollLockRegistry(Rc<RefCell<RegistryState>>);

impl ScrollLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every environment that doesn't bring its own.
    pub fn global() -> Self {
        GLOBAL_REGISTRY.with(Clone::clone)
    }

    pub fn active_locks(&self) -> usize {
        self.0.borrow().active
    }

    pub fn is_locked(&self) -> bool {
        self.active_locks() > 0
    }

    /// Adds one holder. The style is applied by the first holder that
    /// brings a document; holders without one only count.
    pub fn acquire(&self, document: Option<&Rc<dyn Document>>, preserve_scrollbar_width: bool) {
        let mut state = self.0.borrow_mut();
        state.active += 1;
        if state.snapshot.is_some() {
            return;
        }
        let Some(doc) = document else {
            log::debug!("scroll lock acquired without a document; no style applied");
            return;
        };

        state.snapshot = Some(StyleSnapshot {
            document: doc.clone(),
            overflow: doc.body_style(OVERFLOW),
            padding_right: doc.body_style(PADDING_RIGHT),
        });
        doc.set_body_style(OVERFLOW, "hidden");

        if preserve_scrollbar_width {
            let scrollbar_width = doc.inner_width() - doc.client_width();
            if scrollbar_width > 0.0 {
                doc.set_body_style(PADDING_RIGHT, &format!("{scrollbar_width}px"));
            }
        }
        log::debug!("scroll locked");
    }

    /// Removes one holder. Only the 1 → 0 transition restores the snapshot.
    /// Releasing an unheld registry is ignored.
    pub fn release(&self) {
        let mut state = self.0.borrow_mut();
        if state.active == 0 {
            log::warn!("scroll lock released more often than acquired; ignoring");
            return;
        }
        state.active -= 1;
        if state.active > 0 {
            return;
        }
        if let Some(snapshot) = state.snapshot.take() {
            snapshot.restore();
        }
    }

    /// Drops every holder at once and restores the snapshot. Meant for
    /// resetting shared state between independent runs.
    pub fn reset(&self) {
        let mut state = self.0.borrow_mut();
        state.active = 0;
        if let Some(snapshot) = state.snapshot.take() {
            snapshot.restore();
        }
    }
}

/// One consumer's claim on the registry.
pub struct ScrollLock {
    registry: ScrollLockRegistry,
    document: Option<Rc<dyn Document>>,
    preserve_scrollbar_width: Cell<bool>,
    held: Signal<bool>,
}

impl ScrollLock {
    pub fn new(env: &Environment, preserve_scrollbar_width: bool) -> Self {
        Self {
            registry: env.scroll_locks.clone(),
            document: env.document.clone(),
            preserve_scrollbar_width: Cell::new(preserve_scrollbar_width),
            held: signal(false),
        }
    }

    /// Whether this consumer currently holds a lock.
    pub fn is_locked(&self) -> bool {
        self.held.get()
    }

    /// Reactive view of [`ScrollLock::is_locked`].
    pub fn locked_signal(&self) -> Signal<bool> {
        self.held.clone()
    }

    pub fn set_preserve_scrollbar_width(&self, preserve: bool) {
        self.preserve_scrollbar_width.set(preserve);
    }

    pub fn lock(&self) {
        if self.held.get() {
            return;
        }
        self.registry
            .acquire(self.document.as_ref(), self.preserve_scrollbar_width.get());
        self.held.set(true);
    }

    pub fn unlock(&self) {
        if !self.held.get() {
            return;
        }
        self.registry.release();
        self.held.set(false);
    }

    pub fn toggle(&self) {
        if self.held.get() {
            self.unlock();
        } else {
            self.lock();
        }
    }
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.unlock();
    }
}

/// Scroll lock bound to the current composition. The same `ScrollLock` is
/// returned on every pass; teardown releases it if still held.
pub fn use_scroll_lock(options: ScrollLockOptions) -> Rc<ScrollLock> {
    let lock = remember_disposable(
        || ScrollLock::new(&environment(), options.preserve_scrollbar_width),
        |lock| lock.unlock(),
    );
    lock.set_preserve_scrollbar_width(options.preserve_scrollbar_width);

    let target = lock.clone();
    keyed_effect(options.enabled, move |enabled| {
        if *enabled {
            target.lock();
        } else {
            target.unlock();
        }
        Dispose::noop()
    });

    lock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryDocument, MemoryHost};
    use tether_core::Composition;

    fn host_with_scrollbar(width: f32) -> MemoryHost {
        MemoryHost::with_document(MemoryDocument::new(1000.0, 800.0, width))
    }

    #[test]
    fn first_lock_hides_overflow_and_pads_scrollbar() {
        let host = host_with_scrollbar(15.0);
        let lock = ScrollLock::new(&host.environment(), true);

        lock.lock();
        assert_eq!(host.document.body_style("overflow"), "hidden");
        assert_eq!(host.document.body_style("padding-right"), "15px");

        lock.unlock();
        assert_eq!(host.document.body_style("overflow"), "");
        assert_eq!(host.document.body_style("padding-right"), "");
    }

    #[test]
    fn padding_skipped_when_not_preserving_or_no_scrollbar() {
        let host = host_with_scrollbar(15.0);
        let lock = ScrollLock::new(&host.environment(), false);
        lock.lock();
        assert_eq!(host.document.body_style("overflow"), "hidden");
        assert_eq!(host.document.body_style("padding-right"), "");
        lock.unlock();

        let host = host_with_scrollbar(0.0);
        let lock = ScrollLock::new(&host.environment(), true);
        lock.lock();
        assert_eq!(host.document.body_style("padding-right"), "");
    }

    #[test]
    fn restores_non_empty_original_style() {
        let host = host_with_scrollbar(12.0);
        host.document.set_body_style("overflow", "scroll");
        host.document.set_body_style("padding-right", "4px");
        let env = host.environment();
        let a = ScrollLock::new(&env, true);
        let b = ScrollLock::new(&env, true);

        a.lock();
        b.lock();
        assert_eq!(host.document.body_style("padding-right"), "12px");
        a.unlock();
        assert_eq!(host.document.body_style("overflow"), "hidden");
        b.unlock();

        assert_eq!(host.document.body_style("overflow"), "scroll");
        assert_eq!(host.document.body_style("padding-right"), "4px");
    }

    #[test]
    fn repeated_lock_and_unlock_are_idempotent() {
        let host = MemoryHost::new();
        let lock = ScrollLock::new(&host.environment(), true);

        lock.lock();
        lock.lock();
        lock.lock();
        assert_eq!(host.scroll_locks.active_locks(), 1);

        lock.unlock();
        lock.unlock();
        lock.unlock();
        assert_eq!(host.scroll_locks.active_locks(), 0);
        assert_eq!(host.document.body_style("overflow"), "");
    }

    #[test]
    fn registry_release_never_goes_negative() {
        let registry = ScrollLockRegistry::new();
        registry.release();
        assert_eq!(registry.active_locks(), 0);
        registry.acquire(None, true);
        assert!(registry.is_locked());
    }

    #[test]
    fn toggle_flips_state() {
        let host = MemoryHost::new();
        let lock = ScrollLock::new(&host.environment(), true);
        lock.toggle();
        assert!(lock.is_locked());
        lock.toggle();
        assert!(!lock.is_locked());
        assert!(!host.scroll_locks.is_locked());
    }

    #[test]
    fn dropping_a_held_lock_releases_it() {
        let host = MemoryHost::new();
        let env = host.environment();
        {
            let lock = ScrollLock::new(&env, true);
            lock.lock();
            assert!(host.scroll_locks.is_locked());
        }
        assert!(!host.scroll_locks.is_locked());
        assert_eq!(host.document.body_style("overflow"), "");
    }

    #[test]
    fn later_acquisitions_do_not_recapture_style() {
        let host = MemoryHost::new();
        let env = host.environment();
        let a = ScrollLock::new(&env, true);
        let b = ScrollLock::new(&env, true);

        a.lock();
        // "hidden" is now inline; b must not snapshot it as the original.
        b.lock();
        a.unlock();
        b.unlock();
        assert_eq!(host.document.body_style("overflow"), "");
    }

    #[test]
    fn reset_restores_and_zeroes() {
        let host = MemoryHost::new();
        let registry = host.scroll_locks.clone();
        let doc: Rc<dyn Document> = host.document.clone();
        registry.acquire(Some(&doc), true);
        registry.acquire(Some(&doc), true);

        registry.reset();
        assert_eq!(registry.active_locks(), 0);
        assert_eq!(host.document.body_style("overflow"), "");
    }

    #[test]
    fn hook_follows_enabled_option() {
        let host = MemoryHost::new();
        let comp = Composition::new();
        let pass = |enabled: bool| {
            comp.compose(|| {
                crate::host::with_environment(host.environment(), || {
                    use_scroll_lock(ScrollLockOptions::default().enabled(enabled))
                })
            })
        };

        let first = pass(false);
        assert!(!host.scroll_locks.is_locked());

        let second = pass(true);
        assert!(Rc::ptr_eq(&first, &second));
        assert!(host.scroll_locks.is_locked());

        pass(true);
        assert_eq!(host.scroll_locks.active_locks(), 1);

        pass(false);
        assert!(!host.scroll_locks.is_locked());
    }

    #[test]
    fn hook_teardown_releases_exactly_once() {
        let host = MemoryHost::new();
        let other = ScrollLock::new(&host.environment(), true);
        other.lock();

        let comp = Composition::new();
        let lock = comp.compose(|| {
            crate::host::with_environment(host.environment(), || {
                use_scroll_lock(ScrollLockOptions::default().enabled(true))
            })
        });
        lock.lock();
        assert_eq!(host.scroll_locks.active_locks(), 2);

        comp.dispose();
        assert_eq!(host.scroll_locks.active_locks(), 1);
        drop(lock);
        assert_eq!(host.scroll_locks.active_locks(), 1);
        assert_eq!(host.document.body_style("overflow"), "hidden");
    }

    #[test]
    fn holder_without_document_does_not_block_styling() {
        let host = MemoryHost::new();
        host.document.set_body_style("overflow", "auto");
        let shared = ScrollLockRegistry::new();
        let mut headless = Environment::detached();
        headless.scroll_locks = shared.clone();
        let mut attached = host.environment();
        attached.scroll_locks = shared.clone();

        let a = ScrollLock::new(&headless, true);
        let b = ScrollLock::new(&attached, true);
        a.lock();
        b.lock();
        assert_eq!(shared.active_locks(), 2);
        assert_eq!(host.document.body_style("overflow"), "hidden");

        b.unlock();
        assert_eq!(host.document.body_style("overflow"), "hidden");
        a.unlock();
        assert_eq!(shared.active_locks(), 0);
        assert_eq!(host.document.body_style("overflow"), "auto");
    }
}
