//! # Host capabilities
//!
//! Hooks never reach for browser globals directly. They ask the current
//! [`Environment`] for the capability they need, and every capability is
//! optional: a missing store or document means "not running in a browser",
//! and the hook stays inert instead of failing.
//!
//! ```rust
//! use tether_hooks::host::{environment, with_environment, MemoryHost};
//!
//! assert!(environment().document.is_none());
//!
//! let host = MemoryHost::new();
//! with_environment(host.environment(), || {
//!     assert!(environment().document.is_some());
//! });
//! ```
//!
//! [`memory`] provides a complete in-process host; `web` (wasm32 only)
//! binds the same traits to `web-sys`.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::rc::Rc;

use tether_core::{EventHub, Vec2, local, with_local};
use web_time::Duration;

use crate::error::StoreError;
use crate::scroll_lock::ScrollLockRegistry;

pub use memory::{ManualTimers, MemoryDocument, MemoryHost, MemoryStorage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StorageArea {
    /// Survives restarts; shared by every context of the same origin.
    Local,
    /// Scoped to one browsing session.
    Session,
}

/// String-keyed, string-valued store (`localStorage` / `sessionStorage`).
pub trait KeyValueStore {
    fn area(&self) -> StorageArea;
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Change made to a store by another execution context. `key == None`
/// means the whole store was cleared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: Option<String>,
    pub new_value: Option<String>,
    pub area: StorageArea,
}

/// The slice of the DOM the hooks touch: inline body style, viewport
/// metrics, and the title.
pub trait Document {
    /// Inline value of `property` on the body; empty when unset.
    fn body_style(&self, property: &str) -> String;
    /// Setting the empty string removes the inline property.
    fn set_body_style(&self, property: &str, value: &str);
    /// `window.innerWidth`, scrollbar included.
    fn inner_width(&self) -> f32;
    fn inner_height(&self) -> f32;
    /// `document.documentElement.clientWidth`, scrollbar excluded.
    fn client_width(&self) -> f32;
    fn title(&self) -> String;
    fn set_title(&self, title: &str);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

pub trait Timers {
    fn set_timeout(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerHandle;
    fn clear_timeout(&self, handle: TimerHandle);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerDown {
    pub position: Vec2,
}

/// Everything a hook may need from its host. Installed for a subtree with
/// [`with_environment`]; read with [`environment`].
#[derive(Clone)]
pub struct Environment {
    pub local_storage: Option<Rc<dyn KeyValueStore>>,
    pub session_storage: Option<Rc<dyn KeyValueStore>>,
    pub document: Option<Rc<dyn Document>>,
    pub timers: Option<Rc<dyn Timers>>,
    pub storage_events: EventHub<StorageEvent>,
    pub resize_events: EventHub<()>,
    pub pointer_events: EventHub<PointerDown>,
    pub scroll_locks: ScrollLockRegistry,
}

impl Default for Environment {
    fn default() -> Self {
        Self::detached()
    }
}

impl Environment {
    /// No storage, no document, no timers. Scroll locks still count against
    /// the thread's global registry.
    pub fn detached() -> Self {
        Self {
            local_storage: None,
            session_storage: None,
            document: None,
            timers: None,
            storage_events: EventHub::new(),
            resize_events: EventHub::new(),
            pointer_events: EventHub::new(),
            scroll_locks: ScrollLockRegistry::global(),
        }
    }

    pub fn storage(&self, area: StorageArea) -> Option<Rc<dyn KeyValueStore>> {
        match area {
            StorageArea::Local => self.local_storage.clone(),
            StorageArea::Session => self.session_storage.clone(),
        }
    }
}

pub fn with_environment<R>(env: Environment, f: impl FnOnce() -> R) -> R {
    with_local(env, f)
}

/// The innermost installed environment, or [`Environment::detached`].
pub fn environment() -> Environment {
    local::<Environment>().unwrap_or_default()
}
