//! # Host-synchronized hooks
//!
//! Each hook keeps a piece of reactive state consistent with something the
//! composition does not own: a storage entry, the body's scroll style, the
//! window size, the title. Hooks are called inside
//! [`Composition::compose`](tether_core::Composition::compose), read their
//! host through [`host::environment`], and release whatever they claimed
//! when the composition is disposed.
//!
//! ```rust
//! use tether_core::Composition;
//! use tether_hooks::host::{with_environment, MemoryHost};
//! use tether_hooks::prelude::*;
//!
//! let host = MemoryHost::new();
//! let comp = Composition::new();
//!
//! let (visits, lock) = comp.compose(|| {
//!     with_environment(host.environment(), || {
//!         (
//!             use_local_storage("visits", 0u32),
//!             use_scroll_lock(ScrollLockOptions::default().enabled(true)),
//!         )
//!     })
//! });
//! visits.update(|n| n + 1);
//! assert!(lock.is_locked());
//!
//! comp.dispose();
//! assert_eq!(host.local.raw("visits").as_deref(), Some("1"));
//! assert!(!host.scroll_locks.is_locked());
//! ```
//!
//! Every capability is optional. Without a document or storage (tests,
//! servers, workers) hooks return their defaults and do nothing.

pub mod click_outside;
pub mod debounce;
pub mod document_title;
pub mod error;
pub mod event_listener;
pub mod host;
pub mod prelude;
pub mod scroll_lock;
pub mod step;
pub mod storage;
mod tests;
pub mod window_size;

pub use error::{StorageError, StoreError, StoreOp};
