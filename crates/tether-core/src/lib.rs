//! # Signals, slots, and scopes
//!
//! Tether's runtime is deliberately small. A component instance is a
//! [`Composition`]; inside it, hooks keep state in remembered slots, publish
//! it through [`Signal`]s, and hand cleanups to the composition's [`Scope`].
//!
//! ## Signals
//!
//! ```rust
//! use tether_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! ## Remembered state
//!
//! `remember` is order-based: the Nth call in a pass always returns the value
//! created by the Nth call of the first pass, so the returned `Rc` is stable
//! across passes.
//!
//! ```rust
//! use std::rc::Rc;
//! use tether_core::*;
//!
//! let comp = Composition::new();
//! let a = comp.compose(|| remember(|| signal(0)));
//! let b = comp.compose(|| remember(|| signal(99)));
//! assert!(Rc::ptr_eq(&a, &b));
//! assert_eq!(b.get(), 0);
//! ```
//!
//! ## Effects and cleanup
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tether_core::*;
//!
//! let released = Rc::new(Cell::new(false));
//! let comp = Composition::new();
//! comp.compose(|| {
//!     let released = released.clone();
//!     keyed_effect("mounted", move |_| on_unmount(move || released.set(true)));
//! });
//! comp.dispose();
//! assert!(released.get());
//! ```
//!
//! - `keyed_effect` re-runs (after cleaning up) whenever its key changes.
//! - `remember_disposable` ties a cleanup to a remembered value.
//! - `scoped_effect` hands any `Dispose` to the current scope.

pub mod dispose;
pub mod effects;
pub mod geometry;
pub mod hub;
pub mod locals;
pub mod prelude;
pub mod runtime;
pub mod scope;
pub mod signal;

pub use dispose::*;
pub use effects::*;
pub use geometry::*;
pub use hub::*;
pub use locals::*;
pub use runtime::*;
pub use scope::*;
pub use signal::*;
