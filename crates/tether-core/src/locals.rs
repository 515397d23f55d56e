//! # Composition locals
//!
//! Values provided to a subtree without threading them through every call.
//! Tether uses them to inject the host environment (storage, document,
//! timers) so hooks can be exercised against an in-memory host in tests and
//! against the browser in production:
//!
//! ```rust
//! use tether_core::*;
//!
//! #[derive(Clone, PartialEq, Debug)]
//! struct Locale(&'static str);
//!
//! assert_eq!(local::<Locale>(), None);
//! with_local(Locale("fr"), || {
//!     assert_eq!(local::<Locale>(), Some(Locale("fr")));
//!     with_local(Locale("de"), || assert_eq!(local::<Locale>(), Some(Locale("de"))));
//! });
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static LOCALS_STACK: RefCell<Vec<HashMap<TypeId, Box<dyn Any>>>> = RefCell::new(Vec::new());
}

struct FramePop;

impl Drop for FramePop {
    fn drop(&mut self) {
        LOCALS_STACK.with(|st| {
            st.borrow_mut().pop();
        });
    }
}

// Values set inside the frame vanish when it ends.
fn with_locals_frame<R>(f: impl FnOnce() -> R) -> R {
    LOCALS_STACK.with(|st| st.borrow_mut().push(HashMap::new()));
    let _pop = FramePop;
    f()
}

fn set_local<T: 'static>(value: T) {
    LOCALS_STACK.with(|st| {
        if let Some(frame) = st.borrow_mut().last_mut() {
            frame.insert(TypeId::of::<T>(), Box::new(value));
        } else {
            log::debug!("set_local called without a locals frame; ignored");
        }
    });
}

/// Provides `value` to everything `f` calls.
pub fn with_local<T: 'static, R>(value: T, f: impl FnOnce() -> R) -> R {
    with_locals_frame(|| {
        set_local(value);
        f()
    })
}

/// Innermost value of type `T`, if any frame provides one.
pub fn local<T: Clone + 'static>() -> Option<T> {
    LOCALS_STACK.with(|st| {
        st.borrow()
            .iter()
            .rev()
            .find_map(|frame| frame.get(&TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    })
}
