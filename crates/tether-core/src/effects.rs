use std::cell::RefCell;

use crate::{Dispose, remember_disposable};

struct KeyedSlot<K> {
    key: Option<K>,
    cleanup: Dispose,
}

/// Runs `effect` on the first pass and again whenever `key` changes,
/// cleaning up the previous run first. The last cleanup runs on teardown.
pub fn keyed_effect<K: PartialEq + 'static>(key: K, effect: impl FnOnce(&K) -> Dispose) {
    let slot = remember_disposable(
        || {
            RefCell::new(KeyedSlot {
                key: None::<K>,
                cleanup: Dispose::noop(),
            })
        },
        |slot| {
            let cleanup = std::mem::take(&mut slot.borrow_mut().cleanup);
            cleanup.run();
        },
    );

    if slot.borrow().key.as_ref() == Some(&key) {
        return;
    }

    let previous = std::mem::take(&mut slot.borrow_mut().cleanup);
    previous.run();

    let cleanup = effect(&key);
    let mut s = slot.borrow_mut();
    s.key = Some(key);
    s.cleanup = cleanup;
}
