//! # Storage-backed state
//!
//! A [`StorageBinding`] presents one key of a [`KeyValueStore`] as a typed,
//! reactive value. Values are stored as JSON. Nothing here ever panics or
//! returns an error to the caller: failures land in the binding's `error`
//! signal and the next successful operation clears it.
//!
//! - On attach the entry is read and parsed. Missing entries and entries
//!   that fail to parse fall back to the initial value (the latter with a
//!   `Parse` error).
//! - `set` / `update` serialize first; if that fails nothing changes but the
//!   error. Otherwise the in-memory value moves to the new value whether or
//!   not the store accepts it, so a rejected write (quota, disabled storage)
//!   leaves the new value in memory with a `Persistence` error.
//! - `remove` deletes the entry and falls back to the initial value.
//! - Changes made by other contexts arrive through
//!   [`Environment::storage_events`] and are applied to every binding of the
//!   same area and key. Local writes do not notify other local bindings.
//!
//! ```rust
//! use tether_hooks::host::{MemoryHost, StorageArea};
//! use tether_hooks::storage::StorageBinding;
//!
//! let host = MemoryHost::new();
//! let counter = StorageBinding::attach(&host.environment(), StorageArea::Local, "counter", 0);
//!
//! counter.update(|n| n + 5);
//! assert_eq!(counter.value(), 5);
//! assert_eq!(host.local.raw("counter").as_deref(), Some("5"));
//!
//! counter.remove();
//! assert_eq!(counter.value(), 0);
//! assert_eq!(host.local.raw("counter"), None);
//! ```

use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tether_core::{Dispose, Signal, remember_disposable, signal};

use crate::error::{StorageError, StoreOp};
use crate::host::{Environment, KeyValueStore, StorageArea, StorageEvent, environment};

pub struct StorageBinding<T> {
    key: String,
    area: StorageArea,
    initial: T,
    store: Option<Rc<dyn KeyValueStore>>,
    value: Signal<T>,
    error: Signal<Option<StorageError>>,
    subscription: Dispose,
}

fn read_entry<T: DeserializeOwned + Clone>(
    store: &dyn KeyValueStore,
    key: &str,
    initial: &T,
) -> (T, Option<StorageError>) {
    match store.get_item(key) {
        Ok(None) => (initial.clone(), None),
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(v) => (v, None),
            Err(err) => {
                log::warn!("storage key `{key}` holds invalid JSON: {err}");
                (initial.clone(), Some(StorageError::parse(key, err)))
            }
        },
        Err(err) => {
            log::warn!("reading storage key `{key}` failed: {err}");
            (
                initial.clone(),
                Some(StorageError::persistence(key, StoreOp::Read, err)),
            )
        }
    }
}

impl<T> StorageBinding<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Reads `key` from the `area` store of `env` and starts listening for
    /// changes made elsewhere. Without a store the binding is inert and
    /// holds `initial`.
    pub fn attach(
        env: &Environment,
        area: StorageArea,
        key: impl Into<String>,
        initial: T,
    ) -> Rc<Self> {
        let key = key.into();
        let store = env.storage(area);
        let (value, error) = match store.as_deref() {
            Some(store) => read_entry(store, &key, &initial),
            None => (initial.clone(), None),
        };

        Rc::new_cyclic(|weak: &Weak<Self>| {
            let subscription = if store.is_some() {
                let weak = weak.clone();
                env.storage_events.subscribe(move |event| {
                    if let Some(binding) = weak.upgrade() {
                        binding.apply_external(event);
                    }
                })
            } else {
                Dispose::noop()
            };
            Self {
                key,
                area,
                initial,
                store,
                value: signal(value),
                error: signal(error),
                subscription,
            }
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn area(&self) -> StorageArea {
        self.area
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    pub fn value(&self) -> T {
        self.value.get()
    }

    pub fn error(&self) -> Option<StorageError> {
        self.error.get()
    }

    pub fn value_signal(&self) -> Signal<T> {
        self.value.clone()
    }

    pub fn error_signal(&self) -> Signal<Option<StorageError>> {
        self.error.clone()
    }

    pub fn set(&self, value: T) {
        self.write(value);
    }

    /// Computes the next value from the current one, then writes it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.value.with(f);
        self.write(next);
    }

    fn write(&self, next: T) {
        let Some(store) = self.store.as_deref() else {
            log::debug!("no {:?} storage; write to `{}` ignored", self.area, self.key);
            return;
        };
        let raw = match serde_json::to_string(&next) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("cannot serialize value for `{}`: {err}", self.key);
                self.set_error(Some(StorageError::serialize(&self.key, err)));
                return;
            }
        };

        // Persist before notifying, so a subscriber that writes again is
        // the last to reach the store.
        let persisted = store.set_item(&self.key, &raw);
        self.value.set(next);
        match persisted {
            Ok(()) => self.set_error(None),
            Err(err) => {
                log::warn!("persisting `{}` failed: {err}", self.key);
                self.set_error(Some(StorageError::persistence(
                    &self.key,
                    StoreOp::Write,
                    err,
                )));
            }
        }
    }

    pub fn remove(&self) {
        let Some(store) = self.store.as_deref() else {
            log::debug!("no {:?} storage; remove of `{}` ignored", self.area, self.key);
            return;
        };
        match store.remove_item(&self.key) {
            Ok(()) => {
                self.value.set(self.initial.clone());
                self.set_error(None);
            }
            Err(err) => {
                log::warn!("removing `{}` failed: {err}", self.key);
                self.set_error(Some(StorageError::persistence(
                    &self.key,
                    StoreOp::Remove,
                    err,
                )));
            }
        }
    }

    /// Re-reads the entry, as on attach.
    pub fn reload(&self) {
        let Some(store) = self.store.as_deref() else {
            return;
        };
        let (value, error) = read_entry(store, &self.key, &self.initial);
        self.value.set(value);
        self.set_error(error);
    }

    /// Stops reacting to changes from other contexts.
    pub fn detach(&self) {
        self.subscription.run();
    }

    fn apply_external(&self, event: &StorageEvent) {
        if event.area != self.area {
            return;
        }
        let new_value = match &event.key {
            // The whole store was cleared.
            None => None,
            Some(key) if *key == self.key => event.new_value.as_deref(),
            Some(_) => return,
        };

        let Some(raw) = new_value else {
            self.value.set(self.initial.clone());
            self.set_error(None);
            return;
        };
        match serde_json::from_str(raw) {
            Ok(v) => {
                self.value.set(v);
                self.set_error(None);
            }
            Err(err) => {
                log::warn!("external value for `{}` is not valid JSON: {err}", self.key);
                self.set_error(Some(StorageError::parse(&self.key, err)));
            }
        }
    }
}

impl<T> StorageBinding<T> {
    fn set_error(&self, error: Option<StorageError>) {
        let changed = self.error.with(|current| *current != error);
        if changed {
            self.error.set(error);
        }
    }
}

impl<T> Drop for StorageBinding<T> {
    fn drop(&mut self) {
        self.subscription.run();
    }
}

/// Read-only view of a storage entry: value and error, no mutation.
pub struct ReadStorage<T>(Rc<StorageBinding<T>>);

impl<T> Clone for ReadStorage<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> ReadStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    pub fn attach(
        env: &Environment,
        area: StorageArea,
        key: impl Into<String>,
        initial: T,
    ) -> Self {
        Self(StorageBinding::attach(env, area, key, initial))
    }

    pub fn key(&self) -> &str {
        self.0.key()
    }

    pub fn value(&self) -> T {
        self.0.value()
    }

    pub fn error(&self) -> Option<StorageError> {
        self.0.error()
    }

    pub fn value_signal(&self) -> Signal<T> {
        self.0.value_signal()
    }

    pub fn error_signal(&self) -> Signal<Option<StorageError>> {
        self.0.error_signal()
    }

    pub fn reload(&self) {
        self.0.reload();
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

type BindingSlot<T> = std::cell::RefCell<Option<Rc<StorageBinding<T>>>>;

/// Binding remembered by the current composition. The same `Rc` comes back
/// on every pass until `key` changes, which re-attaches to the new key.
fn use_storage<T>(area: StorageArea, key: &str, initial: T) -> Rc<StorageBinding<T>>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    let slot = remember_disposable(
        || BindingSlot::<T>::default(),
        |slot| {
            if let Some(binding) = slot.borrow_mut().take() {
                binding.detach();
            }
        },
    );

    if let Some(binding) = slot.borrow().as_ref().filter(|b| b.key() == key) {
        return binding.clone();
    }

    let binding = StorageBinding::attach(&environment(), area, key, initial);
    if let Some(previous) = slot.borrow_mut().replace(binding.clone()) {
        previous.detach();
    }
    binding
}

pub fn use_local_storage<T>(key: &str, initial: T) -> Rc<StorageBinding<T>>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    use_storage(StorageArea::Local, key, initial)
}

pub fn use_session_storage<T>(key: &str, initial: T) -> Rc<StorageBinding<T>>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    use_storage(StorageArea::Session, key, initial)
}

pub fn use_read_local_storage<T>(key: &str, initial: T) -> ReadStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    ReadStorage(use_storage(StorageArea::Local, key, initial))
}

pub fn use_read_session_storage<T>(key: &str, initial: T) -> ReadStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    ReadStorage(use_storage(StorageArea::Session, key, initial))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::Deserialize;
    use tether_core::Composition;

    use super::*;
    use crate::error::StoreError;
    use crate::host::{MemoryHost, MemoryStorage, with_environment};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        theme: String,
        font_scale: f32,
        pinned: Vec<u32>,
    }

    fn local<T>(host: &MemoryHost, key: &str, initial: T) -> Rc<StorageBinding<T>>
    where
        T: Serialize + DeserializeOwned + Clone + 'static,
    {
        StorageBinding::attach(&host.environment(), StorageArea::Local, key, initial)
    }

    #[test]
    fn attach_reads_existing_entry() {
        let host = MemoryHost::new();
        host.local.insert_raw("name", "\"ada\"");
        let b = local(&host, "name", String::new());
        assert_eq!(b.value(), "ada");
        assert_eq!(b.error(), None);
    }

    #[test]
    fn attach_falls_back_on_invalid_json() {
        let host = MemoryHost::new();
        host.local.insert_raw("count", "not json");
        let b = local(&host, "count", 7);
        assert_eq!(b.value(), 7);
        assert!(matches!(b.error(), Some(StorageError::Parse { ref key, .. }) if key == "count"));
    }

    #[test]
    fn write_round_trips_through_the_store() {
        let host = MemoryHost::new();
        let prefs = Prefs {
            theme: "dark".into(),
            font_scale: 1.25,
            pinned: vec![3, 1, 4],
        };
        let b = local(&host, "prefs", None::<Prefs>);
        b.set(Some(prefs.clone()));

        let raw = host.local.raw("prefs").unwrap_or_default();
        let parsed: Option<Prefs> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, Some(prefs));
    }

    #[test]
    fn successful_write_clears_previous_error() {
        let host = MemoryHost::new();
        host.local.insert_raw("n", "{");
        let b = local(&host, "n", 0);
        assert!(b.error().is_some());
        b.set(1);
        assert_eq!(b.error(), None);
    }

    #[test]
    fn rejected_write_keeps_value_in_memory() {
        let host = MemoryHost::new();
        let b = local(&host, "n", 0);
        host.local.fail_with(Some(StoreError::QuotaExceeded));

        b.set(9);
        assert_eq!(b.value(), 9);
        assert_eq!(
            b.error(),
            Some(StorageError::Persistence {
                key: "n".into(),
                op: StoreOp::Write,
                source: StoreError::QuotaExceeded,
            })
        );
        assert_eq!(host.local.raw("n"), None);

        host.local.fail_with(None);
        b.update(|n| n + 1);
        assert_eq!(b.value(), 10);
        assert_eq!(b.error(), None);
        assert_eq!(host.local.raw("n").as_deref(), Some("10"));
    }

    #[test]
    fn quota_is_enforced() {
        let host = MemoryHost::new();
        let store = Rc::new(
            MemoryStorage::new(StorageArea::Local, host.storage_events.clone()).with_quota(8),
        );
        let mut env = host.environment();
        env.local_storage = Some(store.clone());

        let b = StorageBinding::attach(&env, StorageArea::Local, "k", String::new());
        b.set("0123456789".into());
        assert!(matches!(
            b.error(),
            Some(StorageError::Persistence { source: StoreError::QuotaExceeded, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn unserializable_value_is_rejected_without_changing_state() {
        let host = MemoryHost::new();
        let b = local(&host, "grid", HashMap::<(u8, u8), u8>::new());
        let mut next = HashMap::new();
        next.insert((1, 2), 3);

        b.set(next);
        assert!(b.value().is_empty());
        assert!(matches!(b.error(), Some(StorageError::Serialize { .. })));
        assert_eq!(host.local.raw("grid"), None);
    }

    #[test]
    fn remove_failure_keeps_value() {
        let host = MemoryHost::new();
        let b = local(&host, "n", 0);
        b.set(4);
        host.local.fail_with(Some(StoreError::Security("denied".into())));
        b.remove();
        assert_eq!(b.value(), 4);
        assert!(matches!(
            b.error(),
            Some(StorageError::Persistence { op: StoreOp::Remove, .. })
        ));
    }

    #[test]
    fn external_changes_are_applied_per_key() {
        let host = MemoryHost::new();
        let a = local(&host, "a", 0);
        let other = local(&host, "b", 0);

        host.local.external_set("a", Some("42"));
        assert_eq!(a.value(), 42);
        assert_eq!(other.value(), 0);

        host.local.external_set("a", Some("oops"));
        assert_eq!(a.value(), 42);
        assert!(a.error().is_some());

        host.local.external_set("a", Some("43"));
        assert_eq!(a.value(), 43);
        assert_eq!(a.error(), None);

        host.local.external_set("a", None);
        assert_eq!(a.value(), 0);
    }

    #[test]
    fn external_changes_respect_storage_area() {
        let host = MemoryHost::new();
        let l = local(&host, "k", 0);
        let s = StorageBinding::attach(&host.environment(), StorageArea::Session, "k", 0);

        host.session.external_set("k", Some("5"));
        assert_eq!((l.value(), s.value()), (0, 5));
    }

    #[test]
    fn external_clear_resets_to_initial() {
        let host = MemoryHost::new();
        let b = local(&host, "k", 1);
        b.set(3);
        host.local.external_clear();
        assert_eq!(b.value(), 1);
    }

    #[test]
    fn local_writes_do_not_notify_sibling_bindings() {
        let host = MemoryHost::new();
        let writer = local(&host, "k", 0);
        let reader = ReadStorage::attach(&host.environment(), StorageArea::Local, "k", 0);

        writer.set(8);
        assert_eq!(reader.value(), 0);
        reader.reload();
        assert_eq!(reader.value(), 8);

        host.local.external_set("k", Some("9"));
        assert_eq!((writer.value(), reader.value()), (9, 9));
    }

    #[test]
    fn detached_environment_is_inert() {
        let env = Environment::detached();
        let b = StorageBinding::attach(&env, StorageArea::Local, "k", 3);
        b.set(4);
        b.remove();
        assert_eq!(b.value(), 3);
        assert_eq!(b.error(), None);
        assert!(env.storage_events.is_empty());
    }

    #[test]
    fn detach_and_drop_release_the_subscription() {
        let host = MemoryHost::new();
        let a = local(&host, "k", 0);
        let b = local(&host, "k", 0);
        assert_eq!(host.storage_events.len(), 2);

        a.detach();
        host.local.external_set("k", Some("1"));
        assert_eq!((a.value(), b.value()), (0, 1));

        drop(b);
        assert!(host.storage_events.is_empty());
    }

    #[test]
    fn hook_is_stable_and_released_on_dispose() {
        let host = MemoryHost::new();
        let comp = Composition::new();
        let pass = |key: &'static str| {
            comp.compose(|| {
                with_environment(host.environment(), || use_local_storage(key, 0u32))
            })
        };

        let first = pass("visits");
        first.update(|n| n + 1);
        let second = pass("visits");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.value(), 1);

        let renamed = pass("other");
        assert!(!Rc::ptr_eq(&first, &renamed));
        assert_eq!(host.storage_events.len(), 1);

        comp.dispose();
        assert!(host.storage_events.is_empty());
    }

    #[test]
    fn read_hooks_share_store_with_writers() {
        let host = MemoryHost::new();
        host.session.insert_raw("step", "2");
        let comp = Composition::new();
        let (reader, writer) = comp.compose(|| {
            with_environment(host.environment(), || {
                (
                    use_read_session_storage("step", 0),
                    use_session_storage("step", 0),
                )
            })
        });
        assert_eq!((reader.value(), writer.value()), (2, 2));

        let again = comp.compose(|| {
            with_environment(host.environment(), || use_read_session_storage("step", 0))
        });
        assert!(reader.ptr_eq(&again));
    }

    #[test]
    fn subscriber_may_write_back_during_external_change() {
        let host = MemoryHost::new();
        let n = local(&host, "n", 1i32);
        let weak = Rc::downgrade(&n);
        n.value_signal().subscribe(move |v| {
            if *v < 0
                && let Some(b) = weak.upgrade()
            {
                b.set(0);
            }
        });

        host.local.external_set("n", Some("-3"));

        assert_eq!(n.value(), 0);
        assert_eq!(host.local.raw("n").as_deref(), Some("0"));
        assert_eq!(n.error(), None);
    }

    #[test]
    fn subscriber_write_back_during_local_write_reaches_the_store() {
        let host = MemoryHost::new();
        let n = local(&host, "n", 1i32);
        let weak = Rc::downgrade(&n);
        n.value_signal().subscribe(move |v| {
            if *v > 10
                && let Some(b) = weak.upgrade()
            {
                b.set(10);
            }
        });

        n.set(42);

        assert_eq!(n.value(), 10);
        assert_eq!(host.local.raw("n").as_deref(), Some("10"));
    }
}
