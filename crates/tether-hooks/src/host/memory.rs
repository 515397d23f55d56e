//! In-process host. Stores live in `BTreeMap`s, the document is a handful
//! of cells, and timers only fire when [`ManualTimers::advance`] is called.
//!
//! Writes made through [`KeyValueStore`] behave like writes from the current
//! tab and emit nothing. The `external_*` methods play the part of another
//! tab: they mutate the store and emit a [`StorageEvent`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tether_core::{EventHub, Vec2};
use web_time::Duration;

use super::{
    Document, Environment, KeyValueStore, PointerDown, StorageArea, StorageEvent, TimerHandle,
    Timers,
};
use crate::error::StoreError;
use crate::scroll_lock::ScrollLockRegistry;

pub struct MemoryStorage {
    area: StorageArea,
    entries: RefCell<BTreeMap<String, String>>,
    quota: Cell<Option<usize>>,
    failure: RefCell<Option<StoreError>>,
    events: EventHub<StorageEvent>,
}

impl MemoryStorage {
    pub fn new(area: StorageArea, events: EventHub<StorageEvent>) -> Self {
        Self {
            area,
            entries: RefCell::new(BTreeMap::new()),
            quota: Cell::new(None),
            failure: RefCell::new(None),
            events,
        }
    }

    /// Caps the total size (keys plus values, in bytes) of stored entries.
    pub fn with_quota(self, bytes: usize) -> Self {
        self.quota.set(Some(bytes));
        self
    }

    /// Makes every subsequent operation fail with `err`; `None` heals it.
    pub fn fail_with(&self, err: Option<StoreError>) {
        *self.failure.borrow_mut() = err;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Seeds an entry without notifying anyone.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Another context wrote (`Some`) or removed (`None`) `key`.
    pub fn external_set(&self, key: &str, value: Option<&str>) {
        {
            let mut entries = self.entries.borrow_mut();
            match value {
                Some(v) => entries.insert(key.to_owned(), v.to_owned()),
                None => entries.remove(key),
            };
        }
        self.events.emit(&StorageEvent {
            key: Some(key.to_owned()),
            new_value: value.map(str::to_owned),
            area: self.area,
        });
    }

    /// Another context called `clear()`.
    pub fn external_clear(&self) {
        self.entries.borrow_mut().clear();
        self.events.emit(&StorageEvent {
            key: None,
            new_value: None,
            area: self.area,
        });
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.failure.borrow().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStorage {
    fn area(&self) -> StorageArea {
        self.area
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        if let Some(quota) = self.quota.get()
            && self.used_bytes_without(key) + key.len() + value.len() > quota
        {
            return Err(StoreError::QuotaExceeded);
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

pub struct MemoryDocument {
    styles: RefCell<HashMap<String, String>>,
    viewport: Cell<(f32, f32)>,
    scrollbar_width: Cell<f32>,
    title: RefCell<String>,
}

impl MemoryDocument {
    pub fn new(inner_width: f32, inner_height: f32, scrollbar_width: f32) -> Self {
        Self {
            styles: RefCell::new(HashMap::new()),
            viewport: Cell::new((inner_width, inner_height)),
            scrollbar_width: Cell::new(scrollbar_width),
            title: RefCell::new(String::new()),
        }
    }

    pub fn set_viewport(&self, inner_width: f32, inner_height: f32) {
        self.viewport.set((inner_width, inner_height));
    }

    pub fn set_scrollbar_width(&self, width: f32) {
        self.scrollbar_width.set(width);
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new(1024.0, 768.0, 0.0)
    }
}

impl Document for MemoryDocument {
    fn body_style(&self, property: &str) -> String {
        self.styles
            .borrow()
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_body_style(&self, property: &str, value: &str) {
        let mut styles = self.styles.borrow_mut();
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_owned(), value.to_owned());
        }
    }

    fn inner_width(&self) -> f32 {
        self.viewport.get().0
    }

    fn inner_height(&self) -> f32 {
        self.viewport.get().1
    }

    fn client_width(&self) -> f32 {
        (self.viewport.get().0 - self.scrollbar_width.get()).max(0.0)
    }

    fn title(&self) -> String {
        self.title.borrow().clone()
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_owned();
    }
}

struct PendingTimer {
    deadline: Duration,
    f: Box<dyn FnOnce()>,
}

/// Virtual clock. Nothing fires until [`ManualTimers::advance`].
#[derive(Default)]
pub struct ManualTimers {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    pending: RefCell<BTreeMap<u64, PendingTimer>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Moves the clock forward, firing due timers in deadline order (ties in
    /// scheduling order). Timers scheduled by a callback fire in the same
    /// call if they fall due.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        loop {
            let next = {
                let pending = self.pending.borrow();
                pending
                    .iter()
                    .filter(|(_, t)| t.deadline <= target)
                    .min_by_key(|(id, t)| (t.deadline, **id))
                    .map(|(id, _)| *id)
            };
            let Some(id) = next else { break };
            let Some(timer) = self.pending.borrow_mut().remove(&id) else {
                break;
            };
            self.now.set(timer.deadline.max(self.now.get()));
            (timer.f)();
        }
        self.now.set(target);
    }
}

impl Timers for ManualTimers {
    fn set_timeout(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerHandle {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.pending.borrow_mut().insert(
            id,
            PendingTimer {
                deadline: self.now.get() + delay,
                f,
            },
        );
        TimerHandle(id)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.pending.borrow_mut().remove(&handle.0);
    }
}

/// A whole fake browser tab.
pub struct MemoryHost {
    pub local: Rc<MemoryStorage>,
    pub session: Rc<MemoryStorage>,
    pub document: Rc<MemoryDocument>,
    pub timers: Rc<ManualTimers>,
    pub storage_events: EventHub<StorageEvent>,
    pub resize_events: EventHub<()>,
    pub pointer_events: EventHub<PointerDown>,
    pub scroll_locks: ScrollLockRegistry,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::with_document(MemoryDocument::default())
    }

    pub fn with_document(document: MemoryDocument) -> Self {
        let storage_events = EventHub::new();
        Self {
            local: Rc::new(MemoryStorage::new(
                StorageArea::Local,
                storage_events.clone(),
            )),
            session: Rc::new(MemoryStorage::new(
                StorageArea::Session,
                storage_events.clone(),
            )),
            document: Rc::new(document),
            timers: Rc::new(ManualTimers::new()),
            storage_events,
            resize_events: EventHub::new(),
            pointer_events: EventHub::new(),
            // Private registry so hosts never share lock counts.
            scroll_locks: ScrollLockRegistry::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        Environment {
            local_storage: Some(self.local.clone()),
            session_storage: Some(self.session.clone()),
            document: Some(self.document.clone()),
            timers: Some(self.timers.clone()),
            storage_events: self.storage_events.clone(),
            resize_events: self.resize_events.clone(),
            pointer_events: self.pointer_events.clone(),
            scroll_locks: self.scroll_locks.clone(),
        }
    }

    pub fn resize(&self, inner_width: f32, inner_height: f32) {
        self.document.set_viewport(inner_width, inner_height);
        self.resize_events.emit(&());
    }

    pub fn pointer_down(&self, x: f32, y: f32) {
        self.pointer_events.emit(&PointerDown {
            position: Vec2::new(x, y),
        });
    }
}
