//! Browser host (wasm32) backed by `web-sys`.
//!
//! [`environment`] builds the capability bundle once per thread and installs
//! the `storage`, `resize` and `mousedown` window listeners that feed its
//! hubs. Every capability degrades to `None` when the corresponding global is
//! missing (workers, sandboxed frames, storage disabled by policy).

use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{EventHub, Vec2};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_time::Duration;

use super::{
    Document, Environment, KeyValueStore, PointerDown, StorageArea, StorageEvent, TimerHandle,
    Timers,
};
use crate::error::StoreError;
use crate::scroll_lock::ScrollLockRegistry;

thread_local! {
    static WEB_ENV: RefCell<Option<Environment>> = const { RefCell::new(None) };
}

fn store_error(err: JsValue) -> StoreError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(e) if e.name() == "QuotaExceededError" => StoreError::QuotaExceeded,
        Some(e) if e.name() == "SecurityError" => StoreError::Security(e.message()),
        Some(e) => StoreError::Other(format!("{}: {}", e.name(), e.message())),
        None => StoreError::Other(format!("{err:?}")),
    }
}

pub struct WebStorage {
    area: StorageArea,
    storage: web_sys::Storage,
}

impl KeyValueStore for WebStorage {
    fn area(&self) -> StorageArea {
        self.area
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(store_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(store_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(store_error)
    }
}

pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebDocument {
    fn body_style_decl(&self) -> Option<web_sys::CssStyleDeclaration> {
        self.document.body().map(|b| b.style())
    }
}

impl Document for WebDocument {
    fn body_style(&self, property: &str) -> String {
        self.body_style_decl()
            .and_then(|s| s.get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_body_style(&self, property: &str, value: &str) {
        if let Some(style) = self.body_style_decl() {
            let _ = style.set_property(property, value);
        }
    }

    fn inner_width(&self) -> f32 {
        self.window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
    }

    fn inner_height(&self) -> f32 {
        self.window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as f32
    }

    fn client_width(&self) -> f32 {
        self.document
            .document_element()
            .map(|e| e.client_width())
            .unwrap_or(0) as f32
    }

    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }
}

pub struct WebTimers {
    window: web_sys::Window,
}

impl Timers for WebTimers {
    fn set_timeout(&self, delay: Duration, f: Box<dyn FnOnce()>) -> TimerHandle {
        let callback = Closure::once_into_js(move || f());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.unchecked_ref(),
                millis,
            )
            .unwrap_or_else(|err| {
                log::warn!("setTimeout failed: {err:?}");
                0
            });
        TimerHandle(id as u64)
    }

    fn clear_timeout(&self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.0 as i32);
    }
}

fn storage(window: &web_sys::Window, area: StorageArea) -> Option<web_sys::Storage> {
    let result = match area {
        StorageArea::Local => window.local_storage(),
        StorageArea::Session => window.session_storage(),
    };
    match result {
        Ok(storage) => storage,
        Err(err) => {
            log::warn!("{area:?} storage unavailable: {err:?}");
            None
        }
    }
}

fn listen(window: &web_sys::Window, kind: &str, closure: Closure<dyn FnMut(JsValue)>) {
    let callback: &js_sys::Function = closure.as_ref().unchecked_ref();
    if let Err(err) = window.add_event_listener_with_callback(kind, callback) {
        log::warn!("failed to listen for `{kind}`: {err:?}");
    }
    // Lives as long as the page.
    closure.forget();
}

fn build(window: web_sys::Window) -> Environment {
    let local = storage(&window, StorageArea::Local);
    let session = storage(&window, StorageArea::Session);
    let storage_events: EventHub<StorageEvent> = EventHub::new();
    let resize_events: EventHub<()> = EventHub::new();
    let pointer_events: EventHub<PointerDown> = EventHub::new();

    {
        let hub = storage_events.clone();
        let (local, session) = (local.clone(), session.clone());
        let on_storage = Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| {
            let Some(e) = e.dyn_ref::<web_sys::StorageEvent>() else {
                return;
            };
            let area = match e.storage_area() {
                Some(a) if Some(&a) == local.as_ref() => StorageArea::Local,
                Some(a) if Some(&a) == session.as_ref() => StorageArea::Session,
                _ => return,
            };
            hub.emit(&StorageEvent {
                key: e.key(),
                new_value: e.new_value(),
                area,
            });
        });
        listen(&window, "storage", on_storage);
    }
    {
        let hub = resize_events.clone();
        let on_resize = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| hub.emit(&()));
        listen(&window, "resize", on_resize);
    }
    {
        let hub = pointer_events.clone();
        let on_mousedown = Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| {
            if let Some(e) = e.dyn_ref::<web_sys::MouseEvent>() {
                hub.emit(&PointerDown {
                    position: Vec2::new(e.client_x() as f32, e.client_y() as f32),
                });
            }
        });
        listen(&window, "mousedown", on_mousedown);
    }

    let document = window.document().map(|document| {
        Rc::new(WebDocument {
            window: window.clone(),
            document,
        }) as Rc<dyn Document>
    });
    let to_store = |storage: Option<web_sys::Storage>, area: StorageArea| {
        storage.map(|storage| Rc::new(WebStorage { area, storage }) as Rc<dyn KeyValueStore>)
    };

    Environment {
        local_storage: to_store(local, StorageArea::Local),
        session_storage: to_store(session, StorageArea::Session),
        document,
        timers: Some(Rc::new(WebTimers {
            window: window.clone(),
        })),
        storage_events,
        resize_events,
        pointer_events,
        scroll_locks: ScrollLockRegistry::global(),
    }
}

/// The browser environment, or a detached one outside a window context.
pub fn environment() -> Environment {
    WEB_ENV.with(|cell| {
        if let Some(env) = cell.borrow().as_ref() {
            return env.clone();
        }
        let env = match web_sys::window() {
            Some(window) => build(window),
            None => {
                log::debug!("no window; using a detached environment");
                Environment::detached()
            }
        };
        *cell.borrow_mut() = Some(env.clone());
        env
    })
}
