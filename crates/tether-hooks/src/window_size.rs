use std::rc::{Rc, Weak};

use tether_core::{Dispose, Signal, Size, remember_disposable, signal};
use web_time::Duration;

use crate::debounce::Debouncer;
use crate::host::{Document, Environment, environment};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WindowSizeOptions {
    /// Wait this long after the last resize before publishing.
    pub debounce: Option<Duration>,
    /// Read the size on attach; otherwise start at zero until the first
    /// resize.
    pub initialize_with_value: bool,
}

impl Default for WindowSizeOptions {
    fn default() -> Self {
        Self {
            debounce: None,
            initialize_with_value: true,
        }
    }
}

impl WindowSizeOptions {
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = Some(delay);
        self
    }

    pub fn initialize_with_value(mut self, initialize: bool) -> Self {
        self.initialize_with_value = initialize;
        self
    }
}

fn read_size(document: &dyn Document) -> Size {
    Size::new(document.inner_width(), document.inner_height())
}

pub struct WindowSizeTracker {
    size: Signal<Size>,
    document: Option<Rc<dyn Document>>,
    debouncer: Debouncer,
    subscription: Dispose,
}

impl WindowSizeTracker {
    pub fn attach(env: &Environment, options: WindowSizeOptions) -> Rc<Self> {
        let document = env.document.clone();
        let initial = match (&document, options.initialize_with_value) {
            (Some(doc), true) => read_size(doc.as_ref()),
            _ => Size::default(),
        };

        Rc::new_cyclic(|weak: &Weak<Self>| {
            let subscription = if document.is_some() {
                let weak = weak.clone();
                env.resize_events.subscribe(move |_| {
                    if let Some(tracker) = weak.upgrade() {
                        tracker.on_resize();
                    }
                })
            } else {
                Dispose::noop()
            };
            Self {
                size: signal(initial),
                document,
                debouncer: Debouncer::new(env.timers.clone(), options.debounce),
                subscription,
            }
        })
    }

    pub fn size(&self) -> Size {
        self.size.get()
    }

    pub fn size_signal(&self) -> Signal<Size> {
        self.size.clone()
    }

    pub fn detach(&self) {
        self.subscription.run();
        self.debouncer.cancel();
    }

    fn on_resize(&self) {
        let Some(document) = self.document.clone() else {
            return;
        };
        let size = self.size.clone();
        self.debouncer.call(move || {
            let next = read_size(document.as_ref());
            if size.get() != next {
                size.set(next);
            }
        });
    }
}

impl Drop for WindowSizeTracker {
    fn drop(&mut self) {
        self.subscription.run();
    }
}

/// Window inner size, updated on resize. Options are read on the first pass.
pub fn use_window_size(options: WindowSizeOptions) -> Signal<Size> {
    let tracker = remember_disposable(
        || WindowSizeTracker::attach(&environment(), options),
        |tracker| tracker.detach(),
    );
    tracker.size_signal()
}
