pub use crate::click_outside::{ElementRef, use_click_outside};
pub use crate::document_title::{DocumentTitleOptions, use_document_title};
pub use crate::error::{StorageError, StoreError};
pub use crate::event_listener::use_event_listener;
pub use crate::scroll_lock::{ScrollLock, ScrollLockOptions, ScrollLockRegistry, use_scroll_lock};
pub use crate::step::{StepCursor, StepOptions, Stepper, use_step};
pub use crate::storage::{
    ReadStorage, StorageBinding, use_local_storage, use_read_local_storage,
    use_read_session_storage, use_session_storage,
};
pub use crate::window_size::{WindowSizeOptions, use_window_size};
