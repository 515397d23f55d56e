pub use crate::dispose::{Dispose, on_unmount};
pub use crate::effects::keyed_effect;
pub use crate::geometry::{Rect, Size, Vec2};
pub use crate::hub::EventHub;
pub use crate::locals::{local, with_local};
pub use crate::runtime::{Composition, remember, remember_disposable};
pub use crate::scope::{Scope, current_scope, scoped_effect};
pub use crate::signal::{Signal, signal};
