use std::sync::Arc;

use tessera_core::{PointObject, Spatial};
use tessera_event::Listener;

/// A member of a [`World`](crate::World).
///
/// Every entity has a spatial body. Entities that also want events return
/// themselves from [`as_listener`](Self::as_listener):
///
/// ```ignore
/// impl Entity for Ship {
///     fn as_listener(self: Arc<Self>) -> Option<Arc<dyn Listener>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Entity: Spatial + 'static {
    /// This entity as a listener, or `None` if it has no handlers.
    fn as_listener(self: Arc<Self>) -> Option<Arc<dyn Listener>> {
        None
    }
}

impl Entity for PointObject {}
