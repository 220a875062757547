use std::any::Any;

use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - routed by a stable **event kind** string (e.g. `"product.created"`)
/// - not persisted by this layer; they live as long as their handlers hold them
pub trait Event: core::fmt::Debug + Send + Sync + 'static {
    /// Stable event kind used to route the event to registered handlers.
    fn event_kind(&self) -> &'static str;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Type-erased view, used by handlers to recover the concrete event.
    fn as_any(&self) -> &dyn Any;
}

impl dyn Event {
    /// Downcast a type-erased event to its concrete type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}
