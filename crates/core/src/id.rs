//! Strongly-typed identifiers used across the domain.

use uuid::Uuid;

/// Identifier of a single emitted event.
///
/// Products themselves are keyed by name; events still get a unique id so
/// handlers can de-duplicate under at-least-once delivery.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EventId(Uuid);

impl EventId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
