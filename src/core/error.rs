//=========================================================================
// Error Types
//=========================================================================
//
// The only failures that cross the public surface:
// - `BusError::UnknownEventKind` from `EventBus::wait` / `EventBus::poll`
// - `PublishError<E>` from `EventBus::publish`, which hands the event back
//
// Handler failures never appear here; the router contains them.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::adaptor::EventKind;

//=== BusError ============================================================

/// Failure reading from the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// The platform produced a record the library does not model.
    ///
    /// Harmless: log it and read again.
    #[error("unknown event kind {kind:#06x} ({})", EventKind::name(*kind))]
    UnknownEventKind { kind: u32 },
}

//=== PublishReason =======================================================

/// Why the queue refused a posted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PublishReason {
    /// Queue at capacity.
    #[error("event queue is full")]
    QueueFull,

    /// Consuming side is gone.
    #[error("event queue is disconnected")]
    Disconnected,
}

//=== PublishError ========================================================

/// A posted event was rejected.
///
/// Ownership of the event returns to the caller through
/// [`PublishError::into_event`], so nothing is leaked and the caller may
/// retry or drop it.
#[derive(Error)]
#[error("publish failed: {reason}")]
pub struct PublishError<E> {
    event: E,
    reason: PublishReason,
}

impl<E> PublishError<E> {
    pub(crate) fn new(event: E, reason: PublishReason) -> Self {
        Self { event, reason }
    }

    pub fn reason(&self) -> PublishReason {
        self.reason
    }

    /// Borrows the rejected event.
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Takes back the rejected event.
    pub fn into_event(self) -> E {
        self.event
    }
}

impl<E: fmt::Debug> fmt::Debug for PublishError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishError")
            .field("reason", &self.reason)
            .field("event", &self.event)
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_message_names_kind() {
        let err = BusError::UnknownEventKind { kind: 0x400 };
        assert_eq!(err.to_string(), "unknown event kind 0x0400 (mouse-motion)");
    }

    #[test]
    fn publish_error_returns_event() {
        let err = PublishError::new(String::from("payload"), PublishReason::QueueFull);
        assert_eq!(err.reason(), PublishReason::QueueFull);
        assert_eq!(err.to_string(), "publish failed: event queue is full");
        assert_eq!(err.into_event(), "payload");
    }

    #[test]
    fn publish_reason_messages() {
        assert_eq!(PublishReason::QueueFull.to_string(), "event queue is full");
        assert_eq!(PublishReason::Disconnected.to_string(), "event queue is disconnected");
    }

    #[test]
    fn publish_error_is_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<PublishError<String>>();
        assert_error::<PublishReason>();
    }
}
