//! Error types for event operations.

use thiserror::Error;

/// Boxed error returned by a failing listener.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during event operations.
#[derive(Error, Debug)]
pub enum EventsError {
    /// Event type is empty or lacks the `group:action` form where required.
    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    /// Listener cannot handle any event.
    #[error("invalid listener: {0}")]
    InvalidListener(String),

    /// Attempt to stop an event that was fired as non-cancelable.
    #[error("trying to cancel a non-cancelable event: {0}")]
    NotCancelable(String),

    /// A listener failed during dispatch.
    #[error(transparent)]
    Listener(ListenerError),

    /// Lock poisoned (thread panicked while holding lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl EventsError {
    /// Returns true if this error was raised by a listener.
    pub fn is_listener_failure(&self) -> bool {
        matches!(self, EventsError::Listener(_))
    }

    /// Recovers the listener's own error, if this is a listener failure.
    pub fn into_listener_error(self) -> Option<ListenerError> {
        match self {
            EventsError::Listener(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for event operations.
pub type Result<T> = std::result::Result<T, EventsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn test_listener_error_is_transparent() {
        let err = EventsError::Listener(Box::new(DiskFull));
        assert_eq!(err.to_string(), "disk full");
        assert!(err.is_listener_failure());

        let inner = err.into_listener_error().unwrap();
        assert!(inner.downcast_ref::<DiskFull>().is_some());
    }

    #[test]
    fn test_other_errors_have_no_listener_error() {
        let err = EventsError::InvalidEventType("log".to_string());
        assert!(!err.is_listener_failure());
        assert!(err.into_listener_error().is_none());
    }
}
