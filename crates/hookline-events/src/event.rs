//! The event value passed to listeners.

use std::any::Any;
use std::fmt;

use crate::error::{EventsError, Result};

/// An event being dispatched.
///
/// Everything except the stop flag is fixed at construction, so a listener
/// cannot rewrite what happened mid-dispatch. The payload is opaque and
/// shared by reference with every listener of the same fire call; a payload
/// wrapped in a `Mutex` or `RefCell` lets listeners see each other's changes.
pub struct Event<'a> {
    event_type: String,
    source: &'a dyn Any,
    data: Option<&'a dyn Any>,
    cancelable: bool,
    stopped: bool,
}

impl<'a> Event<'a> {
    /// Creates a cancelable event.
    pub fn new(
        event_type: impl Into<String>,
        source: &'a dyn Any,
        data: Option<&'a dyn Any>,
    ) -> Self {
        Self::with_cancelable(event_type, source, data, true)
    }

    /// Creates an event, choosing whether listeners may stop it.
    pub fn with_cancelable(
        event_type: impl Into<String>,
        source: &'a dyn Any,
        data: Option<&'a dyn Any>,
        cancelable: bool,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            source,
            data,
            cancelable,
            stopped: false,
        }
    }

    /// Full event type, e.g. `"db:beforeQuery"`.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Part before the first `:`, or the whole type when bare.
    pub fn group(&self) -> &str {
        self.event_type
            .split_once(':')
            .map(|(group, _)| group)
            .unwrap_or(&self.event_type)
    }

    /// Part after the first `:`, if any.
    pub fn action(&self) -> Option<&str> {
        self.event_type.split_once(':').map(|(_, action)| action)
    }

    /// The component that fired the event.
    pub fn source(&self) -> &'a dyn Any {
        self.source
    }

    /// Downcasts the source to a concrete component type.
    pub fn source_as<T: Any>(&self) -> Option<&'a T> {
        self.source.downcast_ref::<T>()
    }

    /// The payload passed to `fire`, if any.
    pub fn data(&self) -> Option<&'a dyn Any> {
        self.data
    }

    /// Downcasts the payload to a concrete type.
    pub fn data_as<T: Any>(&self) -> Option<&'a T> {
        self.data.and_then(|data| data.downcast_ref::<T>())
    }

    /// Whether listeners may stop this event.
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Stops propagation to the remaining listeners.
    ///
    /// Fails with `NotCancelable` if the event was fired as non-cancelable.
    pub fn stop(&mut self) -> Result<()> {
        if !self.cancelable {
            return Err(EventsError::NotCancelable(self.event_type.clone()));
        }
        self.stopped = true;
        Ok(())
    }

    /// Whether a listener stopped propagation.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("event_type", &self.event_type)
            .field("has_data", &self.data.is_some())
            .field("cancelable", &self.cancelable)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}
