//! Listener abstraction.
//!
//! Anything that can handle `(event, source, data)` is a listener:
//! - plain closures, through a blanket implementation
//! - [`ActionListener`], which routes by the event's action name
//! - any type implementing [`Listener`] directly

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ListenerError;
use crate::event::Event;

/// What a listener returns: an optional response, or a failure that aborts
/// the dispatch.
pub type ListenerResult = std::result::Result<Option<Value>, ListenerError>;

type Handler =
    dyn Fn(&mut Event<'_>, &dyn Any, Option<&dyn Any>) -> ListenerResult + Send + Sync;

/// Something that handles fired events.
pub trait Listener: Send + Sync {
    /// Handles one event. `source` and `data` are the same values the event
    /// carries.
    fn handle(
        &self,
        event: &mut Event<'_>,
        source: &dyn Any,
        data: Option<&dyn Any>,
    ) -> ListenerResult;

    /// Whether this listener can handle anything at all. Checked on attach.
    fn is_invokable(&self) -> bool {
        true
    }
}

impl<F> Listener for F
where
    F: Fn(&mut Event<'_>, &dyn Any, Option<&dyn Any>) -> ListenerResult + Send + Sync,
{
    fn handle(
        &self,
        event: &mut Event<'_>,
        source: &dyn Any,
        data: Option<&dyn Any>,
    ) -> ListenerResult {
        self(event, source, data)
    }
}

/// Wraps a closure as a shareable listener.
///
/// Keep the returned `Arc` around to detach the listener later.
pub fn listener_fn<F>(f: F) -> Arc<dyn Listener>
where
    F: Fn(&mut Event<'_>, &dyn Any, Option<&dyn Any>) -> ListenerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Returns true if both handles point at the same listener.
///
/// This is the identity `detach` uses.
pub fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    // Data pointers only, vtables are not unique.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Listener with one handler per action name.
///
/// An event whose action has no handler is ignored, so the same listener can
/// be attached to a whole group and only react to the phases it knows.
///
/// ```
/// use hookline_events::{ActionListener, EventsManager};
///
/// let audit = ActionListener::new()
///     .on("beforeSave", |_event, _source, _data| Ok(None))
///     .on("afterSave", |_event, _source, _data| Ok(None));
///
/// let manager = EventsManager::new();
/// manager.attach("model", audit.into_shared()).unwrap();
/// ```
#[derive(Default)]
pub struct ActionListener {
    handlers: HashMap<String, Box<Handler>>,
}

impl ActionListener {
    /// Creates a listener with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `action`, replacing any previous one.
    pub fn on<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Event<'_>, &dyn Any, Option<&dyn Any>) -> ListenerResult + Send + Sync + 'static,
    {
        self.handlers.insert(action.into(), Box::new(handler));
        self
    }

    /// Returns true if a handler exists for `action`.
    pub fn handles(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Converts into a shareable listener handle.
    pub fn into_shared(self) -> Arc<dyn Listener> {
        Arc::new(self)
    }
}

impl Listener for ActionListener {
    fn handle(
        &self,
        event: &mut Event<'_>,
        source: &dyn Any,
        data: Option<&dyn Any>,
    ) -> ListenerResult {
        let handler = match event.action().and_then(|action| self.handlers.get(action)) {
            Some(handler) => handler,
            None => return Ok(None),
        };
        handler(event, source, data)
    }

    fn is_invokable(&self) -> bool {
        !self.handlers.is_empty()
    }
}

impl fmt::Debug for ActionListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut actions: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("ActionListener")
            .field("actions", &actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Source;

    #[test]
    fn test_closure_listener() {
        let listener =
            listener_fn(|event, _source, _data| Ok(Some(json!(event.event_type()))));
        let source = Source;
        let mut event = Event::new("log:beforeWrite", &source, None);

        let result = listener.handle(&mut event, &source, None).unwrap();
        assert_eq!(result, Some(json!("log:beforeWrite")));
        assert!(listener.is_invokable());
    }

    #[test]
    fn test_action_listener_routes_by_action() {
        let listener = ActionListener::new()
            .on("beforeWrite", |_e, _s, _d| Ok(Some(json!("before"))))
            .on("afterWrite", |_e, _s, _d| Ok(Some(json!("after"))));
        let source = Source;

        let mut before = Event::new("log:beforeWrite", &source, None);
        let mut after = Event::new("log:afterWrite", &source, None);
        let mut other = Event::new("log:rotate", &source, None);

        let result = listener.handle(&mut before, &source, None).unwrap();
        assert_eq!(result, Some(json!("before")));
        let result = listener.handle(&mut after, &source, None).unwrap();
        assert_eq!(result, Some(json!("after")));
        let result = listener.handle(&mut other, &source, None).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_empty_action_listener_not_invokable() {
        assert!(!ActionListener::new().is_invokable());
        assert!(ActionListener::new()
            .on("beforeWrite", |_e, _s, _d| Ok(None))
            .is_invokable());
    }

    #[test]
    fn test_same_listener_identity() {
        let a = listener_fn(|_e, _s, _d| Ok(None));
        let b = listener_fn(|_e, _s, _d| Ok(None));
        let a2 = a.clone();

        assert!(same_listener(&a, &a2));
        assert!(!same_listener(&a, &b));
    }
}
