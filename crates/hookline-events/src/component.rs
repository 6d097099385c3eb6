//! Components that announce their operations through an events manager.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::manager::EventsManager;

/// Builds `"<group>:before<Action>"`.
pub fn before(group: &str, action: &str) -> String {
    phase_event(group, "before", action)
}

/// Builds `"<group>:after<Action>"`.
pub fn after(group: &str, action: &str) -> String {
    phase_event(group, "after", action)
}

fn phase_event(group: &str, phase: &str, action: &str) -> String {
    let mut chars = action.chars();
    match chars.next() {
        Some(first) => format!("{}:{}{}{}", group, phase, first.to_uppercase(), chars.as_str()),
        None => format!("{}:{}", group, phase),
    }
}

/// A component holding a shared events manager.
///
/// Implementors only store the manager; firing goes through the provided
/// methods, which pass the component itself as the event source.
pub trait EventsAware: Any {
    /// Stores the manager this component fires through.
    fn set_events_manager(&mut self, manager: Arc<EventsManager>);

    /// The stored manager, if one was set.
    fn events_manager(&self) -> Option<&Arc<EventsManager>>;

    /// Fires `event_type` with `self` as source. Without a manager this does
    /// nothing and returns `Ok(None)`.
    fn fire_event(&self, event_type: &str, data: Option<&dyn Any>) -> Result<Option<Value>>
    where
        Self: Sized,
    {
        match self.events_manager() {
            Some(manager) => manager.fire(event_type, self, data),
            None => Ok(None),
        }
    }

    /// Runs `operation` between `before<Action>` and `after<Action>` events
    /// of `group`.
    ///
    /// A failing `before` listener aborts before `operation` runs.
    fn fire_around<R>(
        &self,
        group: &str,
        action: &str,
        data: Option<&dyn Any>,
        operation: impl FnOnce(&Self) -> R,
    ) -> Result<R>
    where
        Self: Sized,
    {
        self.fire_event(&before(group, action), data)?;
        let output = operation(self);
        self.fire_event(&after(group, action), data)?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::listener_fn;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Cache {
        events_manager: Option<Arc<EventsManager>>,
    }

    impl EventsAware for Cache {
        fn set_events_manager(&mut self, manager: Arc<EventsManager>) {
            self.events_manager = Some(manager);
        }

        fn events_manager(&self) -> Option<&Arc<EventsManager>> {
            self.events_manager.as_ref()
        }
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(before("dummy", "action"), "dummy:beforeAction");
        assert_eq!(after("model", "save"), "model:afterSave");
        assert_eq!(before("model", "Save"), "model:beforeSave");
        assert_eq!(after("model", ""), "model:after");
    }

    #[test]
    fn test_fire_without_manager() {
        let cache = Cache::default();
        assert!(cache.events_manager().is_none());
        assert!(cache.fire_event("cache:beforeGet", None).unwrap().is_none());
    }

    #[test]
    fn test_fire_around_order_and_source() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = Arc::new(EventsManager::new());
        let seen = log.clone();
        manager
            .attach("cache", listener_fn(move |event, source, _d| {
                assert!(source.downcast_ref::<Cache>().is_some());
                seen.lock().unwrap().push(event.event_type().to_string());
                Ok(None)
            }))
            .unwrap();

        let mut cache = Cache::default();
        cache.set_events_manager(manager);

        let value = cache
            .fire_around("cache", "get", None, |_| {
                log.lock().unwrap().push("get".to_string());
                42
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["cache:beforeGet", "get", "cache:afterGet"]
        );
    }
}
