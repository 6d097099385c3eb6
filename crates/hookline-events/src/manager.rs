//! EventsManager - listener registry and synchronous dispatch.
//!
//! Concurrency patterns:
//! - `Arc<RwLock<T>>` guarding the whole registry (one lock per manager)
//! - Snapshot-before-iterate: `fire` copies the listener handles out of the
//!   lock and dispatches with no lock held

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::ManagerConfig;
use crate::error::{EventsError, Result};
use crate::event::Event;
use crate::listener::{same_listener, Listener};

/// One attached listener within a bucket.
struct ListenerEntry {
    listener: Arc<dyn Listener>,
    priority: i32,
    /// Manager-wide attach counter, breaks priority ties.
    seq: u64,
}

/// Internal state of the manager.
struct ManagerState {
    /// Buckets keyed by event type (`"db"` or `"db:beforeQuery"`).
    buckets: HashMap<String, Vec<ListenerEntry>>,
    next_seq: u64,
    enable_priorities: bool,
    collect_responses: bool,
    /// Responses of the last fire, when collecting. `None` slots are
    /// listeners that returned nothing.
    responses: Vec<Option<Value>>,
}

impl ManagerState {
    fn new(config: &ManagerConfig) -> Self {
        Self {
            buckets: HashMap::new(),
            next_seq: 0,
            enable_priorities: config.enable_priorities,
            collect_responses: config.collect_responses,
            responses: Vec::new(),
        }
    }

    /// Adds a listener to a bucket.
    ///
    /// In priority mode the entry goes after the last entry with a priority
    /// greater than or equal to its own, so equal priorities stay in attach
    /// order. Otherwise it is appended.
    fn insert(&mut self, event_type: &str, listener: Arc<dyn Listener>, priority: i32) {
        let entry = ListenerEntry {
            listener,
            priority,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        let by_priority = self.enable_priorities;
        let bucket = self.buckets.entry(event_type.to_string()).or_default();
        if by_priority {
            let pos = bucket
                .iter()
                .position(|e| e.priority < priority)
                .unwrap_or(bucket.len());
            bucket.insert(pos, entry);
        } else {
            bucket.push(entry);
        }
    }

    /// Re-sorts every bucket for the current mode.
    fn reorder(&mut self) {
        for bucket in self.buckets.values_mut() {
            if self.enable_priorities {
                bucket.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
            } else {
                bucket.sort_by_key(|e| e.seq);
            }
        }
    }

    /// Listeners for one fire, each at most once.
    ///
    /// In priority mode the group and exact buckets are merged by priority
    /// (ties in attach order). Otherwise the group bucket comes first, then
    /// the exact bucket.
    fn dispatch_queue(&self, group: &str, event_type: &str) -> Vec<Arc<dyn Listener>> {
        let mut entries: Vec<&ListenerEntry> = [group, event_type]
            .iter()
            .filter_map(|key| self.buckets.get(*key))
            .flatten()
            .collect();
        if self.enable_priorities {
            entries.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        }

        let mut queue: Vec<Arc<dyn Listener>> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !queue.iter().any(|l| same_listener(l, &entry.listener)) {
                queue.push(entry.listener.clone());
            }
        }
        queue
    }
}

/// Thread-safe events manager.
///
/// Listeners are attached to an event type, either a whole group (`"db"`)
/// or one exact event (`"db:beforeQuery"`). Firing `"db:beforeQuery"`
/// dispatches to both buckets: group first, or interleaved by priority in
/// priority mode.
///
/// # Concurrency Pattern: `Arc<RwLock<T>>`
///
/// The registry, mode flags and collected responses share one lock.
/// `fire` holds the read lock only while copying the listener handles, so
/// listeners may attach, detach or fire again without deadlocking, and such
/// changes never affect a dispatch already in progress.
///
/// # Example
///
/// ```
/// use hookline_events::{listener_fn, EventsManager};
///
/// let manager = EventsManager::new();
/// manager
///     .attach("db", listener_fn(|event, _source, _data| {
///         if event.action() == Some("beforeDelete") {
///             event.stop()?;
///         }
///         Ok(None)
///     }))
///     .unwrap();
///
/// manager.fire("db:beforeDelete", &(), None).unwrap();
/// ```
pub struct EventsManager {
    default_priority: i32,
    state: Arc<RwLock<ManagerState>>,
}

impl EventsManager {
    /// Creates a manager in insertion-order mode.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Creates a manager from the given config.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            default_priority: config.default_priority,
            state: Arc::new(RwLock::new(ManagerState::new(&config))),
        }
    }

    /// Attaches a listener with the default priority.
    pub fn attach(&self, event_type: &str, listener: Arc<dyn Listener>) -> Result<()> {
        self.attach_with_priority(event_type, listener, self.default_priority)
    }

    /// Attaches a listener with an explicit priority.
    ///
    /// Higher priorities run first while priority mode is enabled. The
    /// priority is still recorded otherwise, and takes effect if the mode is
    /// switched on later.
    ///
    /// # Errors
    ///
    /// - `InvalidEventType` if `event_type` is empty
    /// - `InvalidListener` if the listener cannot handle any event
    pub fn attach_with_priority(
        &self,
        event_type: &str,
        listener: Arc<dyn Listener>,
        priority: i32,
    ) -> Result<()> {
        if event_type.is_empty() {
            return Err(EventsError::InvalidEventType(
                "event type must not be empty".to_string(),
            ));
        }
        if !listener.is_invokable() {
            return Err(EventsError::InvalidListener(format!(
                "listener for '{}' has no handlers",
                event_type
            )));
        }

        let mut state = self
            .state
            .write()
            .map_err(|e| EventsError::LockPoisoned(e.to_string()))?;
        state.insert(event_type, listener, priority);

        debug!(event_type, priority, "Attached listener");
        Ok(())
    }

    /// Detaches every occurrence of `listener` from `event_type`.
    ///
    /// Listeners are matched by identity (the same `Arc`). Missing types or
    /// listeners are ignored.
    pub fn detach(&self, event_type: &str, listener: &Arc<dyn Listener>) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        let Some(bucket) = state.buckets.get_mut(event_type) else {
            return;
        };

        let before = bucket.len();
        bucket.retain(|e| !same_listener(&e.listener, listener));
        let removed = before - bucket.len();
        if bucket.is_empty() {
            state.buckets.remove(event_type);
        }

        if removed > 0 {
            debug!(event_type, removed, "Detached listener");
        }
    }

    /// Removes all listeners of one type, or of every type when `None`.
    pub fn detach_all(&self, event_type: Option<&str>) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        match event_type {
            Some(event_type) => {
                if state.buckets.remove(event_type).is_some() {
                    debug!(event_type, "Detached all listeners");
                }
            }
            None => {
                state.buckets.clear();
                debug!("Detached all listeners of every type");
            }
        }
    }

    /// Returns the listeners of `event_type` in dispatch order.
    ///
    /// The result is a copy; later changes to the manager don't affect it.
    pub fn get_listeners(&self, event_type: &str) -> Vec<Arc<dyn Listener>> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state
            .buckets
            .get(event_type)
            .map(|bucket| bucket.iter().map(|e| e.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns true if `event_type` has at least one listener.
    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.state
            .read()
            .map(|state| state.buckets.contains_key(event_type))
            .unwrap_or(false)
    }

    /// Switches priority mode on or off.
    ///
    /// Existing buckets are re-sorted: by priority (ties in attach order)
    /// when enabling, back to attach order when disabling.
    pub fn enable_priorities(&self, enabled: bool) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        if state.enable_priorities != enabled {
            state.enable_priorities = enabled;
            state.reorder();
            debug!(enabled, "Priority mode changed");
        }
    }

    /// Returns true if buckets are ordered by priority.
    pub fn are_priorities_enabled(&self) -> bool {
        self.state
            .read()
            .map(|state| state.enable_priorities)
            .unwrap_or(false)
    }

    /// Switches response collection on or off.
    ///
    /// While on, each fire replaces the stored responses with what each
    /// invoked listener returned, in dispatch order.
    pub fn collect_responses(&self, enabled: bool) {
        if let Ok(mut state) = self.state.write() {
            state.collect_responses = enabled;
            if !enabled {
                state.responses.clear();
            }
        }
    }

    /// Returns true if responses are being collected.
    pub fn is_collecting(&self) -> bool {
        self.state
            .read()
            .map(|state| state.collect_responses)
            .unwrap_or(false)
    }

    /// Responses collected by the last fire, one slot per invoked listener.
    pub fn responses(&self) -> Vec<Option<Value>> {
        self.state
            .read()
            .map(|state| state.responses.clone())
            .unwrap_or_default()
    }

    /// Fires a cancelable event.
    ///
    /// See [`fire_with`](Self::fire_with).
    pub fn fire(
        &self,
        event_type: &str,
        source: &dyn Any,
        data: Option<&dyn Any>,
    ) -> Result<Option<Value>> {
        self.fire_with(event_type, source, data, true)
    }

    /// Fires `event_type` (`"group:action"`) at the attached listeners.
    ///
    /// Listeners of the group bucket run first, then listeners of the exact
    /// bucket, unless priority mode orders both together; a listener
    /// attached to both runs once. If the event is
    /// cancelable and a listener stops it, the remaining listeners are
    /// skipped.
    ///
    /// # Returns
    ///
    /// The last `Some` value returned by a listener, or `None` if there were
    /// no listeners or none returned a value.
    ///
    /// # Errors
    ///
    /// - `InvalidEventType` if `event_type` has no `:` or an empty group
    /// - `Listener` with the listener's own error; no further listeners run
    pub fn fire_with(
        &self,
        event_type: &str,
        source: &dyn Any,
        data: Option<&dyn Any>,
        cancelable: bool,
    ) -> Result<Option<Value>> {
        let group = match event_type.split_once(':') {
            Some((group, _)) if !group.is_empty() => group,
            _ => return Err(EventsError::InvalidEventType(event_type.to_string())),
        };

        let (queue, collect) = {
            let state = self
                .state
                .read()
                .map_err(|e| EventsError::LockPoisoned(e.to_string()))?;
            (state.dispatch_queue(group, event_type), state.collect_responses)
        };

        trace!(event_type, listeners = queue.len(), "Firing event");

        let mut event = Event::with_cancelable(event_type, source, data, cancelable);
        let mut responses = Vec::new();
        let outcome = dispatch(
            &queue,
            &mut event,
            source,
            data,
            collect.then_some(&mut responses),
        );

        if collect {
            if let Ok(mut state) = self.state.write() {
                state.responses = responses;
            }
        }

        outcome
    }
}

/// Runs the queue front to back, stopping early when the event is stopped
/// or a listener fails.
fn dispatch(
    queue: &[Arc<dyn Listener>],
    event: &mut Event<'_>,
    source: &dyn Any,
    data: Option<&dyn Any>,
    mut responses: Option<&mut Vec<Option<Value>>>,
) -> Result<Option<Value>> {
    let mut status = None;

    for (index, listener) in queue.iter().enumerate() {
        trace!(event_type = event.event_type(), index, "Invoking listener");

        let response = listener.handle(event, source, data).map_err(|err| {
            debug!(event_type = event.event_type(), index, error = %err, "Listener failed");
            EventsError::Listener(err)
        })?;

        if let Some(responses) = responses.as_deref_mut() {
            responses.push(response.clone());
        }
        if response.is_some() {
            status = response;
        }

        if event.is_cancelable() && event.is_stopped() {
            debug!(
                event_type = event.event_type(),
                skipped = queue.len() - index - 1,
                "Propagation stopped"
            );
            break;
        }
    }

    Ok(status)
}

impl Default for EventsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventsManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("EventsManager");
        debug.field("default_priority", &self.default_priority);
        if let Ok(state) = self.state.read() {
            let mut buckets: Vec<(&str, usize)> = state
                .buckets
                .iter()
                .map(|(k, v)| (k.as_str(), v.len()))
                .collect();
            buckets.sort_unstable();
            debug
                .field("buckets", &buckets)
                .field("enable_priorities", &state.enable_priorities)
                .field("collect_responses", &state.collect_responses);
        }
        debug.finish()
    }
}
