//! Shared fixtures: components firing `before`/`after` events and
//! listeners that count what they see.

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use hookline_events::{Event, EventsAware, EventsManager, Listener, ListenerResult, Result};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Component firing `dummy:beforeAction` / `dummy:afterAction`.
#[derive(Default)]
pub struct ComponentX {
    events_manager: Option<Arc<EventsManager>>,
}

impl ComponentX {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn le_action(&self) -> Result<()> {
        self.fire_around("dummy", "action", None, |_| ())
    }
}

impl EventsAware for ComponentX {
    fn set_events_manager(&mut self, manager: Arc<EventsManager>) {
        self.events_manager = Some(manager);
    }

    fn events_manager(&self) -> Option<&Arc<EventsManager>> {
        self.events_manager.as_ref()
    }
}

/// Component firing `another:beforeAction` / `another:afterAction`.
#[derive(Default)]
pub struct ComponentY {
    events_manager: Option<Arc<EventsManager>>,
}

impl ComponentY {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn le_action(&self) -> Result<()> {
        self.fire_around("another", "action", None, |_| ())
    }
}

impl EventsAware for ComponentY {
    fn set_events_manager(&mut self, manager: Arc<EventsManager>) {
        self.events_manager = Some(manager);
    }

    fn events_manager(&self) -> Option<&Arc<EventsManager>> {
        self.events_manager.as_ref()
    }
}

/// Name of the most recent counting listener to run.
pub type LastListener = Arc<Mutex<Option<&'static str>>>;

/// Counts `beforeAction` / `afterAction` events and records itself as the
/// last listener to run.
pub struct CountingListener {
    name: &'static str,
    before: AtomicUsize,
    after: AtomicUsize,
    last: LastListener,
}

impl CountingListener {
    pub fn new(name: &'static str, last: &LastListener) -> Arc<Self> {
        Arc::new(Self {
            name,
            before: AtomicUsize::new(0),
            after: AtomicUsize::new(0),
            last: last.clone(),
        })
    }

    pub fn before_count(&self) -> usize {
        self.before.load(Ordering::SeqCst)
    }

    pub fn after_count(&self) -> usize {
        self.after.load(Ordering::SeqCst)
    }
}

impl Listener for CountingListener {
    fn handle(
        &self,
        event: &mut Event<'_>,
        _source: &dyn Any,
        _data: Option<&dyn Any>,
    ) -> ListenerResult {
        match event.action() {
            Some("beforeAction") => self.before.fetch_add(1, Ordering::SeqCst),
            Some("afterAction") => self.after.fetch_add(1, Ordering::SeqCst),
            _ => return Ok(None),
        };
        *self.last.lock().unwrap() = Some(self.name);
        Ok(None)
    }
}

/// Listener with no behavior, distinguishable by name.
pub struct NamedListener(pub &'static str);

impl Listener for NamedListener {
    fn handle(
        &self,
        _event: &mut Event<'_>,
        _source: &dyn Any,
        _data: Option<&dyn Any>,
    ) -> ListenerResult {
        Ok(None)
    }
}
