//! In-process events manager.
//!
//! This crate provides the `EventsManager` for decoupling components:
//! - Listeners attached per event type, in attach or priority order
//! - Synchronous dispatch with propagation stopping
//! - Thread-safe registry using `Arc<RwLock<T>>`, dispatch over snapshots
//! - Optional collection of listener responses
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hookline_events::{listener_fn, EventsAware, EventsManager};
//!
//! struct Mailer {
//!     events_manager: Option<Arc<EventsManager>>,
//! }
//!
//! impl EventsAware for Mailer {
//!     fn set_events_manager(&mut self, manager: Arc<EventsManager>) {
//!         self.events_manager = Some(manager);
//!     }
//!
//!     fn events_manager(&self) -> Option<&Arc<EventsManager>> {
//!         self.events_manager.as_ref()
//!     }
//! }
//!
//! let manager = Arc::new(EventsManager::new());
//! manager
//!     .attach("mailer", listener_fn(|event, _source, _data| {
//!         println!("{}", event.event_type());
//!         Ok(None)
//!     }))
//!     .unwrap();
//!
//! let mut mailer = Mailer { events_manager: None };
//! mailer.set_events_manager(manager);
//! mailer.fire_around("mailer", "send", None, |_| ()).unwrap();
//! ```

pub mod component;
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod manager;

pub use component::{after, before, EventsAware};
pub use config::{ManagerConfig, DEFAULT_PRIORITY};
pub use error::{EventsError, ListenerError, Result};
pub use event::Event;
pub use listener::{listener_fn, same_listener, ActionListener, Listener, ListenerResult};
pub use manager::EventsManager;
