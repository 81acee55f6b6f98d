//! Typed event bus for Tessera.
//!
//! Listeners describe their handler methods through a [`MethodTable`]; the
//! [`EventBus`] discovers the eligible ones, files them under the event kind
//! they accept, and invokes them synchronously when an event of exactly that
//! kind is triggered.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use tessera_event::{Event, EventBus, HandlerResult, Listener, Method, MethodTable};
//!
//! #[derive(Debug)]
//! struct Ping;
//!
//! impl Event for Ping {
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl Counter {
//!     fn on_ping(&self, _: &Ping) -> HandlerResult {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Counter {
//!     fn as_any(&self) -> &dyn std::any::Any {
//!         self
//!     }
//!     fn methods(&self) -> Vec<Method> {
//!         MethodTable::<Self>::new().handler("on_ping", Self::on_ping).build()
//!     }
//! }
//!
//! let bus = EventBus::new();
//! let counter = Arc::new(Counter::default());
//! let listener: Arc<dyn Listener> = counter.clone();
//! bus.subscribe_all(&listener);
//! bus.trigger(&Ping).unwrap();
//! assert_eq!(counter.0.load(Ordering::SeqCst), 1);
//! ```

/// The event bus: registry, subscription, and dispatch.
pub mod bus;
/// Error types for the bus and for handler bodies.
pub mod error;
/// The event trait and event kinds.
pub mod event;
/// Listener capability and handler directories.
pub mod listener;
/// Callable metadata and the eligibility rule.
pub mod method;

/// Re-export of [`bus::EventBus`].
pub use bus::EventBus;
/// Re-export error types.
pub use error::{BusError, BusResult, HandlerError, HandlerResult};
/// Re-exports of [`event::Event`] and [`event::EventKind`].
pub use event::{Event, EventKind};
/// Re-export listener types.
pub use listener::{HandlerDirectory, Listener, ListenerId, SelfDescribing, StaticDirectory};
/// Re-export method types.
pub use method::{Method, MethodId, MethodTable, Param};
