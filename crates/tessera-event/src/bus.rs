//! Handler registry and synchronous dispatch.
//!
//! The registry maps each [`EventKind`] to an ordered list of bindings, one
//! per callable, each holding the ordered set of listeners bound to it:
//!
//! ```text
//! EventKind ──► [ (Method, [listener, listener, ..]), (Method, [..]), .. ]
//! ```
//!
//! ## Rules
//! - A (callable, listener) pair is stored at most once.
//! - A binding is dropped as soon as its listener list empties; a kind is
//!   dropped as soon as it has no bindings.
//! - [`EventBus::trigger`] matches the event's exact kind and invokes
//!   callables in subscription order, and listeners per callable in
//!   subscription order.
//! - The first failing handler aborts the rest of that trigger's fan-out.
//! - A callable is only ever bound to instances of the type that declares it.
//!   A callable that cannot be invoked on its listener or event at dispatch
//!   time is evicted for that kind and reported as
//!   [`BusError::InvariantViolation`].
//!
//! ## Locking
//! Every public operation holds one reentrant lock for its whole duration,
//! including the entire fan-out of a trigger. A slow or blocking handler
//! therefore stalls every other thread using the bus. Handlers may call back
//! into the same bus from the dispatching thread: each trigger works from a
//! snapshot of the bindings taken before the first handler runs, so
//! subscriptions changed by a handler take effect from the next trigger.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, error, trace, warn};

use crate::error::{BusError, BusResult, HandlerError};
use crate::event::{Event, EventKind};
use crate::listener::{HandlerDirectory, Listener, ListenerId, SelfDescribing};
use crate::method::{Method, MethodId};

struct Binding {
    method: Method,
    listeners: Vec<Arc<dyn Listener>>,
}

type Plan = Vec<(Method, Vec<Arc<dyn Listener>>)>;

#[derive(Default)]
struct Registry {
    kinds: HashMap<EventKind, Vec<Binding>>,
}

impl Registry {
    /// Returns `true` if the pair was not already present.
    fn insert(&mut self, kind: EventKind, method: &Method, listener: &Arc<dyn Listener>) -> bool {
        let bindings = self.kinds.entry(kind).or_default();
        let index = match bindings.iter().position(|b| b.method == *method) {
            Some(index) => index,
            None => {
                bindings.push(Binding {
                    method: method.clone(),
                    listeners: Vec::new(),
                });
                bindings.len() - 1
            }
        };

        let listeners = &mut bindings[index].listeners;
        let id = ListenerId::of(listener);
        if listeners.iter().any(|l| ListenerId::of(l) == id) {
            return false;
        }
        listeners.push(Arc::clone(listener));
        true
    }

    /// Returns `true` if the pair was present.
    fn remove(&mut self, kind: EventKind, method: MethodId, listener: ListenerId) -> bool {
        let Some(bindings) = self.kinds.get_mut(&kind) else {
            return false;
        };
        let Some(index) = bindings.iter().position(|b| b.method.id() == method) else {
            return false;
        };
        let listeners = &mut bindings[index].listeners;
        let Some(pos) = listeners.iter().position(|l| ListenerId::of(l) == listener) else {
            return false;
        };

        listeners.remove(pos);
        if listeners.is_empty() {
            bindings.remove(index);
        }
        if bindings.is_empty() {
            self.kinds.remove(&kind);
        }
        true
    }

    /// Drop a whole binding. Returns how many listeners it held.
    fn evict(&mut self, kind: EventKind, method: MethodId) -> usize {
        let Some(bindings) = self.kinds.get_mut(&kind) else {
            return 0;
        };
        let Some(index) = bindings.iter().position(|b| b.method.id() == method) else {
            return 0;
        };
        let dropped = bindings.remove(index).listeners.len();
        if bindings.is_empty() {
            self.kinds.remove(&kind);
        }
        dropped
    }

    fn contains(&self, kind: EventKind, method: MethodId, listener: ListenerId) -> bool {
        self.kinds.get(&kind).is_some_and(|bindings| {
            bindings.iter().any(|b| {
                b.method.id() == method && b.listeners.iter().any(|l| ListenerId::of(l) == listener)
            })
        })
    }

    fn plan(&self, kind: EventKind, only: Option<&HashSet<ListenerId>>) -> Plan {
        let Some(bindings) = self.kinds.get(&kind) else {
            return Vec::new();
        };
        let mut plan = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let listeners: Vec<_> = binding
                .listeners
                .iter()
                .filter(|l| only.is_none_or(|set| set.contains(&ListenerId::of(*l))))
                .cloned()
                .collect();
            if !listeners.is_empty() {
                plan.push((binding.method.clone(), listeners));
            }
        }
        plan
    }
}

/// Typed, synchronous event bus.
///
/// One instance owns one registry; there is no global bus. Construct it with
/// the [`HandlerDirectory`] that should describe listeners (by default each
/// listener describes itself).
pub struct EventBus {
    registry: ReentrantMutex<RefCell<Registry>>,
    directory: Box<dyn HandlerDirectory>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        f.debug_struct("EventBus")
            .field("kinds", &registry.kinds.len())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus whose listeners describe their own handlers.
    pub fn new() -> Self {
        Self::with_directory(SelfDescribing)
    }

    /// Create a bus that discovers handlers through `directory`.
    pub fn with_directory(directory: impl HandlerDirectory + 'static) -> Self {
        Self {
            registry: ReentrantMutex::new(RefCell::new(Registry::default())),
            directory: Box::new(directory),
        }
    }

    /// Bind `listener` to `method`.
    ///
    /// The event kind is taken from the method's declared parameter.
    /// Subscribing a pair that is already bound does nothing. Fails with
    /// [`BusError::InvalidArgument`] if `method` is not a valid handler or is
    /// declared by a type other than `listener`'s.
    pub fn subscribe(&self, method: &Method, listener: &Arc<dyn Listener>) -> BusResult<()> {
        let kind = require_handler(method)?;
        if !method.accepts(listener.as_ref()) {
            return Err(BusError::InvalidArgument(format!(
                "{} cannot be bound to a {}",
                method.id(),
                listener.name()
            )));
        }
        let guard = self.registry.lock();
        if guard.borrow_mut().insert(kind, method, listener) {
            debug!(
                kind = %kind,
                method = %method.id(),
                listener = %ListenerId::of(listener),
                "subscribed"
            );
        }
        Ok(())
    }

    /// Unbind `listener` from `method`. Unbinding a pair that is not bound does nothing.
    pub fn unsubscribe(&self, method: &Method, listener: &Arc<dyn Listener>) -> BusResult<()> {
        let kind = require_handler(method)?;
        let guard = self.registry.lock();
        let id = ListenerId::of(listener);
        if guard.borrow_mut().remove(kind, method.id(), id) {
            debug!(kind = %kind, method = %method.id(), listener = %id, "unsubscribed");
        }
        Ok(())
    }

    /// Subscribe every eligible callable `listener` exposes. Returns the
    /// callables subscribed, in discovery order.
    pub fn subscribe_all(&self, listener: &Arc<dyn Listener>) -> Vec<Method> {
        let guard = self.registry.lock();
        let methods = self.discover(listener.as_ref());
        {
            let mut registry = guard.borrow_mut();
            for method in &methods {
                if let Some(kind) = method.event_kind() {
                    registry.insert(kind, method, listener);
                }
            }
        }
        debug!(
            listener = %ListenerId::of(listener),
            name = listener.name(),
            handlers = methods.len(),
            "subscribed all handlers"
        );
        methods
    }

    /// Unsubscribe every eligible callable `listener` exposes. Returns the
    /// callables found, in discovery order.
    pub fn unsubscribe_all(&self, listener: &Arc<dyn Listener>) -> Vec<Method> {
        let guard = self.registry.lock();
        let methods = self.discover(listener.as_ref());
        let id = ListenerId::of(listener);
        {
            let mut registry = guard.borrow_mut();
            for method in &methods {
                if let Some(kind) = method.event_kind() {
                    registry.remove(kind, method.id(), id);
                }
            }
        }
        debug!(
            listener = %id,
            name = listener.name(),
            handlers = methods.len(),
            "unsubscribed all handlers"
        );
        methods
    }

    /// Dispatch `event` to every listener bound to a callable of its exact kind.
    ///
    /// Does nothing if no callable is registered for the kind.
    pub fn trigger(&self, event: &dyn Event) -> BusResult<()> {
        let guard = self.registry.lock();
        let plan = guard.borrow().plan(event.kind(), None);
        dispatch(&guard, event, plan)
    }

    /// Like [`trigger`](Self::trigger), but only listeners in `listeners`
    /// receive the event. Delivery keeps subscription order.
    pub fn trigger_on(&self, event: &dyn Event, listeners: &[Arc<dyn Listener>]) -> BusResult<()> {
        let only: HashSet<ListenerId> = listeners.iter().map(ListenerId::of).collect();
        let guard = self.registry.lock();
        let plan = guard.borrow().plan(event.kind(), Some(&only));
        dispatch(&guard, event, plan)
    }

    /// Invoke `listener`'s own handlers for `event`'s kind, whether or not
    /// they are subscribed. The registry is not consulted or changed.
    pub fn deliver(&self, event: &dyn Event, listener: &Arc<dyn Listener>) -> BusResult<()> {
        let guard = self.registry.lock();
        let kind = event.kind();
        let plan = self
            .discover(listener.as_ref())
            .into_iter()
            .filter(|m| m.event_kind() == Some(kind))
            .map(|m| (m, vec![Arc::clone(listener)]))
            .collect();
        dispatch(&guard, event, plan)
    }

    /// The eligible callables `listener` exposes, in directory order, without
    /// duplicates. Callables declared by another type are skipped.
    pub fn discover(&self, listener: &dyn Listener) -> Vec<Method> {
        let mut seen = HashSet::new();
        self.directory
            .methods(listener)
            .into_iter()
            .filter(|m| {
                if !m.accepts(listener) {
                    warn!(
                        method = %m.id(),
                        listener = listener.name(),
                        "skipping foreign callable"
                    );
                    return false;
                }
                m.is_handler() && seen.insert(m.id())
            })
            .collect()
    }

    /// Return `true` if `method` satisfies the handler rule.
    pub fn is_handler(&self, method: &Method) -> bool {
        method.is_handler()
    }

    /// The kind `method` handles, or `None` if it is not a valid handler.
    pub fn event_of(&self, method: &Method) -> Option<EventKind> {
        method.event_kind()
    }

    /// Return `true` if `listener` is currently bound to `method`.
    pub fn is_subscribed(&self, method: &Method, listener: &Arc<dyn Listener>) -> bool {
        let Some(kind) = method.event_kind() else {
            return false;
        };
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry.contains(kind, method.id(), ListenerId::of(listener))
    }

    /// Kinds that currently have at least one binding, in no particular order.
    pub fn kinds(&self) -> Vec<EventKind> {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry.kinds.keys().copied().collect()
    }

    /// The bindings registered for `kind`: each callable with its listeners,
    /// both in subscription order.
    pub fn bindings(&self, kind: EventKind) -> Vec<(MethodId, Vec<ListenerId>)> {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry
            .kinds
            .get(&kind)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|b| {
                        let listeners = b.listeners.iter().map(ListenerId::of).collect();
                        (b.method.id(), listeners)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of (callable, listener) pairs across all kinds.
    pub fn len(&self) -> usize {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry
            .kinds
            .values()
            .flat_map(|bindings| bindings.iter().map(|b| b.listeners.len()))
            .sum()
    }

    /// Return `true` if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        let guard = self.registry.lock();
        let registry = guard.borrow();
        registry.kinds.is_empty()
    }

    /// Store a binding without validating the method.
    #[cfg(test)]
    fn insert_unchecked(&self, kind: EventKind, method: &Method, listener: &Arc<dyn Listener>) {
        let guard = self.registry.lock();
        guard.borrow_mut().insert(kind, method, listener);
    }
}

fn require_handler(method: &Method) -> BusResult<EventKind> {
    method.event_kind().ok_or_else(|| {
        BusError::InvalidArgument(format!("{} is not a valid handler", method.id()))
    })
}

fn dispatch(registry: &RefCell<Registry>, event: &dyn Event, plan: Plan) -> BusResult<()> {
    let kind = event.kind();
    for (method, listeners) in plan {
        for listener in &listeners {
            trace!(
                kind = %kind,
                method = %method.id(),
                listener = %ListenerId::of(listener),
                "invoking handler"
            );
            if let Err(source) = method.invoke(listener.as_ref(), event) {
                return Err(failure(registry, kind, &method, listener, source));
            }
        }
    }
    Ok(())
}

fn failure(
    registry: &RefCell<Registry>,
    kind: EventKind,
    method: &Method,
    listener: &Arc<dyn Listener>,
    source: HandlerError,
) -> BusError {
    if !method.is_handler() || matches!(source, HandlerError::Mismatch { .. }) {
        let dropped = registry.borrow_mut().evict(kind, method.id());
        error!(
            kind = %kind,
            method = %method.id(),
            dropped,
            error = %source,
            "registered callable cannot handle this kind; evicted"
        );
        return BusError::InvariantViolation {
            method: method.id(),
            kind,
        };
    }

    let listener = ListenerId::of(listener);
    warn!(
        kind = %kind,
        method = %method.id(),
        listener = %listener,
        error = %source,
        "handler failed; aborting dispatch"
    );
    BusError::Dispatch {
        method: method.id(),
        listener,
        source,
    }
}
