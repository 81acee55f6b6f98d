use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::method::{Method, MethodTable};

/// An object that can be subscribed to an [`EventBus`](crate::EventBus).
///
/// Listeners are shared as `Arc<dyn Listener>` and identified by the address
/// of that allocation. Handlers receive `&Self`, so any state they change
/// lives behind interior mutability.
pub trait Listener: Any + Send + Sync {
    /// Support downcasting to the concrete listener type.
    fn as_any(&self) -> &dyn Any;

    /// Every callable this listener type exposes, tagged or not, in
    /// declaration order. Discovery filters this list; it does not need to be
    /// pre-filtered.
    fn methods(&self) -> Vec<Method> {
        Vec::new()
    }

    /// Type name used in logs and errors.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Reference identity of a listener instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

impl ListenerId {
    /// Identity of the allocation behind `listener`.
    pub fn of<L: ?Sized>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Source of the callables a listener exposes.
///
/// The bus asks its directory instead of the listener directly, so tables can
/// come from the listener itself ([`SelfDescribing`]) or be registered ahead
/// of time per type ([`StaticDirectory`]).
pub trait HandlerDirectory: Send + Sync {
    /// The callables `listener` exposes, in a stable order.
    fn methods(&self, listener: &dyn Listener) -> Vec<Method>;
}

/// Directory that asks each listener for its own [`Listener::methods`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfDescribing;

impl HandlerDirectory for SelfDescribing {
    fn methods(&self, listener: &dyn Listener) -> Vec<Method> {
        listener.methods()
    }
}

/// Directory built from method tables registered per listener type.
///
/// Listener types without a registered table expose nothing.
#[derive(Default)]
pub struct StaticDirectory {
    tables: HashMap<TypeId, Vec<Method>>,
}

impl fmt::Debug for StaticDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDirectory")
            .field("types", &self.tables.len())
            .finish()
    }
}

impl StaticDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the table for listener type `L`.
    pub fn register<L: Listener>(&mut self, table: MethodTable<L>) {
        self.tables.insert(TypeId::of::<L>(), table.build());
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<L: Listener>(mut self, table: MethodTable<L>) -> Self {
        self.register(table);
        self
    }

    /// Number of registered listener types.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Return `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl HandlerDirectory for StaticDirectory {
    fn methods(&self, listener: &dyn Listener) -> Vec<Method> {
        self.tables
            .get(&listener.as_any().type_id())
            .cloned()
            .unwrap_or_default()
    }
}
