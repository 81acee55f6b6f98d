use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{HandlerError, HandlerResult};
use crate::event::{Event, EventKind, short_name};
use crate::listener::Listener;

type Invoke = Arc<dyn Fn(&dyn Listener, &dyn Event) -> HandlerResult + Send + Sync>;

/// Identity of a callable: the listener type that declares it plus its name.
///
/// Every instance of a listener type shares the same callables, so a
/// `MethodId` is the key under which listener instances are grouped.
#[derive(Debug, Clone, Copy)]
pub struct MethodId {
    owner: TypeId,
    owner_name: &'static str,
    name: &'static str,
}

impl MethodId {
    /// Identity of the callable `name` declared by `L`.
    pub fn of<L: Any + ?Sized>(name: &'static str) -> Self {
        Self {
            owner: TypeId::of::<L>(),
            owner_name: std::any::type_name::<L>(),
            name,
        }
    }

    /// The callable's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Full type name of the declaring listener type.
    pub fn owner_name(&self) -> &'static str {
        self.owner_name
    }

    /// `TypeId` of the declaring listener type.
    pub fn owner(&self) -> TypeId {
        self.owner
    }
}

impl PartialEq for MethodId {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for MethodId {}

impl Hash for MethodId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", short_name(self.owner_name), self.name)
    }
}

/// A declared parameter of a callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// An event type (possibly the abstract `dyn Event`).
    Event(EventKind),
    /// Any other type.
    Value {
        /// Type ID of the parameter.
        id: TypeId,
        /// Type name of the parameter.
        name: &'static str,
    },
}

impl Param {
    /// A parameter of event type `E`.
    pub fn event<E: Event + ?Sized>() -> Self {
        Self::Event(EventKind::of::<E>())
    }

    /// A parameter of non-event type `T`.
    pub fn value<T: Any + ?Sized>() -> Self {
        Self::Value {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// A callable exposed by a listener type, with the metadata discovery needs:
/// whether it is tagged as a handler and which parameters it declares.
///
/// Equality and hashing follow [`MethodId`] only.
#[derive(Clone)]
pub struct Method {
    id: MethodId,
    tagged: bool,
    params: Vec<Param>,
    invoke: Invoke,
}

impl Method {
    /// A tagged handler on `L` accepting events of type `E`.
    pub fn handler<L, E, F>(name: &'static str, f: F) -> Self
    where
        L: Listener,
        E: Event,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            id: MethodId::of::<L>(name),
            tagged: true,
            params: vec![Param::event::<E>()],
            invoke: typed(f),
        }
    }

    /// A callable with a handler's shape that is not tagged as one.
    pub fn untagged<L, E, F>(name: &'static str, f: F) -> Self
    where
        L: Listener,
        E: Event,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            tagged: false,
            ..Self::handler(name, f)
        }
    }

    /// A tagged callable that declares the abstract `dyn Event`.
    ///
    /// Never eligible: it would match every event.
    pub fn catch_all<L, F>(name: &'static str, f: F) -> Self
    where
        L: Listener,
        F: Fn(&L, &dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        Self::custom(name, true, vec![Param::Event(EventKind::any())], f)
    }

    /// A callable with arbitrary metadata, for directories that build their
    /// own tables.
    pub fn custom<L, F>(name: &'static str, tagged: bool, params: Vec<Param>, f: F) -> Self
    where
        L: Listener,
        F: Fn(&L, &dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            id: MethodId::of::<L>(name),
            tagged,
            params,
            invoke: erased(f),
        }
    }

    /// The callable's identity.
    pub fn id(&self) -> MethodId {
        self.id
    }

    /// The callable's name.
    pub fn name(&self) -> &'static str {
        self.id.name
    }

    /// Return `true` if the callable carries the handler tag.
    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    /// The declared parameters.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The eligibility rule: tagged, exactly one parameter, and that
    /// parameter is a concrete event type (not the abstract kind).
    pub fn is_handler(&self) -> bool {
        self.event_kind().is_some()
    }

    /// The kind this callable handles, or `None` if it is not eligible.
    pub fn event_kind(&self) -> Option<EventKind> {
        if !self.tagged {
            return None;
        }
        match self.params.as_slice() {
            [Param::Event(kind)] if !kind.is_abstract() => Some(*kind),
            _ => None,
        }
    }

    /// Return `true` if `listener` is an instance of the type that declares
    /// this callable.
    pub fn accepts(&self, listener: &dyn Listener) -> bool {
        listener.as_any().type_id() == self.id.owner
    }

    /// Invoke the callable on `listener` with `event`.
    pub fn invoke(&self, listener: &dyn Listener, event: &dyn Event) -> HandlerResult {
        (self.invoke)(listener, event)
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Method {}

impl Hash for Method {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("id", &self.id.to_string())
            .field("tagged", &self.tagged)
            .field("params", &self.params)
            .finish()
    }
}

fn target<L: Listener>(listener: &dyn Listener) -> Result<&L, HandlerError> {
    listener
        .as_any()
        .downcast_ref::<L>()
        .ok_or_else(|| HandlerError::Mismatch {
            expected: std::any::type_name::<L>(),
            found: listener.name(),
        })
}

fn typed<L, E, F>(f: F) -> Invoke
where
    L: Listener,
    E: Event,
    F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(
        move |listener: &dyn Listener, event: &dyn Event| -> HandlerResult {
            let listener = target::<L>(listener)?;
            let payload = event
                .as_any()
                .downcast_ref::<E>()
                .ok_or_else(|| HandlerError::Mismatch {
                    expected: std::any::type_name::<E>(),
                    found: event.kind().name(),
                })?;
            f(listener, payload)
        },
    )
}

fn erased<L, F>(f: F) -> Invoke
where
    L: Listener,
    F: Fn(&L, &dyn Event) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(
        move |listener: &dyn Listener, event: &dyn Event| -> HandlerResult {
            f(target::<L>(listener)?, event)
        },
    )
}

/// Builder for the callables a listener type exposes, in declaration order.
///
/// The order given here is the order discovery reports, and therefore the
/// order in which the bus invokes a listener's handlers for one kind.
pub struct MethodTable<L> {
    methods: Vec<Method>,
    _listener: PhantomData<fn() -> L>,
}

impl<L: Listener> Default for MethodTable<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Listener> MethodTable<L> {
    /// Start an empty table.
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            _listener: PhantomData,
        }
    }

    /// Declare a tagged handler for events of type `E`.
    pub fn handler<E, F>(mut self, name: &'static str, f: F) -> Self
    where
        E: Event,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.push(Method::handler(name, f));
        self
    }

    /// Declare a public callable that is not tagged as a handler.
    pub fn untagged<E, F>(mut self, name: &'static str, f: F) -> Self
    where
        E: Event,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.push(Method::untagged(name, f));
        self
    }

    /// Declare a tagged callable over the abstract `dyn Event`.
    pub fn catch_all<F>(mut self, name: &'static str, f: F) -> Self
    where
        F: Fn(&L, &dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.push(Method::catch_all(name, f));
        self
    }

    /// Append a prebuilt method.
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Finish the table.
    pub fn build(self) -> Vec<Method> {
        self.methods
    }
}
