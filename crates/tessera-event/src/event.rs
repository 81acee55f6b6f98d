use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An immutable event payload. Its concrete type is its routing key.
///
/// Implementors only need to provide [`as_any`](Self::as_any); the kind is
/// derived from the implementing type.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// Support downcasting to the concrete event type.
    fn as_any(&self) -> &dyn Any;

    /// The runtime kind of this event.
    fn kind(&self) -> EventKind {
        EventKind::of::<Self>()
    }
}

/// The runtime type of an event, used as the registry key.
///
/// Two kinds are equal only when they name the same type; there is no
/// supertype or subtype matching.
#[derive(Clone, Copy)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    /// The kind of the event type `E`.
    pub fn of<E: Event + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// The abstract kind, `dyn Event`. A handler declared for it would match
    /// everything, so it is never routable.
    pub fn any() -> Self {
        Self::of::<dyn Event>()
    }

    /// Return `true` if this is the abstract kind.
    pub fn is_abstract(&self) -> bool {
        self.id == TypeId::of::<dyn Event>()
    }

    /// The underlying type ID.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name of the event.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_name(self.name))
    }
}

/// Strip the module path from a type name, keeping generic arguments intact.
pub(crate) fn short_name(name: &'static str) -> &'static str {
    let head = name.split('<').next().unwrap_or(name);
    match head.rfind("::") {
        Some(i) => &name[i + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Moved;

    impl Event for Moved {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Stopped;

    impl Event for Stopped {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn kind_follows_concrete_type() {
        let event: &dyn Event = &Moved;
        assert_eq!(event.kind(), EventKind::of::<Moved>());
        assert_ne!(event.kind(), EventKind::of::<Stopped>());
    }

    #[test]
    fn abstract_kind_is_distinct() {
        assert!(EventKind::any().is_abstract());
        assert!(!EventKind::of::<Moved>().is_abstract());
        assert_ne!(EventKind::any(), EventKind::of::<Moved>());
    }

    #[test]
    fn display_drops_module_path() {
        assert_eq!(EventKind::of::<Moved>().to_string(), "Moved");
        assert_eq!(short_name("a::b::Wrap<c::D>"), "Wrap<c::D>");
        assert_eq!(short_name("Plain"), "Plain");
    }
}
