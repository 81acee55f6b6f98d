use crate::event::EventKind;
use crate::listener::ListenerId;
use crate::method::MethodId;

/// Alias for `Result<T, BusError>`.
pub type BusResult<T> = Result<T, BusError>;

/// What a handler body returns.
pub type HandlerResult = Result<(), HandlerError>;

/// Failure raised while invoking a single handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The handler body itself reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The invocable was handed a listener or event of a type it does not accept.
    #[error("expected {expected}, got {found}")]
    Mismatch {
        /// The type the invocable was built for.
        expected: &'static str,
        /// The type it was actually given.
        found: &'static str,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors surfaced by [`EventBus`](crate::EventBus) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// A caller passed something the operation cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handler failed while an event was being dispatched.
    #[error("handler {method} failed on listener {listener}: {source}")]
    Dispatch {
        /// The callable that failed.
        method: MethodId,
        /// The listener it was invoked on.
        listener: ListenerId,
        /// What the handler reported.
        source: HandlerError,
    },

    /// A registered callable no longer satisfies the handler rule, or could
    /// not be invoked on the listener or event it was handed.
    ///
    /// The callable has already been evicted for `kind` when this is returned.
    #[error("{method} is registered for {kind} but cannot handle it")]
    InvariantViolation {
        /// The offending callable.
        method: MethodId,
        /// The kind it was registered under.
        kind: EventKind,
    },
}

impl BusError {
    /// Return `true` for errors that indicate broken registry bookkeeping.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }
}
