use tessera_core::CoreError;
use tessera_event::BusError;

/// Alias for `Result<T, WorldError>`.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised by [`World`](crate::World) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity cannot join: it is already present, owned elsewhere, or declined.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CoreError),

    /// The world is at its configured capacity.
    #[error("world is full ({capacity} entities)")]
    Full {
        /// The configured maximum.
        capacity: usize,
    },

    /// Dispatching a lifecycle or tick event failed.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl WorldError {
    /// Return `true` for errors that indicate broken bus bookkeeping.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Bus(err) if err.is_fatal())
    }
}
