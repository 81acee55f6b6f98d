//! Entity world for Tessera.
//!
//! A [`World`] is a group of spatial entities that owns an
//! [`EventBus`](tessera_event::EventBus). Entities that are also listeners
//! have their handlers subscribed when they join and unsubscribed when they
//! leave, and each [`World::tick`] dispatches a [`Tick`] event to them.

/// Clocks used to time ticks.
pub mod clock;
/// Configuration types for a world.
pub mod config;
/// The trait every world member implements.
pub mod entity;
/// Error types for the world crate.
pub mod error;
/// Events fired by the world: ticks and membership lifecycle.
pub mod events;
/// The world itself.
pub mod world;

/// Re-exports of the clock types.
pub use clock::{Clock, ManualClock, SystemClock};
/// Re-export of [`config::WorldConfig`].
pub use config::WorldConfig;
/// Re-export of [`entity::Entity`].
pub use entity::Entity;
/// Re-exports of [`error::WorldError`] and [`error::WorldResult`].
pub use error::{WorldError, WorldResult};
/// Re-exports of the world events.
pub use events::{AddedToWorld, RemovedFromWorld, Tick, TickSpan};
/// Re-export of [`world::World`].
pub use world::World;
