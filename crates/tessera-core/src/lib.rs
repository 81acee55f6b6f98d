//! Core types for Tessera: points, spatial objects, and group membership.
//!
//! This crate knows nothing about events. It provides the spatial body every
//! world entity carries ([`PointObject`]) and the thread-safe [`Group`]
//! container whose members are told when they join or leave it.

/// Entity identifiers.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Membership-notifying container.
pub mod group;
/// Spatial objects with position, rotation, and an owning group.
pub mod object;
/// Two-dimensional points.
pub mod point;

/// Re-export of [`entity::EntityId`].
pub use entity::EntityId;
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export group types.
pub use group::{Group, GroupId, GroupKind, Groupable, Owner};
/// Re-export spatial object types.
pub use object::{Placement, PointObject, Spatial};
/// Re-export of [`point::Point`].
pub use point::Point;
