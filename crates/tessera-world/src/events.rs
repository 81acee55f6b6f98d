use std::any::Any;

use chrono::{DateTime, TimeDelta, Utc};
use tessera_core::{EntityId, GroupId};
use tessera_event::Event;

/// Timing of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSpan {
    /// When the tick started.
    pub start: DateTime<Utc>,
    /// When dispatch for the tick finished.
    pub end: DateTime<Utc>,
    /// `end - start`.
    pub duration: TimeDelta,
}

impl TickSpan {
    /// Span from `start` to `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration: end.signed_duration_since(start),
        }
    }
}

/// Fired once per [`World::tick`](crate::World::tick).
///
/// Carries the timing of the *previous* tick, which is `None` for the first
/// tick of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based tick number.
    pub number: u64,
    /// Timing of the previous tick.
    pub previous: Option<TickSpan>,
    /// When this tick started.
    pub start: DateTime<Utc>,
}

impl Tick {
    /// Start of the previous tick.
    pub fn last_tick_start(&self) -> Option<DateTime<Utc>> {
        self.previous.map(|p| p.start)
    }

    /// End of the previous tick's dispatch.
    pub fn last_tick_end(&self) -> Option<DateTime<Utc>> {
        self.previous.map(|p| p.end)
    }

    /// How long the previous tick's dispatch took.
    pub fn last_tick_duration(&self) -> Option<TimeDelta> {
        self.previous.map(|p| p.duration)
    }

    /// Time between the previous tick's start and this one's.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        self.previous
            .map(|p| self.start.signed_duration_since(p.start))
    }
}

impl Event for Tick {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Delivered to an entity as it joins a world, before its handlers are subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedToWorld {
    /// The world being joined.
    pub world: GroupId,
    /// The joining entity.
    pub entity: EntityId,
}

impl Event for AddedToWorld {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Delivered to an entity as it leaves a world, while it is still subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovedFromWorld {
    /// The world being left.
    pub world: GroupId,
    /// The leaving entity.
    pub entity: EntityId,
}

impl Event for RemovedFromWorld {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
