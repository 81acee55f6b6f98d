use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tessera_core::{CoreError, Group, GroupId, GroupKind};
use tessera_event::{EventBus, Method};
use tracing::{Span, debug, info_span, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::WorldConfig;
use crate::entity::Entity;
use crate::error::{WorldError, WorldResult};
use crate::events::{AddedToWorld, RemovedFromWorld, Tick, TickSpan};

#[derive(Debug, Default, Clone, Copy)]
struct TickTiming {
    count: u64,
    last: Option<TickSpan>,
}

/// A group of spatial entities that owns an event bus.
///
/// Membership and subscription stay in step: an entity that is a listener
/// has its handlers subscribed for exactly as long as it is a member.
///
/// ## Ordering
/// - `add`: [`AddedToWorld`] is delivered to the entity, then its handlers
///   are subscribed, then it is stored.
/// - `remove`: [`RemovedFromWorld`] is triggered on the entity while it is
///   still subscribed, then its handlers are unsubscribed, then it is dropped
///   from the group.
///
/// All operations take `&self`; a world is meant to be shared behind an `Arc`.
pub struct World {
    config: WorldConfig,
    entities: Group<dyn Entity>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    timing: Mutex<TickTiming>,
    ticking: ReentrantMutex<()>,
    membership: ReentrantMutex<()>,
    span: Span,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("name", &self.config.name)
            .field("id", &self.entities.id())
            .field("entities", &self.entities.len())
            .field("ticks", &self.tick_count())
            .finish()
    }
}

impl World {
    /// Create an empty world timed by the system clock.
    pub fn new(config: WorldConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an empty world timed by `clock`.
    pub fn with_clock(config: WorldConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(config, EventBus::new(), clock)
    }

    /// Create an empty world around an existing bus, e.g. one built with a
    /// custom [`HandlerDirectory`](tessera_event::HandlerDirectory).
    pub fn from_parts(config: WorldConfig, bus: EventBus, clock: Arc<dyn Clock>) -> Self {
        let entities = Group::new(GroupKind::World);
        let span = info_span!("world", name = %config.name, id = %entities.id());
        Self {
            config,
            entities,
            bus,
            clock,
            timing: Mutex::new(TickTiming::default()),
            ticking: ReentrantMutex::new(()),
            membership: ReentrantMutex::new(()),
            span,
        }
    }

    /// This world's ID, as seen by members through their owner back-reference.
    pub fn id(&self) -> GroupId {
        self.entities.id()
    }

    /// The configuration this world was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world's event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Add an entity.
    ///
    /// Fails with [`WorldError::InvalidArgument`] if the entity is already a
    /// member of this or any other group, and with [`WorldError::Full`] when
    /// the configured capacity is reached. If the entity's `AddedToWorld`
    /// handler fails, the entity is not added.
    pub fn add(&self, entity: Arc<dyn Entity>) -> WorldResult<()> {
        let _span = self.span.enter();
        let _membership = self.membership.lock();

        let world = self.id();
        let id = entity.body().id();
        if self.entities.contains(&entity) {
            return Err(CoreError::AlreadyMember { group: world }.into());
        }
        if let Some(owner) = entity.body().owning_group() {
            return Err(CoreError::OwnedElsewhere {
                entity: id,
                owner: owner.id,
            }
            .into());
        }
        let capacity = self.config.max_entities;
        if capacity > 0 && self.entities.len() >= capacity {
            return Err(WorldError::Full { capacity });
        }

        let listener = Arc::clone(&entity).as_listener();
        let mut fresh = Vec::new();
        if let Some(listener) = &listener {
            if self.config.lifecycle_events {
                self.bus
                    .deliver(&AddedToWorld { world, entity: id }, listener)?;
            }
            let prior: Vec<Method> = self
                .bus
                .discover(listener.as_ref())
                .into_iter()
                .filter(|m| self.bus.is_subscribed(m, listener))
                .collect();
            fresh = self.bus.subscribe_all(listener);
            fresh.retain(|m| !prior.contains(m));
        }

        if let Err(err) = self.entities.add(entity) {
            // Only undo what this call subscribed.
            if let Some(listener) = &listener {
                for method in &fresh {
                    self.bus.unsubscribe(method, listener)?;
                }
            }
            return Err(err.into());
        }
        debug!(entity = %id, listener = listener.is_some(), "entity added");
        Ok(())
    }

    /// Remove an entity. Returns `false` if it was not a member.
    ///
    /// If the entity's `RemovedFromWorld` handler fails, the entity stays a
    /// member and stays subscribed.
    pub fn remove<E: ?Sized>(&self, entity: &Arc<E>) -> WorldResult<bool> {
        let _span = self.span.enter();
        let _membership = self.membership.lock();

        let Some(stored) = self.entities.find(entity) else {
            return Ok(false);
        };
        let id = stored.body().id();
        if let Some(listener) = Arc::clone(&stored).as_listener() {
            if self.config.lifecycle_events {
                let event = RemovedFromWorld {
                    world: self.id(),
                    entity: id,
                };
                self.bus
                    .trigger_on(&event, std::slice::from_ref(&listener))?;
            }
            self.bus.unsubscribe_all(&listener);
        }
        self.entities.remove(&stored);
        debug!(entity = %id, "entity removed");
        Ok(true)
    }

    /// Return `true` if `entity` is a member.
    pub fn contains<E: ?Sized>(&self, entity: &Arc<E>) -> bool {
        self.entities.contains(entity)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Return `true` if the world has no members.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Remove every member through [`remove`](Self::remove), so each one sees
    /// its `RemovedFromWorld` event. Stops at the first failure.
    pub fn clear(&self) -> WorldResult<()> {
        for entity in self.entities.snapshot() {
            self.remove(&entity)?;
        }
        Ok(())
    }

    /// Point-in-time copy of the members in insertion order, safe to iterate
    /// while the world changes (e.g. for a render pass).
    pub fn snapshot(&self) -> Vec<Arc<dyn Entity>> {
        self.entities.snapshot()
    }

    /// Run one tick: trigger a [`Tick`] carrying the previous tick's timing,
    /// then record this tick's timing.
    ///
    /// Timing is recorded even when a handler fails, so the next tick still
    /// reports an accurate previous interval.
    ///
    /// Ticks are serialised: a tick called from another thread waits for the
    /// one in flight to finish. A tick started from inside a tick handler
    /// runs nested and gets the next number.
    pub fn tick(&self) -> WorldResult<()> {
        let _span = self.span.enter();
        let _ticking = self.ticking.lock();
        let start = self.clock.now();
        let (number, previous) = {
            let mut timing = self.timing.lock();
            timing.count += 1;
            (timing.count, timing.last)
        };

        let event = Tick {
            number,
            previous,
            start,
        };
        let outcome = self.bus.trigger(&event);
        let finished = TickSpan::new(start, self.clock.now());

        self.timing.lock().last = Some(finished);
        trace!(
            tick = number,
            duration_ms = finished.duration.num_milliseconds(),
            "tick finished"
        );
        outcome.map_err(WorldError::from)
    }

    /// Number of ticks started so far.
    pub fn tick_count(&self) -> u64 {
        self.timing.lock().count
    }

    /// Timing of the most recent tick.
    pub fn last_tick(&self) -> Option<TickSpan> {
        self.timing.lock().last
    }
}
