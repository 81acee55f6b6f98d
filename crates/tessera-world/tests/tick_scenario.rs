//! Tick delivery through a bare bus and through a world over a static directory.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tessera_core::{Point, PointObject, Spatial};
use tessera_event::{
    EventBus, EventKind, HandlerResult, Listener, Method, MethodTable, StaticDirectory,
};
use tessera_world::{Entity, SystemClock, Tick, World, WorldConfig};

#[derive(Default)]
struct Metronome {
    beats: AtomicUsize,
}

impl Metronome {
    fn on_tick(&self, _: &Tick) -> HandlerResult {
        self.beats.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn beats(&self) -> usize {
        self.beats.load(Ordering::SeqCst)
    }
}

impl Listener for Metronome {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn methods(&self) -> Vec<Method> {
        MethodTable::<Self>::new()
            .handler("on_tick", Self::on_tick)
            .build()
    }
}

fn tick(number: u64) -> Tick {
    Tick {
        number,
        previous: None,
        start: chrono::Utc::now(),
    }
}

#[test]
fn subscribe_two_ticks_then_unsubscribe() {
    let bus = EventBus::new();
    let metronome = Arc::new(Metronome::default());
    let listener: Arc<dyn Listener> = metronome.clone();

    let subscribed = bus.subscribe_all(&listener);
    assert_eq!(subscribed.len(), 1);

    bus.trigger(&tick(1)).unwrap();
    bus.trigger(&tick(2)).unwrap();
    assert_eq!(metronome.beats(), 2);

    bus.unsubscribe_all(&listener);
    bus.trigger(&tick(3)).unwrap();
    assert_eq!(metronome.beats(), 2);
    assert!(bus.bindings(EventKind::of::<Tick>()).is_empty());
    assert!(!bus.kinds().contains(&EventKind::of::<Tick>()));
}

/// A drifting buoy whose handlers are registered in a directory rather than
/// described by the buoy itself.
struct Buoy {
    body: PointObject,
    beats: AtomicUsize,
}

impl Buoy {
    fn drift(&self, _: &Tick) -> HandlerResult {
        self.body.move_by(0.0, -0.5);
        self.beats.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Spatial for Buoy {
    fn body(&self) -> &PointObject {
        &self.body
    }
}

impl Listener for Buoy {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Entity for Buoy {
    fn as_listener(self: Arc<Self>) -> Option<Arc<dyn Listener>> {
        Some(self)
    }
}

#[test]
fn world_over_a_static_directory() {
    let directory =
        StaticDirectory::new().with(MethodTable::<Buoy>::new().handler("drift", Buoy::drift));
    let world = World::from_parts(
        WorldConfig::default().with_name("bay"),
        EventBus::with_directory(directory),
        Arc::new(SystemClock),
    );
    let buoy = Arc::new(Buoy {
        body: PointObject::new(Point::new(0.0, 10.0)),
        beats: AtomicUsize::new(0),
    });

    world.add(buoy.clone()).unwrap();
    world.tick().unwrap();
    world.tick().unwrap();

    assert_eq!(buoy.beats.load(Ordering::SeqCst), 2);
    assert_eq!(buoy.body().y(), 9.0);

    world.remove(&buoy).unwrap();
    world.tick().unwrap();
    assert_eq!(buoy.beats.load(Ordering::SeqCst), 2);
    assert!(world.bus().is_empty());
}
