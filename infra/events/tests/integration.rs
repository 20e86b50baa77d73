use amodel_event_bus::{EventBus, Subscription, dispatch};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lifecycle {
    Touched,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Payload {
    prop: &'static str,
}

fn counting(counter: &Arc<AtomicUsize>) -> impl Fn(&Payload) + Send + Sync + 'static {
    let counter = counter.clone();
    move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_event_flow() {
    let bus = EventBus::<Lifecycle, Payload>::new();
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.on(Lifecycle::Touched, move |payload: &Payload| sink.lock().push(payload.prop));

    bus.emit(Lifecycle::Touched, &Payload { prop: "name" });
    bus.emit(Lifecycle::Created, &Payload { prop: "ignored" });

    assert_eq!(*seen.lock(), ["name"]);
}

#[test]
fn test_class_tier_reaches_every_instance_tier() {
    let class_bus = EventBus::<Lifecycle, Payload>::new();
    let first = EventBus::<Lifecycle, Payload>::new();
    let second = EventBus::<Lifecycle, Payload>::new();
    let class_hits = Arc::new(AtomicUsize::new(0));
    let first_hits = Arc::new(AtomicUsize::new(0));

    class_bus.on(Lifecycle::Touched, counting(&class_hits));
    first.on(Lifecycle::Touched, counting(&first_hits));

    let payload = Payload { prop: "age" };
    assert_eq!(dispatch(&[&class_bus, &first], Lifecycle::Touched, &payload), 2);
    assert_eq!(dispatch(&[&class_bus, &second], Lifecycle::Touched, &payload), 1);

    assert_eq!(class_hits.load(Ordering::SeqCst), 2);
    assert_eq!(first_hits.load(Ordering::SeqCst), 1);
    assert_eq!(class_bus.listener_count(Lifecycle::Touched), 1, "instance tiers never leak upward");
}

#[test]
fn test_once_in_class_tier_fires_a_single_time() {
    let class_bus = EventBus::<Lifecycle, Payload>::new();
    let instance = EventBus::<Lifecycle, Payload>::new();
    let hits = Arc::new(AtomicUsize::new(0));
    class_bus.once(Lifecycle::Created, counting(&hits));

    let payload = Payload { prop: "" };
    dispatch(&[&class_bus, &instance], Lifecycle::Created, &payload);
    dispatch(&[&class_bus, &instance], Lifecycle::Created, &payload);

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unsubscribe_closure_stops_delivery() {
    let bus = EventBus::<Lifecycle, Payload>::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let sub = bus.on(Lifecycle::Touched, counting(&hits));

    bus.emit(Lifecycle::Touched, &Payload { prop: "a" });
    assert!(sub.unsubscribe());
    bus.emit(Lifecycle::Touched, &Payload { prop: "b" });

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_detached_subscription_is_inert() {
    let sub = Subscription::detached();
    assert!(sub.id().is_none());
    assert!(!sub.unsubscribe());
}

#[test]
fn test_listener_can_unsubscribe_itself_while_running() {
    let bus = EventBus::<Lifecycle, Payload>::new();
    let hits = Arc::new(AtomicUsize::new(0));
    let slot: Arc<parking_lot::Mutex<Option<Subscription>>> = Arc::new(parking_lot::Mutex::new(None));

    let handle = slot.clone();
    let counter = hits.clone();
    let sub = bus.on(Lifecycle::Touched, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(sub) = handle.lock().take() {
            sub.unsubscribe();
        }
    });
    *slot.lock() = Some(sub);

    bus.emit(Lifecycle::Touched, &Payload { prop: "x" });
    bus.emit(Lifecycle::Touched, &Payload { prop: "y" });

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
