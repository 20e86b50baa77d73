use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Marker trait for types usable as event keys.
///
/// Any `Copy + Eq + Hash + Debug + Send + Sync + 'static` type implements it.
pub trait EventKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}
impl<T: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static> EventKey for T {}

/// A shared listener callback.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Process-unique listener identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct Slot<P> {
    id: ListenerId,
    listener: Listener<P>,
    once: bool,
}

type Slots<K, P> = FxHashMap<K, Vec<Slot<P>>>;

/// A synchronous, thread-safe listener registry.
///
/// Cloning the bus is cheap and yields a handle to the same registry.
pub struct EventBus<K, P> {
    slots: Arc<RwLock<Slots<K, P>>>,
}

impl<K: EventKey, P: 'static> EventBus<K, P> {
    /// Creates a new, empty `EventBus`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `kind`.
    ///
    /// With `once = true` the listener is removed right before its first invocation.
    /// The returned [`Subscription`] removes the listener when consumed.
    pub fn add_listener<F>(&self, kind: K, listener: F, once: bool) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.add_shared(kind, Arc::new(listener), once)
    }

    /// Registers an already shared listener.
    pub fn add_shared(&self, kind: K, listener: Listener<P>, once: bool) -> Subscription {
        let id = ListenerId::next();
        self.slots.write().entry(kind).or_default().push(Slot { id, listener, once });
        trace!(?kind, ?id, once, "Listener registered");

        let slots = Arc::downgrade(&self.slots);
        Subscription::new(id, move || remove_from(&slots, kind, id))
    }

    /// Shorthand for [`EventBus::add_listener`] with `once = false`.
    pub fn on<F>(&self, kind: K, listener: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.add_listener(kind, listener, false)
    }

    /// Shorthand for [`EventBus::add_listener`] with `once = true`.
    pub fn once<F>(&self, kind: K, listener: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.add_listener(kind, listener, true)
    }

    /// Removes the listener with `id` from `kind`.
    ///
    /// Returns `true` if a listener was removed.
    pub fn remove_listener(&self, kind: K, id: ListenerId) -> bool {
        remove_from(&Arc::downgrade(&self.slots), kind, id)
    }

    /// Returns the listeners currently registered for `kind`, in registration order.
    #[must_use]
    pub fn listeners(&self, kind: K) -> Vec<Listener<P>> {
        self.slots
            .read()
            .get(&kind)
            .map(|slots| slots.iter().map(|slot| slot.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of listeners registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: K) -> usize {
        self.slots.read().get(&kind).map_or(0, Vec::len)
    }

    /// Returns `true` if no listener is registered for any key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.read().values().all(Vec::is_empty)
    }

    /// Runs every listener registered for `kind` with `payload`.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, kind: K, payload: &P) -> usize {
        dispatch(&[self], kind, payload)
    }

    /// Drops every listener. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut slots = self.slots.write();
        let count = slots.values().map(Vec::len).sum();
        slots.clear();
        count
    }

    /// Collects the listeners for `kind` and drops the `once` ones from the registry.
    fn take(&self, kind: K) -> Vec<Listener<P>> {
        let mut slots = self.slots.write();
        let Some(list) = slots.get_mut(&kind) else {
            return Vec::new();
        };
        let taken = list.iter().map(|slot| slot.listener.clone()).collect();
        list.retain(|slot| !slot.once);
        taken
    }
}

/// Runs the listeners of every tier for `kind`, tiers first to last.
///
/// A listener shared by several tiers runs once. Listeners are collected before any
/// of them runs, so subscriptions made during dispatch only see later events.
/// Returns the number of listeners invoked.
pub fn dispatch<K: EventKey, P: 'static>(
    tiers: &[&EventBus<K, P>],
    kind: K,
    payload: &P,
) -> usize {
    let mut listeners: Vec<Listener<P>> = Vec::new();
    for tier in tiers {
        for listener in tier.take(kind) {
            if !listeners.iter().any(|seen| Arc::ptr_eq(seen, &listener)) {
                listeners.push(listener);
            }
        }
    }

    if listeners.is_empty() {
        return 0;
    }

    trace!(?kind, count = listeners.len(), "Event dispatched");
    for listener in &listeners {
        listener(payload);
    }
    listeners.len()
}

fn remove_from<K: EventKey, P>(slots: &Weak<RwLock<Slots<K, P>>>, kind: K, id: ListenerId) -> bool {
    let Some(slots) = slots.upgrade() else {
        return false;
    };
    let mut slots = slots.write();
    let Some(list) = slots.get_mut(&kind) else {
        return false;
    };
    let before = list.len();
    list.retain(|slot| slot.id != id);
    let removed = list.len() != before;
    if removed {
        trace!(?kind, ?id, "Listener removed");
    }
    removed
}

impl<K, P> Clone for EventBus<K, P> {
    fn clone(&self) -> Self {
        Self { slots: self.slots.clone() }
    }
}

impl<K, P> Default for EventBus<K, P> {
    fn default() -> Self {
        Self { slots: Arc::new(RwLock::new(FxHashMap::default())) }
    }
}

impl<K: fmt::Debug, P> fmt::Debug for EventBus<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut map = f.debug_map();
        for (kind, list) in slots.iter() {
            map.entry(kind, &list.len());
        }
        map.finish()
    }
}

/// Handle returned by listener registration.
///
/// Dropping it leaves the listener registered; call [`Subscription::unsubscribe`]
/// to remove it.
pub struct Subscription {
    id: Option<ListenerId>,
    unbind: Option<Box<dyn FnOnce() -> bool + Send + Sync>>,
}

impl Subscription {
    fn new(id: ListenerId, unbind: impl FnOnce() -> bool + Send + Sync + 'static) -> Self {
        Self { id: Some(id), unbind: Some(Box::new(unbind)) }
    }

    /// A subscription bound to nothing.
    #[must_use]
    pub const fn detached() -> Self {
        Self { id: None, unbind: None }
    }

    /// The listener this subscription controls, if any.
    #[must_use]
    pub const fn id(&self) -> Option<ListenerId> {
        self.id
    }

    /// Removes the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(mut self) -> bool {
        self.unbind.take().is_some_and(|unbind| unbind())
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        A,
        B,
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Listener<u32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |tag: &'static str| -> Listener<u32> {
            let sink = sink.clone();
            Arc::new(move |value: &u32| sink.lock().unwrap().push(format!("{tag}:{value}")))
        };
        (log, make)
    }

    #[test]
    fn test_emit_runs_in_registration_order() {
        let bus = EventBus::<Kind, u32>::new();
        let (log, make) = recorder();
        bus.add_shared(Kind::A, make("first"), false);
        bus.add_shared(Kind::A, make("second"), false);
        bus.add_shared(Kind::B, make("other"), false);

        assert_eq!(bus.emit(Kind::A, &1), 2);
        assert_eq!(*log.lock().unwrap(), ["first:1", "second:1"]);
    }

    #[test]
    fn test_once_listener_is_removed_before_running() {
        let bus = EventBus::<Kind, u32>::new();
        let (log, make) = recorder();
        bus.add_shared(Kind::A, make("once"), true);

        assert_eq!(bus.listener_count(Kind::A), 1);
        bus.emit(Kind::A, &1);
        bus.emit(Kind::A, &2);

        assert_eq!(*log.lock().unwrap(), ["once:1"]);
        assert_eq!(bus.listener_count(Kind::A), 0);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_per_listener() {
        let bus = EventBus::<Kind, u32>::new();
        let (_, make) = recorder();
        let sub = bus.add_shared(Kind::A, make("x"), false);
        let id = sub.id().expect("bound subscription");

        assert!(sub.unsubscribe());
        assert!(!bus.remove_listener(Kind::A, id));
        assert!(bus.is_empty());
    }

    #[test]
    fn test_subscription_does_not_keep_bus_alive() {
        let bus = EventBus::<Kind, u32>::new();
        let sub = bus.on(Kind::A, |_| {});
        drop(bus);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_dispatch_dedupes_shared_listeners_across_tiers() {
        let class_tier = EventBus::<Kind, u32>::new();
        let instance_tier = EventBus::<Kind, u32>::new();
        let (log, make) = recorder();
        let shared = make("shared");
        class_tier.add_shared(Kind::B, shared.clone(), false);
        instance_tier.add_shared(Kind::B, shared, false);
        instance_tier.add_shared(Kind::B, make("own"), false);

        assert_eq!(dispatch(&[&class_tier, &instance_tier], Kind::B, &7), 2);
        assert_eq!(*log.lock().unwrap(), ["shared:7", "own:7"]);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let bus = EventBus::<Kind, u32>::new();
        let inner = bus.clone();
        bus.once(Kind::A, move |_| {
            inner.on(Kind::A, |_| {});
        });

        assert_eq!(bus.emit(Kind::A, &0), 1);
        assert_eq!(bus.listener_count(Kind::A), 1);
        assert_eq!(bus.clear(), 1);
    }
}
