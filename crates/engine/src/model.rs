use crate::class::ModelClass;
use crate::event::{EventPayload, ModelEvents};
use crate::tracker;
use crate::value::{Object, Value};
use amodel_domain::EventKind;
use amodel_event_bus::{Subscription, dispatch};
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Process-unique instance identifier; the key of the change tracker's side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) struct ModelInner {
    id: InstanceId,
    class: ModelClass,
    fields: RwLock<Object>,
    events: ModelEvents,
    frozen: AtomicBool,
    /// Touched-propagation subscriptions on nested models, per field.
    links: Mutex<FxHashMap<String, Vec<Subscription>>>,
}

/// Handle to a model instance.
///
/// Every handle of an instance is the same wrapper: cloning never copies data, and
/// equality is identity. Use [`Model::deep_clone`] for an independent copy.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

thread_local! {
    /// Instances currently propagating `touched`, to stop cycles between nested models.
    static PROPAGATING: RefCell<FxHashSet<InstanceId>> = RefCell::new(FxHashSet::default());
}

impl Model {
    /// Allocates an empty instance of `class`. Only the creation pipeline calls this.
    pub(crate) fn instantiate(class: ModelClass) -> Self {
        let inner = ModelInner {
            id: InstanceId::next(),
            class,
            fields: RwLock::new(IndexMap::new()),
            events: ModelEvents::new(),
            frozen: AtomicBool::new(false),
            links: Mutex::new(FxHashMap::default()),
        };
        trace!(class = %inner.class, id = %inner.id, "Model instantiated");
        Self { inner: Arc::new(inner) }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    #[must_use]
    pub fn class(&self) -> &ModelClass {
        &self.inner.class
    }

    /// `true` if this model's class is `class` or one of its subclasses.
    #[must_use]
    pub fn is_instance_of(&self, class: &ModelClass) -> bool {
        self.inner.class.is_subclass_of(class)
    }

    /// `true` if both handles point to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Raw storage ---

    /// Stored value of `prop`, bypassing getters.
    #[must_use]
    pub fn raw(&self, prop: &str) -> Option<Value> {
        self.inner.fields.read().get(prop).cloned()
    }

    /// Stores `value` without any policy check or event. Meant for custom setters.
    pub fn write_raw(&self, prop: &str, value: Value) {
        let links = self.link_nested(&value);
        self.inner.fields.write().insert(prop.to_owned(), value);
        self.replace_links(prop, links);
    }

    /// Removes `prop` without any policy check or event.
    pub fn remove_raw(&self, prop: &str) -> Option<Value> {
        let removed = self.inner.fields.write().shift_remove(prop);
        self.replace_links(prop, Vec::new());
        removed
    }

    /// Copy of the stored fields, hidden ones included.
    #[must_use]
    pub fn data(&self) -> Object {
        self.inner.fields.read().clone()
    }

    /// Detached deep copy of the stored fields; nested models become plain objects.
    #[must_use]
    pub fn snapshot(&self) -> Value {
        Value::Object(self.data()).detached_within(&mut vec![self.id()])
    }

    /// Detached copy of the declared fields only: what change tracking compares.
    #[must_use]
    pub fn tracked_state(&self) -> Value {
        let policies = self.inner.class.policies();
        let data = self.data();
        data.iter()
            .filter(|(key, _)| policies.active_fields.contains(key.as_str()))
            .map(|(key, value)| (key.clone(), value.detached_within(&mut vec![self.id()])))
            .collect()
    }

    // --- Freezing ---

    /// Rejects every further write and delete.
    pub fn freeze(&self) -> &Self {
        self.inner.frozen.store(true, Ordering::Release);
        self
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    // --- Events ---

    /// Listens to `kind` on this instance only.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.inner.events.once(kind, listener)
    }

    /// Emits a bare `kind` event. Returns the number of listeners invoked.
    pub fn emit(&self, kind: EventKind) -> usize {
        self.dispatch(&EventPayload::new(kind, self))
    }

    /// Runs class lineage listeners (nearest class first), then instance listeners.
    pub(crate) fn dispatch(&self, payload: &EventPayload) -> usize {
        let lineage = self.inner.class.lineage();
        let tiers: Vec<&ModelEvents> =
            lineage.iter().map(ModelClass::events).chain([&self.inner.events]).collect();
        dispatch(&tiers, payload.kind, payload)
    }

    /// Marks this model touched and notifies listeners, including parents of nested links.
    pub(crate) fn touch(&self, payload: &EventPayload) {
        let id = self.id();
        if !PROPAGATING.with(|active| active.borrow_mut().insert(id)) {
            return;
        }
        tracker::mark_touched(id);
        self.dispatch(payload);
        PROPAGATING.with(|active| active.borrow_mut().remove(&id));
    }

    // --- Nested links ---

    fn link_nested(&self, value: &Value) -> Vec<Subscription> {
        let mut nested = Vec::new();
        collect_models(value, &mut nested);

        nested
            .into_iter()
            .filter(|model| !model.ptr_eq(self))
            .map(|model| {
                let parent = Arc::downgrade(&self.inner);
                model.inner.events.on(EventKind::Touched, move |_| propagate(&parent))
            })
            .collect()
    }

    fn replace_links(&self, prop: &str, links: Vec<Subscription>) {
        let stale = {
            let mut table = self.inner.links.lock();
            if links.is_empty() { table.remove(prop) } else { table.insert(prop.to_owned(), links) }
        };
        for link in stale.into_iter().flatten() {
            link.unsubscribe();
        }
    }
}

fn propagate(parent: &Weak<ModelInner>) {
    if let Some(inner) = parent.upgrade() {
        let parent = Model { inner };
        parent.touch(&EventPayload::new(EventKind::Touched, &parent));
    }
}

fn collect_models(value: &Value, out: &mut Vec<Model>) {
    match value {
        Value::Model(model) => out.push(model.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_models(item, out)),
        Value::Object(object) => object.values().for_each(|item| collect_models(item, out)),
        _ => {},
    }
}

impl Drop for ModelInner {
    fn drop(&mut self) {
        tracker::release(self.id);
        for link in self.links.get_mut().drain().flat_map(|(_, links)| links) {
            link.unsubscribe();
        }
    }
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Model {}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("class", &self.inner.class.name())
            .field("id", &self.inner.id)
            .field("fields", &self.inner.fields.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
