use crate::descriptor::{FactoryConfig, FieldDescriptor};
use crate::error::ModelError;
use crate::event::{EventPayload, ModelEvents};
use crate::model::Model;
use crate::registry::{
    AttributeDefault, Behaviors, FactoryBinding, Getter, Policies, Setter, Validator,
};
use crate::value::{Object, Value};
use amodel_domain::{EventKind, FieldFlags};
use amodel_event_bus::Subscription;
use fxhash::FxHashMap;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Weak};
use tracing::{trace, warn};

/// Process-unique class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u64);

impl ClassId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Live classes by name, for factory fields declared by name.
static DIRECTORY: LazyLock<RwLock<FxHashMap<String, Weak<ClassInner>>>> =
    LazyLock::new(|| RwLock::new(FxHashMap::default()));

struct ClassInner {
    id: ClassId,
    name: Cow<'static, str>,
    parent: Option<ModelClass>,
    /// `None` until the first policy mutation on this class.
    policies: RwLock<Option<Arc<Policies>>>,
    behaviors: RwLock<Behaviors>,
    events: ModelEvents,
}

/// A model class: field metadata, behaviors and class-level listeners.
///
/// Cloning is cheap and yields a handle to the same class.
#[derive(Clone)]
pub struct ModelClass {
    inner: Arc<ClassInner>,
}

impl ModelClass {
    /// Creates a root class and registers it in the class directory.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self::build(name.into(), None)
    }

    /// Creates a subclass inheriting `parent`'s metadata and listeners.
    pub fn extend(parent: &Self, name: impl Into<Cow<'static, str>>) -> Self {
        Self::build(name.into(), Some(parent.clone()))
    }

    fn build(name: Cow<'static, str>, parent: Option<Self>) -> Self {
        let inner = Arc::new(ClassInner {
            id: ClassId::next(),
            name,
            parent,
            policies: RwLock::new(None),
            behaviors: RwLock::new(Behaviors::default()),
            events: ModelEvents::new(),
        });

        let mut directory = DIRECTORY.write();
        let previous = directory.insert(inner.name.to_string(), Arc::downgrade(&inner));
        if previous.is_some_and(|weak| weak.strong_count() > 0) {
            warn!(class = %inner.name, "Model class name registered twice; the newest class wins");
        }
        trace!(class = %inner.name, id = ?inner.id, "Model class registered");
        Self { inner }
    }

    /// Finds a live class by name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        DIRECTORY.read().get(name).and_then(Weak::upgrade).map(|inner| Self { inner })
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.inner.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.inner.parent.as_ref()
    }

    /// This class followed by its ancestors, nearest first.
    #[must_use]
    pub fn lineage(&self) -> Vec<Self> {
        std::iter::successors(Some(self), |class| class.parent()).cloned().collect()
    }

    /// `true` if `self` is `ancestor` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, ancestor: &Self) -> bool {
        std::iter::successors(Some(self), |class| class.parent()).any(|class| class == ancestor)
    }

    /// Class-level listener registry.
    #[must_use]
    pub fn events(&self) -> &ModelEvents {
        &self.inner.events
    }

    /// Listens to `kind` on every instance of this class and its subclasses.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    /// Like [`ModelClass::on`], removed after the first event of `kind` on any instance.
    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.inner.events.once(kind, listener)
    }

    // --- Declarations ---

    /// Declares `name` from a descriptor.
    ///
    /// # Errors
    ///
    /// Factory resolution errors; nothing is registered when one occurs.
    pub fn field(&self, name: &str, descriptor: FieldDescriptor) -> Result<&Self, ModelError> {
        let FieldDescriptor { flags, attribute, getter, setter, validator, factory, hooks } =
            descriptor;
        let factory = factory.map(FactoryConfig::bind).transpose()?;

        self.update_policies(|policies| policies.apply(name, flags));
        {
            let mut behaviors = self.inner.behaviors.write();
            if let Some(attribute) = attribute {
                behaviors.attributes.insert(name.to_owned(), attribute);
            }
            if let Some(getter) = getter {
                behaviors.getters.insert(name.to_owned(), getter);
            }
            if let Some(setter) = setter {
                behaviors.setters.insert(name.to_owned(), setter);
            }
            if let Some(validator) = validator {
                behaviors.validators.insert(name.to_owned(), validator);
            }
            if let Some(factory) = factory {
                behaviors.factories.insert(name.to_owned(), factory);
            }
        }

        for (event, hook, once) in hooks {
            let prop = name.to_owned();
            let fired = AtomicBool::new(false);
            self.inner.events.on(event.into(), move |payload| {
                if payload.is_for(&prop) && !(once && fired.swap(true, Ordering::AcqRel)) {
                    hook(payload);
                }
            });
        }

        trace!(class = %self.name(), field = name, ?flags, "Field declared");
        Ok(self)
    }

    pub fn add_field(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::empty()));
        self
    }

    pub fn add_to_fillable(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::FILLABLE));
        self
    }

    pub fn add_to_protected(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::PROTECTED));
        self
    }

    pub fn add_to_readonly(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::READONLY));
        self
    }

    pub fn add_to_hidden(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::HIDDEN));
        self
    }

    pub fn add_to_required(&self, name: &str) -> &Self {
        self.update_policies(|policies| policies.apply(name, FieldFlags::REQUIRED));
        self
    }

    /// Registers a computed getter. Getter names show up in `keys()` even without stored data.
    pub fn define_getter<F>(&self, name: &str, getter: F) -> &Self
    where
        F: Fn(&Model, &str) -> Value + Send + Sync + 'static,
    {
        self.inner.behaviors.write().getters.insert(name.to_owned(), Arc::new(getter));
        self
    }

    pub fn define_setter<F>(&self, name: &str, setter: F) -> &Self
    where
        F: Fn(&Model, &str, Value) -> bool + Send + Sync + 'static,
    {
        self.inner.behaviors.write().setters.insert(name.to_owned(), Arc::new(setter));
        self
    }

    pub fn define_validator(&self, name: &str, validator: Validator) -> &Self {
        self.inner.behaviors.write().validators.insert(name.to_owned(), validator);
        self
    }

    pub fn define_attribute(&self, name: &str, default: AttributeDefault) -> &Self {
        self.inner.behaviors.write().attributes.insert(name.to_owned(), default);
        self
    }

    pub fn define_factory(&self, name: &str, binding: FactoryBinding) -> &Self {
        self.inner.behaviors.write().factories.insert(name.to_owned(), binding);
        self
    }

    // --- Resolution ---

    #[must_use]
    pub fn resolve_getter(&self, name: &str) -> Option<Getter> {
        self.resolve(|behaviors| behaviors.getters.get(name).cloned())
    }

    #[must_use]
    pub fn resolve_setter(&self, name: &str) -> Option<Setter> {
        self.resolve(|behaviors| behaviors.setters.get(name).cloned())
    }

    #[must_use]
    pub fn resolve_validator(&self, name: &str) -> Option<Validator> {
        self.resolve(|behaviors| behaviors.validators.get(name).cloned())
    }

    #[must_use]
    pub fn resolve_factory(&self, name: &str) -> Option<FactoryBinding> {
        self.resolve(|behaviors| behaviors.factories.get(name).cloned())
    }

    /// Defaults merged root to leaf; factories are evaluated on every call.
    #[must_use]
    pub fn resolve_attributes(&self) -> Object {
        let mut lineage = self.lineage();
        lineage.reverse();

        let mut defaults = Vec::new();
        for class in &lineage {
            let behaviors = class.inner.behaviors.read();
            defaults.extend(behaviors.attributes.iter().map(|(k, d)| (k.clone(), d.clone())));
        }

        let mut resolved = Object::new();
        for (name, default) in defaults {
            resolved.insert(name, default.resolve());
        }
        resolved
    }

    /// Names of every getter visible to this class, ancestors' first.
    #[must_use]
    pub fn getter_names(&self) -> IndexSet<String> {
        let mut lineage = self.lineage();
        lineage.reverse();
        lineage
            .iter()
            .flat_map(|class| class.inner.behaviors.read().getters.keys().cloned().collect::<Vec<_>>())
            .collect()
    }

    fn resolve<T>(&self, find: impl Fn(&Behaviors) -> Option<T>) -> Option<T> {
        std::iter::successors(Some(self), |class| class.parent())
            .find_map(|class| find(&class.inner.behaviors.read()))
    }

    // --- Policies ---

    /// Effective policy sets: this class's own copy, or the nearest ancestor's.
    #[must_use]
    pub fn policies(&self) -> Arc<Policies> {
        if let Some(own) = self.inner.policies.read().as_ref() {
            return own.clone();
        }
        self.parent().map_or_else(|| Arc::new(Policies::default()), Self::policies)
    }

    /// Copies the inherited policies on first use, then mutates the own copy.
    fn update_policies(&self, mutate: impl FnOnce(&mut Policies)) {
        let inherited = self.inner.policies.read().is_none().then(|| {
            self.parent().map(|parent| (*parent.policies()).clone()).unwrap_or_default()
        });

        let mut slot = self.inner.policies.write();
        let own = slot.get_or_insert_with(|| Arc::new(inherited.unwrap_or_default()));
        mutate(Arc::make_mut(own));
    }

    #[must_use]
    pub fn is_active_field(&self, name: &str) -> bool {
        self.policies().active_fields.contains(name)
    }

    #[must_use]
    pub fn is_fillable(&self, name: &str) -> bool {
        self.policies().is_fillable(name)
    }

    #[must_use]
    pub fn is_protected(&self, name: &str) -> bool {
        self.policies().protected.contains(name)
    }

    #[must_use]
    pub fn is_readonly(&self, name: &str) -> bool {
        self.policies().readonly.contains(name)
    }

    #[must_use]
    pub fn is_hidden(&self, name: &str) -> bool {
        self.policies().hidden.contains(name)
    }

    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.policies().required.contains(name)
    }
}

impl Drop for ClassInner {
    fn drop(&mut self) {
        let mut directory = DIRECTORY.write();
        if directory.get(self.name.as_ref()).is_some_and(|weak| weak.strong_count() == 0) {
            directory.remove(self.name.as_ref());
        }
    }
}

impl PartialEq for ModelClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ModelClass {}

impl Hash for ModelClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelClass")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(Self::name))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ModelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.name)
    }
}
