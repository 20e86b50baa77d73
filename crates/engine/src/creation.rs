use crate::class::ModelClass;
use crate::config;
use crate::error::ModelError;
use crate::event::EventPayload;
use crate::model::Model;
use crate::tracker::{self, CreationScope};
use crate::value::{Object, Value};
use amodel_domain::EventKind;
use std::future::IntoFuture;
use tracing::{instrument, trace};

/// Options of a single creation.
///
/// `Default` follows the installed engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CreateOptions {
    /// Return input that already is an instance of the class unchanged.
    pub lazy: bool,
    /// Save the raw input and the initial state for change tracking.
    pub tracked: bool,
    /// Deep-clone the input before filling.
    pub sanitize: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        let config = config::current();
        Self { lazy: false, tracked: config.tracking.enabled, sanitize: config.creation.sanitize }
    }
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options of the lazy factory: reuse instances, trust the caller's graph.
    pub fn lazy_defaults() -> Self {
        Self { lazy: true, sanitize: false, ..Self::default() }
    }

    pub const fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub const fn tracked(mut self, tracked: bool) -> Self {
        self.tracked = tracked;
        self
    }

    pub const fn sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }
}

/// Input of the fill step, remembering whether it was already deep-cloned.
enum FillSource {
    Raw(Object),
    Sanitized(Object),
}

impl FillSource {
    fn prepare(self, class: &ModelClass, sanitize: bool) -> Object {
        match self {
            Self::Raw(object) if sanitize => match class.sanitize(&Value::Object(object)) {
                Value::Object(clean) => clean,
                _ => Object::new(),
            },
            Self::Raw(object) | Self::Sanitized(object) => object,
        }
    }
}

impl ModelClass {
    /// Creates an instance with the default options.
    ///
    /// # Errors
    ///
    /// Validation, required-field and nested factory errors.
    pub fn create(&self, data: impl Into<Value>) -> Result<Model, ModelError> {
        self.create_with(data, CreateOptions::default())
    }

    /// Like [`ModelClass::create`], but existing instances are returned as they are
    /// and the input is not cloned.
    ///
    /// # Errors
    ///
    /// See [`ModelClass::create`].
    pub fn create_lazy(&self, data: impl Into<Value>) -> Result<Model, ModelError> {
        self.create_with(data, CreateOptions::lazy_defaults())
    }

    /// Runs the creation pipeline.
    ///
    /// # Errors
    ///
    /// See [`ModelClass::create`].
    #[instrument(level = "trace", skip(self, data), fields(class = %self))]
    pub fn create_with(
        &self,
        data: impl Into<Value>,
        options: CreateOptions,
    ) -> Result<Model, ModelError> {
        let data = data.into();
        if let Value::Model(model) = &data
            && options.lazy
            && model.is_instance_of(self)
        {
            trace!(id = %model.id(), "Reusing existing instance");
            return Ok(model.clone());
        }

        let raw_input = options.tracked.then(|| data.detached());
        let source = match data {
            Value::Object(object) => FillSource::Raw(object),
            Value::Model(model) => FillSource::Raw(model.data()),
            _ => FillSource::Sanitized(Object::new()),
        };

        let model = {
            let _scope = CreationScope::enter();
            let source = source.prepare(self, options.sanitize);
            let model = Model::instantiate(self.clone());
            self.fill_new(&model, source)?;
            self.check_required(&model)?;
            model
        };

        if let Some(raw) = raw_input {
            tracker::save_raw(&model, &raw);
            tracker::save_initial_state(&model, &model.tracked_state());
        }

        trace!(id = %model.id(), tracked = options.tracked, "Model created");
        model.dispatch(&EventPayload::new(EventKind::Created, &model));
        Ok(model)
    }

    /// Creates one instance per truthy entry of `items`.
    ///
    /// # Errors
    ///
    /// The first creation error.
    pub fn create_from_collection<I>(&self, items: I) -> Result<Vec<Model>, ModelError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.collect(items, CreateOptions::default())
    }

    /// Lazy variant of [`ModelClass::create_from_collection`].
    ///
    /// # Errors
    ///
    /// The first creation error.
    pub fn create_lazy_from_collection<I>(&self, items: I) -> Result<Vec<Model>, ModelError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.collect(items, CreateOptions::lazy_defaults())
    }

    /// Awaits `data`, then creates an instance from it.
    ///
    /// # Errors
    ///
    /// See [`ModelClass::create`].
    pub async fn async_create<F>(&self, data: F) -> Result<Model, ModelError>
    where
        F: IntoFuture,
        F::Output: Into<Value>,
    {
        let data = data.await;
        self.create(data)
    }

    /// Awaits `items`, then creates one instance per truthy entry.
    ///
    /// # Errors
    ///
    /// The first creation error.
    pub async fn async_create_from_collection<F, I>(&self, items: F) -> Result<Vec<Model>, ModelError>
    where
        F: IntoFuture<Output = I>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items = items.await;
        self.create_from_collection(items)
    }

    /// Deep copy of creation input; nested models are re-created in their own class.
    #[must_use]
    pub fn sanitize(&self, data: &Value) -> Value {
        data.deep_clone()
    }

    fn collect<I>(&self, items: I, options: CreateOptions) -> Result<Vec<Model>, ModelError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        items
            .into_iter()
            .map(Into::into)
            .filter(|item: &Value| !item.is_falsy())
            .map(|item| self.create_with(item, options))
            .collect()
    }

    /// Defaults overlaid with `source`, restricted to declared or fillable keys.
    fn fill_new(&self, model: &Model, source: Object) -> Result<(), ModelError> {
        let mut merged = source;
        for (key, default) in self.resolve_attributes() {
            merged.entry(key).or_insert(default);
        }

        for (key, value) in merged {
            if self.is_active_field(&key) || self.is_fillable(&key) {
                model.set(&key, value)?;
            }
        }
        Ok(())
    }

    fn check_required(&self, model: &Model) -> Result<(), ModelError> {
        let policies = self.policies();
        match policies.required.iter().find(|field| model.raw(field).is_none_or(|v| v.is_null())) {
            Some(field) => Err(ModelError::RequiredField { field: field.clone().into(), context: None }),
            None => Ok(()),
        }
    }
}
