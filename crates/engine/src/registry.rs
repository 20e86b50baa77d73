use crate::class::ModelClass;
use crate::error::ModelError;
use crate::model::Model;
use crate::value::Value;
use amodel_domain::FieldFlags;
use fxhash::FxHashMap;
use indexmap::{IndexMap, IndexSet};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Computed read: `(model, prop) -> value`.
pub type Getter = Arc<dyn Fn(&Model, &str) -> Value + Send + Sync>;

/// Custom write: `(model, prop, value) -> written`.
///
/// A setter owns the storage step; it usually ends with [`Model::write_raw`].
/// The model is marked touched after the setter, and only when it returns `true`.
pub type Setter = Arc<dyn Fn(&Model, &str, Value) -> bool + Send + Sync>;

type ValidateFn = dyn Fn(&Model, &str, &Value) -> Result<(), ModelError> + Send + Sync;

/// Field validator. An error aborts the write before any setter or event runs.
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&Model, &str, &Value) -> Result<(), ModelError> + Send + Sync + 'static,
    {
        Self(Arc::new(validate))
    }

    /// Adapts a boolean check; a `false` result becomes a [`ModelError::Validation`].
    pub fn predicate<F>(check: F, message: impl Into<Cow<'static, str>>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        Self::new(move |_, prop, value| {
            if check(value) {
                Ok(())
            } else {
                Err(ModelError::validation(prop.to_owned(), message.clone()))
            }
        })
    }

    /// Runs the validator for `prop`.
    ///
    /// # Errors
    ///
    /// Whatever the validator rejects the value with.
    pub fn validate(&self, model: &Model, prop: &str, value: &Value) -> Result<(), ModelError> {
        (self.0)(model, prop, value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

/// Default value of a field: a fixed value, or a factory evaluated on every resolution.
#[derive(Clone)]
pub enum AttributeDefault {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl AttributeDefault {
    pub fn factory<F, V>(make: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::Factory(Arc::new(move || make().into()))
    }

    /// Produces the default. Fixed values are deep-cloned so instances never share them.
    #[must_use]
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.deep_clone(),
            Self::Factory(make) => make(),
        }
    }
}

impl fmt::Debug for AttributeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A factory field bound to its nested class.
#[derive(Debug, Clone)]
pub struct FactoryBinding {
    pub class: ModelClass,
    pub default: Option<AttributeDefault>,
}

impl FactoryBinding {
    /// Passes an assigned value through the nested class's lazy pipeline.
    ///
    /// Arrays map element-wise with falsy entries dropped; null takes the
    /// declared default, if any.
    ///
    /// # Errors
    ///
    /// Errors raised while constructing the nested models.
    pub fn convert(&self, value: Value) -> Result<Value, ModelError> {
        match value {
            Value::Null => match self.default.as_ref().map(AttributeDefault::resolve) {
                None | Some(Value::Null) => Ok(Value::Null),
                Some(default) => self.convert_present(default),
            },
            other => self.convert_present(other),
        }
    }

    fn convert_present(&self, value: Value) -> Result<Value, ModelError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter(|item| !item.is_falsy())
                .map(|item| self.class.create_lazy(item).map(Value::Model))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => self.class.create_lazy(other).map(Value::Model),
        }
    }
}

/// The policy sets of one class. Sets only grow.
#[derive(Debug, Clone, Default)]
pub struct Policies {
    pub fillable: IndexSet<String>,
    pub protected: IndexSet<String>,
    pub readonly: IndexSet<String>,
    pub hidden: IndexSet<String>,
    pub required: IndexSet<String>,
    pub active_fields: IndexSet<String>,
}

impl Policies {
    /// Declares `name` as an active field carrying `flags`.
    pub fn apply(&mut self, name: &str, flags: FieldFlags) {
        self.active_fields.insert(name.to_owned());
        let sets = [
            (FieldFlags::FILLABLE, &mut self.fillable),
            (FieldFlags::PROTECTED, &mut self.protected),
            (FieldFlags::READONLY, &mut self.readonly),
            (FieldFlags::HIDDEN, &mut self.hidden),
            (FieldFlags::REQUIRED, &mut self.required),
        ];
        for (flag, set) in sets {
            if flags.contains(flag) {
                set.insert(name.to_owned());
            }
        }
    }

    /// An empty fillable set allows every field.
    #[must_use]
    pub fn is_fillable(&self, name: &str) -> bool {
        self.fillable.is_empty() || self.fillable.contains(name)
    }

    /// Flags currently recorded for `name`.
    #[must_use]
    pub fn flags_of(&self, name: &str) -> FieldFlags {
        let mut flags = FieldFlags::empty();
        flags.set(FieldFlags::FILLABLE, self.fillable.contains(name));
        flags.set(FieldFlags::PROTECTED, self.protected.contains(name));
        flags.set(FieldFlags::READONLY, self.readonly.contains(name));
        flags.set(FieldFlags::HIDDEN, self.hidden.contains(name));
        flags.set(FieldFlags::REQUIRED, self.required.contains(name));
        flags
    }
}

/// One class's own behavior layer; lookups fall back to the parent layer.
#[derive(Default)]
pub(crate) struct Behaviors {
    pub(crate) getters: FxHashMap<String, Getter>,
    pub(crate) setters: FxHashMap<String, Setter>,
    pub(crate) validators: FxHashMap<String, Validator>,
    pub(crate) attributes: IndexMap<String, AttributeDefault>,
    pub(crate) factories: FxHashMap<String, FactoryBinding>,
}
