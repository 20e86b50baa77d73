use crate::class::ModelClass;
use crate::error::ModelError;
use crate::event::EventPayload;
use crate::model::Model;
use crate::registry::{AttributeDefault, FactoryBinding, Getter, Setter, Validator};
use crate::value::Value;
use amodel_domain::{FieldFlags, PropEvent};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Nested-model binding of a factory field.
#[derive(Clone)]
pub enum FactoryConfig {
    Class(ModelClass),
    /// Class plus the value used when `null` is assigned.
    ClassWithDefault(ModelClass, AttributeDefault),
    /// Class looked up by name at declaration time.
    Named(Cow<'static, str>),
    NamedWithDefault(Cow<'static, str>, AttributeDefault),
}

impl FactoryConfig {
    /// Binds `class` with a lazily evaluated default, e.g. `Vec::new` for collections.
    pub fn with_default<F, V>(class: ModelClass, default: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        Self::ClassWithDefault(class, AttributeDefault::factory(default))
    }

    /// Resolves the configuration into a binding.
    ///
    /// # Errors
    ///
    /// * [`ModelError::InvalidFactoryModel`] for a blank class name.
    /// * [`ModelError::MissingFactoryModel`] if no live class is registered under the name.
    pub fn bind(self) -> Result<FactoryBinding, ModelError> {
        let (class, default) = match self {
            Self::Class(class) => (class, None),
            Self::ClassWithDefault(class, default) => (class, Some(default)),
            Self::Named(name) => (named_class(&name)?, None),
            Self::NamedWithDefault(name, default) => (named_class(&name)?, Some(default)),
        };
        Ok(FactoryBinding { class, default })
    }
}

fn named_class(name: &str) -> Result<ModelClass, ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::InvalidFactoryModel {
            message: "factory class name is blank".into(),
            context: None,
        });
    }
    ModelClass::lookup(name).ok_or_else(|| ModelError::MissingFactoryModel {
        message: format!("no model class named `{name}` is registered").into(),
        context: None,
    })
}

impl fmt::Debug for FactoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) | Self::ClassWithDefault(class, _) => {
                f.debug_tuple("Class").field(&class.name()).finish()
            },
            Self::Named(name) | Self::NamedWithDefault(name, _) => {
                f.debug_tuple("Named").field(name).finish()
            },
        }
    }
}

pub(crate) type Hook = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Declarative description of one field, consumed by [`ModelClass::field`].
///
/// ```rust,ignore
/// class.field("age", FieldDescriptor::new()
///     .fillable()
///     .attribute(0)
///     .validator(|_, prop, value| match value.as_i64() {
///         Some(age) if age < 0 => Err(ModelError::validation(prop.to_owned(), "must not be negative")),
///         _ => Ok(()),
///     }))?;
/// ```
#[derive(Default)]
#[must_use]
pub struct FieldDescriptor {
    pub(crate) flags: FieldFlags,
    pub(crate) attribute: Option<AttributeDefault>,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
    pub(crate) validator: Option<Validator>,
    pub(crate) factory: Option<FactoryConfig>,
    pub(crate) hooks: Vec<(PropEvent, Hook, bool)>,
}

impl FieldDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn fillable(self) -> Self {
        self.flags(FieldFlags::FILLABLE)
    }

    pub fn hidden(self) -> Self {
        self.flags(FieldFlags::HIDDEN)
    }

    pub fn protected(self) -> Self {
        self.flags(FieldFlags::PROTECTED)
    }

    pub fn readonly(self) -> Self {
        self.flags(FieldFlags::READONLY)
    }

    pub fn required(self) -> Self {
        self.flags(FieldFlags::REQUIRED)
    }

    /// Fixed default value.
    pub fn attribute(mut self, value: impl Into<Value>) -> Self {
        self.attribute = Some(AttributeDefault::Value(value.into()));
        self
    }

    /// Default produced by `make` each time defaults are resolved.
    pub fn attribute_with<F, V>(mut self, make: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.attribute = Some(AttributeDefault::factory(make));
        self
    }

    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Model, &str) -> Value + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Model, &str, Value) -> bool + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    pub fn validator<F>(self, validate: F) -> Self
    where
        F: Fn(&Model, &str, &Value) -> Result<(), ModelError> + Send + Sync + 'static,
    {
        self.validate_with(Validator::new(validate))
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn factory(mut self, config: FactoryConfig) -> Self {
        self.factory = Some(config);
        self
    }

    /// Hook running on every `event` concerning this field, for all instances.
    pub fn on<F>(mut self, event: PropEvent, hook: F) -> Self
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.hooks.push((event, Arc::new(hook), false));
        self
    }

    /// Hook running on the first `event` concerning this field only.
    pub fn once<F>(mut self, event: PropEvent, hook: F) -> Self
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        self.hooks.push((event, Arc::new(hook), true));
        self
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("flags", &self.flags)
            .field("attribute", &self.attribute)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("validator", &self.validator.is_some())
            .field("factory", &self.factory)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
