use crate::class::ModelClass;
use crate::creation::CreateOptions;
use crate::error::ModelError;
use crate::model::Model;
use crate::value::Value;

/// A typed handle over [`Model`] bound to one class, as generated by `#[active_model]`.
pub trait ActiveModel: Sized {
    /// The class every instance of this type belongs to.
    ///
    /// # Panics
    ///
    /// Generated implementations panic on first use if a field declaration is rejected.
    fn class() -> &'static ModelClass;

    /// Wraps `model` without checking its class.
    fn from_model_unchecked(model: Model) -> Self;

    fn model(&self) -> &Model;

    /// Wraps `model` if it is an instance of [`ActiveModel::class`] or a subclass.
    fn from_model(model: Model) -> Option<Self> {
        model.is_instance_of(Self::class()).then(|| Self::from_model_unchecked(model))
    }

    /// # Errors
    ///
    /// See [`ModelClass::create`].
    fn create(data: impl Into<Value>) -> Result<Self, ModelError> {
        Self::class().create(data).map(Self::from_model_unchecked)
    }

    /// # Errors
    ///
    /// See [`ModelClass::create`].
    fn create_with(data: impl Into<Value>, options: CreateOptions) -> Result<Self, ModelError> {
        Self::class().create_with(data, options).map(Self::from_model_unchecked)
    }

    /// # Errors
    ///
    /// See [`ModelClass::create`].
    fn create_lazy(data: impl Into<Value>) -> Result<Self, ModelError> {
        Self::class().create_lazy(data).map(Self::from_model_unchecked)
    }

    /// # Errors
    ///
    /// The first creation error.
    fn create_from_collection<I>(items: I) -> Result<Vec<Self>, ModelError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let models = Self::class().create_from_collection(items)?;
        Ok(models.into_iter().map(Self::from_model_unchecked).collect())
    }
}

/// Typed extraction from a [`Value`], used by generated field readers.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64().and_then(|i| Self::try_from(i).ok())
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for Model {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Model(model) => Some(model),
            _ => None,
        }
    }
}

/// Every element must convert; one failure yields `None`.
impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// `null` reads as `Some(None)`, so an explicitly cleared field is distinguishable
/// from a value of the wrong type.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}
