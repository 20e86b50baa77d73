use crate::model::{InstanceId, Model};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Ordered string-keyed object storage.
pub type Object = IndexMap<String, Value>;

/// A dynamic value stored in a model field.
///
/// Absence of a key is modelled as `Option::None` by the accessors, never as a variant.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
    /// A nested model handle.
    Model(Model),
    /// A host value that takes part in identity comparisons only and is never serialized.
    Opaque(Opaque),
}

/// Shared host value carried by [`Value::Opaque`].
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrows the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Falsy values are dropped by collection factories: null, `false`, `0`, `NaN` and `""`.
    #[must_use]
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0 || f.is_nan(),
            Self::String(s) => s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Model(_) | Self::Opaque(_) => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats with no fractional part convert losslessly.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(model) => Some(model),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_array(&self) -> Option<&Vec<Self>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Structural equality.
    ///
    /// Numbers compare numerically, `NaN` equals itself, a model equals an object
    /// or another model holding equal data, and opaque values compare by identity.
    /// A pair of models met again while comparing them is taken as equal, so cyclic
    /// graphs terminate.
    #[must_use]
    pub fn deep_eq(&self, other: &Self) -> bool {
        values_eq(self, other, &mut Vec::new())
    }

    /// Deep copy with fresh identities: nested models are cloned into new instances
    /// of their class, so policy enforcement carries over to the copy.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Array(items) => Self::Array(items.iter().map(Self::deep_clone).collect()),
            Self::Object(object) => Self::Object(
                object.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect(),
            ),
            Self::Model(model) => Self::Model(model.deep_clone()),
            other => other.clone(),
        }
    }

    /// Plain-data copy: nested models become objects of their stored fields.
    ///
    /// Used for snapshots, which must not alias or keep alive live models. A model
    /// reached again through itself becomes `null`.
    #[must_use]
    pub fn detached(&self) -> Self {
        self.detached_within(&mut Vec::new())
    }

    /// [`Value::detached`] for a value already inside the models on `path`.
    pub(crate) fn detached_within(&self, path: &mut Vec<InstanceId>) -> Self {
        match self {
            Self::Array(items) => {
                Self::Array(items.iter().map(|item| item.detached_within(path)).collect())
            },
            Self::Object(object) => Self::Object(detach_object(object, path)),
            Self::Model(model) if path.contains(&model.id()) => Self::Null,
            Self::Model(model) => {
                path.push(model.id());
                let object = detach_object(&model.data(), path);
                path.pop();
                Self::Object(object)
            },
            other => other.clone(),
        }
    }
}

fn values_eq(a: &Value, b: &Value, active: &mut Vec<(InstanceId, InstanceId)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
                _ => false,
            }
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_eq(x, y, active))
        },
        (Value::Object(a), Value::Object(b)) => objects_eq(a, b, active),
        (Value::Model(a), Value::Model(b)) => {
            if a.ptr_eq(b) {
                return true;
            }
            let pair = (a.id(), b.id());
            if active.contains(&pair) {
                return true;
            }
            active.push(pair);
            let equal = objects_eq(&a.data(), &b.data(), active);
            active.pop();
            equal
        },
        (Value::Model(m), Value::Object(o)) | (Value::Object(o), Value::Model(m)) => {
            objects_eq(&m.data(), o, active)
        },
        (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
        _ => false,
    }
}

fn objects_eq(a: &Object, b: &Object, active: &mut Vec<(InstanceId, InstanceId)>) -> bool {
    a.len() == b.len()
        && a.iter().all(|(key, value)| b.get(key).is_some_and(|v| values_eq(value, v, active)))
}

fn detach_object(object: &Object, path: &mut Vec<InstanceId>) -> Object {
    object.iter().map(|(k, v)| (k.clone(), v.detached_within(path))).collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_eq(other)
    }
}

// --- Conversions ---

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value.into())
            }
        })*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    Object => Object,
    Model => Model,
    Opaque => Opaque,
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                n.as_i64().map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int)
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            },
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            },
        }
    }
}

impl FromIterator<(String, Self)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Self)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().collect())
    }
}

// --- Serialize ---

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null | Self::Opaque(_) => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter().filter(|item| !matches!(item, Self::Opaque(_))) {
                    seq.serialize_element(item)?;
                }
                seq.end()
            },
            Self::Object(object) => {
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in object.iter().filter(|(_, v)| !matches!(v, Self::Opaque(_))) {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            },
            Self::Model(model) => model.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_compare_numerically() {
        assert!(Value::Int(1).deep_eq(&Value::Float(1.0)));
        assert!(Value::Float(f64::NAN).deep_eq(&Value::Float(f64::NAN)));
        assert!(!Value::Int(1).deep_eq(&Value::String("1".into())));
    }

    #[test]
    fn test_object_equality_ignores_key_order() {
        let a = Value::from(json!({ "a": 1, "b": [1, 2] }));
        let b = Value::from(json!({ "b": [1, 2], "a": 1 }));
        assert_eq!(a, b);
        assert_ne!(a, Value::from(json!({ "a": 1 })));
    }

    #[test]
    fn test_cyclic_models_compare_and_detach() {
        let node = crate::ModelClass::new("ValueRing");
        let ring = |label: &str| {
            let model = node.create(json!({ "label": label })).unwrap();
            model.set("next", model.clone()).unwrap();
            Value::Model(model)
        };
        let (a, b, c) = (ring("x"), ring("x"), ring("y"));

        assert!(a.deep_eq(&b));
        assert!(!a.deep_eq(&c));
        assert_eq!(a.detached(), Value::from(json!({ "label": "x", "next": null })));
    }

    #[test]
    fn test_opaque_compares_by_identity() {
        let token = Opaque::new(42_u8);
        assert!(Value::Opaque(token.clone()).deep_eq(&Value::Opaque(token)));
        assert!(!Value::Opaque(Opaque::new(1)).deep_eq(&Value::Opaque(Opaque::new(1))));
    }

    #[test]
    fn test_falsy_values() {
        for value in [Value::Null, false.into(), 0.into(), "".into(), f64::NAN.into()] {
            assert!(value.is_falsy(), "{value:?} should be falsy");
        }
        assert!(!Value::Array(Vec::new()).is_falsy());
        assert!(!Value::from("0").is_falsy());
    }

    #[test]
    fn test_opaque_values_are_not_serialized() {
        let mut object = Object::new();
        object.insert("name".into(), "bolt".into());
        object.insert("handle".into(), Value::Opaque(Opaque::new(())));

        let json = serde_json::to_value(Value::Object(object)).unwrap();
        assert_eq!(json, json!({ "name": "bolt" }));
    }

    #[test]
    fn test_json_conversion_keeps_integers() {
        assert!(matches!(Value::from(json!(7)), Value::Int(7)));
        assert!(matches!(Value::from(json!(7.5)), Value::Float(f) if (f - 7.5).abs() < f64::EPSILON));
    }
}
