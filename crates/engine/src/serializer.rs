use crate::error::ModelError;
use crate::model::{InstanceId, Model};
use crate::value::Value;
use fxhash::FxHashMap;
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use tracing::warn;

thread_local! {
    /// Originals mapped to their copies while a [`Model::deep_clone`] is in progress.
    static CLONING: RefCell<FxHashMap<InstanceId, Model>> = RefCell::new(FxHashMap::default());
}

impl Model {
    /// Plain JSON view: visible keys read through getters, hidden fields and opaque
    /// values left out. A model reached again through itself serializes as `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = Vec::new();
        model_json(self, &mut path)
    }

    /// Serializes [`Model::to_json`] to a string.
    ///
    /// # Errors
    ///
    /// [`ModelError::Serialization`] if encoding fails.
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(&self.to_json())?)
    }

    /// Independent copy with a new identity.
    ///
    /// Stored data is copied as is, hidden fields included; nested models are cloned
    /// into new instances of their class, with cycles preserved. Change tracking and
    /// listeners are not carried over.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        if let Some(copy) = CLONING.with(|active| active.borrow().get(&self.id()).cloned()) {
            return copy;
        }

        let copy = Self::instantiate(self.class().clone());
        let outermost = CLONING.with(|active| {
            let mut active = active.borrow_mut();
            let outermost = active.is_empty();
            active.insert(self.id(), copy.clone());
            outermost
        });

        for (key, value) in self.data() {
            copy.write_raw(&key, value.deep_clone());
        }

        CLONING.with(|active| {
            let mut active = active.borrow_mut();
            if outermost {
                active.clear();
            } else {
                active.remove(&self.id());
            }
        });
        copy
    }
}

fn model_json(model: &Model, path: &mut Vec<InstanceId>) -> serde_json::Value {
    if path.contains(&model.id()) {
        warn!(class = %model.class(), id = %model.id(), "Cyclic model reference serialized as null");
        return serde_json::Value::Null;
    }

    path.push(model.id());
    let object = model
        .keys()
        .into_iter()
        .filter_map(|key| {
            let value = model.get(&key)?;
            value_json(&value, path).map(|json| (key, json))
        })
        .collect();
    path.pop();
    serde_json::Value::Object(object)
}

/// `None` for values that are left out of the output.
fn value_json(value: &Value, path: &mut Vec<InstanceId>) -> Option<serde_json::Value> {
    Some(match value {
        Value::Opaque(_) => return None,
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => {
            serde_json::Number::from_f64(*f).map_or(serde_json::Value::Null, serde_json::Value::Number)
        },
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().filter_map(|item| value_json(item, path)).collect())
        },
        Value::Object(object) => serde_json::Value::Object(
            object
                .iter()
                .filter_map(|(key, item)| value_json(item, path).map(|json| (key.clone(), json)))
                .collect(),
        ),
        Value::Model(model) => model_json(model, path),
    })
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
