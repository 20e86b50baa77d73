//! Enforced accessors: every read, write, delete and enumeration of a model
//! goes through the policies of its class.

use crate::error::ModelError;
use crate::event::EventPayload;
use crate::model::Model;
use crate::tracker;
use crate::value::Value;
use amodel_domain::EventKind;
use indexmap::IndexSet;
use tracing::debug;

impl Model {
    /// Reads `prop` through its getter, or the stored value when it has none.
    #[must_use]
    pub fn get(&self, prop: &str) -> Option<Value> {
        match self.class().resolve_getter(prop) {
            Some(getter) => Some(getter(self, prop)),
            None => self.raw(prop),
        }
    }

    /// Writes `prop` under the class policies.
    ///
    /// Returns `Ok(false)` when the write is rejected: frozen model, field not
    /// fillable, or readonly field already holding a value outside construction.
    /// A custom setter's result is returned as is.
    ///
    /// A value deep-equal to the held one is accepted without storing it, so a
    /// nested model is never swapped for equal plain data.
    ///
    /// # Errors
    ///
    /// Validator rejections and nested factory errors; the field keeps its value.
    pub fn set(&self, prop: &str, value: impl Into<Value>) -> Result<bool, ModelError> {
        let value = value.into();
        if self.is_frozen() {
            debug!(class = %self.class(), prop, "Write rejected: model is frozen");
            return Ok(false);
        }

        let current = self.raw(prop);
        if current.as_ref().is_some_and(|held| held.deep_eq(&value)) {
            // The held value stays: it may be a factory-built model equal to plain input.
            return Ok(true);
        }

        let class = self.class().clone();
        if !class.is_active_field(prop) {
            self.write_raw(prop, value);
            return Ok(true);
        }
        if !class.is_fillable(prop) {
            debug!(%class, prop, "Write rejected: field is not fillable");
            return Ok(false);
        }

        let creating = tracker::is_creating();
        let held = current.as_ref().is_some_and(|held| !held.is_null());
        if class.is_readonly(prop) && !creating && held {
            debug!(%class, prop, "Write rejected: field is readonly");
            return Ok(false);
        }

        if let Some(validator) = class.resolve_validator(prop) {
            validator.validate(self, prop, &value)?;
        }

        let value = match class.resolve_factory(prop) {
            Some(binding) => binding.convert(value)?,
            None => value,
        };

        let payload = |kind| EventPayload::prop(kind, self, prop, Some(value.clone()), current.clone());
        let setter = class.resolve_setter(prop);
        if !creating && setter.is_none() {
            self.touch(&payload(EventKind::Touched));
        }

        self.dispatch(&payload(EventKind::BeforeSetValue));
        let written = match setter {
            Some(setter) => {
                let written = setter(self, prop, value.clone());
                if written && !creating {
                    self.touch(&payload(EventKind::Touched));
                }
                written
            },
            None => {
                self.write_raw(prop, value.clone());
                true
            },
        };
        self.dispatch(&payload(EventKind::AfterSetValue));

        if held && value.is_null() {
            self.dispatch(&payload(EventKind::Nulling));
        }
        Ok(written)
    }

    /// Deletes `prop`. Returns `Ok(true)` if a stored value was removed.
    ///
    /// # Errors
    ///
    /// [`ModelError::ProtectedField`] if the field is protected.
    pub fn delete(&self, prop: &str) -> Result<bool, ModelError> {
        if self.class().is_protected(prop) {
            return Err(ModelError::ProtectedField { field: prop.to_owned().into(), context: None });
        }
        if self.is_frozen() {
            debug!(class = %self.class(), prop, "Delete rejected: model is frozen");
            return Ok(false);
        }

        let old_value = self.raw(prop);
        self.dispatch(&EventPayload::prop(
            EventKind::BeforeDeletingAttribute,
            self,
            prop,
            None,
            old_value,
        ));
        Ok(self.remove_raw(prop).is_some())
    }

    /// Stored keys plus getter-only keys, minus hidden fields.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let class = self.class();
        let policies = class.policies();

        let mut keys: IndexSet<String> = self.data().into_keys().collect();
        keys.extend(class.getter_names());
        keys.into_iter().filter(|key| !policies.hidden.contains(key)).collect()
    }

    /// Raw containment: hidden and getter-only keys are not special.
    #[must_use]
    pub fn has(&self, prop: &str) -> bool {
        self.raw(prop).is_some()
    }

    /// Writes every entry of `data` through [`Model::set`].
    ///
    /// Objects and models contribute their entries; anything else is ignored.
    ///
    /// # Errors
    ///
    /// The first write error; earlier entries stay written.
    pub fn fill(&self, data: impl Into<Value>) -> Result<&Self, ModelError> {
        let entries = match data.into() {
            Value::Object(object) => object,
            Value::Model(model) => model.data(),
            _ => return Ok(self),
        };
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{FieldDescriptor, ModelClass, ModelError, Value};
    use amodel_domain::EventKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let bump = count.clone();
        (count, move || {
            bump.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_rejected_write_returns_false() {
        let class = ModelClass::new("InterceptFillable");
        class.add_to_fillable("name").add_field("secret");
        let model = class.create(json!({ "name": "a" })).unwrap();

        assert!(!model.set("secret", "x").unwrap());
        assert_eq!(model.get("secret"), None);
        assert!(model.set("name", "b").unwrap());
    }

    #[test]
    fn test_idempotent_write_skips_validator_and_events() {
        let class = ModelClass::new("InterceptIdempotent");
        let (validations, bump) = counter();
        class
            .field(
                "age",
                FieldDescriptor::new().fillable().validator(move |_, _, _| {
                    bump();
                    Ok(())
                }),
            )
            .unwrap();
        let model = class.create(json!({ "age": 3 })).unwrap();
        let before = validations.load(Ordering::SeqCst);

        let (events, bump) = counter();
        model.on(EventKind::Touched, move |_| bump());
        assert!(model.set("age", 3.0).unwrap());

        assert_eq!(validations.load(Ordering::SeqCst), before);
        assert_eq!(events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_undeclared_props_bypass_policy_without_touching() {
        let class = ModelClass::new("InterceptUndeclared");
        class.add_to_fillable("name");
        let model = class.create(json!({})).unwrap();
        let (events, bump) = counter();
        model.on(EventKind::Touched, move |_| bump());

        assert!(model.set("scratch", 1).unwrap());
        assert_eq!(model.get("scratch"), Some(Value::Int(1)));
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert!(!model.was_touched());
    }

    #[test]
    fn test_readonly_rejects_after_construction() {
        let class = ModelClass::new("InterceptReadonly");
        class.field("code", FieldDescriptor::new().readonly()).unwrap();
        let model = class.create(json!({ "code": "A1" })).unwrap();

        assert!(!model.set("code", "B2").unwrap());
        assert_eq!(model.get("code"), Some(Value::from("A1")));
    }

    #[test]
    fn test_getter_overrides_read_and_appears_in_keys() {
        let class = ModelClass::new("InterceptGetter");
        class.add_to_fillable("first").add_to_fillable("last");
        class.define_getter("full", |model, _| {
            let part = |key| model.raw(key).and_then(|v| v.as_str().map(str::to_owned));
            Value::from(format!("{} {}", part("first").unwrap_or_default(), part("last").unwrap_or_default()))
        });
        let model = class.create(json!({ "first": "Ada", "last": "Lovelace" })).unwrap();

        assert_eq!(model.get("full"), Some(Value::from("Ada Lovelace")));
        assert_eq!(model.keys(), ["first", "last", "full"]);
        assert!(!model.has("full"));
    }

    #[test]
    fn test_setter_result_is_returned() {
        let class = ModelClass::new("InterceptSetter");
        class
            .field(
                "name",
                FieldDescriptor::new().setter(|model, prop, value| {
                    let upper = value.as_str().map(str::to_uppercase).map_or(value, Value::from);
                    model.write_raw(prop, upper);
                    true
                }),
            )
            .unwrap();
        let model = class.create(json!({ "name": "bolt" })).unwrap();

        assert_eq!(model.get("name"), Some(Value::from("BOLT")));
    }

    #[test]
    fn test_setter_that_declines_does_not_touch() {
        let class = ModelClass::new("InterceptDecliningSetter");
        class.field("name", FieldDescriptor::new().setter(|_, _, _| false)).unwrap();
        let model = class.create(json!({})).unwrap();
        model.start_tracking();
        let (events, bump) = counter();
        model.on(EventKind::Touched, move |_| bump());

        assert!(!model.set("name", "ignored").unwrap());
        assert!(!model.was_touched());
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(model.is_touched(), Some(false));
    }

    #[test]
    fn test_event_order_for_a_write() {
        let class = ModelClass::new("InterceptOrder");
        class.add_to_fillable("note");
        let model = class.create(json!({ "note": "a" })).unwrap();

        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        for kind in [EventKind::Touched, EventKind::BeforeSetValue, EventKind::AfterSetValue, EventKind::Nulling] {
            let log = log.clone();
            model.on(kind, move |payload| log.lock().push(payload.kind));
        }
        model.set("note", Value::Null).unwrap();

        assert_eq!(
            *log.lock(),
            [EventKind::Touched, EventKind::BeforeSetValue, EventKind::AfterSetValue, EventKind::Nulling]
        );
    }

    #[test]
    fn test_delete_protected_field_errors() {
        let class = ModelClass::new("InterceptProtected");
        class.field("vin", FieldDescriptor::new().protected()).unwrap();
        class.add_field("color");
        let model = class.create(json!({ "vin": "X", "color": "red" })).unwrap();

        assert!(matches!(model.delete("vin"), Err(ModelError::ProtectedField { .. })));
        assert!(model.has("vin"));
        assert!(model.delete("color").unwrap());
        assert!(!model.delete("color").unwrap());
    }

    #[test]
    fn test_frozen_model_rejects_writes() {
        let class = ModelClass::new("InterceptFrozen");
        class.add_field("n");
        let model = class.create(json!({ "n": 1 })).unwrap();
        model.freeze();

        assert!(!model.set("n", 2).unwrap());
        assert!(!model.delete("n").unwrap());
        assert_eq!(model.get("n"), Some(Value::Int(1)));
    }
}
