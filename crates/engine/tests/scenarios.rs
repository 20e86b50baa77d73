use amodel_engine::{FieldDescriptor, ModelClass, ModelError, Validator, Value};
use serde_json::json;

fn car_class(name: &'static str) -> ModelClass {
    let car = ModelClass::new(name);
    car.field("driver", FieldDescriptor::new().fillable().attribute("Ivan")).unwrap();
    car.field("chassis", FieldDescriptor::new().fillable()).unwrap();
    car
}

#[test]
fn test_car_defaults_merge_with_input() {
    let car = car_class("ScenarioCar");
    let model = car.create(json!({ "chassis": "Porsche" })).unwrap();

    assert_eq!(model.to_json(), json!({ "chassis": "Porsche", "driver": "Ivan" }));
    assert_eq!(model.keys(), ["chassis", "driver"]);
}

#[test]
fn test_car_input_overrides_default() {
    let car = car_class("ScenarioCarOverride");
    let model = car.create(json!({ "chassis": "Lada", "driver": "Petr" })).unwrap();

    assert_eq!(model.get("driver"), Some(Value::from("Petr")));
}

#[test]
fn test_protected_vin_cannot_be_deleted() {
    let car = car_class("ScenarioProtectedVin");
    car.field("vin", FieldDescriptor::new().fillable().protected()).unwrap();
    let model = car.create(json!({ "chassis": "Porsche", "vin": "WP0ZZZ99ZTS392124" })).unwrap();

    let err = model.delete("vin").unwrap_err();
    assert!(matches!(err, ModelError::ProtectedField { ref field, .. } if field == "vin"));
    assert_eq!(err.to_string(), "Property `vin` is protected");
    assert_eq!(model.get("vin"), Some(Value::from("WP0ZZZ99ZTS392124")));
}

#[test]
fn test_hidden_vin_is_readable_but_not_serialized() {
    let car = car_class("ScenarioHiddenVin");
    car.field("vin", FieldDescriptor::new().fillable().hidden()).unwrap();
    let model = car.create(json!({ "chassis": "Porsche", "vin": "WP0ZZZ99ZTS392124" })).unwrap();

    assert_eq!(model.get("vin"), Some(Value::from("WP0ZZZ99ZTS392124")));
    assert!(model.has("vin"));
    assert!(!model.keys().contains(&"vin".to_owned()));
    assert_eq!(model.to_json(), json!({ "chassis": "Porsche", "driver": "Ivan" }));
}

#[test]
fn test_negative_age_is_rejected_and_value_kept() {
    let person = ModelClass::new("ScenarioPerson");
    person
        .field(
            "age",
            FieldDescriptor::new().fillable().validate_with(Validator::predicate(
                |value| value.as_f64().is_none_or(|age| age >= 0.0),
                "age must not be negative",
            )),
        )
        .unwrap();
    let model = person.create(json!({ "age": 30 })).unwrap();

    let err = model.set("age", -1).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Validation failed for `age`: age must not be negative");
    assert_eq!(model.get("age"), Some(Value::Int(30)));
}

#[test]
fn test_validator_runs_during_construction() {
    let person = ModelClass::new("ScenarioPersonCreate");
    person
        .field(
            "age",
            FieldDescriptor::new().validate_with(Validator::predicate(
                |value| value.as_i64().is_some_and(|age| age >= 0),
                "age must not be negative",
            )),
        )
        .unwrap();

    assert!(matches!(person.create(json!({ "age": -5 })), Err(ModelError::Validation { .. })));
}

#[test]
fn test_readonly_field_keeps_constructed_value() {
    let order = ModelClass::new("ScenarioOrder");
    order.field("number", FieldDescriptor::new().readonly()).unwrap();
    order.add_field("status");
    let model = order.create(json!({ "number": 17, "status": "new" })).unwrap();

    assert!(!model.set("number", 18).unwrap());
    assert!(model.set("status", "paid").unwrap());
    assert_eq!(model.get("number"), Some(Value::Int(17)));
}

#[test]
fn test_readonly_field_without_value_accepts_one_write() {
    let order = ModelClass::new("ScenarioOrderLate");
    order.field("number", FieldDescriptor::new().readonly()).unwrap();
    let model = order.create(json!({})).unwrap();

    assert!(model.set("number", 1).unwrap());
    assert!(!model.set("number", 2).unwrap());
}
