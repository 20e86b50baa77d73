use amodel_engine::{
    CreateOptions, EventKind, FactoryConfig, FieldDescriptor, ModelClass, ModelError, Value,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn wheel_class(name: &'static str) -> ModelClass {
    let wheel = ModelClass::new(name);
    wheel.add_to_fillable("size");
    wheel
}

#[test]
fn test_nested_object_becomes_a_model() {
    let wheel = wheel_class("FactorySpare");
    let car = ModelClass::new("FactoryCarSpare");
    car.field("spare", FieldDescriptor::new().factory(FactoryConfig::Class(wheel.clone())))
        .unwrap();

    let model = car.create(json!({ "spare": { "size": 16 } })).unwrap();
    let spare = model.get("spare").and_then(|v| v.as_model().cloned()).unwrap();

    assert!(spare.is_instance_of(&wheel));
    assert_eq!(spare.get("size"), Some(Value::Int(16)));
    assert_eq!(model.to_json(), json!({ "spare": { "size": 16 } }));
}

#[test]
fn test_arrays_map_element_wise_and_drop_falsy() {
    let wheel = wheel_class("FactoryWheel");
    let car = ModelClass::new("FactoryCarWheels");
    car.field("wheels", FieldDescriptor::new().factory(FactoryConfig::Class(wheel))).unwrap();

    let model = car
        .create(json!({ "wheels": [{ "size": 17 }, null, { "size": 18 }, false] }))
        .unwrap();

    let wheels = model.get("wheels").and_then(|v| v.as_array().cloned()).unwrap();
    assert_eq!(wheels.len(), 2);
    assert!(wheels.iter().all(|w| w.as_model().is_some()));
}

#[test]
fn test_null_takes_the_factory_default() {
    let wheel = wheel_class("FactoryWheelDefault");
    let car = ModelClass::new("FactoryCarDefault");
    car.field("wheels", FieldDescriptor::new().factory(FactoryConfig::with_default(wheel, Vec::<Value>::new)))
        .unwrap();

    let model = car.create(json!({ "wheels": null })).unwrap();
    assert_eq!(model.get("wheels"), Some(Value::Array(Vec::new())));

    model.set("wheels", json!([{ "size": 15 }])).unwrap();
    model.set("wheels", Value::Null).unwrap();
    assert_eq!(model.get("wheels"), Some(Value::Array(Vec::new())));
}

#[test]
fn test_existing_instance_is_stored_as_is() {
    let wheel = wheel_class("FactoryWheelReuse");
    let car = ModelClass::new("FactoryCarReuse");
    car.field("spare", FieldDescriptor::new().factory(FactoryConfig::Class(wheel.clone())))
        .unwrap();
    let model = car.create(json!({})).unwrap();
    let spare = wheel.create(json!({ "size": 14 })).unwrap();

    model.set("spare", spare.clone()).unwrap();
    assert!(model.get("spare").and_then(|v| v.as_model().cloned()).unwrap().ptr_eq(&spare));
}

#[test]
fn test_named_factory_resolves_registered_class() {
    let _engine = {
        let engine = ModelClass::new("FactoryNamedEngine");
        engine.add_field("power");
        engine
    };
    let car = ModelClass::new("FactoryCarNamed");
    car.field("engine", FieldDescriptor::new().factory(FactoryConfig::Named("FactoryNamedEngine".into())))
        .unwrap();

    let model = car.create(json!({ "engine": { "power": 250 } })).unwrap();
    let engine = model.get("engine").and_then(|v| v.as_model().cloned()).unwrap();
    assert_eq!(engine.class().name(), "FactoryNamedEngine");
}

#[test]
fn test_named_factory_errors() {
    let car = ModelClass::new("FactoryCarBroken");

    let missing = car.field("engine", FieldDescriptor::new().factory(FactoryConfig::Named("NoSuchModel".into())));
    assert!(matches!(missing, Err(ModelError::MissingFactoryModel { .. })));

    let invalid = car.field("engine", FieldDescriptor::new().factory(FactoryConfig::Named("  ".into())));
    assert!(matches!(invalid, Err(ModelError::InvalidFactoryModel { .. })));

    assert!(!car.is_active_field("engine"));
}

#[test]
fn test_nested_construction_keeps_outer_construction_quiet() {
    let wheel = wheel_class("FactoryWheelQuiet");
    let car = ModelClass::new("FactoryCarQuiet");
    car.field("axle", FieldDescriptor::new().factory(FactoryConfig::Class(wheel))).unwrap();
    car.add_field("name");

    let touched = Arc::new(AtomicUsize::new(0));
    let counter = touched.clone();
    car.on(EventKind::Touched, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    car.create(json!({ "axle": { "size": 1 }, "name": "quiet" })).unwrap();
    assert_eq!(touched.load(Ordering::SeqCst), 0);
}

#[test]
fn test_equal_plain_input_keeps_the_nested_model() {
    let wheel = wheel_class("FactoryWheelEqual");
    let car = ModelClass::new("FactoryCarEqual");
    car.field("spare", FieldDescriptor::new().fillable().factory(FactoryConfig::Class(wheel.clone())))
        .unwrap();
    let model = car.create_with(json!({ "spare": { "size": 16 } }), CreateOptions::new().tracked(true)).unwrap();
    let spare = model.get("spare").and_then(|v| v.as_model().cloned()).unwrap();

    assert!(model.set("spare", json!({ "size": 16 })).unwrap());
    model.fill(json!({ "spare": { "size": 16 } })).unwrap();

    let held = model.get("spare").and_then(|v| v.as_model().cloned()).unwrap();
    assert!(held.ptr_eq(&spare) && held.is_instance_of(&wheel));
    assert_eq!(model.is_touched(), Some(false));

    spare.set("size", 17).unwrap();
    assert!(model.was_touched(), "nested link survives the equal write");
}
