//! Construction signal in the non-reentrant `flag` mode.

use amodel_engine::{
    CreationScopeMode, EngineConfig, EventKind, FactoryConfig, FieldDescriptor, ModelClass,
    configure, tracker,
};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn with_scope_mode(mode: CreationScopeMode, test: impl FnOnce()) {
    let mut config = EngineConfig::default();
    config.creation.scope = mode;
    configure(config);
    test();
    configure(EngineConfig::default());
}

fn touched_during_nested_create(class_suffix: &'static str) -> usize {
    let wheel = ModelClass::new(format!("LegacyWheel{class_suffix}"));
    wheel.add_field("size");
    let car = ModelClass::new(format!("LegacyCar{class_suffix}"));
    car.field("axle", FieldDescriptor::new().factory(FactoryConfig::Class(wheel))).unwrap();
    car.add_field("name");

    let touched = Arc::new(AtomicUsize::new(0));
    let counter = touched.clone();
    car.on(EventKind::Touched, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // "axle" sorts before "name", so the nested construction ends first.
    car.create(json!({ "axle": { "size": 1 }, "name": "early" })).unwrap();
    touched.load(Ordering::SeqCst)
}

#[test]
#[serial]
fn test_flag_mode_clears_signal_after_nested_construction() {
    with_scope_mode(CreationScopeMode::Flag, || {
        assert_eq!(touched_during_nested_create("Flag"), 1);
    });
}

#[test]
#[serial]
fn test_depth_mode_keeps_signal_until_outer_construction_ends() {
    with_scope_mode(CreationScopeMode::Depth, || {
        assert_eq!(touched_during_nested_create("Depth"), 0);
    });
}

#[test]
#[serial]
fn test_flag_mode_is_not_reentrant() {
    with_scope_mode(CreationScopeMode::Flag, || {
        tracker::start_creating();
        tracker::start_creating();
        tracker::end_creating();
        assert!(tracker::is_not_creating());
    });
}

#[test]
#[serial]
fn test_tracking_enabled_by_config() {
    let mut config = EngineConfig::default();
    config.tracking.enabled = true;
    configure(config);

    let class = ModelClass::new("LegacyTrackedByDefault");
    class.add_field("n");
    let model = class.create(json!({ "n": 1 })).unwrap();
    configure(EngineConfig::default());

    assert_eq!(model.is_touched(), Some(false));
}
