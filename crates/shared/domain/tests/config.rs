use amodel_domain::config::{CreationScopeMode, EngineConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.creation.scope, CreationScopeMode::Depth);
    assert!(cfg.creation.sanitize);
    assert!(!cfg.tracking.enabled);
}

#[test]
fn engine_config_deserializes_partial_sections() {
    let raw = json!({
        "creation": { "scope": "flag" },
        "tracking": { "enabled": true }
    });

    let cfg: EngineConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.creation.scope, CreationScopeMode::Flag);
    assert!(cfg.creation.sanitize, "missing keys keep their defaults");
    assert!(cfg.tracking.enabled);
}

#[test]
fn empty_document_is_default_config() {
    let cfg: EngineConfig = serde_json::from_value(json!({})).expect("config deserialize");
    assert_eq!(cfg, EngineConfig::default());
}
