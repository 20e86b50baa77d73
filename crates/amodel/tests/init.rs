use amodel::prelude::*;
use amodel::{CreationScopeMode, current_config};
use serde_json::json;
use serial_test::serial;
use std::io::Write;

#[test]
#[serial]
fn test_init_applies_the_loaded_configuration() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[creation]\nscope = \"flag\"\n\n[tracking]\nenabled = true\n").unwrap();

    let applied = amodel::init(Some(file.path())).unwrap();
    assert_eq!(applied.creation.scope, CreationScopeMode::Flag);
    assert_eq!(current_config().creation.scope, CreationScopeMode::Flag);

    let class = ModelClass::new("InitTracked");
    class.add_field("name");
    let model = class.create(json!({ "name": "first" })).unwrap();
    assert_eq!(model.is_touched(), Some(false));

    model.set("name", "second").unwrap();
    assert_eq!(model.is_touched(), Some(true));
}

#[test]
#[serial]
fn test_invalid_configuration_keeps_the_previous_one() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[tracking]\nenabled = \"often\"\n").unwrap();

    let before = current_config();
    assert!(amodel::init(Some(file.path())).is_err());
    assert_eq!(*current_config(), *before);
}
