use amodel_domain::events::{EventKind, PropEvent};
use amodel_domain::flags::FieldFlags;
use std::str::FromStr;
use strum::IntoEnumIterator;

#[test]
fn event_names_match_hook_keys() {
    let names: Vec<String> = EventKind::iter().map(|kind| kind.to_string()).collect();
    assert_eq!(
        names,
        [
            "touched",
            "created",
            "beforeSetValue",
            "afterSetValue",
            "beforeDeletingAttribute",
            "nulling"
        ]
    );
    assert_eq!(EventKind::from_str("beforeDeletingAttribute"), Ok(EventKind::BeforeDeletingAttribute));
}

#[test]
fn prop_events_exclude_lifecycle_kinds() {
    for event in PropEvent::iter() {
        assert!(EventKind::from(event).is_prop_event());
    }
    assert!(PropEvent::try_from(EventKind::Touched).is_err());
    assert!(PropEvent::try_from(EventKind::Created).is_err());
    assert_eq!(PropEvent::try_from(EventKind::Nulling), Ok(PropEvent::Nulling));
}

#[test]
fn field_flags_parse_and_roundtrip_as_bits() {
    assert_eq!(FieldFlags::from("hidden"), FieldFlags::HIDDEN);
    assert_eq!(FieldFlags::from("unknown"), FieldFlags::empty());

    let flags = FieldFlags::FILLABLE | FieldFlags::READONLY;
    let encoded = serde_json::to_value(flags).expect("serialize flags");
    assert_eq!(encoded, serde_json::json!(9));
    let decoded: FieldFlags = serde_json::from_value(encoded).expect("deserialize flags");
    assert_eq!(decoded, flags);
}
