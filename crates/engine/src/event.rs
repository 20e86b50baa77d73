use crate::model::Model;
use crate::value::Value;
use amodel_domain::EventKind;
use amodel_event_bus::EventBus;

/// Listener registry carried by every class and every instance.
pub type ModelEvents = EventBus<EventKind, EventPayload>;

/// What a listener receives.
///
/// `prop`, `value` and `old_value` are filled for property events; `value` is
/// `None` for deletions and `old_value` is `None` when the field held nothing.
#[derive(Debug, Clone)]
pub struct EventPayload {
    pub kind: EventKind,
    pub target: Model,
    pub prop: Option<String>,
    pub value: Option<Value>,
    pub old_value: Option<Value>,
}

impl EventPayload {
    #[must_use]
    pub fn new(kind: EventKind, target: &Model) -> Self {
        Self { kind, target: target.clone(), prop: None, value: None, old_value: None }
    }

    #[must_use]
    pub fn prop(
        kind: EventKind,
        target: &Model,
        prop: &str,
        value: Option<Value>,
        old_value: Option<Value>,
    ) -> Self {
        Self { kind, target: target.clone(), prop: Some(prop.to_owned()), value, old_value }
    }

    /// Whether the payload concerns `prop`.
    #[must_use]
    pub fn is_for(&self, prop: &str) -> bool {
        self.prop.as_deref() == Some(prop)
    }
}
