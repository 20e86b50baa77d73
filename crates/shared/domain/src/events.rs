use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Lifecycle events emitted by models.
///
/// String forms follow the camelCase names used by hook maps
/// (`"beforeSetValue"`, `"nulling"`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum EventKind {
    /// A declared field changed outside of construction.
    Touched,
    /// Construction finished.
    Created,
    BeforeSetValue,
    AfterSetValue,
    BeforeDeletingAttribute,
    /// A non-null field value was replaced by null.
    Nulling,
}

impl EventKind {
    /// Whether payloads of this kind carry a property name.
    #[must_use]
    pub const fn is_prop_event(self) -> bool {
        !matches!(self, Self::Touched | Self::Created)
    }
}

/// The subset of [`EventKind`] that can be attached to a single field.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PropEvent {
    BeforeSetValue,
    AfterSetValue,
    BeforeDeletingAttribute,
    Nulling,
}

impl From<PropEvent> for EventKind {
    fn from(event: PropEvent) -> Self {
        match event {
            PropEvent::BeforeSetValue => Self::BeforeSetValue,
            PropEvent::AfterSetValue => Self::AfterSetValue,
            PropEvent::BeforeDeletingAttribute => Self::BeforeDeletingAttribute,
            PropEvent::Nulling => Self::Nulling,
        }
    }
}

impl TryFrom<EventKind> for PropEvent {
    type Error = EventKind;

    fn try_from(kind: EventKind) -> Result<Self, Self::Error> {
        match kind {
            EventKind::BeforeSetValue => Ok(Self::BeforeSetValue),
            EventKind::AfterSetValue => Ok(Self::AfterSetValue),
            EventKind::BeforeDeletingAttribute => Ok(Self::BeforeDeletingAttribute),
            EventKind::Nulling => Ok(Self::Nulling),
            other => Err(other),
        }
    }
}
