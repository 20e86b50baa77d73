//! # Domain Types
//!
//! Plain data shared by every crate of the active model engine: lifecycle event
//! kinds, field policy flags and the engine configuration tree.
//! No behavior lives here beyond small conversions.

pub mod config;
pub mod events;
pub mod flags;

pub use config::{CreationConfig, CreationScopeMode, EngineConfig, TrackingConfig};
pub use events::{EventKind, PropEvent};
pub use flags::FieldFlags;
