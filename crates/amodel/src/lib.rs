//! Facade crate for the active model engine.
//! Re-exports the engine API, the declaration macros and the shared domain types.
//! Keep this crate thin: it should compose other crates, not implement engine logic.
//!
//! ## Usage
//! - Declare models with [`active_model`] or build classes by hand with [`ModelClass`].
//! - Call [`init`] once at startup to load and apply the engine configuration.
//!
//! ```rust
//! use amodel::prelude::*;
//!
//! #[active_model]
//! pub struct Car {
//!     #[field(fillable, attribute = "Ivan")]
//!     driver: String,
//!     #[field(fillable)]
//!     chassis: String,
//! }
//!
//! # fn main() -> Result<(), ModelError> {
//! let car = Car::create(serde_json::json!({ "chassis": "Porsche" }))?;
//! assert_eq!(car.driver().as_deref(), Some("Ivan"));
//! assert_eq!(car.chassis().as_deref(), Some("Porsche"));
//! # Ok(())
//! # }
//! ```

pub use amodel_derive::{active_model, model_error};
pub use amodel_domain as domain;
pub use amodel_engine::*;
#[cfg(all(feature = "kernel", not(target_arch = "wasm32")))]
pub use amodel_kernel as kernel;

/// Everything a model declaration needs.
pub mod prelude {
    pub use crate::{
        ActiveModel, CreateOptions, EventKind, EventPayload, FactoryConfig, FieldDescriptor,
        FromValue, Model, ModelClass, ModelError, Object, PropEvent, Validator, Value,
        active_model,
    };
}

/// Loads the engine configuration (file plus `AMODEL__*` overrides) and applies it.
///
/// Returns the configuration now in effect.
///
/// # Errors
/// Returns [`kernel::config::ConfigError`] if the file or the overrides are invalid;
/// the previous configuration then stays in effect.
#[cfg(all(feature = "kernel", not(target_arch = "wasm32")))]
pub fn init(
    path: Option<impl AsRef<std::path::Path>>,
) -> Result<std::sync::Arc<EngineConfig>, kernel::config::ConfigError> {
    let config = kernel::config::load_engine_config(path)?;
    tracing::info!(
        scope = ?config.creation.scope,
        sanitize = config.creation.sanitize,
        tracking = config.tracking.enabled,
        "Engine configured"
    );
    configure(config);
    Ok(current_config())
}
