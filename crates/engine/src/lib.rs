//! # Active Model Engine
//!
//! Dynamic models whose fields are governed by per-class metadata.
//!
//! * [`ModelClass`] holds the field policies (fillable, protected, readonly, hidden,
//!   required), the behaviors (getters, setters, validators, defaults, factories) and
//!   class-level listeners. Subclasses inherit all of it.
//! * [`Model`] is the single handle of an instance. Every access goes through its
//!   enforced accessors: [`Model::get`], [`Model::set`], [`Model::delete`],
//!   [`Model::keys`] and [`Model::has`].
//! * The creation pipeline ([`ModelClass::create`] and friends) sanitizes input, applies
//!   defaults and fills only legitimate fields.
//! * The [`tracker`] keeps initial snapshots outside the models and answers whether an
//!   instance was touched since.
//!
//! ## Usage
//! ```rust
//! use amodel_engine::{FieldDescriptor, ModelClass, Value};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), amodel_engine::ModelError> {
//! let car = ModelClass::new("DocCar");
//! car.field("driver", FieldDescriptor::new().fillable().attribute("Ivan"))?;
//! car.field("chassis", FieldDescriptor::new().fillable())?;
//!
//! let model = car.create(json!({ "chassis": "Porsche" }))?;
//! assert_eq!(model.get("driver"), Some(Value::from("Ivan")));
//! assert_eq!(model.to_json(), json!({ "chassis": "Porsche", "driver": "Ivan" }));
//! # Ok(())
//! # }
//! ```

mod class;
mod config;
mod creation;
mod descriptor;
mod error;
mod event;
mod intercept;
mod mapper;
mod model;
mod registry;
mod serializer;
pub mod tracker;
mod typed;
mod value;

pub use amodel_domain::{CreationScopeMode, EngineConfig, EventKind, FieldFlags, PropEvent};
pub use amodel_event_bus::Subscription;
pub use class::{ClassId, ModelClass};
pub use config::{configure, current as current_config};
pub use creation::CreateOptions;
pub use descriptor::{FactoryConfig, FieldDescriptor};
pub use error::{ModelError, ModelErrorExt};
pub use event::{EventPayload, ModelEvents};
pub use mapper::{MapHandler, MapTarget};
pub use model::{InstanceId, Model};
pub use registry::{AttributeDefault, FactoryBinding, Getter, Policies, Setter, Validator};
pub use typed::{ActiveModel, FromValue};
pub use value::{Object, Opaque, Value};
