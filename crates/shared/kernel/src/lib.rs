//! Kernel utilities shared by the engine's binaries.
//! Keep this crate lightweight: it loads configuration and re-exports the domain types.
//!
//! ## Config loading (non-wasm)
//! ```rust,no_run
//! use amodel_kernel::config::load_engine_config;
//!
//! let cfg = load_engine_config(Some("config/amodel.toml")).unwrap_or_default();
//! assert!(cfg.creation.sanitize);
//! ```
#[cfg(not(target_arch = "wasm32"))]
pub mod config;

pub use amodel_domain as domain;
