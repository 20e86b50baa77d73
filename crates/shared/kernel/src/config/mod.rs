use amodel_domain::EngineConfig;
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides (`AMODEL__CREATION__SCOPE=flag`).
pub const ENV_PREFIX: &str = "AMODEL";

/// File looked up when no path is given; its extension is optional.
pub const DEFAULT_CONFIG_FILE: &str = "amodel";

/// Custom error type for config loading.
#[amodel_derive::model_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration by layering a file with environment overrides.
///
/// 1. **Base File**: an explicit `path` must exist. Without one, the `amodel` file in the
///    working directory is used if present.
/// 2. **Environment Overrides**: variables prefixed with `AMODEL__`; nested keys are
///    separated by double underscores (`AMODEL__TRACKING__ENABLED` maps to `tracking.enabled`).
///
/// # Errors
/// * An explicit file is missing or unreadable.
/// * The merged settings do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use amodel_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct ShellConfig {
///     verbose: bool,
/// }
///
/// let cfg: ShellConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load(path.as_ref().map(AsRef::<Path>::as_ref), None)
}

/// Like [`load_config`], reading overrides from `vars` instead of the process environment.
///
/// Keys use the same `AMODEL__SECTION__KEY` form.
///
/// # Errors
/// See [`load_config`].
pub fn load_config_with_env<T>(
    path: Option<impl AsRef<Path>>,
    vars: HashMap<String, String>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load(path.as_ref().map(AsRef::<Path>::as_ref), Some(vars))
}

/// Loads the engine section tree; every key is optional.
///
/// # Errors
/// See [`load_config`].
pub fn load_engine_config(path: Option<impl AsRef<Path>>) -> Result<EngineConfig, ConfigError> {
    load_config(path)
}

fn load<T>(path: Option<&Path>, vars: Option<HashMap<String, String>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let (effective_path, required) = path.map_or_else(
        || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        |p| (p.to_path_buf(), true),
    );

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake)
                .source(vars),
        );

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
