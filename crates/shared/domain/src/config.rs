use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
///
/// Every section falls back to its defaults, so an empty file is a valid config.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub creation: CreationConfig,
    pub tracking: TrackingConfig,
}

/// Construction pipeline settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationConfig {
    /// How the "construction in progress" signal behaves for nested construction.
    pub scope: CreationScopeMode,
    /// Deep-clone caller input before filling a model.
    pub sanitize: bool,
}

/// Semantics of the construction signal.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreationScopeMode {
    /// Nesting-aware counter: construction ends when the outermost scope ends.
    #[default]
    Depth,
    /// Legacy single boolean: any nested scope ending clears the signal.
    Flag,
}

/// Change tracking settings.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Track every created model unless the caller opts out.
    pub enabled: bool,
}

// --- Default ---

impl Default for CreationConfig {
    fn default() -> Self {
        Self { scope: CreationScopeMode::Depth, sanitize: true }
    }
}
