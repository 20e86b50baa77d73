use amodel_domain::EngineConfig;
use parking_lot::RwLock;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static CONFIG: LazyLock<RwLock<Arc<EngineConfig>>> =
    LazyLock::new(|| RwLock::new(Arc::new(EngineConfig::default())));

/// Installs `config` process-wide. Models created afterwards follow it.
pub fn configure(config: EngineConfig) {
    debug!(?config, "Engine configured");
    *CONFIG.write() = Arc::new(config);
}

/// The configuration currently in effect.
#[must_use]
pub fn current() -> Arc<EngineConfig> {
    CONFIG.read().clone()
}
