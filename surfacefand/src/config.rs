//! Configuration loading for the daemon
//!
//! The static configuration is read once at startup. A missing file is not
//! an error: the daemon runs on defaults.

use std::path::Path;
use surfacefan_core::{ConfigError, StaticConfig};
use tokio::fs;
use tracing::info;

/// Load the static config from `path`, falling back to defaults if missing
pub(crate) async fn load_static_config(path: &Path) -> Result<StaticConfig, ConfigError> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        info!(
            "Static config not found at {}. Using defaults.",
            path.display()
        );
        return Ok(StaticConfig::default());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    StaticConfig::from_toml(&content)
}
