//! Configuration management

use crate::error::Result;
use crate::types::Config;
use std::path::Path;
use tokio::fs;

/// Load configuration from a JSON file, falling back to defaults.
///
/// Missing keys take their default value; a missing file means all defaults.
pub async fn load_config(path: &Path) -> Result<Config> {
    if !fs::try_exists(path).await? {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).await?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub async fn save_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        crate::utils::paths::ensure_dir(parent).await?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).await?;
    Ok(())
}
