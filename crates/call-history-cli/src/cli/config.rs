use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use call_history_core::LoaderConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Fixture used when `--fixture` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture: Option<PathBuf>,

    /// Paging limits for the loader
    #[serde(default)]
    pub loader: LoaderConfig,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: CliConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .loader
            .validate()
            .with_context(|| format!("Invalid loader settings in {}", path.display()))?;
        Ok(config)
    }
}
