use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_GROUP_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_UPCOMING_CALL_LINK_LIMIT,
};
use crate::error::{LoaderError, LoaderResult};

/// Paging and coalescing limits for a `CallHistoryLoader`.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides:
///
/// ```json
/// { "pageSize": 25 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderConfig {
    /// Rows loaded per `load_more(Older)` and rows built per cache page.
    pub page_size: usize,
    /// Most call records a single row may coalesce.
    pub max_group_size: usize,
    /// Most never-used call links shown above the call history.
    pub upcoming_call_link_limit: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            upcoming_call_link_limit: DEFAULT_UPCOMING_CALL_LINK_LIMIT,
        }
    }
}

impl LoaderConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_group_size(mut self, max_group_size: usize) -> Self {
        self.max_group_size = max_group_size;
        self
    }

    /// Load and validate a config from a JSON file.
    pub fn load(path: &Path) -> LoaderResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| LoaderError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LoaderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LoaderResult<()> {
        if self.page_size == 0 {
            return Err(LoaderError::InvalidConfig("pageSize must be at least 1".into()));
        }
        if self.max_group_size == 0 {
            return Err(LoaderError::InvalidConfig(
                "maxGroupSize must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
