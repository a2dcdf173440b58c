use std::path::PathBuf;

/// Failures reported by a `CallRecordStore`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Call record store unavailable: {0}")]
    Unavailable(String),

    #[error("Call record store returned corrupt data: {0}")]
    Corrupt(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid loader config: {0}")]
    InvalidConfig(String),

    #[error("Failed to read loader config {}: {source}", .path.display())]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse loader config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("Page fetch worker failed: {0}")]
    Worker(String),
}

impl LoaderError {
    /// True when the failure came from the store and a later retry may succeed.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, LoaderError::Store(StoreError::Unavailable(_)))
    }
}

pub type LoaderResult<T> = Result<T, LoaderError>;
