use serde::{Deserialize, Serialize};

/// Enough about a call link to render a row for it before any call has
/// happened on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLinkSummary {
    pub row_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Unix milliseconds when the link was created.
    pub created_at: u64,
}
