use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use call_history_core::models::{
    CallDirection, CallKind, CallLinkSummary, CallRecord, CallRecordId, CallStatus,
    ConversationId, DefaultViewModelBuilder,
};
use call_history_core::MemoryCallRecordStore;
use serde::{Deserialize, Serialize};

/// A call as written in a fixture file. Exactly one of `thread` and
/// `callLink` names the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureCall {
    pub call_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_link: Option<i64>,
    /// Unix milliseconds
    pub started_at: u64,
    pub direction: CallDirection,
    #[serde(default = "default_kind")]
    pub kind: CallKind,
    pub status: CallStatus,
}

fn default_kind() -> CallKind {
    CallKind::Audio
}

impl FixtureCall {
    pub fn to_record(&self) -> Result<CallRecord> {
        let conversation_id = match (self.thread, self.call_link) {
            (Some(thread), None) => ConversationId::Thread(thread),
            (None, Some(call_link)) => ConversationId::CallLink(call_link),
            _ => bail!(
                "Call {} must name exactly one of thread and callLink",
                self.call_id
            ),
        };
        Ok(CallRecord {
            id: CallRecordId::new(conversation_id, self.call_id),
            started_at: self.started_at,
            direction: self.direction,
            kind: self.kind,
            status: self.status,
        })
    }
}

/// A call history loaded from JSON, standing in for a real database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fixture {
    pub calls: Vec<FixtureCall>,
    pub call_links: Vec<CallLinkSummary>,
    pub thread_titles: HashMap<i64, String>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse fixture file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize fixture")
    }

    pub fn records(&self) -> Result<Vec<CallRecord>> {
        self.calls.iter().map(FixtureCall::to_record).collect()
    }

    pub fn into_store(self) -> Result<(MemoryCallRecordStore, DefaultViewModelBuilder)> {
        let store = MemoryCallRecordStore::with_records(self.records()?);
        for call_link in self.call_links {
            store.upsert_call_link(call_link);
        }
        Ok((store, DefaultViewModelBuilder::new(self.thread_titles)))
    }
}
