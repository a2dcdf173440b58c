use serde::{Deserialize, Serialize};
use std::fmt;

/// The conversation a call happened in.
///
/// Thread conversations are backed by a persistent chat thread; call-link
/// conversations are ad-hoc rooms addressed by the call link's row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "rowId", rename_all = "camelCase")]
pub enum ConversationId {
    Thread(i64),
    CallLink(i64),
}

impl ConversationId {
    pub fn is_call_link(&self) -> bool {
        matches!(self, ConversationId::CallLink(_))
    }

    pub fn call_link_row_id(&self) -> Option<i64> {
        match self {
            ConversationId::CallLink(row_id) => Some(*row_id),
            ConversationId::Thread(_) => None,
        }
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationId::Thread(row_id) => write!(f, "thread:{}", row_id),
            ConversationId::CallLink(row_id) => write!(f, "call-link:{}", row_id),
        }
    }
}

/// Identifies a call record: a call id is only unique within its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecordId {
    pub conversation_id: ConversationId,
    pub call_id: u64,
}

impl CallRecordId {
    pub fn new(conversation_id: ConversationId, call_id: u64) -> Self {
        Self {
            conversation_id,
            call_id,
        }
    }
}

impl fmt::Display for CallRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.conversation_id, self.call_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallDirection {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallKind {
    Audio,
    Video,
    Group,
    AdHoc,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Group => "group",
            Self::AdHoc => "ad_hoc",
        }
    }
}

/// Outcome of a call. Individual, group and call-link calls each use a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallStatus {
    // Individual calls
    Pending,
    Accepted,
    NotAccepted,
    IncomingMissed,
    // Group calls
    Generic,
    Joined,
    Ringing,
    RingingAccepted,
    RingingDeclined,
    RingingMissed,
    RingingMissedNotificationProfile,
}

impl CallStatus {
    pub fn is_missed(self) -> bool {
        matches!(
            self,
            Self::IncomingMissed | Self::RingingMissed | Self::RingingMissedNotificationProfile
        )
    }
}

/// One call attempt, as read from the store. Never mutated by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: CallRecordId,
    /// Unix milliseconds when the call began.
    pub started_at: u64,
    pub direction: CallDirection,
    pub kind: CallKind,
    pub status: CallStatus,
}

impl CallRecord {
    pub fn conversation_id(&self) -> ConversationId {
        self.id.conversation_id
    }

    pub fn call_link_row_id(&self) -> Option<i64> {
        self.id.conversation_id.call_link_row_id()
    }

    pub fn is_missed(&self) -> bool {
        self.status.is_missed()
    }

    pub fn position(&self) -> RecordPosition {
        RecordPosition {
            started_at: self.started_at,
            id: self.id,
        }
    }
}

/// Where a record sits in the canonical order: by start time, then by id.
///
/// Display order is descending, so "older" means a smaller position. Page
/// boundaries are positions rather than timestamps so records that share a
/// start time are neither skipped nor loaded twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPosition {
    pub started_at: u64,
    pub id: CallRecordId,
}
