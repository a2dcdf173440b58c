use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{CallRecord, ConversationId};

/// Which call records a loader shows.
///
/// Stores apply the query to every fetch; the loader only uses it to decide
/// whether upcoming call links belong in the list at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallRecordQuery {
    pub only_missed: bool,
    /// Restrict to these conversations, e.g. the matches of a search term.
    pub only_conversations: Option<BTreeSet<ConversationId>>,
}

impl CallRecordQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn missed() -> Self {
        Self {
            only_missed: true,
            only_conversations: None,
        }
    }

    pub fn in_conversations(conversations: impl IntoIterator<Item = ConversationId>) -> Self {
        Self {
            only_missed: false,
            only_conversations: Some(conversations.into_iter().collect()),
        }
    }

    /// Upcoming call links are only listed when nothing is filtered out.
    pub fn is_unfiltered(&self) -> bool {
        !self.only_missed && self.only_conversations.is_none()
    }

    pub fn matches(&self, record: &CallRecord) -> bool {
        if self.only_missed && !record.is_missed() {
            return false;
        }
        match &self.only_conversations {
            Some(conversations) => conversations.contains(&record.conversation_id()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallDirection, CallKind, CallRecordId, CallStatus};

    fn record(thread: i64, status: CallStatus) -> CallRecord {
        CallRecord {
            id: CallRecordId::new(ConversationId::Thread(thread), 1),
            started_at: 1_000,
            direction: CallDirection::Incoming,
            kind: CallKind::Audio,
            status,
        }
    }

    #[test]
    fn test_missed_filter() {
        let query = CallRecordQuery::missed();
        assert!(query.matches(&record(1, CallStatus::IncomingMissed)));
        assert!(!query.matches(&record(1, CallStatus::Accepted)));
        assert!(!query.is_unfiltered());
    }

    #[test]
    fn test_conversation_filter() {
        let query = CallRecordQuery::in_conversations([ConversationId::Thread(2)]);
        assert!(query.matches(&record(2, CallStatus::Accepted)));
        assert!(!query.matches(&record(3, CallStatus::Accepted)));
    }

    #[test]
    fn test_default_matches_everything() {
        let query = CallRecordQuery::all();
        assert!(query.is_unfiltered());
        assert!(query.matches(&record(9, CallStatus::Pending)));
    }
}
