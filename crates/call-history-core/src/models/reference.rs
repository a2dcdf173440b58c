//! Row identities.
//!
//! A `Reference` names a row of the calls list without holding its view
//! model. Display layers key their list diffing by it, so equality must stay
//! stable while the same underlying calls are reloaded.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::call_record::{CallRecord, CallRecordId};

/// A call link that has never been used for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpcomingCallLinkReference {
    pub call_link_row_id: i64,
}

impl UpcomingCallLinkReference {
    pub fn new(call_link_row_id: i64) -> Self {
        Self { call_link_row_id }
    }
}

/// One or more coalesced call records, newest first.
///
/// Identity is the oldest contained record: splicing a newer call into the
/// row keeps it equal to what it was, while dropping its oldest call makes it
/// a different row.
#[derive(Debug, Clone)]
pub struct CallHistoryItemReference {
    call_record_ids: Arc<[CallRecordId]>,
    call_link_row_id: Option<i64>,
}

impl CallHistoryItemReference {
    /// Panics if `call_record_ids` is empty.
    pub fn new(call_record_ids: Vec<CallRecordId>) -> Self {
        assert!(
            !call_record_ids.is_empty(),
            "CallHistoryItemReference must contain at least one call record"
        );
        let call_link_row_id = call_record_ids[0].conversation_id.call_link_row_id();
        Self {
            call_record_ids: call_record_ids.into(),
            call_link_row_id,
        }
    }

    /// `records` must be non-empty and ordered newest first.
    pub fn from_records(records: &[CallRecord]) -> Self {
        Self::new(records.iter().map(|record| record.id).collect())
    }

    pub fn call_record_ids(&self) -> &[CallRecordId] {
        &self.call_record_ids
    }

    pub fn newest_id(&self) -> CallRecordId {
        self.call_record_ids[0]
    }

    pub fn oldest_id(&self) -> CallRecordId {
        self.call_record_ids[self.call_record_ids.len() - 1]
    }

    pub fn call_link_row_id(&self) -> Option<i64> {
        self.call_link_row_id
    }

    pub fn len(&self) -> usize {
        self.call_record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.call_record_ids.is_empty()
    }

    pub fn contains(&self, id: &CallRecordId) -> bool {
        self.call_record_ids.contains(id)
    }

    /// The same row minus `ids`, or `None` if nothing would remain.
    pub(crate) fn without(&self, ids: &HashSet<CallRecordId>) -> Option<Self> {
        let remaining: Vec<CallRecordId> = self
            .call_record_ids
            .iter()
            .filter(|id| !ids.contains(id))
            .copied()
            .collect();

        if remaining.is_empty() {
            None
        } else {
            Some(Self::new(remaining))
        }
    }

    /// A row with `newer` (newest first) placed ahead of the current calls.
    pub(crate) fn prepending(&self, newer: &[CallRecordId]) -> Self {
        let mut ids = Vec::with_capacity(newer.len() + self.len());
        ids.extend_from_slice(newer);
        ids.extend_from_slice(&self.call_record_ids);
        Self::new(ids)
    }
}

impl PartialEq for CallHistoryItemReference {
    fn eq(&self, other: &Self) -> bool {
        self.oldest_id() == other.oldest_id()
    }
}

impl Eq for CallHistoryItemReference {}

impl Hash for CallHistoryItemReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.oldest_id().hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    UpcomingCallLink(UpcomingCallLinkReference),
    CallHistoryItem(CallHistoryItemReference),
}

impl Reference {
    pub fn call_link_row_id(&self) -> Option<i64> {
        match self {
            Reference::UpcomingCallLink(link) => Some(link.call_link_row_id),
            Reference::CallHistoryItem(item) => item.call_link_row_id(),
        }
    }

    pub fn as_call_history_item(&self) -> Option<&CallHistoryItemReference> {
        match self {
            Reference::CallHistoryItem(item) => Some(item),
            Reference::UpcomingCallLink(_) => None,
        }
    }

    /// True if this row shows any of `ids`.
    pub fn contains_any(&self, ids: &HashSet<CallRecordId>) -> bool {
        self.as_call_history_item()
            .is_some_and(|item| item.call_record_ids().iter().any(|id| ids.contains(id)))
    }
}

impl From<UpcomingCallLinkReference> for Reference {
    fn from(reference: UpcomingCallLinkReference) -> Self {
        Reference::UpcomingCallLink(reference)
    }
}

impl From<CallHistoryItemReference> for Reference {
    fn from(reference: CallHistoryItemReference) -> Self {
        Reference::CallHistoryItem(reference)
    }
}
