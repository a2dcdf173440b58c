//! Fixtures shared by the unit tests.

use parking_lot::Mutex;

use crate::constants::COALESCING_WINDOW_MS;
use crate::error::StoreError;
use crate::models::{
    CallDirection, CallKind, CallLinkSummary, CallRecord, CallRecordId, CallStatus,
    ConversationId, RecordPosition, ViewModelBuilder,
};
use crate::store::{CallRecordCursor, CallRecordQuery, CallRecordStore, MemoryCallRecordStore};

pub const MINUTE_MS: u64 = 60 * 1000;
pub const HOUR_MS: u64 = 60 * MINUTE_MS;

pub fn call_with(
    call_id: u64,
    started_at: u64,
    conversation_id: ConversationId,
    direction: CallDirection,
    status: CallStatus,
) -> CallRecord {
    CallRecord {
        id: CallRecordId::new(conversation_id, call_id),
        started_at,
        direction,
        kind: CallKind::Audio,
        status,
    }
}

/// An answered outgoing call in thread `thread`.
pub fn call(call_id: u64, started_at: u64, thread: i64) -> CallRecord {
    call_with(
        call_id,
        started_at,
        ConversationId::Thread(thread),
        CallDirection::Outgoing,
        CallStatus::Accepted,
    )
}

pub fn call_on_link(call_id: u64, started_at: u64, call_link_row_id: i64) -> CallRecord {
    call_with(
        call_id,
        started_at,
        ConversationId::CallLink(call_link_row_id),
        CallDirection::Outgoing,
        CallStatus::Joined,
    )
}

pub fn link(row_id: i64, created_at: u64) -> CallLinkSummary {
    CallLinkSummary {
        row_id,
        name: Some(format!("Link {}", row_id)),
        created_at,
    }
}

pub fn ids_of(records: &[CallRecord]) -> Vec<u64> {
    records.iter().map(|record| record.id.call_id).collect()
}

/// Hands out descending timestamps, newest first, so fixtures read in
/// display order.
pub struct SequentialTimestamps {
    next: u64,
}

impl SequentialTimestamps {
    pub fn new() -> Self {
        Self {
            next: 1_000 * 24 * HOUR_MS,
        }
    }

    /// A minute older than the previous timestamp.
    pub fn coalescable(&mut self) -> u64 {
        self.next -= MINUTE_MS;
        self.next
    }

    /// Far enough before the previous timestamp that nothing coalesces across it.
    pub fn uncoalescable(&mut self) -> u64 {
        self.next -= COALESCING_WINDOW_MS + HOUR_MS;
        self.next
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestViewModel {
    pub call_ids: Vec<u64>,
    pub call_link_row_id: Option<i64>,
}

pub struct TestViewModelBuilder;

impl ViewModelBuilder for TestViewModelBuilder {
    type ViewModel = TestViewModel;

    fn call_history_item(&self, records: &[CallRecord]) -> TestViewModel {
        TestViewModel {
            call_ids: ids_of(records),
            call_link_row_id: records[0].call_link_row_id(),
        }
    }

    fn upcoming_call_link(&self, call_link: &CallLinkSummary) -> TestViewModel {
        TestViewModel {
            call_ids: Vec::new(),
            call_link_row_id: Some(call_link.row_id),
        }
    }
}

/// Wraps a memory store and records every point lookup.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryCallRecordStore,
    fetched: Mutex<Vec<u64>>,
}

impl CountingStore {
    pub fn with_records(records: impl IntoIterator<Item = CallRecord>) -> Self {
        Self {
            inner: MemoryCallRecordStore::with_records(records),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Call ids looked up since the last call.
    pub fn take_fetched(&self) -> Vec<u64> {
        std::mem::take(&mut *self.fetched.lock())
    }
}

impl CallRecordStore for CountingStore {
    fn fetch_older(
        &self,
        query: &CallRecordQuery,
        before: Option<&RecordPosition>,
    ) -> Result<CallRecordCursor<'_>, StoreError> {
        self.inner.fetch_older(query, before)
    }

    fn fetch_newer(
        &self,
        query: &CallRecordQuery,
        after: &RecordPosition,
    ) -> Result<CallRecordCursor<'_>, StoreError> {
        self.inner.fetch_newer(query, after)
    }

    fn fetch_by_id(&self, id: &CallRecordId) -> Result<Option<CallRecord>, StoreError> {
        self.fetched.lock().push(id.call_id);
        self.inner.fetch_by_id(id)
    }

    fn fetch_upcoming_call_links(&self, limit: usize) -> Result<Vec<CallLinkSummary>, StoreError> {
        self.inner.fetch_upcoming_call_links(limit)
    }
}
