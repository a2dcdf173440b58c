use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use parking_lot::RwLock;

use super::{CallRecordCursor, CallRecordQuery, CallRecordStore};
use crate::error::StoreError;
use crate::models::{CallLinkSummary, CallRecord, CallRecordId, RecordPosition};

/// In-memory call record store.
///
/// Rows sit behind a `RwLock` so the store can be shared with worker tasks
/// and mutated while a loader reads from it. Cursors iterate a snapshot taken
/// when the fetch was issued.
#[derive(Debug, Default)]
pub struct MemoryCallRecordStore {
    inner: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<RecordPosition, CallRecord>,
    positions: HashMap<CallRecordId, RecordPosition>,
    call_links: BTreeMap<i64, CallLinkSummary>,
    /// Set while simulating an outage; every fetch fails with this message.
    unavailable: Option<String>,
}

impl MemoryState {
    fn check_available(&self) -> Result<(), StoreError> {
        match &self.unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn has_calls_on_link(&self, row_id: i64) -> bool {
        self.positions
            .keys()
            .any(|id| id.conversation_id.call_link_row_id() == Some(row_id))
    }
}

impl MemoryCallRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = CallRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.upsert(record);
        }
        store
    }

    /// Insert a record, replacing any record with the same id.
    pub fn upsert(&self, record: CallRecord) {
        let mut state = self.inner.write();
        if let Some(old_position) = state.positions.remove(&record.id) {
            state.records.remove(&old_position);
        }
        let position = record.position();
        state.positions.insert(record.id, position);
        state.records.insert(position, record);
    }

    pub fn delete(&self, id: &CallRecordId) -> Option<CallRecord> {
        let mut state = self.inner.write();
        let position = state.positions.remove(id)?;
        state.records.remove(&position)
    }

    pub fn upsert_call_link(&self, call_link: CallLinkSummary) {
        self.inner.write().call_links.insert(call_link.row_id, call_link);
    }

    pub fn delete_call_link(&self, row_id: i64) -> Option<CallLinkSummary> {
        self.inner.write().call_links.remove(&row_id)
    }

    /// Make every fetch fail with `StoreError::Unavailable` until cleared.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        self.inner.write().unavailable = reason.map(str::to_string);
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }
}

impl CallRecordStore for MemoryCallRecordStore {
    fn fetch_older(
        &self,
        query: &CallRecordQuery,
        before: Option<&RecordPosition>,
    ) -> Result<CallRecordCursor<'_>, StoreError> {
        let state = self.inner.read();
        state.check_available()?;

        let snapshot: Vec<CallRecord> = match before {
            Some(before) => state
                .records
                .range(..*before)
                .rev()
                .map(|(_, record)| record)
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
            None => state
                .records
                .values()
                .rev()
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
        };

        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn fetch_newer(
        &self,
        query: &CallRecordQuery,
        after: &RecordPosition,
    ) -> Result<CallRecordCursor<'_>, StoreError> {
        let state = self.inner.read();
        state.check_available()?;

        let snapshot: Vec<CallRecord> = state
            .records
            .range((Bound::Excluded(*after), Bound::Unbounded))
            .map(|(_, record)| record)
            .filter(|record| query.matches(record))
            .cloned()
            .collect();

        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn fetch_by_id(&self, id: &CallRecordId) -> Result<Option<CallRecord>, StoreError> {
        let state = self.inner.read();
        state.check_available()?;

        Ok(state
            .positions
            .get(id)
            .and_then(|position| state.records.get(position))
            .cloned())
    }

    fn fetch_upcoming_call_links(&self, limit: usize) -> Result<Vec<CallLinkSummary>, StoreError> {
        let state = self.inner.read();
        state.check_available()?;

        let mut links: Vec<CallLinkSummary> = state
            .call_links
            .values()
            .filter(|link| !state.has_calls_on_link(link.row_id))
            .cloned()
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.row_id.cmp(&a.row_id)));
        links.truncate(limit);
        Ok(links)
    }
}
