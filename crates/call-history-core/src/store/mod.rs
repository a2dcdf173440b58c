//! The call record store the loader reads from.
//!
//! Persistence is not this crate's concern: a store is anything that can
//! answer the four queries below with the documented ordering.
//! `MemoryCallRecordStore` is a complete in-process implementation.

pub mod memory;
pub mod query;

pub use memory::MemoryCallRecordStore;
pub use query::CallRecordQuery;

use crate::error::StoreError;
use crate::models::{CallLinkSummary, CallRecord, CallRecordId, RecordPosition};

/// Lazily yields call records. A record-level error ends the page.
pub type CallRecordCursor<'a> = Box<dyn Iterator<Item = Result<CallRecord, StoreError>> + 'a>;

pub trait CallRecordStore {
    /// Records matching `query` strictly older than `before` (all of them if
    /// `None`), newest first.
    fn fetch_older(
        &self,
        query: &CallRecordQuery,
        before: Option<&RecordPosition>,
    ) -> Result<CallRecordCursor<'_>, StoreError>;

    /// Records matching `query` strictly newer than `after`, oldest first.
    fn fetch_newer(
        &self,
        query: &CallRecordQuery,
        after: &RecordPosition,
    ) -> Result<CallRecordCursor<'_>, StoreError>;

    /// `Ok(None)` if the record was deleted since its id was captured.
    fn fetch_by_id(&self, id: &CallRecordId) -> Result<Option<CallRecord>, StoreError>;

    /// Call links that have never been used for a call, newest first.
    fn fetch_upcoming_call_links(&self, limit: usize) -> Result<Vec<CallLinkSummary>, StoreError>;
}
