//! One page of call history, split into request, fetch and result so the
//! store read can run away from the thread that owns the loader.

use std::sync::Arc;

use tracing::debug;

use crate::coalescing::{group_newer, group_older, CallRecordGroup};
use crate::error::{LoaderError, LoaderResult, StoreError};
use crate::models::{CallRecord, CallRecordId, RecordPosition};
use crate::store::{CallRecordQuery, CallRecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadDirection {
    Older,
    Newer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// Coalesce up to `max_groups` rows strictly older than `before`.
    Older {
        before: Option<RecordPosition>,
        max_groups: usize,
        max_group_size: usize,
    },
    /// Every record strictly newer than `after`. `splice_into` is the oldest
    /// record of the newest loaded row, which a new record may join.
    Newer {
        after: RecordPosition,
        splice_into: Option<CallRecordId>,
    },
}

/// A store read captured by `CallHistoryLoader::begin_load`.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub generation: u64,
    pub direction: LoadDirection,
    pub kind: PageKind,
    pub query: CallRecordQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContents {
    Older(Vec<CallRecordGroup>),
    Newer {
        /// Newest first.
        records: Vec<CallRecord>,
        /// The current record for `PageKind::Newer::splice_into`, `None` if it
        /// was deleted meanwhile.
        splice_into: Option<CallRecord>,
    },
}

/// The result of a `PageRequest`, ready for `CallHistoryLoader::apply_page`.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub generation: u64,
    pub direction: LoadDirection,
    pub contents: PageContents,
}

impl FetchedPage {
    pub fn is_empty(&self) -> bool {
        match &self.contents {
            PageContents::Older(groups) => groups.is_empty(),
            PageContents::Newer { records, .. } => records.is_empty(),
        }
    }
}

impl PageRequest {
    /// Read the page from `store`. Touches nothing but the store.
    pub fn fetch<S>(&self, store: &S) -> Result<FetchedPage, StoreError>
    where
        S: CallRecordStore + ?Sized,
    {
        let contents = match &self.kind {
            PageKind::Older {
                before,
                max_groups,
                max_group_size,
            } => {
                let cursor = store.fetch_older(&self.query, before.as_ref())?;
                PageContents::Older(group_older(cursor, *max_groups, *max_group_size)?)
            }
            PageKind::Newer { after, splice_into } => {
                let records = group_newer(store.fetch_newer(&self.query, after)?)?;
                let splice_into = match splice_into {
                    Some(id) if !records.is_empty() => store.fetch_by_id(id)?,
                    _ => None,
                };
                PageContents::Newer {
                    records,
                    splice_into,
                }
            }
        };

        let page = FetchedPage {
            generation: self.generation,
            direction: self.direction,
            contents,
        };
        debug!(
            "Fetched {:?} page (generation {}, empty: {})",
            self.direction,
            self.generation,
            page.is_empty()
        );
        Ok(page)
    }
}

/// Run `request` on tokio's blocking pool.
pub async fn fetch_page_on_worker<S>(store: Arc<S>, request: PageRequest) -> LoaderResult<FetchedPage>
where
    S: CallRecordStore + Send + Sync + 'static,
{
    let page = tokio::task::spawn_blocking(move || request.fetch(store.as_ref()))
        .await
        .map_err(|e| LoaderError::Worker(e.to_string()))??;
    Ok(page)
}
