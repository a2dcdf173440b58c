//! The calls list loader.
//!
//! `CallHistoryLoader` is the only type a display layer talks to. It owns a
//! `ReferenceIndex` (which rows exist, in display order) and a
//! `ViewModelCache` (built models for rows near the viewport), pages call
//! records in from a `CallRecordStore`, and reports which rows changed when
//! the store tells it about mutations.
//!
//! The loader has a single owner and no internal locking. Store reads may run
//! elsewhere through `begin_load` / `PageRequest::fetch` / `apply_page`; only
//! the page from the most recent `begin_load` is ever applied.

pub mod page;
pub mod reference_index;
pub mod view_model_cache;

pub use page::{
    fetch_page_on_worker, FetchedPage, LoadDirection, PageContents, PageKind, PageRequest,
};
pub use reference_index::{DroppedRecords, ReferenceIndex};
pub use view_model_cache::ViewModelCache;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::coalescing::{is_valid_coalescing_anchor, CallRecordGroup};
use crate::config::LoaderConfig;
use crate::error::LoaderResult;
use crate::models::{
    CallLinkSummary, CallRecord, CallRecordId, Reference, UpcomingCallLinkReference,
    ViewModelBuilder,
};
use crate::store::{CallRecordQuery, CallRecordStore};

/// A change the store reports to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallRecordMutation {
    /// New records exist. Nothing is patched; call `load_more(Newer)`.
    Inserted(Vec<CallRecordId>),
    /// Record contents changed. Cached models are dropped but rows keep
    /// their grouping, even if a direction or missed status changed.
    Updated(Vec<CallRecordId>),
    Deleted(Vec<CallRecordId>),
    /// Call link details (name, state) changed for these call link rows.
    CallLinksUpdated(Vec<i64>),
}

/// What a load did to the row list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub did_change: bool,
    /// The page belonged to an older `begin_load` or was already applied.
    /// Nothing was changed.
    pub superseded: bool,
    /// Rows whose identity survived but whose contents changed.
    pub updated: HashSet<Reference>,
    /// Rows that no longer exist.
    pub removed: HashSet<Reference>,
}

impl LoadOutcome {
    fn superseded() -> Self {
        Self {
            superseded: true,
            ..Self::default()
        }
    }
}

pub struct CallHistoryLoader<S: ?Sized, B: ViewModelBuilder> {
    store: Arc<S>,
    builder: B,
    config: LoaderConfig,
    query: CallRecordQuery,
    references: ReferenceIndex,
    cache: ViewModelCache<B::ViewModel>,
    upcoming_call_links: HashMap<i64, CallLinkSummary>,
    generation: u64,
    /// Generation of the last `begin_load` whose page has not been applied.
    in_flight: Option<u64>,
    /// Ids deleted since `in_flight` was issued; filtered out of its page.
    deleted_in_flight: HashSet<CallRecordId>,
    integrity_changes: HashSet<Reference>,
}

impl<S, B> CallHistoryLoader<S, B>
where
    S: CallRecordStore + ?Sized,
    B: ViewModelBuilder,
{
    pub fn new(store: Arc<S>, builder: B, config: LoaderConfig) -> LoaderResult<Self> {
        Self::with_query(store, builder, config, CallRecordQuery::all())
    }

    pub fn with_query(
        store: Arc<S>,
        builder: B,
        config: LoaderConfig,
        query: CallRecordQuery,
    ) -> LoaderResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            builder,
            config,
            query,
            references: ReferenceIndex::new(),
            cache: ViewModelCache::new(),
            upcoming_call_links: HashMap::new(),
            generation: 0,
            in_flight: None,
            deleted_in_flight: HashSet::new(),
            integrity_changes: HashSet::new(),
        })
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Panics if `at` is out of bounds.
    pub fn reference(&self, at: usize) -> Reference {
        self.references.reference(at)
    }

    pub fn references(&self) -> impl Iterator<Item = Reference> + '_ {
        self.references.iter()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn query(&self) -> &CallRecordQuery {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn cached_view_model_count(&self) -> usize {
        self.cache.len()
    }

    /// The cached model for row `at`, without building anything.
    pub fn cached_view_model(&self, at: usize) -> Option<&B::ViewModel> {
        self.cache.view_model(at, &self.references)
    }

    /// The model for row `at`, building its page on a cache miss.
    ///
    /// `None` means `at` is out of bounds, or the row could not be built
    /// because the store failed.
    pub fn view_model(&mut self, at: usize) -> Option<&B::ViewModel> {
        let reference = self.references.get(at)?;
        if !self.cache.contains(&reference) {
            self.ensure_loaded(at);
        }
        self.cache.view_model(at, &self.references)
    }

    fn ensure_loaded(&mut self, at: usize) {
        loop {
            let mut dangling = HashSet::new();
            let store = &*self.store;
            let builder = &self.builder;
            let call_links = &self.upcoming_call_links;
            self.cache
                .ensure_loaded(at, self.config.page_size, &self.references, |reference| {
                    build_view_model(store, builder, call_links, reference, &mut dangling)
                });

            if dangling.is_empty() {
                return;
            }

            warn!(
                "Dropping {} call record(s) that no longer exist in the store",
                dangling.len()
            );
            let dropped = self.references.drop_records(&dangling);
            for reference in dropped.affected() {
                self.cache.remove(&reference);
                self.integrity_changes.insert(reference);
            }
        }
    }

    /// Rows removed or changed because the store no longer had some of
    /// their records while building models. Clears the set.
    pub fn drain_integrity_changes(&mut self) -> HashSet<Reference> {
        std::mem::take(&mut self.integrity_changes)
    }

    /// Load one page in `direction` on the calling thread.
    ///
    /// On error nothing but the generation counter has changed.
    pub fn load_more(&mut self, direction: LoadDirection) -> LoaderResult<LoadOutcome> {
        let request = self.begin_load(direction);
        match request.fetch(&*self.store) {
            Ok(page) => Ok(self.apply_page(page)),
            Err(e) => {
                warn!("Failed to load {:?} call records: {}", direction, e);
                Err(e.into())
            }
        }
    }

    /// Load older pages until row `index` exists or the store runs out.
    /// Returns whether the row exists.
    pub fn load_until_index(&mut self, index: usize) -> LoaderResult<bool> {
        while index >= self.references.len() {
            if !self.load_more(LoadDirection::Older)?.did_change {
                break;
            }
        }
        Ok(index < self.references.len())
    }

    /// Capture the store read for the next page and supersede any page
    /// already in flight.
    pub fn begin_load(&mut self, direction: LoadDirection) -> PageRequest {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.deleted_in_flight.clear();

        let kind = match (direction, self.references.newest_loaded()) {
            (LoadDirection::Newer, Some(after)) => PageKind::Newer {
                after,
                splice_into: self
                    .references
                    .newest_call_history_item()
                    .map(|item| item.oldest_id()),
            },
            _ => PageKind::Older {
                before: self.references.oldest_loaded(),
                max_groups: self.config.page_size,
                max_group_size: self.config.max_group_size,
            },
        };

        PageRequest {
            generation: self.generation,
            direction,
            kind,
            query: self.query.clone(),
        }
    }

    /// Apply a fetched page, unless a later `begin_load` or `reset`
    /// superseded it.
    pub fn apply_page(&mut self, page: FetchedPage) -> LoadOutcome {
        if self.in_flight != Some(page.generation) {
            debug!(
                "Discarding {:?} page from generation {} (current {})",
                page.direction, page.generation, self.generation
            );
            return LoadOutcome::superseded();
        }
        self.in_flight = None;

        let deleted = std::mem::take(&mut self.deleted_in_flight);
        let mut outcome = match page.contents {
            PageContents::Older(mut groups) => {
                if !deleted.is_empty() {
                    groups = groups
                        .into_iter()
                        .filter_map(|group| group.without(&deleted))
                        .collect();
                }
                self.apply_older(groups)
            }
            PageContents::Newer {
                mut records,
                mut splice_into,
            } => {
                records.retain(|record| !deleted.contains(&record.id));
                if splice_into
                    .as_ref()
                    .is_some_and(|target| deleted.contains(&target.id))
                {
                    splice_into = None;
                }
                self.apply_newer(records, splice_into)
            }
        };
        if outcome.did_change {
            self.prune_duplicate_call_links(&mut outcome);
        }
        outcome
    }

    fn apply_older(&mut self, groups: Vec<CallRecordGroup>) -> LoadOutcome {
        if groups.is_empty() {
            debug!("No older call records to load");
            return LoadOutcome::default();
        }

        debug!("Loaded {} older call history rows", groups.len());
        self.references.append_older(&groups);
        LoadOutcome {
            did_change: true,
            ..LoadOutcome::default()
        }
    }

    fn apply_newer(
        &mut self,
        mut records: Vec<CallRecord>,
        splice_into: Option<CallRecord>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        if records.is_empty() {
            return outcome;
        }

        let splice = match (records.last(), splice_into.as_ref()) {
            (Some(oldest_new), Some(target)) => self.can_splice(oldest_new, target),
            _ => false,
        };
        if splice {
            if let Some(oldest_new) = records.pop() {
                let group = CallRecordGroup::new(oldest_new);
                if let Some((before, after)) = self.references.splice_into_newest(&group) {
                    self.cache.remove(&Reference::from(before));
                    outcome.updated.insert(Reference::from(after));
                }
            }
        }

        debug!(
            "Loaded {} newer call record(s), spliced: {}",
            records.len() + usize::from(splice),
            splice
        );
        let groups: Vec<CallRecordGroup> = records.into_iter().map(CallRecordGroup::new).collect();
        self.references.prepend_newer(&groups);
        outcome.did_change = true;
        outcome
    }

    /// Whether `oldest_new` may join the newest row, whose oldest record
    /// is `target`.
    fn can_splice(&self, oldest_new: &CallRecord, target: &CallRecord) -> bool {
        let Some(newest) = self.references.newest_call_history_item() else {
            return false;
        };
        newest.oldest_id() == target.id
            && newest.len() < self.config.max_group_size
            && is_valid_coalescing_anchor(oldest_new, target)
    }

    fn prune_duplicate_call_links(&mut self, outcome: &mut LoadOutcome) {
        for reference in self.references.prune_duplicate_call_links() {
            if let Reference::UpcomingCallLink(link) = &reference {
                self.upcoming_call_links.remove(&link.call_link_row_id);
            }
            self.cache.remove(&reference);
            outcome.updated.remove(&reference);
            outcome.removed.insert(reference);
            outcome.did_change = true;
        }
    }

    /// Replace the upcoming call link rows from the store. Filtered queries
    /// show no upcoming call links.
    pub fn reload_upcoming_call_links(&mut self) -> LoaderResult<LoadOutcome> {
        let summaries = if self.query.is_unfiltered() {
            self.store
                .fetch_upcoming_call_links(self.config.upcoming_call_link_limit)
                .map_err(|e| {
                    warn!("Failed to load upcoming call links: {}", e);
                    e
                })?
        } else {
            Vec::new()
        };

        let links: Vec<UpcomingCallLinkReference> = summaries
            .iter()
            .map(|summary| UpcomingCallLinkReference::new(summary.row_id))
            .collect();
        let summaries: HashMap<i64, CallLinkSummary> = summaries
            .into_iter()
            .map(|summary| (summary.row_id, summary))
            .collect();

        let mut outcome = LoadOutcome::default();
        let previous = self.references.replace_upcoming_call_links(links.clone());
        for link in &previous {
            let reference = Reference::from(*link);
            self.cache.remove(&reference);
            if summaries.contains_key(&link.call_link_row_id) {
                if self.upcoming_call_links.get(&link.call_link_row_id)
                    != summaries.get(&link.call_link_row_id)
                {
                    outcome.updated.insert(reference);
                }
            } else {
                outcome.removed.insert(reference);
            }
        }
        outcome.did_change =
            previous != links || !outcome.updated.is_empty() || !outcome.removed.is_empty();
        self.upcoming_call_links = summaries;

        debug!("Loaded {} upcoming call links", links.len());
        self.prune_duplicate_call_links(&mut outcome);
        Ok(outcome)
    }

    /// Bring rows in line with a store change. Returns every row a display
    /// needs to reload or delete.
    pub fn apply_external_mutation(&mut self, mutation: CallRecordMutation) -> HashSet<Reference> {
        match mutation {
            CallRecordMutation::Inserted(ids) => {
                debug!("{} call record(s) inserted; waiting for a newer load", ids.len());
                HashSet::new()
            }
            CallRecordMutation::Updated(ids) => {
                let ids: HashSet<CallRecordId> = ids.into_iter().collect();
                self.cache.invalidate(|reference| reference.contains_any(&ids));
                self.references
                    .iter()
                    .filter(|reference| reference.contains_any(&ids))
                    .collect()
            }
            CallRecordMutation::Deleted(ids) => {
                let ids: HashSet<CallRecordId> = ids.into_iter().collect();
                if self.in_flight.is_some() {
                    self.deleted_in_flight.extend(ids.iter().copied());
                }
                let affected = self.references.drop_records(&ids).affected();
                for reference in &affected {
                    self.cache.remove(reference);
                }
                affected
            }
            CallRecordMutation::CallLinksUpdated(row_ids) => {
                let row_ids: HashSet<i64> = row_ids.into_iter().collect();
                let on_updated_link = |reference: &Reference| {
                    reference
                        .call_link_row_id()
                        .is_some_and(|row_id| row_ids.contains(&row_id))
                };
                self.cache.invalidate(on_updated_link);
                self.references.iter().filter(|r| on_updated_link(r)).collect()
            }
        }
    }

    /// Forget every row and switch to `query`. Pages in flight for the old
    /// query are discarded when they arrive.
    pub fn reset(&mut self, query: CallRecordQuery) {
        debug!("Resetting call history loader");
        self.query = query;
        self.references.clear();
        self.cache.clear();
        self.upcoming_call_links.clear();
        self.integrity_changes.clear();
        self.generation += 1;
        self.in_flight = None;
        self.deleted_in_flight.clear();
    }
}

/// Build the model for one row. Ids the store no longer has are added to
/// `dangling` and the row is left unbuilt.
fn build_view_model<S, B>(
    store: &S,
    builder: &B,
    call_links: &HashMap<i64, CallLinkSummary>,
    reference: &Reference,
    dangling: &mut HashSet<CallRecordId>,
) -> Option<B::ViewModel>
where
    S: CallRecordStore + ?Sized,
    B: ViewModelBuilder,
{
    match reference {
        Reference::UpcomingCallLink(link) => match call_links.get(&link.call_link_row_id) {
            Some(summary) => Some(builder.upcoming_call_link(summary)),
            None => {
                warn!("No summary for upcoming call link {}", link.call_link_row_id);
                None
            }
        },
        Reference::CallHistoryItem(item) => {
            let mut records = Vec::with_capacity(item.len());
            let mut complete = true;
            for id in item.call_record_ids() {
                match store.fetch_by_id(id) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {
                        dangling.insert(*id);
                        complete = false;
                    }
                    Err(e) => {
                        warn!("Failed to fetch call record {} in {}: {}", id.call_id, id.conversation_id, e);
                        return None;
                    }
                }
            }
            complete.then(|| builder.call_history_item(&records))
        }
    }
}
