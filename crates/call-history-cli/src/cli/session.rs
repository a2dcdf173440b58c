use std::sync::Arc;

use anyhow::{bail, Result};
use call_history_core::models::{ConversationId, DefaultViewModelBuilder};
use call_history_core::{
    fetch_page_on_worker, CallHistoryLoader, CallRecordId, CallRecordMutation, CallRecordQuery,
    LoadDirection, LoaderConfig, MemoryCallRecordStore,
};
use tracing::{debug, info};

use super::fixture::Fixture;
use super::render::RenderedRow;

pub type FixtureLoader = CallHistoryLoader<MemoryCallRecordStore, DefaultViewModelBuilder>;

/// Build the query for the list filters given on the command line.
pub fn build_query(missed_only: bool, threads: &[i64]) -> CallRecordQuery {
    let mut query = if threads.is_empty() {
        CallRecordQuery::all()
    } else {
        CallRecordQuery::in_conversations(threads.iter().copied().map(ConversationId::Thread))
    };
    query.only_missed = missed_only;
    query
}

/// A loader over a fixture-backed store, driven the way a calls list would.
pub struct Session {
    loader: FixtureLoader,
}

impl Session {
    pub fn new(fixture: Fixture, config: LoaderConfig, query: CallRecordQuery) -> Result<Self> {
        let (store, builder) = fixture.into_store()?;
        info!("Loaded {} call records", store.len());

        let mut loader = CallHistoryLoader::with_query(Arc::new(store), builder, config, query)?;
        loader.reload_upcoming_call_links()?;
        Ok(Self { loader })
    }

    pub fn loader(&self) -> &FixtureLoader {
        &self.loader
    }

    /// Load up to `pages` older pages, reading the store on the blocking
    /// pool. Returns the number of pages that added rows.
    pub async fn load_pages(&mut self, pages: usize) -> Result<usize> {
        let mut loaded = 0;
        for _ in 0..pages {
            let request = self.loader.begin_load(LoadDirection::Older);
            let page = fetch_page_on_worker(self.loader.store().clone(), request).await?;
            let outcome = self.loader.apply_page(page);
            if !outcome.did_change {
                break;
            }
            loaded += 1;
        }
        debug!(
            "Loaded {} page(s), {} rows",
            loaded,
            self.loader.reference_count()
        );
        Ok(loaded)
    }

    pub fn row(&mut self, index: usize) -> Result<RenderedRow> {
        if !self.loader.load_until_index(index)? {
            bail!(
                "Row {} does not exist (the list has {} rows)",
                index,
                self.loader.reference_count()
            );
        }
        let reference = self.loader.reference(index);
        match self.loader.view_model(index).cloned() {
            Some(view_model) => Ok(RenderedRow::new(index, &reference, view_model)),
            None => bail!("Row {} could not be built", index),
        }
    }

    /// Every loaded row, building view models page by page.
    pub fn rows(&mut self) -> Vec<RenderedRow> {
        let mut rows = Vec::with_capacity(self.loader.reference_count());
        // Building a page can drop rows whose calls left the store
        let mut index = 0;
        while index < self.loader.reference_count() {
            if let Some(view_model) = self.loader.view_model(index).cloned() {
                let reference = self.loader.reference(index);
                rows.push(RenderedRow::new(index, &reference, view_model));
            }
            index += 1;
        }
        rows
    }

    /// Delete a call from the store and tell the loader. Returns how many
    /// rows were affected.
    pub fn delete_call(&mut self, id: CallRecordId) -> Result<usize> {
        if self.loader.store().delete(&id).is_none() {
            bail!("No call {}", id);
        }
        let affected = self
            .loader
            .apply_external_mutation(CallRecordMutation::Deleted(vec![id]));
        info!("Deleted call {}, {} row(s) affected", id, affected.len());
        Ok(affected.len())
    }
}
