pub mod coalescing;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod models;
pub mod store;

#[cfg(test)]
mod testing;

// Re-export the loader surface at crate root for convenience
pub use config::LoaderConfig;
pub use error::{LoaderError, LoaderResult, StoreError};
pub use loader::{
    fetch_page_on_worker, CallHistoryLoader, CallRecordMutation, FetchedPage, LoadDirection,
    LoadOutcome, PageRequest,
};
pub use models::{
    CallHistoryItemReference, CallRecord, CallRecordId, DefaultViewModelBuilder, Reference,
    UpcomingCallLinkReference, ViewModelBuilder,
};
pub use store::{CallRecordQuery, CallRecordStore, MemoryCallRecordStore};
