use std::collections::HashMap;

use serde::Serialize;

use super::call_link::CallLinkSummary;
use super::call_record::{CallDirection, CallKind, CallRecord, ConversationId};

/// Builds display view models for the loader.
///
/// The loader never inspects the view model; it only caches what this
/// returns for rows near the viewport.
pub trait ViewModelBuilder {
    type ViewModel;

    /// `records` is non-empty, newest first, and passed coalescing checks
    /// when the row was formed.
    fn call_history_item(&self, records: &[CallRecord]) -> Self::ViewModel;

    fn upcoming_call_link(&self, call_link: &CallLinkSummary) -> Self::ViewModel;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayDirection {
    Incoming,
    Outgoing,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CallRowState {
    /// A past call.
    Inactive,
    /// A call link nobody has called on yet.
    Upcoming,
}

/// The default row model: what a calls list shows for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallViewModel {
    pub title: String,
    pub conversation_id: ConversationId,
    pub direction: Option<DisplayDirection>,
    pub medium: Option<CallKind>,
    pub state: CallRowState,
    /// Number of calls coalesced into this row (0 for an upcoming link).
    pub call_count: usize,
    pub newest_started_at: Option<u64>,
    pub oldest_started_at: Option<u64>,
}

impl CallViewModel {
    /// Title with the coalesced call count appended, e.g. "Alice (3)".
    pub fn display_title(&self) -> String {
        if self.call_count > 1 {
            format!("{} ({})", self.title, self.call_count)
        } else {
            self.title.clone()
        }
    }
}

/// Builds `CallViewModel`s, resolving thread titles from a lookup table.
#[derive(Debug, Clone, Default)]
pub struct DefaultViewModelBuilder {
    thread_titles: HashMap<i64, String>,
}

impl DefaultViewModelBuilder {
    pub fn new(thread_titles: HashMap<i64, String>) -> Self {
        Self { thread_titles }
    }

    fn title_for(&self, conversation_id: ConversationId) -> String {
        match conversation_id {
            ConversationId::Thread(row_id) => self
                .thread_titles
                .get(&row_id)
                .cloned()
                .unwrap_or_else(|| format!("Thread {}", row_id)),
            ConversationId::CallLink(_) => "Call link".to_string(),
        }
    }
}

impl ViewModelBuilder for DefaultViewModelBuilder {
    type ViewModel = CallViewModel;

    fn call_history_item(&self, records: &[CallRecord]) -> CallViewModel {
        let newest = &records[0];
        let oldest = &records[records.len() - 1];

        let direction = if newest.is_missed() {
            DisplayDirection::Missed
        } else {
            match newest.direction {
                CallDirection::Incoming => DisplayDirection::Incoming,
                CallDirection::Outgoing => DisplayDirection::Outgoing,
            }
        };

        CallViewModel {
            title: self.title_for(newest.conversation_id()),
            conversation_id: newest.conversation_id(),
            direction: Some(direction),
            medium: Some(newest.kind),
            state: CallRowState::Inactive,
            call_count: records.len(),
            newest_started_at: Some(newest.started_at),
            oldest_started_at: Some(oldest.started_at),
        }
    }

    fn upcoming_call_link(&self, call_link: &CallLinkSummary) -> CallViewModel {
        CallViewModel {
            title: call_link
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "Call link".to_string()),
            conversation_id: ConversationId::CallLink(call_link.row_id),
            direction: None,
            medium: Some(CallKind::AdHoc),
            state: CallRowState::Upcoming,
            call_count: 0,
            newest_started_at: None,
            oldest_started_at: None,
        }
    }
}
