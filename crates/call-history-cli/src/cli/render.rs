use call_history_core::models::{CallRowState, CallViewModel, DisplayDirection};
use call_history_core::Reference;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One printed row, also the shape of `--json` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRow {
    pub index: usize,
    pub call_ids: Vec<u64>,
    #[serde(flatten)]
    pub view_model: CallViewModel,
}

impl RenderedRow {
    pub fn new(index: usize, reference: &Reference, view_model: CallViewModel) -> Self {
        let call_ids = reference
            .as_call_history_item()
            .map(|item| item.call_record_ids().iter().map(|id| id.call_id).collect())
            .unwrap_or_default();
        Self {
            index,
            call_ids,
            view_model,
        }
    }
}

pub fn format_timestamp(millis: u64) -> String {
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

fn direction_label(view_model: &CallViewModel) -> &'static str {
    match (view_model.state, view_model.direction) {
        (CallRowState::Upcoming, _) => "upcoming",
        (_, Some(DisplayDirection::Missed)) => "missed",
        (_, Some(DisplayDirection::Incoming)) => "incoming",
        (_, Some(DisplayDirection::Outgoing)) => "outgoing",
        (_, None) => "-",
    }
}

/// A single text line for `row`.
pub fn render_row(row: &RenderedRow) -> String {
    let view_model = &row.view_model;
    let medium = view_model.medium.map(|kind| kind.as_str()).unwrap_or("-");
    let when = view_model
        .newest_started_at
        .map(format_timestamp)
        .unwrap_or_default();

    let mut line = format!(
        "{:>4}  {:<9} {:<7} {}",
        row.index,
        direction_label(view_model),
        medium,
        view_model.display_title()
    );
    if !when.is_empty() {
        line.push_str("  ");
        line.push_str(&when);
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_history_core::models::{
        CallHistoryItemReference, CallKind, CallRecordId, ConversationId,
        UpcomingCallLinkReference,
    };

    fn history_row() -> RenderedRow {
        let conversation_id = ConversationId::Thread(7);
        let reference = Reference::from(CallHistoryItemReference::new(vec![
            CallRecordId::new(conversation_id, 2),
            CallRecordId::new(conversation_id, 1),
        ]));
        RenderedRow::new(
            3,
            &reference,
            CallViewModel {
                title: "Alice".to_string(),
                conversation_id,
                direction: Some(DisplayDirection::Missed),
                medium: Some(CallKind::Video),
                state: CallRowState::Inactive,
                call_count: 2,
                newest_started_at: Some(0),
                oldest_started_at: Some(0),
            },
        )
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
        assert_eq!(format_timestamp(u64::MAX), "unknown time");
    }

    #[test]
    fn test_render_history_row() {
        let row = history_row();
        assert_eq!(row.call_ids, vec![2, 1]);
        assert_eq!(
            render_row(&row),
            "   3  missed    video   Alice (2)  1970-01-01 00:00"
        );
    }

    #[test]
    fn test_render_upcoming_link_row() {
        let reference = Reference::from(UpcomingCallLinkReference::new(42));
        let row = RenderedRow::new(
            0,
            &reference,
            CallViewModel {
                title: "Standup".to_string(),
                conversation_id: ConversationId::CallLink(42),
                direction: None,
                medium: Some(CallKind::AdHoc),
                state: CallRowState::Upcoming,
                call_count: 0,
                newest_started_at: None,
                oldest_started_at: None,
            },
        );
        assert!(row.call_ids.is_empty());
        assert_eq!(render_row(&row), "   0  upcoming  ad_hoc  Standup");
    }

    #[test]
    fn test_json_row_is_flat() {
        let json = serde_json::to_value(history_row()).unwrap();
        assert_eq!(json["index"], 3);
        assert_eq!(json["title"], "Alice");
        assert_eq!(json["callCount"], 2);
        assert_eq!(json["direction"], "missed");
    }
}
