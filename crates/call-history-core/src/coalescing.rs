//! Coalescing: which adjacent calls share one row of the calls list.
//!
//! A row's first (newest) record is its anchor. A later, older record joins
//! the row when it happened in the same conversation, in the same direction,
//! with the same missed status, and within `COALESCING_WINDOW_MS` of the
//! anchor. Calls on call links never coalesce.
//!
//! Loading is asymmetric. Older pages are coalesced in bulk here; newer
//! records are returned one per row and the loader splices at most one of
//! them into its current newest row.

use std::collections::HashSet;

use crate::constants::COALESCING_WINDOW_MS;
use crate::error::StoreError;
use crate::models::{CallRecord, CallRecordId, RecordPosition};

/// Whether `candidate` may be coalesced into a row anchored at `anchor`.
pub fn is_valid_coalescing_anchor(anchor: &CallRecord, candidate: &CallRecord) -> bool {
    if anchor.conversation_id() != candidate.conversation_id() {
        return false;
    }
    if anchor.conversation_id().is_call_link() || candidate.conversation_id().is_call_link() {
        return false;
    }
    if anchor.direction != candidate.direction || anchor.is_missed() != candidate.is_missed() {
        return false;
    }

    // anchor.started_at - window < candidate.started_at, without underflow
    candidate.started_at.saturating_add(COALESCING_WINDOW_MS) > anchor.started_at
}

/// A non-empty run of coalesced records, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecordGroup {
    records: Vec<CallRecord>,
}

impl CallRecordGroup {
    pub fn new(anchor: CallRecord) -> Self {
        Self {
            records: vec![anchor],
        }
    }

    pub fn anchor(&self) -> &CallRecord {
        &self.records[0]
    }

    pub fn oldest(&self) -> &CallRecord {
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<CallRecordId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn newest_position(&self) -> RecordPosition {
        self.anchor().position()
    }

    pub fn oldest_position(&self) -> RecordPosition {
        self.oldest().position()
    }

    /// The group minus `ids`, or `None` if nothing is left.
    pub(crate) fn without(mut self, ids: &HashSet<CallRecordId>) -> Option<Self> {
        self.records.retain(|record| !ids.contains(&record.id));
        (!self.records.is_empty()).then_some(self)
    }

    /// Append `record` if it coalesces under the anchor and the group has
    /// room. Hands the record back otherwise.
    fn try_push(&mut self, record: CallRecord, max_group_size: usize) -> Result<(), CallRecord> {
        if self.records.len() < max_group_size && is_valid_coalescing_anchor(self.anchor(), &record)
        {
            self.records.push(record);
            Ok(())
        } else {
            Err(record)
        }
    }
}

/// Coalesce a newest-first cursor into at most `max_groups` groups.
///
/// A group is only closed by a record that cannot join it, so every returned
/// group except possibly the last is complete. The record that closes the
/// `max_groups`-th group is left unconsumed; it is older than the returned
/// groups and will start the next page.
pub fn group_older<I>(
    cursor: I,
    max_groups: usize,
    max_group_size: usize,
) -> Result<Vec<CallRecordGroup>, StoreError>
where
    I: IntoIterator<Item = Result<CallRecord, StoreError>>,
{
    let mut groups: Vec<CallRecordGroup> = Vec::new();
    if max_groups == 0 {
        return Ok(groups);
    }

    let mut current: Option<CallRecordGroup> = None;
    for record in cursor {
        let record = record?;

        let Some(group) = current.as_mut() else {
            current = Some(CallRecordGroup::new(record));
            continue;
        };

        if let Err(record) = group.try_push(record, max_group_size) {
            groups.extend(current.take());
            if groups.len() == max_groups {
                return Ok(groups);
            }
            current = Some(CallRecordGroup::new(record));
        }
    }

    groups.extend(current);
    Ok(groups)
}

/// Reverse an oldest-first cursor of newer records into newest-first order.
///
/// Newer records are not coalesced against each other.
pub fn group_newer<I>(cursor: I) -> Result<Vec<CallRecord>, StoreError>
where
    I: IntoIterator<Item = Result<CallRecord, StoreError>>,
{
    let mut records = cursor.into_iter().collect::<Result<Vec<_>, _>>()?;
    records.reverse();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallDirection, CallStatus, ConversationId};
    use crate::testing::{
        call, call_on_link, call_with, SequentialTimestamps, HOUR_MS, MINUTE_MS,
    };

    fn ok(records: Vec<CallRecord>) -> impl Iterator<Item = Result<CallRecord, StoreError>> {
        records.into_iter().map(Ok)
    }

    fn group_ids(groups: &[CallRecordGroup]) -> Vec<Vec<u64>> {
        groups
            .iter()
            .map(|group| group.records().iter().map(|r| r.id.call_id).collect())
            .collect()
    }

    #[test]
    fn test_window_boundary() {
        let anchor = call(1, 10 * HOUR_MS, 1);

        let just_outside = call(2, 10 * HOUR_MS - (4 * HOUR_MS + 1_000), 1);
        assert!(!is_valid_coalescing_anchor(&anchor, &just_outside));

        let exactly_window = call(3, 10 * HOUR_MS - 4 * HOUR_MS, 1);
        assert!(!is_valid_coalescing_anchor(&anchor, &exactly_window));

        let just_inside = call(4, 10 * HOUR_MS - (3 * HOUR_MS + 59 * MINUTE_MS), 1);
        assert!(is_valid_coalescing_anchor(&anchor, &just_inside));
    }

    #[test]
    fn test_window_near_epoch_does_not_underflow() {
        let anchor = call(1, MINUTE_MS, 1);
        let candidate = call(2, 0, 1);
        assert!(is_valid_coalescing_anchor(&anchor, &candidate));
    }

    #[test]
    fn test_attribute_mismatches_do_not_coalesce() {
        let anchor = call(1, 10 * HOUR_MS, 1);

        assert!(!is_valid_coalescing_anchor(&anchor, &call(2, 10 * HOUR_MS - MINUTE_MS, 2)));

        let incoming = call_with(
            3,
            10 * HOUR_MS - MINUTE_MS,
            ConversationId::Thread(1),
            CallDirection::Incoming,
            CallStatus::Accepted,
        );
        assert!(!is_valid_coalescing_anchor(&anchor, &incoming));

        let missed_anchor = call_with(
            4,
            10 * HOUR_MS,
            ConversationId::Thread(1),
            CallDirection::Incoming,
            CallStatus::IncomingMissed,
        );
        assert!(!is_valid_coalescing_anchor(&missed_anchor, &incoming));

        // Different missed statuses still count as "missed"
        let ringing_missed = call_with(
            5,
            10 * HOUR_MS - MINUTE_MS,
            ConversationId::Thread(1),
            CallDirection::Incoming,
            CallStatus::RingingMissedNotificationProfile,
        );
        assert!(is_valid_coalescing_anchor(&missed_anchor, &ringing_missed));
    }

    #[test]
    fn test_call_links_never_coalesce() {
        let anchor = call_on_link(1, 10 * HOUR_MS, 42);
        let candidate = call_on_link(2, 10 * HOUR_MS - MINUTE_MS, 42);
        assert!(!is_valid_coalescing_anchor(&anchor, &candidate));

        let groups = group_older(ok(vec![anchor, candidate]), 10, 50).unwrap();
        assert_eq!(group_ids(&groups), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_matching_burst_is_one_group() {
        let mut ts = SequentialTimestamps::new();
        let records: Vec<_> = (1..=20).map(|id| call(id, ts.coalescable(), 1)).collect();

        let groups = group_older(ok(records), 10, 50).unwrap();
        assert_eq!(group_ids(&groups), vec![(1..=20).collect::<Vec<_>>()]);
    }

    #[test]
    fn test_candidates_are_checked_against_anchor_not_previous() {
        // Each call is 2h after the next, so neighbours are in range but the
        // third is 4h from the anchor.
        let records = vec![
            call(1, 10 * HOUR_MS, 1),
            call(2, 8 * HOUR_MS, 1),
            call(3, 6 * HOUR_MS, 1),
        ];

        let groups = group_older(ok(records), 10, 50).unwrap();
        assert_eq!(group_ids(&groups), vec![vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_mixed_sequence() {
        let mut ts = SequentialTimestamps::new();
        let missed = |id, started_at| {
            call_with(
                id,
                started_at,
                ConversationId::Thread(3),
                CallDirection::Incoming,
                CallStatus::IncomingMissed,
            )
        };
        let answered = |id, started_at| {
            call_with(
                id,
                started_at,
                ConversationId::Thread(3),
                CallDirection::Incoming,
                CallStatus::Accepted,
            )
        };
        let records = vec![
            call(99, ts.uncoalescable(), 0),
            call(98, ts.coalescable(), 0),
            call(97, ts.coalescable(), 0),
            // Outside the window
            call(0, ts.uncoalescable(), 0),
            // Different thread
            call(1, ts.coalescable(), 1),
            // Different missed status
            missed(2, ts.uncoalescable()),
            answered(3, ts.coalescable()),
            // Intervening call breaks the run
            missed(4, ts.coalescable()),
        ];

        let groups = group_older(ok(records), 100, 50).unwrap();
        assert_eq!(
            group_ids(&groups),
            vec![vec![99, 98, 97], vec![0], vec![1], vec![2], vec![3], vec![4]]
        );
    }

    #[test]
    fn test_max_group_size_splits() {
        let mut ts = SequentialTimestamps::new();
        let records: Vec<_> = (1..=7).map(|id| call(id, ts.coalescable(), 1)).collect();

        let groups = group_older(ok(records), 10, 5).unwrap();
        assert_eq!(group_ids(&groups), vec![vec![1, 2, 3, 4, 5], vec![6, 7]]);
    }

    #[test]
    fn test_max_groups_stops_without_truncating_open_group() {
        let mut ts = SequentialTimestamps::new();
        let records = vec![
            call(1, ts.uncoalescable(), 1),
            call(2, ts.uncoalescable(), 2),
            call(3, ts.coalescable(), 2),
            call(4, ts.uncoalescable(), 3),
            call(5, ts.uncoalescable(), 4),
        ];

        let groups = group_older(ok(records), 2, 50).unwrap();
        assert_eq!(group_ids(&groups), vec![vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_trailing_group_is_flushed() {
        let mut ts = SequentialTimestamps::new();
        let records = vec![call(1, ts.uncoalescable(), 1), call(2, ts.coalescable(), 1)];

        let groups = group_older(ok(records), 5, 50).unwrap();
        assert_eq!(group_ids(&groups), vec![vec![1, 2]]);
        assert_eq!(groups[0].oldest().id.call_id, 2);
    }

    #[test]
    fn test_cursor_error_propagates() {
        let cursor = vec![
            Ok(call(1, 10 * HOUR_MS, 1)),
            Err(StoreError::Unavailable("gone".into())),
        ];
        assert!(group_older(cursor, 5, 50).is_err());
    }

    #[test]
    fn test_group_newer_reverses() {
        let records = vec![call(1, HOUR_MS, 1), call(2, 2 * HOUR_MS, 1)];
        let newer = group_newer(ok(records)).unwrap();
        let ids: Vec<u64> = newer.iter().map(|r| r.id.call_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
