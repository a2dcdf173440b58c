//! The ordered list of rows the loader knows about.
//!
//! Rows are addressed through one flattened sequence: every upcoming call
//! link first, then call history items newest first.

use std::collections::HashSet;

use crate::coalescing::CallRecordGroup;
use crate::models::{
    CallHistoryItemReference, CallRecordId, RecordPosition, Reference, UpcomingCallLinkReference,
};

/// Rows changed by `ReferenceIndex::drop_records`.
#[derive(Debug, Default)]
pub struct DroppedRecords {
    /// Rows whose every call was dropped.
    pub removed: Vec<Reference>,
    /// Rows that lost some calls, as `(before, after)`. Identity changes when
    /// the oldest call was dropped.
    pub modified: Vec<(Reference, Reference)>,
}

impl DroppedRecords {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.modified.is_empty()
    }

    /// Every identity a display needs to reload or delete.
    pub fn affected(&self) -> HashSet<Reference> {
        let mut affected: HashSet<Reference> = self.removed.iter().cloned().collect();
        for (before, after) in &self.modified {
            affected.insert(before.clone());
            affected.insert(after.clone());
        }
        affected
    }
}

#[derive(Debug, Default)]
pub struct ReferenceIndex {
    upcoming_call_links: Vec<UpcomingCallLinkReference>,
    call_history_items: Vec<CallHistoryItemReference>,
    /// Bounds of every call history record loaded so far. Never shrinks, so
    /// dropped records are not paged in again.
    oldest_loaded: Option<RecordPosition>,
    newest_loaded: Option<RecordPosition>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.upcoming_call_links.len() + self.call_history_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Panics if `index` is out of bounds.
    pub fn reference(&self, index: usize) -> Reference {
        match self.get(index) {
            Some(reference) => reference,
            None => panic!(
                "reference index {} out of bounds (count {})",
                index,
                self.len()
            ),
        }
    }

    pub fn get(&self, index: usize) -> Option<Reference> {
        let upcoming_count = self.upcoming_call_links.len();
        if index < upcoming_count {
            Some(self.upcoming_call_links[index].into())
        } else {
            self.call_history_items
                .get(index - upcoming_count)
                .cloned()
                .map(Reference::from)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Reference> + '_ {
        self.upcoming_call_links
            .iter()
            .map(|link| Reference::from(*link))
            .chain(self.call_history_items.iter().cloned().map(Reference::from))
    }

    pub fn index_of(&self, reference: &Reference) -> Option<usize> {
        match reference {
            Reference::UpcomingCallLink(link) => {
                self.upcoming_call_links.iter().position(|l| l == link)
            }
            Reference::CallHistoryItem(item) => self
                .call_history_items
                .iter()
                .position(|i| i == item)
                .map(|position| position + self.upcoming_call_links.len()),
        }
    }

    pub fn upcoming_call_links(&self) -> &[UpcomingCallLinkReference] {
        &self.upcoming_call_links
    }

    pub fn call_history_items(&self) -> &[CallHistoryItemReference] {
        &self.call_history_items
    }

    pub fn newest_call_history_item(&self) -> Option<&CallHistoryItemReference> {
        self.call_history_items.first()
    }

    pub fn oldest_loaded(&self) -> Option<RecordPosition> {
        self.oldest_loaded
    }

    pub fn newest_loaded(&self) -> Option<RecordPosition> {
        self.newest_loaded
    }

    pub fn has_loaded_call_history(&self) -> bool {
        self.newest_loaded.is_some()
    }

    /// Swap in a new upcoming call link list, returning the old one.
    pub fn replace_upcoming_call_links(
        &mut self,
        links: Vec<UpcomingCallLinkReference>,
    ) -> Vec<UpcomingCallLinkReference> {
        std::mem::replace(&mut self.upcoming_call_links, links)
    }

    /// Append older groups at the tail, one row per group.
    pub fn append_older(&mut self, groups: &[CallRecordGroup]) {
        for group in groups {
            self.widen_loaded_range(group.newest_position());
            self.widen_loaded_range(group.oldest_position());
            self.call_history_items
                .push(CallHistoryItemReference::from_records(group.records()));
        }
    }

    /// Insert newer groups (newest first) at the head, one row per group.
    pub fn prepend_newer(&mut self, groups: &[CallRecordGroup]) {
        for group in groups {
            self.widen_loaded_range(group.newest_position());
            self.widen_loaded_range(group.oldest_position());
        }
        let items = groups
            .iter()
            .map(|group| CallHistoryItemReference::from_records(group.records()));
        self.call_history_items.splice(0..0, items);
    }

    /// Replace the newest row with a version holding `newer` calls ahead of
    /// its own. Returns the replaced row.
    pub fn splice_into_newest(
        &mut self,
        newer: &CallRecordGroup,
    ) -> Option<(CallHistoryItemReference, CallHistoryItemReference)> {
        let newest = self.call_history_items.first_mut()?;
        let before = newest.clone();
        *newest = before.prepending(&newer.ids());
        let after = newest.clone();

        self.widen_loaded_range(newer.newest_position());
        self.widen_loaded_range(newer.oldest_position());
        Some((before, after))
    }

    fn widen_loaded_range(&mut self, position: RecordPosition) {
        self.oldest_loaded = Some(match self.oldest_loaded {
            Some(oldest) => oldest.min(position),
            None => position,
        });
        self.newest_loaded = Some(match self.newest_loaded {
            Some(newest) => newest.max(position),
            None => position,
        });
    }

    /// Keep one row per call link.
    ///
    /// A call history item wins over an upcoming link, and among call history
    /// items the first (most recent) wins. Returns the removed rows.
    pub fn prune_duplicate_call_links(&mut self) -> Vec<Reference> {
        let mut removed = Vec::new();
        let mut seen: HashSet<i64> = HashSet::new();

        self.call_history_items.retain(|item| match item.call_link_row_id() {
            Some(row_id) if !seen.insert(row_id) => {
                removed.push(Reference::from(item.clone()));
                false
            }
            _ => true,
        });

        self.upcoming_call_links.retain(|link| {
            if seen.insert(link.call_link_row_id) {
                true
            } else {
                removed.push(Reference::from(*link));
                false
            }
        });

        removed
    }

    /// Remove `ids` from every call history item, dropping rows left empty.
    pub fn drop_records(&mut self, ids: &HashSet<CallRecordId>) -> DroppedRecords {
        let mut dropped = DroppedRecords::default();
        if ids.is_empty() {
            return dropped;
        }

        let mut kept = Vec::with_capacity(self.call_history_items.len());
        for item in self.call_history_items.drain(..) {
            if !item.call_record_ids().iter().any(|id| ids.contains(id)) {
                kept.push(item);
                continue;
            }
            match item.without(ids) {
                Some(remaining) => {
                    dropped
                        .modified
                        .push((item.into(), Reference::from(remaining.clone())));
                    kept.push(remaining);
                }
                None => dropped.removed.push(item.into()),
            }
        }
        self.call_history_items = kept;

        dropped
    }

    /// Forget everything, including the loaded range.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
