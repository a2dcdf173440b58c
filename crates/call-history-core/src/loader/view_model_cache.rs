use std::collections::{HashMap, HashSet};
use std::ops::Range;

use super::reference_index::ReferenceIndex;
use crate::constants::HOT_WINDOW_SLACK_PAGES;
use crate::models::Reference;

/// Built view models for the rows around the most recently requested index.
///
/// Entries are keyed by `Reference` so that rows shifting position (newer
/// calls prepended, rows pruned) keep their cached models. Locality is
/// still measured in indices: `ensure_loaded` evicts every entry whose row
/// is outside the hot window around the requested page.
#[derive(Debug)]
pub struct ViewModelCache<V> {
    entries: HashMap<Reference, V>,
}

impl<V> Default for ViewModelCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

/// The page containing `index`, clamped to `len`.
pub fn page_range(index: usize, page_size: usize, len: usize) -> Range<usize> {
    let start = (index / page_size) * page_size;
    start.min(len)..(start + page_size).min(len)
}

/// Indices whose view models survive a load of the page starting at
/// `page_start`.
pub fn hot_window(page_start: usize, page_size: usize, len: usize) -> Range<usize> {
    let slack = HOT_WINDOW_SLACK_PAGES * page_size;
    let start = page_start.saturating_sub(slack);
    let end = (page_start + page_size + slack).min(len);
    start.min(end)..end
}

impl<V> ViewModelCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, reference: &Reference) -> Option<&V> {
        self.entries.get(reference)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.entries.contains_key(reference)
    }

    /// The cached model for the row at `index`, if any. Never builds.
    pub fn view_model(&self, index: usize, references: &ReferenceIndex) -> Option<&V> {
        let reference = references.get(index)?;
        self.entries.get(&reference)
    }

    pub fn remove(&mut self, reference: &Reference) -> Option<V> {
        self.entries.remove(reference)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every cached model whose reference matches. Returns the
    /// references that had a cached model.
    pub fn invalidate<F>(&mut self, mut predicate: F) -> Vec<Reference>
    where
        F: FnMut(&Reference) -> bool,
    {
        let matching: Vec<Reference> = self
            .entries
            .keys()
            .filter(|reference| predicate(reference))
            .cloned()
            .collect();
        for reference in &matching {
            self.entries.remove(reference);
        }
        matching
    }

    /// Build the missing models of the page containing `around`, then evict
    /// everything outside the hot window around that page.
    ///
    /// `build` returning `None` leaves the row uncached. Returns the page
    /// range, empty if `around` is out of bounds.
    pub fn ensure_loaded<F>(
        &mut self,
        around: usize,
        page_size: usize,
        references: &ReferenceIndex,
        mut build: F,
    ) -> Range<usize>
    where
        F: FnMut(&Reference) -> Option<V>,
    {
        let len = references.len();
        if around >= len || page_size == 0 {
            return around.min(len)..around.min(len);
        }

        let page = page_range(around, page_size, len);
        for index in page.clone() {
            let reference = references.reference(index);
            if self.entries.contains_key(&reference) {
                continue;
            }
            if let Some(view_model) = build(&reference) {
                self.entries.insert(reference, view_model);
            }
        }

        let window = hot_window(page.start, page_size, len);
        let keep: HashSet<Reference> = window.filter_map(|index| references.get(index)).collect();
        self.entries.retain(|reference, _| keep.contains(reference));

        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coalescing::CallRecordGroup;
    use crate::testing::{call, SequentialTimestamps};

    fn index_with_rows(count: u64) -> ReferenceIndex {
        let mut ts = SequentialTimestamps::new();
        let groups: Vec<CallRecordGroup> = (0..count)
            .map(|id| CallRecordGroup::new(call(id, ts.uncoalescable(), id as i64)))
            .collect();
        let mut index = ReferenceIndex::new();
        index.append_older(&groups);
        index
    }

    fn build_all(cache: &mut ViewModelCache<usize>, around: usize, references: &ReferenceIndex) {
        cache.ensure_loaded(around, 10, references, |reference| {
            references.index_of(reference)
        });
    }

    fn cached_indices(cache: &ViewModelCache<usize>, references: &ReferenceIndex) -> Vec<usize> {
        (0..references.len())
            .filter(|&i| cache.view_model(i, references).is_some())
            .collect()
    }

    #[test]
    fn test_page_and_window_ranges() {
        assert_eq!(page_range(25, 10, 100), 20..30);
        assert_eq!(page_range(95, 10, 97), 90..97);
        assert_eq!(hot_window(20, 10, 100), 0..50);
        assert_eq!(hot_window(50, 10, 100), 30..80);
        assert_eq!(hot_window(90, 10, 97), 70..97);
    }

    #[test]
    fn test_ensure_loaded_builds_only_the_page() {
        let references = index_with_rows(100);
        let mut cache = ViewModelCache::new();

        let page = cache.ensure_loaded(25, 10, &references, |reference| references.index_of(reference));
        assert_eq!(page, 20..30);
        assert_eq!(cached_indices(&cache, &references), (20..30).collect::<Vec<_>>());
        assert_eq!(cache.view_model(23, &references), Some(&23));
    }

    #[test]
    fn test_eviction_window() {
        let references = index_with_rows(100);
        let mut cache = ViewModelCache::new();

        for around in [0, 10, 20, 30, 40, 50] {
            build_all(&mut cache, around, &references);
        }
        // Page 50..60 keeps 30..80; only 30..60 was ever built.
        assert_eq!(cached_indices(&cache, &references), (30..60).collect::<Vec<_>>());

        build_all(&mut cache, 95, &references);
        assert_eq!(cached_indices(&cache, &references), (90..100).collect::<Vec<_>>());
        assert!(cache.len() <= 5 * 10);
    }

    #[test]
    fn test_cached_rows_are_not_rebuilt() {
        let references = index_with_rows(30);
        let mut cache = ViewModelCache::new();
        build_all(&mut cache, 5, &references);

        let mut builds = 0;
        cache.ensure_loaded(7, 10, &references, |_| {
            builds += 1;
            Some(0)
        });
        assert_eq!(builds, 0);
    }

    #[test]
    fn test_failed_build_leaves_row_uncached() {
        let references = index_with_rows(5);
        let mut cache: ViewModelCache<usize> = ViewModelCache::new();
        cache.ensure_loaded(0, 10, &references, |reference| {
            references.index_of(reference).filter(|&i| i != 2)
        });
        assert_eq!(cached_indices(&cache, &references), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds_builds_nothing() {
        let references = index_with_rows(5);
        let mut cache: ViewModelCache<usize> = ViewModelCache::new();
        let page = cache.ensure_loaded(5, 10, &references, |_| Some(0));
        assert!(page.is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_keeps_references() {
        let references = index_with_rows(10);
        let mut cache = ViewModelCache::new();
        build_all(&mut cache, 0, &references);

        let target = references.reference(3);
        let invalidated = cache.invalidate(|reference| *reference == target);
        assert_eq!(invalidated, vec![target]);
        assert_eq!(references.len(), 10);
        assert!(cache.view_model(3, &references).is_none());
        assert_eq!(cache.len(), 9);
    }
}
