use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::{FetchError, FetchRange, Page};

/// A range whose most recent fetch failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedRange {
    pub range: FetchRange,
    pub error: FetchError,
}

/// Sparse, index-addressed state of one collection under one generation.
///
/// Unset indices mean "not fetched yet"; they are distinguishable from rows that are confirmed
/// absent (`index >= total_count`).
#[derive(Clone, Debug)]
pub struct CollectionWindow<T> {
    items: BTreeMap<usize, T>,
    total_count: Option<usize>,
    highest_requested_index: Option<usize>,
    fully_loaded: bool,
    generation: u64,
    failures: Vec<FailedRange>,
}

impl<T> CollectionWindow<T> {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            items: BTreeMap::new(),
            total_count: None,
            highest_requested_index: None,
            fully_loaded: false,
            generation,
            failures: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The total reported by the most recent successful fetch; `None` before the first one.
    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    pub fn highest_requested_index(&self) -> Option<usize> {
        self.highest_requested_index
    }

    /// Whether the most recent successful fetch reached the end of the collection.
    ///
    /// Recomputed on every merge. It does not mean every earlier index is materialized.
    pub fn is_fully_loaded(&self) -> bool {
        self.fully_loaded
    }

    pub fn loaded_len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(&index)
    }

    pub fn is_materialized(&self, index: usize) -> bool {
        self.items.contains_key(&index)
    }

    pub fn is_row_loaded(&self, index: usize) -> bool {
        self.total_count.is_some_and(|total| index < total) && self.items.contains_key(&index)
    }

    pub fn last_materialized_index(&self) -> Option<usize> {
        self.items.keys().next_back().copied()
    }

    /// Iterates over materialized rows in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.items.iter().map(|(index, item)| (*index, item))
    }

    pub fn failures(&self) -> &[FailedRange] {
        &self.failures
    }

    pub fn failure_at(&self, index: usize) -> Option<&FetchError> {
        self.failures
            .iter()
            .rev()
            .find(|f| f.range.contains(index))
            .map(|f| &f.error)
    }

    pub(crate) fn note_requested(&mut self, end: usize) {
        self.highest_requested_index = Some(match self.highest_requested_index {
            Some(prev) => prev.max(end),
            None => end,
        });
    }

    /// Writes a page at its absolute indices and adopts the server's total.
    ///
    /// Returns the number of rows written.
    pub(crate) fn merge(&mut self, range: FetchRange, page: Page<T>) -> usize {
        let total = page.total_count;

        let mut written = 0usize;
        for (offset, item) in page.items.into_iter().take(range.len()).enumerate() {
            let index = range.start + offset;
            if index >= total {
                break;
            }
            self.items.insert(index, item);
            written += 1;
        }

        self.total_count = Some(total);
        if self
            .last_materialized_index()
            .is_some_and(|index| index >= total)
        {
            // The collection shrank: rows past the new end are gone.
            drop(self.items.split_off(&total));
        }

        self.fully_loaded = range.end.saturating_add(1) >= total;

        self.clear_failures_in(range);
        written
    }

    pub(crate) fn record_failure(&mut self, range: FetchRange, error: FetchError) {
        self.clear_failures_in(range);
        self.failures.push(FailedRange { range, error });
    }

    pub(crate) fn clear_failures_in(&mut self, range: FetchRange) {
        self.failures.retain(|f| !f.range.overlaps(&range));
    }

    /// Moves to the next generation but keeps the materialized rows on screen.
    pub(crate) fn advance_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Drops everything fetched and starts the next generation.
    pub(crate) fn reset(&mut self) -> u64 {
        self.items.clear();
        self.total_count = None;
        self.highest_requested_index = None;
        self.fully_loaded = false;
        self.failures.clear();
        self.advance_generation()
    }
}
