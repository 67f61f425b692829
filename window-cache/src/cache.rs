use alloc::string::String;
use alloc::vec::Vec;

use crate::window::{CollectionWindow, FailedRange};
use crate::{
    CacheOptions, CompletionOutcome, FetchRange, PageRequest, PageResponse, RequestId, RowState,
    WindowStats,
};

#[derive(Clone, Copy, Debug)]
struct InFlight {
    id: RequestId,
    range: FetchRange,
}

/// A sparse, index-addressed view of one server-backed collection.
///
/// The cache is sans-IO. Operations that need data return [`PageRequest`]s; the adapter runs
/// them (in any order, concurrently or not) and hands each result back through
/// [`WindowedCollectionCache::complete`]. Every request is stamped with the generation active
/// when it was issued, and results from a superseded generation are dropped on arrival.
///
/// Typical wiring:
/// - the virtualizer reports a visible range → [`on_visible_range_changed`]
/// - the adapter executes the returned requests → [`complete`]
/// - rows render through [`row_state`] / [`is_row_loaded`], sized by [`row_count_hint`]
///
/// [`on_visible_range_changed`]: WindowedCollectionCache::on_visible_range_changed
/// [`complete`]: WindowedCollectionCache::complete
/// [`row_state`]: WindowedCollectionCache::row_state
/// [`is_row_loaded`]: WindowedCollectionCache::is_row_loaded
/// [`row_count_hint`]: WindowedCollectionCache::row_count_hint
#[derive(Clone, Debug)]
pub struct WindowedCollectionCache<T, S = ()> {
    options: CacheOptions<S>,
    window: CollectionWindow<T>,
    in_flight: Vec<InFlight>,
    next_request_id: u64,
}

impl<T, S: Clone> WindowedCollectionCache<T, S> {
    pub fn new(options: CacheOptions<S>) -> Self {
        Self::starting_at(options, 0)
    }

    /// A cache whose first generation is `generation`. Used where a window replaces a torn-down
    /// one for the same scope, so stamps issued by the old window never match the new one.
    pub(crate) fn starting_at(options: CacheOptions<S>, generation: u64) -> Self {
        cdebug!(
            page_size = options.page_size,
            scoped = options.scope.is_some(),
            generation,
            "WindowedCollectionCache::new"
        );
        Self {
            options,
            window: CollectionWindow::new(generation),
            in_flight: Vec::new(),
            next_request_id: 0,
        }
    }

    pub fn options(&self) -> &CacheOptions<S> {
        &self.options
    }

    pub fn scope(&self) -> Option<&S> {
        self.options.scope.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.options.search_term
    }

    pub fn page_size(&self) -> usize {
        self.options.page_size
    }

    pub fn window(&self) -> &CollectionWindow<T> {
        &self.window
    }

    pub fn generation(&self) -> u64 {
        self.window.generation()
    }

    pub fn total_count(&self) -> Option<usize> {
        self.window.total_count()
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.window.is_fully_loaded()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn failures(&self) -> &[FailedRange] {
        self.window.failures()
    }

    /// Row count to hand to a virtualizer.
    ///
    /// Before the first fetch resolves the total is unknown; this reports a single loading row
    /// so the viewport has something to measure and a range to request.
    pub fn row_count_hint(&self) -> usize {
        self.window.total_count().unwrap_or(1)
    }

    pub fn is_row_loaded(&self, index: usize) -> bool {
        self.window.is_row_loaded(index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if !self.window.is_row_loaded(index) {
            return None;
        }
        self.window.get(index)
    }

    pub fn row_state(&self, index: usize) -> RowState<'_, T> {
        if self.window.total_count().is_some_and(|total| index >= total) {
            return RowState::OutOfRange;
        }
        if let Some(item) = self.window.get(index) {
            return RowState::Loaded(item);
        }
        if self.in_flight.iter().any(|f| f.range.contains(index)) {
            return RowState::Loading;
        }
        match self.window.failure_at(index) {
            Some(error) => RowState::Failed(error),
            None => RowState::Unrequested,
        }
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats {
            generation: self.window.generation(),
            total_count: self.window.total_count(),
            loaded: self.window.loaded_len(),
            in_flight: self.in_flight.len(),
            failed_ranges: self.window.failures().len(),
            highest_requested_index: self.window.highest_requested_index(),
            fully_loaded: self.window.is_fully_loaded(),
        }
    }

    /// Rendering-contract alias for [`WindowedCollectionCache::request`].
    pub fn on_visible_range_changed(&mut self, range: FetchRange) -> Vec<PageRequest<S>> {
        self.request(range)
    }

    /// Declares interest in `range` and returns the fetches needed to cover it.
    ///
    /// - Indices that are materialized or already covered by an in-flight fetch are skipped, so
    ///   overlapping calls never fetch the same index twice.
    /// - Each contiguous run of missing indices yields exactly one request, widened outward to
    ///   the page boundary while the neighbouring indices are still uncovered.
    /// - Once the total is known, the range is clamped to it; a range entirely past the end
    ///   yields nothing.
    pub fn request(&mut self, range: FetchRange) -> Vec<PageRequest<S>> {
        let Some(range) = self.clamp_to_total(range) else {
            ctrace!(
                start = range.start,
                end = range.end,
                "request past end of collection"
            );
            return Vec::new();
        };
        self.window.note_requested(range.end);

        let mut out = Vec::new();
        let mut index = range.start;
        while index <= range.end {
            if self.is_covered(index) {
                match index.checked_add(1) {
                    Some(next) => index = next,
                    None => break,
                }
                continue;
            }

            let run_start = index;
            while index < range.end && !self.is_covered(index + 1) {
                index += 1;
            }
            let gap = self.widen_to_page(FetchRange::new(run_start, index));
            out.push(self.issue(gap));

            match gap.end.checked_add(1) {
                Some(next) => index = next,
                None => break,
            }
        }
        out
    }

    /// Merges (or discards) the result of a previously issued request.
    ///
    /// - A response from an older generation is dropped unconditionally.
    /// - On success the items land at `range.start + i` and the total is overwritten with the
    ///   server's value.
    /// - On failure the range is released for retry and marked failed; materialized rows are
    ///   left untouched.
    pub fn complete(&mut self, response: PageResponse<S, T>) -> CompletionOutcome {
        let PageResponse {
            id,
            generation,
            result,
            ..
        } = response;

        if generation != self.window.generation() {
            ctrace!(
                request = id.0,
                generation,
                current = self.window.generation(),
                "discarding stale page"
            );
            return CompletionOutcome::Stale;
        }
        let Some(pos) = self.in_flight.iter().position(|f| f.id == id) else {
            ctrace!(request = id.0, "discarding response for unknown request");
            return CompletionOutcome::Stale;
        };
        let flight = self.in_flight.swap_remove(pos);

        match result {
            Ok(page) => {
                let total_count = page.total_count;
                let _written = self.window.merge(flight.range, page);
                ctrace!(
                    request = id.0,
                    start = flight.range.start,
                    end = flight.range.end,
                    written = _written,
                    total_count,
                    "merged page"
                );
                CompletionOutcome::Merged {
                    range: flight.range,
                    total_count,
                }
            }
            Err(error) => {
                cwarn!(
                    request = id.0,
                    start = flight.range.start,
                    end = flight.range.end,
                    error = %error,
                    "page fetch failed"
                );
                self.window.record_failure(flight.range, error);
                CompletionOutcome::Failed {
                    range: flight.range,
                }
            }
        }
    }

    /// Switches to a new search term.
    ///
    /// Clears the window and starts a new generation; fetches still in flight may finish but
    /// their results are ignored. Returns `false` (and does nothing) if the term is unchanged.
    /// Callers re-request their visible range afterwards.
    pub fn set_search_term(&mut self, search_term: impl Into<String>) -> bool {
        let search_term = search_term.into();
        if search_term == self.options.search_term {
            return false;
        }
        self.options.search_term = search_term;
        self.reset_window();
        true
    }

    /// Points the cache at a different collection (e.g. another owner or parent).
    ///
    /// The window is discarded, never merged; the generation keeps increasing so late results
    /// for the old collection are dropped.
    pub fn set_scope(&mut self, scope: Option<S>) {
        self.options.scope = scope;
        self.reset_window();
    }

    /// Refetches everything requested so far in one request, after a mutation changed the
    /// collection's membership or order.
    ///
    /// The search term is kept and the materialized rows stay visible until the refetch lands,
    /// so the viewport does not jump. A new generation starts, so in-flight fetches that may
    /// carry pre-mutation data are ignored. Returns `None` if nothing was ever requested.
    ///
    /// Once the total is known the refetch stops at its last row, even if earlier requests
    /// reached further.
    pub fn invalidate_and_refetch_loaded(&mut self) -> Option<PageRequest<S>> {
        let last = match (
            self.window.highest_requested_index(),
            self.window.last_materialized_index(),
        ) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let last = match (last, self.window.total_count()) {
            (Some(last), Some(total)) => Some(last.min(total.saturating_sub(1))),
            (last, _) => last,
        };

        let _generation = self.window.advance_generation();
        self.in_flight.clear();
        cdebug!(generation = _generation, "invalidated window");

        let last = last?;
        Some(self.issue(FetchRange::new(0, last)))
    }

    fn reset_window(&mut self) {
        let _generation = self.window.reset();
        self.in_flight.clear();
        cdebug!(generation = _generation, "reset window");
    }

    fn clamp_to_total(&self, range: FetchRange) -> Option<FetchRange> {
        match self.window.total_count() {
            None => Some(range),
            Some(total) if range.start >= total => None,
            Some(total) => Some(FetchRange::new(range.start, range.end.min(total - 1))),
        }
    }

    fn is_covered(&self, index: usize) -> bool {
        self.window.is_materialized(index) || self.in_flight.iter().any(|f| f.range.contains(index))
    }

    fn widen_to_page(&self, run: FetchRange) -> FetchRange {
        let page = self.options.page_size;
        if page <= 1 {
            return run;
        }

        let page_start = run.start - run.start % page;
        let mut page_end = (run.end / page).saturating_mul(page).saturating_add(page - 1);
        if let Some(total) = self.window.total_count() {
            page_end = page_end.min(total.saturating_sub(1));
        }

        let mut start = run.start;
        while start > page_start && !self.is_covered(start - 1) {
            start -= 1;
        }
        let mut end = run.end;
        while end < page_end && !self.is_covered(end + 1) {
            end += 1;
        }
        FetchRange::new(start, end)
    }

    fn issue(&mut self, range: FetchRange) -> PageRequest<S> {
        self.next_request_id += 1;
        let id = RequestId(self.next_request_id);
        self.in_flight.push(InFlight { id, range });
        self.window.clear_failures_in(range);
        cdebug!(
            request = id.0,
            start = range.start,
            end = range.end,
            generation = self.window.generation(),
            "issuing page fetch"
        );
        PageRequest {
            id,
            generation: self.window.generation(),
            scope: self.options.scope.clone(),
            range,
            search_term: self.options.search_term.clone(),
        }
    }
}
