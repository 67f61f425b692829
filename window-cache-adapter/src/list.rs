use alloc::string::String;
use alloc::vec::Vec;

use virtualizer::{Virtualizer, VirtualizerOptions};
use window_cache::source::{PageSource, fetch_all};
use window_cache::{
    CacheOptions, CompletionOutcome, FetchRange, PageRequest, PageResponse, RowState, WindowStats,
    WindowedCollectionCache,
};

/// What [`WindowedList::complete`] did, plus the fetches the updated count made necessary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completed<S> {
    pub outcome: CompletionOutcome,
    pub requests: Vec<PageRequest<S>>,
}

/// A framework-neutral controller that pairs a `virtualizer::Virtualizer` with a
/// [`WindowedCollectionCache`].
///
/// Adapters drive it by calling:
/// - `on_viewport_size` / `on_scroll` when UI events occur
/// - `complete` with each finished fetch
/// - `tick(now_ms)` each frame (for `is_scrolling` debouncing)
///
/// Every call that can move the visible range returns the page fetches to run. Row counts are
/// kept in sync with the cache: a single loading row until the first total arrives, the
/// server's total afterwards.
#[derive(Clone, Debug)]
pub struct WindowedList<T, S = ()> {
    v: Virtualizer,
    cache: WindowedCollectionCache<T, S>,
}

impl<T, S: Clone> WindowedList<T, S> {
    /// Creates a list with a fixed row size along the scroll axis.
    pub fn new(options: CacheOptions<S>, row_size: u32) -> Self {
        let cache = WindowedCollectionCache::new(options);
        let v = Virtualizer::new(VirtualizerOptions::new(
            cache.row_count_hint(),
            move |_| row_size,
        ));
        Self { v, cache }
    }

    /// Wraps an already configured virtualizer (e.g. with measured rows or padding).
    ///
    /// The virtualizer's count is overwritten with the cache's row count.
    pub fn from_parts(mut v: Virtualizer, cache: WindowedCollectionCache<T, S>) -> Self {
        v.set_count(cache.row_count_hint());
        Self { v, cache }
    }

    pub fn into_parts(self) -> (Virtualizer, WindowedCollectionCache<T, S>) {
        (self.v, self.cache)
    }

    pub fn virtualizer(&self) -> &Virtualizer {
        &self.v
    }

    pub fn virtualizer_mut(&mut self) -> &mut Virtualizer {
        &mut self.v
    }

    pub fn cache(&self) -> &WindowedCollectionCache<T, S> {
        &self.cache
    }

    /// Direct access to the cache. Call [`sync`](Self::sync) afterwards if the change can affect
    /// the row count.
    pub fn cache_mut(&mut self) -> &mut WindowedCollectionCache<T, S> {
        &mut self.cache
    }

    pub fn stats(&self) -> WindowStats {
        self.cache.stats()
    }

    pub fn on_viewport_size(&mut self, viewport_main: u32) -> Vec<PageRequest<S>> {
        self.v.set_viewport_size(viewport_main);
        self.sync()
    }

    /// Call this when the UI reports a scroll offset change (e.g. user wheel/drag).
    pub fn on_scroll(&mut self, scroll_offset: u64, now_ms: u64) -> Vec<PageRequest<S>> {
        self.v.apply_scroll_offset_event_clamped(scroll_offset, now_ms);
        self.sync()
    }

    pub fn tick(&mut self, now_ms: u64) {
        self.v.update_scrolling(now_ms);
    }

    /// Applies a new search term and scrolls back to the top.
    ///
    /// An unchanged term does nothing and returns no requests.
    pub fn set_search_term(&mut self, search_term: impl Into<String>) -> Vec<PageRequest<S>> {
        if !self.cache.set_search_term(search_term) {
            return Vec::new();
        }
        self.v.set_scroll_offset(0);
        self.sync()
    }

    /// Points the list at a different collection and scrolls back to the top.
    pub fn set_scope(&mut self, scope: Option<S>) -> Vec<PageRequest<S>> {
        self.cache.set_scope(scope);
        self.v.set_scroll_offset(0);
        self.sync()
    }

    /// Refetches everything requested so far, e.g. after a mutation. The count and scroll
    /// position are left alone until the refetch lands.
    pub fn invalidate(&mut self) -> Option<PageRequest<S>> {
        self.cache.invalidate_and_refetch_loaded()
    }

    /// Copies the cache's row count into the virtualizer and requests whatever part of the
    /// virtual range (visible rows plus overscan) is not loaded or loading yet.
    pub fn sync(&mut self) -> Vec<PageRequest<S>> {
        self.v.set_count(self.cache.row_count_hint());
        let range = self.v.virtual_range();
        let Some(range) = FetchRange::from_exclusive(range.start_index, range.end_index) else {
            return Vec::new();
        };
        let requests = self.cache.request(range);
        if !requests.is_empty() {
            ltrace!(
                start = range.start,
                end = range.end,
                fetches = requests.len(),
                "virtual range needs rows"
            );
        }
        requests
    }

    /// Merges a finished fetch. A merged page may change the count and with it the virtual
    /// range, so the follow-up fetches are returned alongside the outcome.
    ///
    /// Failed and stale responses produce no follow-ups; failed rows are retried the next time
    /// the range is synced.
    pub fn complete(&mut self, response: PageResponse<S, T>) -> Completed<S> {
        let outcome = self.cache.complete(response);
        let requests = match outcome {
            CompletionOutcome::Merged {
                total_count: _total_count,
                ..
            } => {
                ldebug!(total_count = _total_count, "page merged");
                self.sync()
            }
            CompletionOutcome::Failed { .. } | CompletionOutcome::Stale => Vec::new(),
        };
        Completed { outcome, requests }
    }

    /// Calls `f` for each index in the virtual range with its load state.
    pub fn for_each_row(&self, mut f: impl FnMut(usize, RowState<'_, T>)) {
        let cache = &self.cache;
        self.v
            .for_each_virtual_index(|index| f(index, cache.row_state(index)));
    }

    /// Runs `requests` against `source` one after another, merges the results, and returns the
    /// follow-up fetches. Loop until it returns nothing to fill the viewport.
    pub async fn fetch_round<P: PageSource<S, T>>(
        &mut self,
        source: &P,
        requests: Vec<PageRequest<S>>,
    ) -> Vec<PageRequest<S>> {
        let responses = fetch_all(source, requests).await;
        let mut next = Vec::new();
        for response in responses {
            next.extend(self.complete(response).requests);
        }
        next
    }
}
