use crate::*;

use std::string::{String, ToString};
use std::vec::Vec;
use std::{format, vec};

use window_cache::{
    CacheOptions, CompletionOutcome, FetchError, FetchRange, Page, PageRequest, PageResponse,
    PageSource, RowState,
};

fn respond(request: PageRequest<()>, total: usize) -> PageResponse<(), String> {
    let items = request
        .range
        .indices()
        .take_while(|&i| i < total)
        .map(|i| format!("row-{i}"))
        .collect();
    request.respond(Ok(Page::new(items, total)))
}

fn list(page_size: usize) -> WindowedList<String> {
    WindowedList::new(CacheOptions::new().with_page_size(page_size), 1)
}

struct Rows(usize);

impl PageSource<(), String> for Rows {
    async fn fetch_page(&self, request: &PageRequest<()>) -> Result<Page<String>, FetchError> {
        let items = request
            .range
            .indices()
            .take_while(|&i| i < self.0)
            .map(|i| format!("row-{i}"))
            .collect();
        Ok(Page::new(items, self.0))
    }
}

#[test]
fn unknown_total_renders_one_loading_row() {
    let mut l = list(20);
    assert_eq!(l.virtualizer().count(), 1);

    let reqs = l.on_viewport_size(10);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].range, FetchRange::new(0, 19));

    let mut rows = Vec::new();
    l.for_each_row(|i, state| rows.push((i, state.is_loaded(), state == RowState::Loading)));
    assert_eq!(rows, vec![(0, false, true)]);
}

#[test]
fn merged_page_updates_the_count() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);

    let done = l.complete(respond(req, 237));
    assert!(matches!(
        done.outcome,
        CompletionOutcome::Merged {
            total_count: 237,
            ..
        }
    ));
    // the first page covers the viewport and its overscan
    assert!(done.requests.is_empty());
    assert_eq!(l.virtualizer().count(), 237);

    let mut loaded = 0;
    l.for_each_row(|_, state| {
        if state.is_loaded() {
            loaded += 1;
        }
    });
    assert!(loaded >= 10);
}

#[test]
fn scrolling_to_the_tail_fetches_only_the_tail() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);
    l.complete(respond(req, 237));

    let reqs = l.on_scroll(10_000, 0);
    assert_eq!(l.virtualizer().scroll_offset(), 227);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].range, FetchRange::new(220, 236));

    let done = l.complete(respond(reqs.into_iter().next().unwrap(), 237));
    assert!(done.requests.is_empty());
    assert!(l.cache().is_row_loaded(236));
    assert!(!l.cache().is_row_loaded(237));
    assert!(l.cache().is_fully_loaded());
}

#[test]
fn search_change_starts_over_at_the_top() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);
    let stale = {
        l.complete(respond(req, 237));
        l.on_scroll(100, 0).remove(0)
    };

    let reqs = l.set_search_term("truck");
    assert_eq!(l.virtualizer().scroll_offset(), 0);
    assert_eq!(l.virtualizer().count(), 1);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].search_term, "truck");

    let done = l.complete(respond(stale, 237));
    assert_eq!(done.outcome, CompletionOutcome::Stale);
    assert!(done.requests.is_empty());
    assert_eq!(l.virtualizer().count(), 1);

    assert!(l.set_search_term("truck").is_empty());
}

#[test]
fn failed_page_is_retried_on_the_next_sync() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);
    let done = l.complete(req.respond(Err(FetchError::Transport("offline".to_string()))));
    assert!(matches!(done.outcome, CompletionOutcome::Failed { .. }));
    assert!(done.requests.is_empty());

    let mut failed = false;
    l.for_each_row(|_, state| failed |= matches!(state, RowState::Failed(_)));
    assert!(failed);

    let retry = l.sync();
    assert_eq!(retry.len(), 1);
    assert_eq!(retry[0].range, FetchRange::new(0, 19));
}

#[test]
fn invalidate_keeps_count_until_refetch_lands() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);
    l.complete(respond(req, 237));

    let refetch = l.invalidate().unwrap();
    assert_eq!(refetch.range.start, 0);
    assert_eq!(l.virtualizer().count(), 237);

    l.complete(respond(refetch, 5));
    assert_eq!(l.virtualizer().count(), 5);
    assert_eq!(l.stats().total_count, Some(5));
}

#[test]
fn empty_collection_requests_nothing_more() {
    let mut l = list(20);
    let req = l.on_viewport_size(10).remove(0);
    let done = l.complete(respond(req, 0));
    assert!(done.requests.is_empty());
    assert_eq!(l.virtualizer().count(), 0);
    assert!(l.sync().is_empty());
}

#[test]
fn fetch_rounds_fill_the_viewport() {
    let source = Rows(100);
    let mut l = list(5);
    let mut reqs = l.on_viewport_size(10);
    let mut rounds = 0;
    while !reqs.is_empty() {
        rounds += 1;
        assert!(rounds < 10);
        reqs = pollster::block_on(l.fetch_round(&source, reqs));
    }
    assert_eq!(rounds, 2);

    l.for_each_row(|i, state| assert!(state.is_loaded(), "row {i} not loaded"));
    assert_eq!(l.virtualizer().count(), 100);
}
