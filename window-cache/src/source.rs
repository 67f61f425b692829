//! Async boundary traits for the three external contracts the caches consume.
//!
//! None of these are required: the caches only produce and consume plain request/response
//! values. The traits and helpers here are for adapters that prefer to `await` a data source.

use core::future::Future;

use alloc::vec::Vec;

use crate::tree::ParentDescriptor;
use crate::{
    Direction, FetchError, LookupError, MutationError, MutationReceipt, Page, PageRequest,
    PageResponse,
};

/// Serves windows of a collection: `items` for `[start, end]` plus the current total.
///
/// Timeouts belong to the implementation; a future that never resolves simply leaves its rows
/// in the loading state.
pub trait PageSource<S, T> {
    fn fetch_page(
        &self,
        request: &PageRequest<S>,
    ) -> impl Future<Output = Result<Page<T>, FetchError>>;
}

/// Point lookup of a node's parent. `Ok(None)` means the node is a root.
pub trait ParentLookup<I> {
    fn fetch_parent(
        &self,
        id: &I,
    ) -> impl Future<Output = Result<Option<ParentDescriptor<I>>, LookupError>>;
}

/// Adds identities to, or removes them from, the relation owned by `owner`.
pub trait RelationMutator<K> {
    fn apply_relation_change(
        &self,
        owner: &K,
        identities: &[K],
        direction: Direction,
    ) -> impl Future<Output = Result<MutationReceipt, MutationError>>;
}

/// Executes one request against `source` and pairs it with the result.
pub async fn fetch<S, T, P>(source: &P, request: PageRequest<S>) -> PageResponse<S, T>
where
    P: PageSource<S, T>,
{
    let result = source.fetch_page(&request).await;
    request.respond(result)
}

/// Executes requests one after another, preserving their order.
pub async fn fetch_all<S, T, P>(
    source: &P,
    requests: impl IntoIterator<Item = PageRequest<S>>,
) -> Vec<PageResponse<S, T>>
where
    P: PageSource<S, T>,
{
    let mut out = Vec::new();
    for request in requests {
        out.push(fetch(source, request).await);
    }
    out
}
