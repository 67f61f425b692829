//! Windowed, generation-stamped caches for server-backed collections.
//!
//! A virtualized viewport only ever needs the rows it can see. This crate keeps a sparse,
//! index-addressed copy of a remote collection and fetches exactly the gaps the viewport asks
//! for, while the collection may be searched and mutated from the same screen:
//!
//! - [`WindowedCollectionCache`]: one collection under one search term. Gaps are fetched on
//!   demand, overlapping requests are deduplicated, and results from superseded generations are
//!   discarded.
//! - [`HierarchicalLazyTree`]: one cache per expanded node, plus ancestor-path resolution to
//!   pre-expand the way to a selected node.
//! - [`DualListRelationEditor`]: two caches over the two sides of a many-to-many relation, with
//!   a staged selection and a commit that refetches both sides after it settles.
//!
//! The crate is sans-IO: operations return request values and the adapter feeds results back.
//! The [`source`] module has async traits and helpers for adapters that want to `await` their
//! data source instead. For binding a cache to the `virtualizer` crate, see
//! `window-cache-adapter`.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod error;
mod key;
mod options;
mod relation;
pub mod source;
mod tree;
mod types;
mod window;


pub use cache::WindowedCollectionCache;
pub use error::{FetchError, LookupError, MutationError};
pub use key::Identity;
pub use options::{
    CacheOptions, DEFAULT_MAX_ANCESTOR_DEPTH, DEFAULT_PAGE_SIZE, EditorOptions, TreeOptions,
};
pub use relation::{
    CommitOutcome, CommitPlan, CommitState, DualListRelationEditor, EditorFetch, MutationReceipt,
    MutationRequest, Notification, NotificationKind, RelationSelection,
};
pub use source::{PageSource, ParentLookup, RelationMutator};
pub use tree::{
    AncestorPath, ChildWindow, HierarchicalLazyTree, NodeData, ParentDescriptor, RevealOutcome,
    RevealTicket, SubtreeNode, TreeNode, TreeRow, build_subtree, resolve_ancestor_path,
};
pub use types::{
    CompletionOutcome, Direction, FetchRange, Page, PageRequest, PageResponse, RequestId,
    RowState, Side, WindowStats,
};
pub use window::{CollectionWindow, FailedRange};
