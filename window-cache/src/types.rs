use alloc::string::String;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

use crate::FetchError;

/// An inclusive index range `[start, end]` over a collection's absolute index space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchRange {
    pub start: usize,
    pub end: usize, // inclusive
}

#[allow(clippy::len_without_is_empty)]
impl FetchRange {
    /// Creates a range; the bounds are swapped if given in reverse order.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// Converts a half-open `[start, end_exclusive)` range (as produced by most virtualizers).
    ///
    /// Returns `None` for an empty range.
    pub fn from_exclusive(start: usize, end_exclusive: usize) -> Option<Self> {
        if start >= end_exclusive {
            return None;
        }
        Some(Self {
            start,
            end: end_exclusive - 1,
        })
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn overlaps(&self, other: &FetchRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Identifies one issued fetch. Ids are unique per cache and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(pub u64);

/// A fetch the embedding adapter must execute.
///
/// The request carries everything the fetch contract needs (scope, range, search term) plus the
/// generation it was issued under. Hand the result back through [`PageRequest::respond`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest<S> {
    pub id: RequestId,
    pub generation: u64,
    pub scope: Option<S>,
    pub range: FetchRange,
    pub search_term: String,
}

impl<S> PageRequest<S> {
    pub fn start_index(&self) -> usize {
        self.range.start
    }

    pub fn end_index_inclusive(&self) -> usize {
        self.range.end
    }

    /// Pairs this request with the outcome of executing it.
    pub fn respond<T>(self, result: Result<Page<T>, FetchError>) -> PageResponse<S, T> {
        PageResponse {
            id: self.id,
            generation: self.generation,
            scope: self.scope,
            range: self.range,
            result,
        }
    }
}

/// One page as returned by the server.
///
/// `items[i]` belongs at absolute index `range.start + i`. The list may be shorter than the
/// requested range when it is truncated by `total_count`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: usize) -> Self {
        Self { items, total_count }
    }
}

/// The result of a [`PageRequest`], ready to be fed back into the cache that issued it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageResponse<S, T> {
    pub id: RequestId,
    pub generation: u64,
    pub scope: Option<S>,
    pub range: FetchRange,
    pub result: Result<Page<T>, FetchError>,
}

/// What `complete` did with a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Items were merged at their absolute indices.
    Merged { range: FetchRange, total_count: usize },
    /// The fetch failed; the range was released and marked failed.
    Failed { range: FetchRange },
    /// The response belonged to a superseded generation (or an unknown request) and was dropped.
    Stale,
}

/// Per-index load state, for rendering rows and placeholders.
#[derive(Debug, PartialEq, Eq)]
pub enum RowState<'a, T> {
    /// Never requested (or released without an error).
    Unrequested,
    /// Covered by a fetch that has not resolved yet.
    Loading,
    Loaded(&'a T),
    /// The last fetch covering this index failed.
    Failed(&'a FetchError),
    /// `index >= total_count`.
    OutOfRange,
}

impl<T> Clone for RowState<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RowState<'_, T> {}

impl<'a, T> RowState<'a, T> {
    pub fn item(&self) -> Option<&'a T> {
        match self {
            Self::Loaded(item) => Some(item),
            _ => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// A lightweight snapshot of a window's bookkeeping, for diagnostics and status bars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStats {
    pub generation: u64,
    pub total_count: Option<usize>,
    pub loaded: usize,
    pub in_flight: usize,
    pub failed_ranges: usize,
    pub highest_requested_index: Option<usize>,
    pub fully_loaded: bool,
}

/// Which list of a relation editor an item is shown in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    /// Already part of the relation.
    Related,
    /// Eligible, but not part of the relation.
    Unrelated,
}

/// Direction of a relation mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Add,
    Remove,
}
