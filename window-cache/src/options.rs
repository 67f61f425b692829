use alloc::string::String;

/// Default number of rows per fetch when a gap is widened to a page boundary.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default limit on ancestor hops walked by `resolve_ancestor_path`.
pub const DEFAULT_MAX_ANCESTOR_DEPTH: usize = 64;

/// Configuration for [`crate::WindowedCollectionCache`].
///
/// A cache is bound to one logical collection: `scope` (e.g. an owner or parent id, `None` for
/// a global collection) plus `search_term`. Changing either discards the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheOptions<S = ()> {
    pub scope: Option<S>,
    pub search_term: String,
    /// Gaps are widened outward to multiples of this size (never over loaded or in-flight rows).
    ///
    /// `0` or `1` fetches exactly the missing span.
    pub page_size: usize,
}

impl<S> Default for CacheOptions<S> {
    fn default() -> Self {
        Self {
            scope: None,
            search_term: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<S> CacheOptions<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: S) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_search_term(mut self, search_term: impl Into<String>) -> Self {
        self.search_term = search_term.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Configuration for [`crate::HierarchicalLazyTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeOptions {
    /// Page size of every per-node child window, and the size of the initial request on expand.
    pub page_size: usize,
    /// Upper bound on hops in an ancestor walk (and on nesting in `visible_rows`).
    ///
    /// Guards against cyclic parent links coming back from the server.
    pub max_ancestor_depth: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_ancestor_depth: DEFAULT_MAX_ANCESTOR_DEPTH,
        }
    }
}

impl TreeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_ancestor_depth(mut self, max_ancestor_depth: usize) -> Self {
        self.max_ancestor_depth = max_ancestor_depth;
        self
    }
}

/// Configuration for [`crate::DualListRelationEditor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorOptions<K> {
    pub page_size: usize,
    /// Scope of the "unrelated" list. `None` queries the global collection; `Some` narrows it to
    /// a sibling filter (e.g. the distributor that owns the candidates).
    pub unrelated_scope: Option<K>,
}

impl<K> Default for EditorOptions<K> {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            unrelated_scope: None,
        }
    }
}

impl<K> EditorOptions<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_unrelated_scope(mut self, scope: Option<K>) -> Self {
        self.unrelated_scope = scope;
        self
    }
}
