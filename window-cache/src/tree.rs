use alloc::string::String;
use alloc::vec::Vec;

use crate::key::KeyMap;
use crate::source::ParentLookup;
use crate::{
    CacheOptions, CompletionOutcome, FetchRange, Identity, LookupError, PageRequest, PageResponse,
    TreeOptions, WindowedCollectionCache,
};

/// A tree node as described by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeData<I> {
    pub id: I,
    pub label: String,
    /// `None` for roots.
    pub parent_id: Option<I>,
    /// Declared by the server; independent of whether children were ever fetched.
    pub has_children: bool,
}

impl<I> NodeData<I> {
    pub fn new(id: I, label: impl Into<String>, parent_id: Option<I>, has_children: bool) -> Self {
        Self {
            id,
            label: label.into(),
            parent_id,
            has_children,
        }
    }
}

/// What a parent lookup returns: the parent's own node description.
pub type ParentDescriptor<I> = NodeData<I>;

/// A window over one level of the tree: the roots, or the children of one node.
pub type ChildWindow<I> = WindowedCollectionCache<NodeData<I>, I>;

/// A node known to the tree, with its lazily created child window.
#[derive(Clone, Debug)]
pub struct TreeNode<I> {
    data: NodeData<I>,
    expanded: bool,
    child_window: Option<ChildWindow<I>>,
}

impl<I> TreeNode<I> {
    fn new(data: NodeData<I>) -> Self {
        Self {
            data,
            expanded: false,
            child_window: None,
        }
    }

    pub fn data(&self) -> &NodeData<I> {
        &self.data
    }

    pub fn id(&self) -> &I {
        &self.data.id
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn parent_id(&self) -> Option<&I> {
        self.data.parent_id.as_ref()
    }

    pub fn has_children(&self) -> bool {
        self.data.has_children
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Indices in this window are positions among this node's children only.
    pub fn child_window(&self) -> Option<&ChildWindow<I>> {
        self.child_window.as_ref()
    }
}

/// One flattened row of the visible tree.
#[derive(Debug)]
pub enum TreeRow<'a, I> {
    Node {
        depth: usize,
        node: &'a TreeNode<I>,
    },
    /// A slot of a level whose row has not been fetched yet.
    Placeholder {
        depth: usize,
        parent: Option<&'a I>,
        index: usize,
    },
}

impl<I> TreeRow<'_, I> {
    pub fn depth(&self) -> usize {
        match self {
            Self::Node { depth, .. } | Self::Placeholder { depth, .. } => *depth,
        }
    }
}

/// Ancestors of a node, nearest parent first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AncestorPath<I> {
    pub chain: Vec<ParentDescriptor<I>>,
    /// Set when the walk stopped on a failed lookup; `chain` holds what was resolved before it.
    pub interrupted: Option<LookupError>,
}

impl<I> AncestorPath<I> {
    pub fn ids(&self) -> impl Iterator<Item = &I> {
        self.chain.iter().map(|p| &p.id)
    }

    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// A single-branch display tree built from an ancestor chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubtreeNode<I> {
    pub node: ParentDescriptor<I>,
    pub children: Vec<SubtreeNode<I>>,
}

/// Stamps an ancestor walk so that a newer walk supersedes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealTicket {
    seq: u64,
}

/// Result of [`HierarchicalLazyTree::reveal`].
#[derive(Clone, Debug)]
pub struct RevealOutcome<I> {
    pub path: AncestorPath<I>,
    /// Child-window fetches issued by expanding the path.
    pub requests: Vec<PageRequest<I>>,
}

/// Walks parent links one point lookup at a time, starting at `leaf`.
///
/// The walk ends at a node without a parent. A failed lookup ends it early and the partial chain
/// is returned with the error; so does a repeated id or reaching `max_depth` hops.
pub async fn resolve_ancestor_path<I, L>(lookup: &L, leaf: &I, max_depth: usize) -> AncestorPath<I>
where
    I: Identity,
    L: ParentLookup<I>,
{
    let mut chain: Vec<ParentDescriptor<I>> = Vec::new();
    let mut interrupted = None;
    let mut current = leaf.clone();

    loop {
        if chain.len() >= max_depth {
            cwarn!(max_depth, "ancestor walk hit depth limit");
            break;
        }
        match lookup.fetch_parent(&current).await {
            Ok(None) => break,
            Ok(Some(parent)) => {
                if parent.id == *leaf || chain.iter().any(|p| p.id == parent.id) {
                    cwarn!(depth = chain.len(), "ancestor walk found a cycle");
                    break;
                }
                let is_root = parent.parent_id.is_none();
                current = parent.id.clone();
                chain.push(parent);
                if is_root {
                    break;
                }
            }
            Err(error) => {
                cwarn!(depth = chain.len(), error = %error, "ancestor walk interrupted");
                interrupted = Some(error);
                break;
            }
        }
    }

    AncestorPath { chain, interrupted }
}

/// Nests an ancestor chain (nearest first) into one branch rooted at the furthest ancestor.
///
/// Each node gets exactly one child, the next-nearer ancestor. Siblings are not populated; they
/// stay behind each node's own child window. Assumes a single path to the root.
pub fn build_subtree<I: Clone>(chain: &[ParentDescriptor<I>]) -> Option<SubtreeNode<I>> {
    let mut ancestors = chain.iter();
    let nearest = ancestors.next()?;
    let mut subtree = SubtreeNode {
        node: nearest.clone(),
        children: Vec::new(),
    };
    for ancestor in ancestors {
        subtree = SubtreeNode {
            node: ancestor.clone(),
            children: alloc::vec![subtree],
        };
    }
    Some(subtree)
}

/// A tree whose levels are loaded lazily, one [`ChildWindow`] per expanded node.
///
/// There is no global index space: the roots live in their own window (scope `None`) and every
/// node's children in a window scoped to that node's id. Page responses are routed back by the
/// scope they were issued with, see [`HierarchicalLazyTree::complete`].
///
/// Node ids are assumed unique across the whole tree.
#[derive(Clone, Debug)]
pub struct HierarchicalLazyTree<I> {
    options: TreeOptions,
    roots: ChildWindow<I>,
    nodes: KeyMap<I, TreeNode<I>>,
    reveal_seq: u64,
    /// First generation for newly created child windows; above every torn-down window's.
    window_floor: u64,
}

impl<I: Identity> HierarchicalLazyTree<I> {
    pub fn new(options: TreeOptions) -> Self {
        Self {
            roots: WindowedCollectionCache::new(Self::level_options(&options, None)),
            options,
            nodes: KeyMap::default(),
            reveal_seq: 0,
            window_floor: 0,
        }
    }

    fn level_options(options: &TreeOptions, scope: Option<I>) -> CacheOptions<I> {
        let mut level = CacheOptions::new().with_page_size(options.page_size);
        level.scope = scope;
        level
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    pub fn roots(&self) -> &ChildWindow<I> {
        &self.roots
    }

    pub fn node(&self, id: &I) -> Option<&TreeNode<I>> {
        self.nodes.get(id)
    }

    /// Number of nodes registered so far (fetched or revealed).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_expanded(&self, id: &I) -> bool {
        self.nodes.get(id).is_some_and(|n| n.expanded)
    }

    pub fn request_roots(&mut self, range: FetchRange) -> Vec<PageRequest<I>> {
        self.roots.request(range)
    }

    /// Requests a range of `parent`'s children (e.g. when its child list scrolls).
    ///
    /// Does nothing until the node has been expanded once.
    pub fn request_children(&mut self, parent: &I, range: FetchRange) -> Vec<PageRequest<I>> {
        match self.nodes.get_mut(parent).and_then(|n| n.child_window.as_mut()) {
            Some(window) => window.request(range),
            None => Vec::new(),
        }
    }

    /// Registers a node described out of band (e.g. by an ancestor lookup).
    ///
    /// An already known node keeps its expansion state and child window.
    pub fn insert_node(&mut self, data: NodeData<I>) {
        match self.nodes.get_mut(&data.id) {
            Some(node) => node.data = data,
            None => {
                self.nodes.insert(data.id.clone(), TreeNode::new(data));
            }
        }
    }

    /// Marks a node expanded. The first expansion creates its child window (scope = node id,
    /// empty search term) and requests the first page.
    ///
    /// Nodes the server declared childless are expanded without a fetch.
    pub fn expand(&mut self, id: &I) -> Vec<PageRequest<I>> {
        let Some(node) = self.nodes.get_mut(id) else {
            cwarn!("expand: unknown node");
            return Vec::new();
        };
        node.expanded = true;
        if node.child_window.is_some() || !node.data.has_children {
            return Vec::new();
        }

        let mut window = WindowedCollectionCache::starting_at(
            Self::level_options(&self.options, Some(id.clone())),
            self.window_floor,
        );
        let requests = window.request(FetchRange::new(0, self.options.page_size.max(1) - 1));
        node.child_window = Some(window);
        requests
    }

    /// Marks a node collapsed. Its child window is kept, so re-expanding costs nothing.
    pub fn collapse(&mut self, id: &I) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.expanded => {
                node.expanded = false;
                true
            }
            _ => false,
        }
    }

    pub fn toggle_expanded(&mut self, id: &I) -> Vec<PageRequest<I>> {
        if self.is_expanded(id) {
            self.collapse(id);
            Vec::new()
        } else {
            self.expand(id)
        }
    }

    /// Routes a page response to the window that issued it and registers the fetched nodes.
    ///
    /// Responses for nodes that have since been removed are dropped.
    pub fn complete(&mut self, response: PageResponse<I, NodeData<I>>) -> CompletionOutcome {
        let (outcome, fetched) = match response.scope.clone() {
            None => {
                let outcome = self.roots.complete(response);
                (outcome, Self::collect_level(&self.roots, outcome))
            }
            Some(parent) => {
                let Some(window) = self
                    .nodes
                    .get_mut(&parent)
                    .and_then(|n| n.child_window.as_mut())
                else {
                    ctrace!("dropping page for a node that no longer exists");
                    return CompletionOutcome::Stale;
                };
                let outcome = window.complete(response);
                (outcome, Self::collect_level(window, outcome))
            }
        };

        for data in fetched {
            self.insert_node(data);
        }
        outcome
    }

    fn collect_level(window: &ChildWindow<I>, outcome: CompletionOutcome) -> Vec<NodeData<I>> {
        let CompletionOutcome::Merged { range, .. } = outcome else {
            return Vec::new();
        };
        range
            .indices()
            .filter_map(|index| window.get(index).cloned())
            .collect()
    }

    /// Refetches one level after its membership changed. `None` addresses the roots.
    pub fn invalidate_level(&mut self, parent: Option<&I>) -> Option<PageRequest<I>> {
        match parent {
            None => self.roots.invalidate_and_refetch_loaded(),
            Some(id) => self
                .nodes
                .get_mut(id)
                .and_then(|n| n.child_window.as_mut())
                .and_then(|w| w.invalidate_and_refetch_loaded()),
        }
    }

    /// Forgets a node and every registered descendant (e.g. after it was deleted), then
    /// refetches the level that contained it.
    ///
    /// Late page responses for the removed windows are dropped by `complete`, including after
    /// the same id is registered and expanded again.
    pub fn remove_node(&mut self, id: &I) -> Option<PageRequest<I>> {
        let removed = self.nodes.remove(id)?;
        self.retire_window(&removed);
        let mut pending = alloc::vec![removed.data.id];
        while let Some(parent) = pending.pop() {
            let children: Vec<I> = self
                .nodes
                .values()
                .filter(|n| n.data.parent_id.as_ref() == Some(&parent))
                .map(|n| n.data.id.clone())
                .collect();
            for child in children {
                if let Some(node) = self.nodes.remove(&child) {
                    self.retire_window(&node);
                }
                pending.push(child);
            }
        }
        self.invalidate_level(removed.data.parent_id.as_ref())
    }

    fn retire_window(&mut self, node: &TreeNode<I>) {
        if let Some(window) = &node.child_window {
            self.window_floor = self.window_floor.max(window.generation().wrapping_add(1));
        }
    }

    /// Starts an ancestor walk. Any walk started earlier becomes stale.
    pub fn begin_reveal(&mut self) -> RevealTicket {
        self.reveal_seq = self.reveal_seq.wrapping_add(1);
        RevealTicket {
            seq: self.reveal_seq,
        }
    }

    /// Applies a resolved ancestor path: registers the ancestors and expands them from the
    /// furthest down to the nearest.
    ///
    /// A partial path expands as far as it goes. A stale ticket is ignored.
    pub fn finish_reveal(
        &mut self,
        ticket: RevealTicket,
        path: &AncestorPath<I>,
    ) -> Vec<PageRequest<I>> {
        if ticket.seq != self.reveal_seq {
            cdebug!(ticket = ticket.seq, current = self.reveal_seq, "stale reveal ignored");
            return Vec::new();
        }

        let mut requests = Vec::new();
        for ancestor in path.chain.iter().rev() {
            self.insert_node(ancestor.clone());
            requests.extend(self.expand(&ancestor.id));
        }
        requests
    }

    /// Resolves the ancestors of `leaf` through `lookup` and pre-expands them.
    ///
    /// The tree stays mutably borrowed for the whole walk, so no page can be completed and no
    /// other reveal can start meanwhile. Adapters that need either should pair
    /// [`begin_reveal`](Self::begin_reveal) and [`finish_reveal`](Self::finish_reveal) around
    /// their own [`resolve_ancestor_path`] call.
    pub async fn reveal<L: ParentLookup<I>>(&mut self, lookup: &L, leaf: &I) -> RevealOutcome<I> {
        let ticket = self.begin_reveal();
        let path = resolve_ancestor_path(lookup, leaf, self.options.max_ancestor_depth).await;
        let requests = self.finish_reveal(ticket, &path);
        RevealOutcome { path, requests }
    }

    /// Flattens the expanded part of the tree into rows, depth first.
    ///
    /// Every slot of a loaded level yields a row; slots that are not fetched yet yield
    /// placeholders, so the result can be fed straight to a virtualizer.
    pub fn visible_rows(&self) -> Vec<TreeRow<'_, I>> {
        let mut rows = Vec::new();
        self.push_level(&self.roots, None, 0, &mut rows);
        rows
    }

    fn push_level<'a>(
        &'a self,
        window: &'a ChildWindow<I>,
        parent: Option<&'a I>,
        depth: usize,
        out: &mut Vec<TreeRow<'a, I>>,
    ) {
        if depth > self.options.max_ancestor_depth {
            return;
        }
        for index in 0..window.row_count_hint() {
            let Some(node) = window.get(index).and_then(|d| self.nodes.get(&d.id)) else {
                out.push(TreeRow::Placeholder {
                    depth,
                    parent,
                    index,
                });
                continue;
            };
            out.push(TreeRow::Node { depth, node });
            if let (true, Some(children)) = (node.expanded, node.child_window.as_ref()) {
                self.push_level(children, Some(&node.data.id), depth + 1, out);
            }
        }
    }
}
