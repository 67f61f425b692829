use std::collections::HashMap;

use window_cache::{
    FetchRange, HierarchicalLazyTree, LookupError, NodeData, Page, PageRequest, PageResponse,
    ParentDescriptor, ParentLookup, TreeOptions, TreeRow, build_subtree,
};

// region -> depot -> bay
struct Sites(HashMap<u32, NodeData<u32>>);

impl Sites {
    fn new() -> Self {
        let nodes = [
            NodeData::new(1, "North", None, true),
            NodeData::new(2, "South", None, true),
            NodeData::new(10, "Depot A", Some(1), true),
            NodeData::new(11, "Depot B", Some(1), false),
            NodeData::new(100, "Bay 1", Some(10), false),
            NodeData::new(101, "Bay 2", Some(10), false),
        ];
        Self(nodes.into_iter().map(|n| (n.id, n)).collect())
    }

    fn children(&self, request: PageRequest<u32>) -> PageResponse<u32, NodeData<u32>> {
        let mut level: Vec<&NodeData<u32>> = self
            .0
            .values()
            .filter(|n| n.parent_id == request.scope)
            .collect();
        level.sort_by_key(|n| n.id);
        let items = level
            .iter()
            .skip(request.range.start)
            .take(request.range.len())
            .map(|n| (*n).clone())
            .collect();
        let total = level.len();
        request.respond(Ok(Page::new(items, total)))
    }
}

impl ParentLookup<u32> for Sites {
    async fn fetch_parent(&self, id: &u32) -> Result<Option<ParentDescriptor<u32>>, LookupError> {
        let node = self
            .0
            .get(id)
            .ok_or_else(|| LookupError::NotFound(id.to_string()))?;
        match node.parent_id {
            None => Ok(None),
            Some(parent) => Ok(self.0.get(&parent).cloned()),
        }
    }
}

fn print(tree: &HierarchicalLazyTree<u32>) {
    for row in tree.visible_rows() {
        let indent = "  ".repeat(row.depth());
        match row {
            TreeRow::Node { node, .. } => {
                let marker = if node.is_expanded() { "-" } else { "+" };
                println!("{indent}{marker} {}", node.label());
            }
            TreeRow::Placeholder { index, .. } => println!("{indent}  (loading #{index})"),
        }
    }
}

fn main() {
    let sites = Sites::new();
    let mut tree: HierarchicalLazyTree<u32> =
        HierarchicalLazyTree::new(TreeOptions::new().with_page_size(20));
    for request in tree.request_roots(FetchRange::new(0, 19)) {
        tree.complete(sites.children(request));
    }

    // Jump to "Bay 2": resolve its ancestors and pre-expand them.
    let outcome = pollster::block_on(tree.reveal(&sites, &101));
    let path: Vec<u32> = outcome.path.ids().copied().collect();
    println!("ancestors of 101: {path:?}");
    if let Some(branch) = build_subtree(&outcome.path.chain) {
        println!("branch root: {}", branch.node.label);
    }

    println!("before children arrive:");
    print(&tree);

    for request in outcome.requests {
        tree.complete(sites.children(request));
    }
    println!("after:");
    print(&tree);
}
