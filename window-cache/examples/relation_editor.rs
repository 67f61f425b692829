use std::cell::RefCell;
use std::collections::BTreeSet;

use window_cache::{
    Direction, DualListRelationEditor, EditorOptions, FetchRange, MutationError,
    MutationReceipt, Page, PageRequest, RelationMutator, Side,
};

// A distributor (id 1) and the vehicles assigned to it.
struct Server {
    assigned: RefCell<BTreeSet<u32>>,
}

impl Server {
    fn serve(&self, side: Side, request: &PageRequest<u32>) -> Page<u32> {
        let assigned = self.assigned.borrow();
        let ids: Vec<u32> = (100..108)
            .filter(|id| assigned.contains(id) == (side == Side::Related))
            .collect();
        let items = ids
            .iter()
            .skip(request.range.start)
            .take(request.range.len())
            .copied()
            .collect();
        Page::new(items, ids.len())
    }
}

impl RelationMutator<u32> for Server {
    async fn apply_relation_change(
        &self,
        _owner: &u32,
        identities: &[u32],
        direction: Direction,
    ) -> Result<MutationReceipt, MutationError> {
        let mut assigned = self.assigned.borrow_mut();
        match direction {
            Direction::Add => {
                if identities.contains(&107) {
                    return Err(MutationError::Validation(
                        "vehicle 107 is assigned elsewhere".to_string(),
                    ));
                }
                assigned.extend(identities.iter().copied());
            }
            Direction::Remove => {
                for id in identities {
                    assigned.remove(id);
                }
            }
        }
        Ok(MutationReceipt::new("Vehicles updated"))
    }
}

fn load(editor: &mut DualListRelationEditor<u32, u32>, server: &Server, side: Side) {
    for request in editor.request(side, FetchRange::new(0, 9)) {
        let page = server.serve(side, &request);
        editor.complete_fetch(side, request.respond(Ok(page)));
    }
}

fn print(editor: &DualListRelationEditor<u32, u32>) {
    for side in [Side::Related, Side::Unrelated] {
        let ids: Vec<u32> = editor.cache(side).window().iter().map(|(_, id)| *id).collect();
        println!("  {side:?}: {ids:?}");
    }
}

fn main() {
    let server = Server {
        assigned: RefCell::new([100, 101, 102].into_iter().collect()),
    };
    let mut editor = DualListRelationEditor::new(1, EditorOptions::new().with_page_size(10));
    load(&mut editor, &server, Side::Related);
    load(&mut editor, &server, Side::Unrelated);
    println!("before:");
    print(&editor);

    editor.toggle(103, Side::Unrelated);
    editor.toggle(104, Side::Unrelated);
    editor.toggle(101, Side::Related);

    if let Some(outcome) = pollster::block_on(editor.commit_with(&server)) {
        for notification in &outcome.notifications {
            println!("{:?}: {}", notification.kind, notification.message);
        }
        for fetch in outcome.refetch {
            let page = server.serve(fetch.side, &fetch.request);
            editor.complete_fetch(fetch.side, fetch.request.respond(Ok(page)));
        }
    }
    println!("after:");
    print(&editor);

    // One leg fails; both lists are still refreshed.
    editor.toggle(107, Side::Unrelated);
    editor.toggle(100, Side::Related);
    if let Some(outcome) = pollster::block_on(editor.commit_with(&server)) {
        for notification in &outcome.notifications {
            println!("{:?}: {}", notification.kind, notification.message);
        }
        for fetch in outcome.refetch {
            let page = server.serve(fetch.side, &fetch.request);
            editor.complete_fetch(fetch.side, fetch.request.respond(Ok(page)));
        }
    }
    println!("after partial failure:");
    print(&editor);
}
