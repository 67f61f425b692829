use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::key::KeySet;
use crate::source::RelationMutator;
use crate::{
    CacheOptions, CompletionOutcome, Direction, EditorOptions, FetchRange, Identity,
    MutationError, PageRequest, PageResponse, Side, WindowedCollectionCache,
};

/// Identities staged for linking and unlinking.
///
/// An identity is never in both sets. Toggling an identity that is already staged unstages it;
/// toggling it again from the same side stages it again. Selection records intent to flip, not a
/// target value.
#[derive(Clone, Debug)]
pub struct RelationSelection<K> {
    to_link: KeySet<K>,
    to_unlink: KeySet<K>,
}

impl<K: Identity> Default for RelationSelection<K> {
    fn default() -> Self {
        Self {
            to_link: KeySet::default(),
            to_unlink: KeySet::default(),
        }
    }
}

impl<K: Identity> PartialEq for RelationSelection<K> {
    fn eq(&self, other: &Self) -> bool {
        self.to_link == other.to_link && self.to_unlink == other.to_unlink
    }
}

impl<K: Identity> Eq for RelationSelection<K> {}

impl<K: Identity> RelationSelection<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips `identity`. Items toggled on the unrelated side are staged for linking, items on
    /// the related side for unlinking.
    pub fn toggle(&mut self, identity: K, side: Side) {
        if self.to_link.remove(&identity) || self.to_unlink.remove(&identity) {
            return;
        }
        match side {
            Side::Unrelated => self.to_link.insert(identity),
            Side::Related => self.to_unlink.insert(identity),
        };
    }

    pub fn staged_for(&self, identity: &K) -> Option<Direction> {
        if self.to_link.contains(identity) {
            Some(Direction::Add)
        } else if self.to_unlink.contains(identity) {
            Some(Direction::Remove)
        } else {
            None
        }
    }

    pub fn is_staged(&self, identity: &K) -> bool {
        self.staged_for(identity).is_some()
    }

    pub fn to_link(&self) -> impl Iterator<Item = &K> {
        self.to_link.iter()
    }

    pub fn to_unlink(&self) -> impl Iterator<Item = &K> {
        self.to_unlink.iter()
    }

    pub fn link_len(&self) -> usize {
        self.to_link.len()
    }

    pub fn unlink_len(&self) -> usize {
        self.to_unlink.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_link.is_empty() && self.to_unlink.is_empty()
    }

    pub fn clear(&mut self) {
        self.to_link.clear();
        self.to_unlink.clear();
    }
}

/// What the server said about a successful mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationReceipt {
    pub message: String,
}

impl MutationReceipt {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One mutation call the adapter must execute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRequest<K> {
    pub cycle: u64,
    pub owner: K,
    pub identities: Vec<K>,
    pub direction: Direction,
}

/// The calls a commit needs: at most one per direction. Run them concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPlan<K> {
    pub cycle: u64,
    pub link: Option<MutationRequest<K>>,
    pub unlink: Option<MutationRequest<K>>,
}

impl<K> CommitPlan<K> {
    pub fn legs(&self) -> impl Iterator<Item = &MutationRequest<K>> {
        self.link.iter().chain(self.unlink.iter())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NotificationKind {
    Success,
    Failure,
}

/// A user-facing message about one (or two coalesced) mutation calls.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

/// A page fetch issued by the editor, tagged with the list it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorFetch<K> {
    pub side: Side,
    pub request: PageRequest<K>,
}

/// Everything that follows a settled commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome<K> {
    pub notifications: Vec<Notification>,
    /// One refetch per list that had anything requested.
    pub refetch: Vec<EditorFetch<K>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommitState {
    Idle,
    Submitting,
}

#[derive(Clone, Debug)]
struct PendingCommit {
    cycle: u64,
    link_pending: bool,
    unlink_pending: bool,
    notifications: Vec<Notification>,
}

/// Two windowed lists over a many-to-many relation plus a staged edit set.
///
/// `related` holds what is already in the relation (scoped by the owner id), `unrelated` what
/// could be added. Edits are staged with [`toggle`] and sent with [`commit`]; afterwards both
/// lists are refetched from the server instead of being patched locally, since the server
/// decides membership, ordering and totals.
///
/// [`toggle`]: DualListRelationEditor::toggle
/// [`commit`]: DualListRelationEditor::commit
#[derive(Clone, Debug)]
pub struct DualListRelationEditor<K, T> {
    owner: K,
    related: WindowedCollectionCache<T, K>,
    unrelated: WindowedCollectionCache<T, K>,
    selection: RelationSelection<K>,
    pending: Option<PendingCommit>,
    cycle: u64,
}

impl<K: Identity, T> DualListRelationEditor<K, T> {
    pub fn new(owner: K, options: EditorOptions<K>) -> Self {
        let related = CacheOptions::new()
            .with_scope(owner.clone())
            .with_page_size(options.page_size);
        let mut unrelated = CacheOptions::new().with_page_size(options.page_size);
        unrelated.scope = options.unrelated_scope;
        Self {
            owner,
            related: WindowedCollectionCache::new(related),
            unrelated: WindowedCollectionCache::new(unrelated),
            selection: RelationSelection::new(),
            pending: None,
            cycle: 0,
        }
    }

    pub fn owner(&self) -> &K {
        &self.owner
    }

    pub fn related(&self) -> &WindowedCollectionCache<T, K> {
        &self.related
    }

    pub fn unrelated(&self) -> &WindowedCollectionCache<T, K> {
        &self.unrelated
    }

    pub fn cache(&self, side: Side) -> &WindowedCollectionCache<T, K> {
        match side {
            Side::Related => &self.related,
            Side::Unrelated => &self.unrelated,
        }
    }

    fn cache_mut(&mut self, side: Side) -> &mut WindowedCollectionCache<T, K> {
        match side {
            Side::Related => &mut self.related,
            Side::Unrelated => &mut self.unrelated,
        }
    }

    pub fn selection(&self) -> &RelationSelection<K> {
        &self.selection
    }

    pub fn state(&self) -> CommitState {
        if self.pending.is_some() {
            CommitState::Submitting
        } else {
            CommitState::Idle
        }
    }

    /// Switches to another owner. Both lists and the selection are discarded, and a commit
    /// still in flight for the previous owner no longer triggers a refresh.
    pub fn set_owner(&mut self, owner: K) {
        self.related.set_scope(Some(owner.clone()));
        let unrelated_scope = self.unrelated.scope().cloned();
        self.unrelated.set_scope(unrelated_scope);
        self.owner = owner;
        self.selection.clear();
        self.pending = None;
        self.cycle = self.cycle.wrapping_add(1);
    }

    pub fn request(&mut self, side: Side, range: FetchRange) -> Vec<PageRequest<K>> {
        self.cache_mut(side).request(range)
    }

    pub fn set_search_term(&mut self, side: Side, search_term: impl Into<String>) -> bool {
        self.cache_mut(side).set_search_term(search_term)
    }

    pub fn complete_fetch(
        &mut self,
        side: Side,
        response: PageResponse<K, T>,
    ) -> CompletionOutcome {
        self.cache_mut(side).complete(response)
    }

    /// Stages or unstages `identity`. Purely local; no request is produced.
    ///
    /// Ignored (returns `false`) while a commit is submitting.
    pub fn toggle(&mut self, identity: K, side: Side) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.selection.toggle(identity, side);
        true
    }

    pub fn is_staged(&self, identity: &K) -> bool {
        self.selection.is_staged(identity)
    }

    pub fn staged_for(&self, identity: &K) -> Option<Direction> {
        self.selection.staged_for(identity)
    }

    /// Turns the staged selection into at most two independent mutation calls.
    ///
    /// Returns `None` when nothing is staged, or while a previous commit is still submitting.
    pub fn commit(&mut self) -> Option<CommitPlan<K>> {
        if self.pending.is_some() {
            cdebug!(cycle = self.cycle, "commit rejected while submitting");
            return None;
        }
        if self.selection.is_empty() {
            return None;
        }

        self.cycle = self.cycle.wrapping_add(1);
        let cycle = self.cycle;
        let leg = |identities: Vec<K>, direction| {
            (!identities.is_empty()).then(|| MutationRequest {
                cycle,
                owner: self.owner.clone(),
                identities,
                direction,
            })
        };
        let link = leg(self.selection.to_link().cloned().collect(), Direction::Add);
        let unlink = leg(
            self.selection.to_unlink().cloned().collect(),
            Direction::Remove,
        );

        cdebug!(
            cycle,
            link = self.selection.link_len(),
            unlink = self.selection.unlink_len(),
            "commit submitting"
        );
        self.pending = Some(PendingCommit {
            cycle,
            link_pending: link.is_some(),
            unlink_pending: unlink.is_some(),
            notifications: Vec::new(),
        });
        Some(CommitPlan { cycle, link, unlink })
    }

    /// Settles one leg of the commit identified by `cycle`.
    ///
    /// Once every leg has settled, successful or not, the selection is cleared, both lists are
    /// invalidated and the outcome carries the notifications plus the refetch requests. Until
    /// then this returns `None`. Results for an unknown cycle or an already settled leg are
    /// ignored.
    pub fn complete_mutation(
        &mut self,
        cycle: u64,
        direction: Direction,
        result: Result<MutationReceipt, MutationError>,
    ) -> Option<CommitOutcome<K>> {
        let pending = self.pending.as_mut().filter(|p| p.cycle == cycle)?;
        let slot = match direction {
            Direction::Add => &mut pending.link_pending,
            Direction::Remove => &mut pending.unlink_pending,
        };
        if !*slot {
            return None;
        }
        *slot = false;

        let notification = match result {
            Ok(receipt) => Notification {
                kind: NotificationKind::Success,
                message: receipt.message,
            },
            Err(error) => {
                cwarn!(cycle, error = %error, "relation mutation failed");
                Notification {
                    kind: NotificationKind::Failure,
                    message: error.to_string(),
                }
            }
        };
        pending.notifications.push(notification);
        if pending.link_pending || pending.unlink_pending {
            return None;
        }

        let notifications = self.pending.take().map(|p| p.notifications)?;
        self.selection.clear();

        let mut refetch = Vec::new();
        for side in [Side::Related, Side::Unrelated] {
            if let Some(request) = self.cache_mut(side).invalidate_and_refetch_loaded() {
                refetch.push(EditorFetch { side, request });
            }
        }
        Some(CommitOutcome {
            notifications: coalesce(notifications),
            refetch,
        })
    }

    /// Runs [`commit`](Self::commit) through `mutator`, both legs concurrently, and settles it.
    pub async fn commit_with<M: RelationMutator<K>>(
        &mut self,
        mutator: &M,
    ) -> Option<CommitOutcome<K>> {
        let CommitPlan { cycle, link, unlink } = self.commit()?;

        let run = |leg: Option<MutationRequest<K>>| async move {
            match leg {
                Some(req) => Some(
                    mutator
                        .apply_relation_change(&req.owner, &req.identities, req.direction)
                        .await,
                ),
                None => None,
            }
        };
        let (linked, unlinked) = futures_util::future::join(run(link), run(unlink)).await;

        let mut outcome = None;
        if let Some(result) = linked {
            outcome = self.complete_mutation(cycle, Direction::Add, result).or(outcome);
        }
        if let Some(result) = unlinked {
            outcome = self
                .complete_mutation(cycle, Direction::Remove, result)
                .or(outcome);
        }
        outcome
    }
}

fn coalesce(mut notifications: Vec<Notification>) -> Vec<Notification> {
    if let [first, second] = notifications.as_slice() {
        if first.message == second.message {
            let kind = if first.kind == NotificationKind::Failure
                || second.kind == NotificationKind::Failure
            {
                NotificationKind::Failure
            } else {
                NotificationKind::Success
            };
            notifications.truncate(1);
            notifications[0].kind = kind;
        }
    }
    notifications
}
