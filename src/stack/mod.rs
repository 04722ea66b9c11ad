//! In-memory representation of a stack of diffs.
//!
//! A [Stack] is a doubly linked list of [StackRef]s. The nodes live in an arena and link to one another by
//! [RefId]; the content-addressed SHA of each ref is only an identifier, and is translated to and from links at
//! the persistence boundary ([RefFile]).

use crate::errors::{StError, StResult};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::Index};

mod fmt;
pub use fmt::DisplayRef;

/// The index of a ref within a [Stack]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefId(usize);

/// The on-disk form of a single ref, stored as `<sha>.json` within the stack's directory.
///
/// Links to neighbors are SHAs, with an empty string marking an end of the chain.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefFile {
    /// SHA of the previous ref, or empty if this is the first ref.
    pub prev: String,
    /// The branch holding the diff.
    pub branch: String,
    /// The id of the ref.
    pub sha: String,
    /// SHA of the next ref, or empty if this is the last ref.
    pub next: String,
    /// Web URL of the linked merge request, or empty.
    pub mr: String,
    /// Description of the diff, used as the commit message and merge request title.
    pub description: String,
}

/// The content of a single diff within a [Stack].
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct StackRef {
    /// The content-addressed id of the ref.
    pub sha: String,
    /// The branch holding the diff.
    pub branch: String,
    /// Web URL of the linked merge request, if one was created.
    pub mr: Option<String>,
    /// Description of the diff.
    pub description: String,
}

impl StackRef {
    /// Creates a new [StackRef] without a linked merge request.
    pub fn new(sha: String, branch: String, description: String) -> Self {
        Self {
            sha,
            branch,
            mr: None,
            description,
        }
    }

    /// Returns the first line of the description, truncated to 72 characters.
    pub fn subject(&self) -> String {
        let line = self.description.lines().next().unwrap_or_default();
        if line.chars().count() <= 72 {
            return line.to_string();
        }
        format!("{}...", line.chars().take(69).collect::<String>())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Node {
    data: StackRef,
    prev: Option<RefId>,
    next: Option<RefId>,
}

/// A named, ordered chain of [StackRef]s.
///
/// All stacks loaded from disk pass through [Stack::from_records], which rejects inconsistent chains.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Stack {
    /// The title of the stack.
    title: String,
    /// The arena of nodes. Removed refs leave an empty slot so that outstanding [RefId]s never alias.
    nodes: Vec<Option<Node>>,
    /// Index from SHA to arena slot.
    by_sha: HashMap<String, RefId>,
}

impl Stack {
    /// Creates a new, empty [Stack].
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Assembles a [Stack] from persisted [RefFile]s and validates the chain.
    ///
    /// ## Returns
    /// - `Ok(Stack)` - A stack with exactly one head and one tail, where walking from head to tail visits every
    ///   ref once.
    /// - `Err(StError::CorruptedStack)` - If the records do not form such a chain.
    pub fn from_records(title: impl Into<String>, mut records: Vec<RefFile>) -> StResult<Self> {
        let mut stack = Self::new(title);

        // Keep arena order independent of directory listing order.
        records.sort_by(|a, b| a.sha.cmp(&b.sha));

        for record in &records {
            if record.sha.is_empty() {
                return Err(StError::CorruptedStack(
                    "Found a ref without a SHA.".to_string(),
                ));
            }
            if stack.by_sha.contains_key(&record.sha) {
                return Err(StError::CorruptedStack(format!(
                    "Ref {} is recorded more than once.",
                    record.sha
                )));
            }
            if stack.find_branch(&record.branch).is_some() {
                return Err(StError::CorruptedStack(format!(
                    "Branch {} belongs to more than one ref.",
                    record.branch
                )));
            }

            let id = RefId(stack.nodes.len());
            stack.by_sha.insert(record.sha.clone(), id);
            stack.nodes.push(Some(Node {
                data: StackRef {
                    sha: record.sha.clone(),
                    branch: record.branch.clone(),
                    mr: Some(record.mr.clone()).filter(|mr| !mr.is_empty()),
                    description: record.description.clone(),
                },
                prev: None,
                next: None,
            }));
        }

        // Resolve SHA links into arena links.
        for record in &records {
            let id = stack.by_sha[&record.sha];
            let prev = stack.resolve_link(&record.sha, &record.prev)?;
            let next = stack.resolve_link(&record.sha, &record.next)?;
            if let Some(node) = stack.nodes[id.0].as_mut() {
                node.prev = prev;
                node.next = next;
            }
        }

        stack.validate()?;
        Ok(stack)
    }

    /// Resolves the SHA `target` referenced by the ref `from` into a [RefId].
    fn resolve_link(&self, from: &str, target: &str) -> StResult<Option<RefId>> {
        if target.is_empty() {
            return Ok(None);
        }
        self.by_sha.get(target).copied().map(Some).ok_or_else(|| {
            StError::CorruptedStack(format!(
                "Ref {} points to unknown ref {}.",
                from, target
            ))
        })
    }

    /// Checks the chain invariants of the stack.
    fn validate(&self) -> StResult<()> {
        // Empty stacks are okay.
        if self.is_empty() {
            return Ok(());
        }

        let heads = self.nodes().filter(|(_, n)| n.prev.is_none()).count();
        let tails = self.nodes().filter(|(_, n)| n.next.is_none()).count();
        if heads > 1 || tails > 1 {
            return Err(StError::CorruptedStack(
                "More than one end or start ref detected.".to_string(),
            ));
        }
        if heads != 1 {
            return Err(StError::CorruptedStack(
                "Expected exactly one start ref.".to_string(),
            ));
        }
        if tails != 1 {
            return Err(StError::CorruptedStack(
                "Expected exactly one end ref.".to_string(),
            ));
        }

        for (id, node) in self.nodes() {
            let next_agrees = node.next.map_or(true, |n| self.link(n).prev == Some(id));
            let prev_agrees = node.prev.map_or(true, |p| self.link(p).next == Some(id));
            if !next_agrees || !prev_agrees {
                return Err(StError::CorruptedStack(format!(
                    "Ref {} disagrees with its neighbors about their order.",
                    node.data.sha
                )));
            }
        }

        // With symmetric links and a single head, the walk from the head cannot loop; anything it misses is
        // an orphaned cycle.
        let reachable = self.iter().count();
        if reachable != self.len() {
            return Err(StError::CorruptedStack(format!(
                "{} ref(s) are not reachable from the first ref.",
                self.len() - reachable
            )));
        }

        Ok(())
    }

    /// Returns the title of the stack.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the number of refs in the stack.
    pub fn len(&self) -> usize {
        self.by_sha.len()
    }

    /// Returns `true` if the stack has no refs.
    pub fn is_empty(&self) -> bool {
        self.by_sha.is_empty()
    }

    /// Gets a mutable ref by id. Only the content of the ref may be modified this way; the SHA is the ref's
    /// identity and links are owned by the [Stack].
    pub fn get_mut(&mut self, id: RefId) -> Option<&mut StackRef> {
        self.nodes.get_mut(id.0)?.as_mut().map(|n| &mut n.data)
    }

    /// Returns the first ref of the stack, found by scanning for the ref without a previous link.
    pub fn first(&self) -> Option<RefId> {
        self.nodes()
            .find(|(_, n)| n.prev.is_none())
            .map(|(id, _)| id)
    }

    /// Returns the last ref of the stack, found by scanning for the ref without a next link.
    pub fn last(&self) -> Option<RefId> {
        self.nodes()
            .find(|(_, n)| n.next.is_none())
            .map(|(id, _)| id)
    }

    /// Returns the ref after `id`, if any.
    pub fn next(&self, id: RefId) -> Option<RefId> {
        self.nodes.get(id.0)?.as_ref()?.next
    }

    /// Returns the ref before `id`, if any.
    pub fn prev(&self, id: RefId) -> Option<RefId> {
        self.nodes.get(id.0)?.as_ref()?.prev
    }

    /// Returns an iterator over the ref ids of the stack, from first to last.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self,
            cursor: self.first(),
            remaining: self.len(),
        }
    }

    /// Returns the branch names of the stack, from first to last.
    pub fn branches(&self) -> Vec<String> {
        self.iter().map(|id| self[id].branch.clone()).collect()
    }

    /// Finds the ref holding `branch`.
    pub fn find_branch(&self, branch: &str) -> Option<RefId> {
        self.nodes()
            .find(|(_, n)| n.data.branch == branch)
            .map(|(id, _)| id)
    }

    /// Finds the ref with the given SHA.
    pub fn find_sha(&self, sha: &str) -> Option<RefId> {
        self.by_sha.get(sha).copied()
    }

    /// Returns the persisted form of the ref `id`.
    ///
    /// ## Panics
    /// - If `id` does not refer to a ref of this stack.
    pub fn record(&self, id: RefId) -> RefFile {
        let node = self.link(id);
        let sha_of = |link: Option<RefId>| link.map(|l| self[l].sha.clone()).unwrap_or_default();

        RefFile {
            prev: sha_of(node.prev),
            branch: node.data.branch.clone(),
            sha: node.data.sha.clone(),
            next: sha_of(node.next),
            mr: node.data.mr.clone().unwrap_or_default(),
            description: node.data.description.clone(),
        }
    }

    /// Appends a ref to the end of the stack.
    ///
    /// ## Returns
    /// - `Ok(RefId)` - The id of the new ref. If the stack was not empty, the previous last ref now links to it.
    /// - `Err(_)` - If the SHA or branch of the ref is already part of the stack.
    pub fn push(&mut self, data: StackRef) -> StResult<RefId> {
        if self.by_sha.contains_key(&data.sha) {
            return Err(StError::ShaCollision(data.sha));
        }
        if self.find_branch(&data.branch).is_some() {
            return Err(StError::DuplicateBranch(data.branch));
        }

        let tail = self.last();
        let id = RefId(self.nodes.len());
        self.by_sha.insert(data.sha.clone(), id);
        self.nodes.push(Some(Node {
            data,
            prev: tail,
            next: None,
        }));

        if let Some(node) = tail.and_then(|t| self.nodes[t.0].as_mut()) {
            node.next = Some(id);
        }

        Ok(id)
    }

    /// Removes a ref from the stack, linking its neighbors to one another.
    ///
    /// ## Returns
    /// - `Some(StackRef)` - The removed ref.
    /// - `None` - If `id` was already removed.
    pub fn remove(&mut self, id: RefId) -> Option<StackRef> {
        let node = self.nodes.get_mut(id.0)?.take()?;
        self.by_sha.remove(&node.data.sha);

        if let Some(prev) = node.prev.and_then(|p| self.nodes[p.0].as_mut()) {
            prev.next = node.next;
        }
        if let Some(next) = node.next.and_then(|n| self.nodes[n.0].as_mut()) {
            next.prev = node.prev;
        }

        Some(node.data)
    }

    /// Returns a copy of the stack whose links follow `order`. Content of the refs is untouched, and ids remain
    /// valid in the copy.
    ///
    /// `order` must hold every ref of the stack exactly once.
    pub fn relinked(&self, order: &[RefId]) -> Self {
        debug_assert_eq!(order.len(), self.len());

        let mut stack = self.clone();
        for (i, id) in order.iter().enumerate() {
            if let Some(node) = stack.nodes[id.0].as_mut() {
                node.prev = i.checked_sub(1).map(|p| order[p]);
                node.next = order.get(i + 1).copied();
            }
        }
        stack
    }

    /// Returns the previous and next links of `id`.
    pub fn neighbors(&self, id: RefId) -> (Option<RefId>, Option<RefId>) {
        (self.prev(id), self.next(id))
    }

    /// Iterates over the live nodes of the arena, in arena order.
    fn nodes(&self) -> impl Iterator<Item = (RefId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (RefId(i), n)))
    }

    /// Returns the node `id`.
    ///
    /// ## Panics
    /// - If `id` was removed or belongs to another stack.
    fn link(&self, id: RefId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("ref {:?} is not part of stack {}", id, self.title),
        }
    }
}

impl Index<RefId> for Stack {
    type Output = StackRef;

    /// ## Panics
    /// - If `id` was removed or belongs to another stack.
    fn index(&self, id: RefId) -> &Self::Output {
        &self.link(id).data
    }
}

/// Iterator over the refs of a [Stack], from first to last.
pub struct Iter<'a> {
    stack: &'a Stack,
    cursor: Option<RefId>,
    /// Upper bound on the number of steps, so a malformed chain can never loop forever.
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = RefId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.cursor?;
        self.remaining -= 1;
        self.cursor = self.stack.next(current);
        Some(current)
    }
}

#[cfg(test)]
mod test {
    use super::{RefFile, Stack, StackRef};
    use crate::errors::StError;

    fn record(sha: &str, prev: &str, next: &str) -> RefFile {
        RefFile {
            sha: sha.to_string(),
            prev: prev.to_string(),
            next: next.to_string(),
            branch: format!("Branch{}", sha),
            description: format!("diff {}", sha),
            ..Default::default()
        }
    }

    fn chain(n: usize) -> Stack {
        let shas = (1..=n).map(|i| i.to_string()).collect::<Vec<_>>();
        let records = shas
            .iter()
            .enumerate()
            .map(|(i, sha)| {
                let prev = i.checked_sub(1).map(|p| shas[p].as_str()).unwrap_or("");
                let next = shas.get(i + 1).map(String::as_str).unwrap_or("");
                record(sha, prev, next)
            })
            .collect();
        Stack::from_records("stack", records).unwrap()
    }

    #[test]
    fn first_and_last_of_two_refs() {
        let stack = Stack::from_records("stack", vec![record("1", "", "2"), record("2", "1", "")]).unwrap();

        assert_eq!(stack[stack.last().unwrap()].sha, "2");
        assert_eq!(stack[stack.first().unwrap()].sha, "1");
    }

    #[test]
    fn walk_visits_every_ref_once() {
        for n in 1..6 {
            let stack = chain(n);
            let walked = stack.iter().map(|id| stack[id].sha.clone()).collect::<Vec<_>>();
            let expected = (1..=n).map(|i| i.to_string()).collect::<Vec<_>>();
            assert_eq!(walked, expected);
            assert_eq!(stack.iter().last(), stack.last());
        }
    }

    #[test]
    fn two_heads_are_corrupted() {
        let err = Stack::from_records(
            "stack",
            vec![record("1", "", "2"), record("2", "1", ""), record("3", "", "")],
        )
        .unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
    }

    #[test]
    fn two_tails_are_corrupted() {
        let err = Stack::from_records(
            "stack",
            vec![record("1", "", ""), record("2", "1", "")],
        )
        .unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
    }

    #[test]
    fn dangling_link_is_corrupted() {
        let err = Stack::from_records("stack", vec![record("1", "", "9")]).unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
    }

    #[test]
    fn orphaned_cycle_is_corrupted() {
        let err = Stack::from_records(
            "stack",
            vec![
                record("1", "", ""),
                record("2", "3", "3"),
                record("3", "2", "2"),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
    }

    #[test]
    fn duplicate_branch_is_corrupted() {
        let mut second = record("2", "1", "");
        second.branch = "Branch1".to_string();
        let err = Stack::from_records("stack", vec![record("1", "", "2"), second]).unwrap_err();
        assert!(matches!(err, StError::CorruptedStack(_)));
    }

    #[test]
    fn empty_stack_is_valid() {
        let stack = Stack::from_records("stack", vec![]).unwrap();
        assert!(stack.is_empty());
        assert_eq!(stack.first(), None);
        assert_eq!(stack.last(), None);
    }

    #[test]
    fn records_round_trip_links() {
        let stack = chain(3);
        let middle = stack.find_sha("2").unwrap();
        assert_eq!(stack.record(middle), record("2", "1", "3"));
    }

    #[test]
    fn push_appends_to_tail() {
        let mut stack = chain(2);
        let id = stack
            .push(StackRef::new("3".into(), "Branch3".into(), "three".into()))
            .unwrap();

        assert_eq!(stack.last(), Some(id));
        assert_eq!(stack.record(stack.find_sha("2").unwrap()).next, "3");
        assert_eq!(stack.record(id).prev, "2");
    }

    #[test]
    fn push_rejects_sha_collision() {
        let mut stack = chain(2);
        let err = stack
            .push(StackRef::new("2".into(), "Other".into(), "two".into()))
            .unwrap_err();
        assert!(matches!(err, StError::ShaCollision(_)));
    }

    #[test]
    fn removing_middle_relinks_neighbors() {
        let mut stack = chain(3);
        let middle = stack.find_sha("2").unwrap();
        let removed = stack.record(middle);

        stack.remove(middle).unwrap();

        let prev = stack.record(stack.find_sha("1").unwrap());
        let next = stack.record(stack.find_sha("3").unwrap());
        assert_eq!(prev.next, removed.next);
        assert_eq!(next.prev, removed.prev);
        assert_eq!(stack.branches(), vec!["Branch1", "Branch3"]);
    }

    #[test]
    fn removing_sole_ref_empties_stack() {
        let mut stack = chain(1);
        let only = stack.first().unwrap();
        stack.remove(only).unwrap();
        assert!(stack.is_empty());
        assert_eq!(stack.iter().count(), 0);
    }

    #[test]
    fn relinked_follows_order() {
        let stack = Stack::from_records("stack", vec![record("1", "", "2"), record("2", "1", "")]).unwrap();
        let order = vec![stack.find_branch("Branch2").unwrap(), stack.find_branch("Branch1").unwrap()];

        let relinked = stack.relinked(&order);

        assert_eq!(relinked.record(order[0]).prev, "");
        assert_eq!(relinked.record(order[1]).next, "");
        assert_eq!(relinked.branches(), vec!["Branch2", "Branch1"]);
    }

    #[test]
    fn relinked_in_same_order_is_equal() {
        let stack = chain(4);
        let order = stack.iter().collect::<Vec<_>>();
        assert_eq!(stack.relinked(&order), stack);
    }

    #[test]
    fn subject_truncates_long_lines() {
        let mut data = StackRef::default();
        data.description = format!("{}\nbody", "a".repeat(80));
        assert_eq!(data.subject().len(), 72);
        data.description = "short\nbody".to_string();
        assert_eq!(data.subject(), "short");
    }
}
