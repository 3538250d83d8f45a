//! Operation chain arena.
//!
//! Operations link to each other through single predecessor references.
//! Rather than chase object pointers, the chain keeps a flat arena of
//! operations plus two derived lookup tables (predecessor-of and
//! successor-of) that are rebuilt on every structural mutation. Cascade
//! traversal is then iteration over ids.
//!
//! The `next_operation` back-reference stored on each operation is
//! rewritten from the successor table during reindexing; it is never
//! authoritative on its own.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::operation::{Operation, OperationId};

/// What happens to a removed operation's successor link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelinkPolicy {
    /// The successor inherits the removed operation's predecessor.
    Bridge,
    /// The successor becomes a chain head.
    LeaveGap,
}

/// An arena of operations with derived link tables.
///
/// Serializes as a plain operation array; the link tables are rebuilt on
/// deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Operation>", into = "Vec<Operation>")]
pub struct Chain {
    operations: Vec<Operation>,
    index: HashMap<OperationId, usize>,
    successor: HashMap<OperationId, OperationId>,
    predecessor: HashMap<OperationId, OperationId>,
}

impl From<Vec<Operation>> for Chain {
    fn from(operations: Vec<Operation>) -> Self {
        Self::from_operations(operations)
    }
}

impl From<Chain> for Vec<Operation> {
    fn from(chain: Chain) -> Self {
        chain.operations
    }
}

impl Chain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a chain from a list of operations, deriving the link
    /// tables.
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        let mut chain = Self {
            operations,
            ..Self::default()
        };
        chain.reindex();
        chain
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Operations in display order.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Iterates operations in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<OperationId> {
        self.operations.iter().map(|op| op.id.clone()).collect()
    }

    /// Whether an operation with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up an operation by id.
    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.index.get(id).map(|&i| &self.operations[i])
    }

    /// Looks up an operation mutably.
    ///
    /// Callers mutating link fields must `reindex` (or use `relink`)
    /// afterwards.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Operation> {
        self.index.get(id).map(|&i| &mut self.operations[i])
    }

    /// Id of the operation that declares `id` as its predecessor.
    pub fn successor_of(&self, id: &str) -> Option<&OperationId> {
        self.successor.get(id)
    }

    /// Id of the operation `id` declares as its predecessor, if that
    /// predecessor exists in the chain.
    pub fn predecessor_of(&self, id: &str) -> Option<&OperationId> {
        self.predecessor.get(id)
    }

    /// Appends an operation and reindexes.
    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
        self.reindex();
    }

    /// Appends a draft operation with the default workshop-day window.
    ///
    /// The window lands on the end date of the last operation in display
    /// order, or on `today` when the chain is empty. Returns the
    /// generated id.
    pub fn append_draft(&mut self, today: NaiveDate) -> OperationId {
        let base_date = self
            .operations
            .last()
            .map(|op| op.end.date())
            .unwrap_or(today);
        let name = format!("Operation {}", self.operations.len() + 1);
        let draft = Operation::draft(name, base_date);
        let id = draft.id.clone();
        self.push(draft);
        id
    }

    /// Removes an operation, re-pointing its successor per `policy`.
    ///
    /// Returns the removed operation, or `None` for an unknown id. The
    /// caller decides whether the re-pointed successor's window should be
    /// re-propagated (see `propagation::remove_operation`).
    pub fn remove(&mut self, id: &str, policy: RelinkPolicy) -> Option<Operation> {
        let pos = self.index.get(id).copied()?;
        let removed = self.operations.remove(pos);
        for op in &mut self.operations {
            if op.previous_operation.as_deref() == Some(id) {
                op.previous_operation = match policy {
                    RelinkPolicy::Bridge => removed.previous_operation.clone(),
                    RelinkPolicy::LeaveGap => None,
                };
            }
        }
        self.reindex();
        Some(removed)
    }

    /// Re-points an operation's predecessor link and reindexes.
    ///
    /// Returns `false` when `id` is unknown.
    pub fn relink(&mut self, id: &str, previous: Option<OperationId>) -> bool {
        match self.get_mut(id) {
            Some(op) => {
                op.previous_operation = previous;
                self.reindex();
                true
            }
            None => false,
        }
    }

    /// Replaces externally ingested actual timestamps that arrived
    /// end-only (see `Operation::normalize_actuals`).
    pub fn normalize_actuals(&mut self) {
        for op in &mut self.operations {
            op.normalize_actuals();
        }
    }

    /// Rebuilds the id index and the derived link tables, and rewrites
    /// each operation's `next_operation` back-reference.
    ///
    /// When two operations claim the same predecessor the first one in
    /// display order wins; validation reports the duplicate.
    pub fn reindex(&mut self) {
        self.index.clear();
        self.successor.clear();
        self.predecessor.clear();

        for (i, op) in self.operations.iter().enumerate() {
            self.index.entry(op.id.clone()).or_insert(i);
        }
        for op in &self.operations {
            if let Some(prev) = &op.previous_operation {
                if self.index.contains_key(prev.as_str()) {
                    self.predecessor.insert(op.id.clone(), prev.clone());
                    self.successor.entry(prev.clone()).or_insert_with(|| op.id.clone());
                }
            }
        }
        for op in &mut self.operations {
            op.next_operation = self.successor.get(op.id.as_str()).cloned();
        }
    }

    /// Sorts operations into display order: chain heads by planned start,
    /// each followed depth-first by its successors.
    ///
    /// Operations whose predecessor is missing from the chain count as
    /// heads. Members of a corrupt cyclic stretch keep their relative
    /// order at the end of the list.
    pub fn sort_display(&mut self) {
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut roots: Vec<usize> = Vec::new();

        for (i, op) in self.operations.iter().enumerate() {
            match &op.previous_operation {
                Some(prev) if self.index.contains_key(prev.as_str()) => {
                    children.entry(prev.as_str()).or_default().push(i);
                }
                _ => roots.push(i),
            }
        }

        roots.sort_by_key(|&i| self.operations[i].planned_start);
        for indices in children.values_mut() {
            indices.sort_by_key(|&i| self.operations[i].planned_start);
        }

        let mut order: Vec<usize> = Vec::with_capacity(self.operations.len());
        let mut placed = vec![false; self.operations.len()];
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(i) = stack.pop() {
            if placed[i] {
                continue;
            }
            placed[i] = true;
            order.push(i);
            if let Some(kids) = children.get(self.operations[i].id.as_str()) {
                for &k in kids.iter().rev() {
                    stack.push(k);
                }
            }
        }
        // Anything unreachable from a head (cyclic data) trails behind.
        for i in 0..self.operations.len() {
            if !placed[i] {
                order.push(i);
            }
        }

        let mut sorted = Vec::with_capacity(self.operations.len());
        for i in order {
            sorted.push(self.operations[i].clone());
        }
        self.operations = sorted;
        self.reindex();
    }
}

impl PartialEq for Chain {
    fn eq(&self, other: &Self) -> bool {
        self.operations == other.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn op(id: &str, day: u32) -> Operation {
        Operation::new(id, format!("op {id}"), dt(day, 8), dt(day, 20))
    }

    fn linked_chain() -> Chain {
        Chain::from_operations(vec![
            op("a", 10),
            op("b", 11).with_previous("a"),
            op("c", 12).with_previous("b"),
        ])
    }

    #[test]
    fn test_reindex_builds_link_tables() {
        let chain = linked_chain();
        assert_eq!(chain.successor_of("a"), Some(&"b".to_string()));
        assert_eq!(chain.successor_of("b"), Some(&"c".to_string()));
        assert_eq!(chain.successor_of("c"), None);
        assert_eq!(chain.predecessor_of("c"), Some(&"b".to_string()));
        assert_eq!(chain.predecessor_of("a"), None);
    }

    #[test]
    fn test_reindex_rewrites_next_references() {
        let mut ops = vec![op("a", 10), op("b", 11).with_previous("a")];
        // Stale back-reference: must be rewritten from the links.
        ops[1].next_operation = Some("a".into());
        let chain = Chain::from_operations(ops);
        assert_eq!(chain.get("a").unwrap().next_operation, Some("b".to_string()));
        assert_eq!(chain.get("b").unwrap().next_operation, None);
    }

    #[test]
    fn test_duplicate_successor_first_wins() {
        let chain = Chain::from_operations(vec![
            op("a", 10),
            op("b", 11).with_previous("a"),
            op("c", 12).with_previous("a"),
        ]);
        assert_eq!(chain.successor_of("a"), Some(&"b".to_string()));
    }

    #[test]
    fn test_dangling_predecessor_ignored_by_tables() {
        let chain = Chain::from_operations(vec![op("a", 10).with_previous("ghost")]);
        assert_eq!(chain.predecessor_of("a"), None);
        assert_eq!(chain.successor_of("ghost"), None);
    }

    #[test]
    fn test_remove_bridge_relinks_successor() {
        let mut chain = linked_chain();
        let removed = chain.remove("b", RelinkPolicy::Bridge).unwrap();
        assert_eq!(removed.id, "b");
        assert_eq!(
            chain.get("c").unwrap().previous_operation,
            Some("a".to_string())
        );
        assert_eq!(chain.successor_of("a"), Some(&"c".to_string()));
    }

    #[test]
    fn test_remove_leave_gap_orphans_successor() {
        let mut chain = linked_chain();
        chain.remove("b", RelinkPolicy::LeaveGap).unwrap();
        assert_eq!(chain.get("c").unwrap().previous_operation, None);
        assert_eq!(chain.successor_of("a"), None);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut chain = linked_chain();
        assert!(chain.remove("nope", RelinkPolicy::Bridge).is_none());
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_relink() {
        let mut chain = linked_chain();
        assert!(chain.relink("c", Some("a".into())));
        // "b" already claims "a", so "b" keeps the successor slot.
        assert_eq!(chain.successor_of("a"), Some(&"b".to_string()));
        assert!(chain.relink("c", None));
        assert_eq!(chain.predecessor_of("c"), None);
        assert!(!chain.relink("nope", None));
    }

    #[test]
    fn test_append_draft_inherits_tail_date() {
        let mut chain = linked_chain();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let id = chain.append_draft(today);
        let draft = chain.get(&id).unwrap();
        // Tail op "c" ends on day 12; the draft starts there.
        assert_eq!(draft.start, dt(12, 8));
        assert_eq!(draft.end, dt(12, 20));
        assert_eq!(draft.name, "Operation 4");
    }

    #[test]
    fn test_append_draft_empty_chain_uses_today() {
        let mut chain = Chain::new();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let id = chain.append_draft(today);
        assert_eq!(chain.get(&id).unwrap().start.date(), today);
    }

    #[test]
    fn test_sort_display_follows_links() {
        let mut chain = Chain::from_operations(vec![
            op("c", 12).with_previous("b"),
            op("a", 10),
            op("b", 11).with_previous("a"),
        ]);
        chain.sort_display();
        assert_eq!(chain.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_display_orders_roots_by_planned_start() {
        let mut chain = Chain::from_operations(vec![
            op("late", 20),
            op("early", 5),
            op("child", 21).with_previous("late"),
        ]);
        chain.sort_display();
        assert_eq!(chain.ids(), vec!["early", "late", "child"]);
    }

    #[test]
    fn test_serde_rebuilds_link_tables() {
        let chain = linked_chain();
        let json = serde_json::to_string(&chain).unwrap();
        let back: Chain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chain);
        assert_eq!(back.successor_of("a"), Some(&"b".to_string()));
    }

    #[test]
    fn test_sort_display_keeps_cyclic_stretch() {
        let mut chain = Chain::from_operations(vec![
            op("x", 10).with_previous("y"),
            op("y", 11).with_previous("x"),
            op("root", 9),
        ]);
        chain.sort_display();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.ids()[0], "root");
    }
}
