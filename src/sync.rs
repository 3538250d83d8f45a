//! Optimistic local-first editing session.
//!
//! The chain is owned by one editing session at a time. Edits mutate the
//! local chain immediately; persistence follows best-effort and never
//! blocks recomputation. Reconciliation is deliberately blunt:
//!
//! - Each local edit bumps a monotonically increasing revision. A store
//!   response carries the revision the request was issued at; if the
//!   session has moved on since, the response is stale and dropped.
//! - Authoritative reloads replace the whole chain. There is no partial
//!   merge, so local and remote state cannot diverge silently.
//! - Per-operation baseline snapshots answer "is this dirty?" so the UI
//!   can warn before overwriting concurrent edits. They are never used
//!   to merge.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Chain, Operation, OperationId, RelinkPolicy};
use crate::propagation::{self, ChangeFlag, FieldChange, PropagationError};

/// Revision counter value. Compared, never interpreted.
pub type Revision = u64;

/// An editing session over one order's chain.
#[derive(Debug, Clone)]
pub struct SyncSession {
    chain: Chain,
    baseline: HashMap<OperationId, Operation>,
    revision: Revision,
}

impl SyncSession {
    /// Opens a session on a freshly fetched chain.
    pub fn new(chain: Chain) -> Self {
        let baseline = snapshot(&chain);
        Self {
            chain,
            baseline,
            revision: 0,
        }
    }

    /// The current local chain.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The current revision. Capture this when issuing a store request
    /// and hand it back to `accept_remote` with the response.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Applies a field edit locally, cascading as needed.
    ///
    /// The revision advances on success. On error the chain is
    /// untouched.
    pub fn apply(
        &mut self,
        operation_id: &str,
        change: FieldChange,
    ) -> Result<Vec<ChangeFlag>, PropagationError> {
        let outcome = propagation::apply_field_change(self.chain.clone(), operation_id, change)?;
        self.chain = outcome.chain;
        self.revision += 1;
        Ok(outcome.flags)
    }

    /// Appends a draft operation with the default workshop-day window
    /// (see `Chain::append_draft`). Drafts have no baseline snapshot and
    /// report dirty until synchronized.
    pub fn append_draft(&mut self, today: chrono::NaiveDate) -> OperationId {
        let id = self.chain.append_draft(today);
        self.revision += 1;
        id
    }

    /// Removes an operation locally with the given re-link policy.
    pub fn remove(
        &mut self,
        operation_id: &str,
        policy: RelinkPolicy,
    ) -> Result<Vec<ChangeFlag>, PropagationError> {
        let outcome = propagation::remove_operation(self.chain.clone(), operation_id, policy)?;
        self.chain = outcome.chain;
        self.revision += 1;
        Ok(outcome.flags)
    }

    /// Whether an operation differs from its last synchronized snapshot.
    ///
    /// Unknown ids count as dirty: a locally created draft has no
    /// baseline yet.
    pub fn is_dirty(&self, operation_id: &str) -> bool {
        match (self.chain.get(operation_id), self.baseline.get(operation_id)) {
            (Some(current), Some(base)) => current != base,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Ids of all dirty operations, in display order.
    pub fn dirty_ids(&self) -> Vec<OperationId> {
        self.chain
            .iter()
            .filter(|op| self.is_dirty(&op.id))
            .map(|op| op.id.clone())
            .collect()
    }

    /// Accepts an authoritative chain from the store.
    ///
    /// `issued_at` is the session revision captured when the request was
    /// sent. A response that predates newer local edits is discarded and
    /// `false` returned; otherwise the whole chain is replaced and the
    /// session marked clean.
    pub fn accept_remote(&mut self, chain: Chain, issued_at: Revision) -> bool {
        if issued_at < self.revision {
            debug!(
                issued_at,
                current = self.revision,
                "stale store response dropped"
            );
            return false;
        }
        self.replace(chain);
        true
    }

    /// Unconditionally replaces the local chain (an explicit reload).
    pub fn replace(&mut self, chain: Chain) {
        self.baseline = snapshot(&chain);
        self.chain = chain;
    }

    /// Marks the current local state as synchronized, e.g. after a
    /// successful save that returned no new data.
    pub fn mark_synced(&mut self) {
        self.baseline = snapshot(&self.chain);
    }
}

fn snapshot(chain: &Chain) -> HashMap<OperationId, Operation> {
    chain
        .iter()
        .map(|op| (op.id.clone(), op.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operation;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn chain() -> Chain {
        Chain::from_operations(vec![
            Operation::new("a", "A", dt(10, 8), dt(10, 20)),
            Operation::new("b", "B", dt(10, 8), dt(10, 20)).with_previous("a"),
        ])
    }

    fn end_time(h: u32) -> FieldChange {
        FieldChange::EndTime(NaiveTime::from_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn test_apply_bumps_revision_and_mutates_locally() {
        let mut session = SyncSession::new(chain());
        assert_eq!(session.revision(), 0);

        session.apply("a", end_time(22)).unwrap();
        assert_eq!(session.revision(), 1);
        assert_eq!(session.chain().get("a").unwrap().end, dt(10, 22));
        // The cascade reached "b" without any store involvement.
        assert_eq!(session.chain().get("b").unwrap().start, dt(10, 22));
    }

    #[test]
    fn test_failed_apply_leaves_chain_and_revision() {
        let mut session = SyncSession::new(chain());
        let before = session.chain().clone();
        assert!(session.apply("ghost", end_time(22)).is_err());
        assert_eq!(session.revision(), 0);
        assert_eq!(session.chain(), &before);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut session = SyncSession::new(chain());
        assert!(!session.is_dirty("a"));
        assert!(session.dirty_ids().is_empty());

        session.apply("a", end_time(22)).unwrap();
        // The cascade dirtied the successor too.
        assert_eq!(session.dirty_ids(), vec!["a", "b"]);

        session.mark_synced();
        assert!(!session.is_dirty("a"));
        assert!(!session.is_dirty("b"));
    }

    #[test]
    fn test_draft_counts_as_dirty() {
        let mut session = SyncSession::new(chain());
        let draft_id = session.append_draft(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(session.revision(), 1);
        assert!(session.is_dirty(&draft_id));
        assert_eq!(session.dirty_ids(), vec![draft_id]);
    }

    #[test]
    fn test_stale_response_dropped() {
        let mut session = SyncSession::new(chain());
        let issued_at = session.revision();

        // A newer local edit supersedes the in-flight request.
        session.apply("a", end_time(22)).unwrap();
        let local_end = session.chain().get("a").unwrap().end;

        let accepted = session.accept_remote(chain(), issued_at);
        assert!(!accepted);
        assert_eq!(session.chain().get("a").unwrap().end, local_end);
    }

    #[test]
    fn test_current_response_replaces_wholesale() {
        let mut session = SyncSession::new(chain());
        session.apply("a", end_time(22)).unwrap();

        let mut authoritative = chain();
        authoritative.get_mut("a").unwrap().name = "A (renamed upstream)".into();
        let accepted = session.accept_remote(authoritative, session.revision());
        assert!(accepted);
        // Local edit gone: last write observed on reload wins.
        assert_eq!(session.chain().get("a").unwrap().end, dt(10, 20));
        assert_eq!(session.chain().get("a").unwrap().name, "A (renamed upstream)");
        assert!(session.dirty_ids().is_empty());
    }

    #[test]
    fn test_remove_goes_through_session() {
        let mut session = SyncSession::new(chain());
        session.remove("a", RelinkPolicy::Bridge).unwrap();
        assert_eq!(session.revision(), 1);
        assert!(session.chain().get("a").is_none());
        assert_eq!(session.chain().get("b").unwrap().previous_operation, None);
    }
}
