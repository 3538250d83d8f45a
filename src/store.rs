//! External persistence interface.
//!
//! The core does not talk to the network itself. It defines the contract
//! an order/operation store must satisfy and the payload shapes crossing
//! that boundary; the surrounding application supplies the transport and
//! maps these logical fields onto its wire format.
//!
//! Store failures are the caller's to surface. Nothing in the core
//! treats them as fatal: local state stays editable and is reconciled on
//! the next authoritative reload (see `sync`).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{OperationId, Order};

/// Store-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store refused the request (validation, permissions).
    #[error("store rejected the request: {0}")]
    Rejected(String),
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// No such order.
    #[error("unknown order: {0}")]
    UnknownOrder(String),
    /// No such operation.
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),
}

/// Fields persisted for one operation.
///
/// The baseline window is what the store keeps; working and predicted
/// windows are derived or computed elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPayload {
    /// Owning order id.
    pub order: String,
    /// Operation name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Position within the order, for stable listing.
    pub priority: i32,
    /// Baseline window start.
    pub planned_start: NaiveDateTime,
    /// Baseline window end.
    pub planned_end: NaiveDateTime,
    /// Assigned approver.
    pub master: Option<String>,
    /// Successor link, written during chain linking.
    pub next_operation: Option<OperationId>,
}

/// Store acknowledgement of a created or updated operation.
///
/// Creation replaces the draft's temporary id with a store-assigned one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedOperation {
    /// Authoritative operation id.
    pub id: OperationId,
}

/// The persistence collaborator the core is written against.
///
/// All calls are synchronous from the core's point of view; the caller
/// decides where they actually run and feeds results back as events.
pub trait OperationStore {
    /// Fetches a full order with its operation chain.
    fn fetch_order(&self, order_id: &str) -> Result<Order, StoreError>;

    /// Creates an operation, returning its authoritative id.
    fn create_operation(&mut self, payload: &OperationPayload) -> Result<SavedOperation, StoreError>;

    /// Updates an operation.
    fn update_operation(
        &mut self,
        id: &str,
        payload: &OperationPayload,
    ) -> Result<SavedOperation, StoreError>;

    /// Deletes an operation.
    fn delete_operation(&mut self, id: &str) -> Result<(), StoreError>;

    /// Lifecycle transition: planned -> in-progress, with the resource
    /// assignment.
    fn start_operation(
        &mut self,
        id: &str,
        workshop: &str,
        executors: &[String],
    ) -> Result<(), StoreError>;

    /// Lifecycle transition: in-progress -> completed.
    fn finish_operation(&mut self, id: &str) -> Result<(), StoreError>;
}

impl OperationPayload {
    /// Builds a payload from an operation's persisted fields.
    pub fn from_operation(op: &crate::models::Operation, order_id: &str, priority: i32) -> Self {
        Self {
            order: order_id.to_string(),
            name: op.name.clone(),
            description: op.description.clone(),
            priority,
            planned_start: op.planned_start,
            planned_end: op.planned_end,
            master: op.master.clone(),
            next_operation: op.next_operation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operation;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_payload_from_operation() {
        let mut op = Operation::new("op-1", "Milling", dt(10, 8), dt(10, 20))
            .with_description("rough pass")
            .with_master("m-7");
        op.next_operation = Some("op-2".into());

        let payload = OperationPayload::from_operation(&op, "ord-1", 3);
        assert_eq!(payload.order, "ord-1");
        assert_eq!(payload.name, "Milling");
        assert_eq!(payload.priority, 3);
        assert_eq!(payload.planned_start, dt(10, 8));
        assert_eq!(payload.master, Some("m-7".to_string()));
        assert_eq!(payload.next_operation, Some("op-2".to_string()));
    }

    #[test]
    fn test_payload_serde_roundtrip() {
        let op = Operation::new("op-1", "Milling", dt(10, 8), dt(10, 20));
        let payload = OperationPayload::from_operation(&op, "ord-1", 1);
        let json = serde_json::to_string(&payload).unwrap();
        let back: OperationPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
