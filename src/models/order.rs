//! Order model.
//!
//! An order groups the operations of one manufacturing job. The order
//! exclusively owns its chain: operations never outlive their order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::chain::Chain;
use super::operation::Operation;

/// A manufacturing order with its operation chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// Order title.
    pub title: String,
    /// Free-form description (drawing reference, notes).
    pub description: String,
    /// Delivery deadline. Rendered as the deadline marker on the chart.
    pub deadline: Option<NaiveDate>,
    /// Approver assigned to new operations by default.
    pub default_master: Option<String>,
    /// The operation chain, owned by this order.
    pub chain: Chain,
}

impl Order {
    /// Creates an empty order.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            deadline: None,
            default_master: None,
            chain: Chain::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the default approver.
    pub fn with_default_master(mut self, master: impl Into<String>) -> Self {
        self.default_master = Some(master.into());
        self
    }

    /// Sets the operation chain.
    pub fn with_operations(mut self, operations: Vec<Operation>) -> Self {
        self.chain = Chain::from_operations(operations);
        self
    }
}
