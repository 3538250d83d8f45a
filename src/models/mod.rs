//! Scheduling domain models.
//!
//! Core data types for manufacturing orders and their operation chains:
//! an `Order` owns a `Chain`, a `Chain` is an arena of `Operation`s with
//! derived predecessor/successor lookup tables, and `Actor`/`Role`
//! identify who is driving lifecycle transitions.

mod actor;
mod chain;
mod operation;
mod order;

pub use actor::{Actor, Role};
pub use chain::{Chain, RelinkPolicy};
pub use operation::{Operation, OperationId, OperationStatus};
pub use order::Order;
