//! Scheduling core for manufacturing order tracking.
//!
//! An order is a linear chain of operations linked by single
//! predecessor/successor references. This crate owns the computations
//! the surrounding application hangs on: dependency propagation through
//! the chain, lifecycle transitions, prediction refresh, and Gantt
//! timeline geometry. UI, transport, and storage are collaborators
//! behind the `store` trait.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Order`, `Operation`, `Chain`,
//!   `Actor`, `Role`
//! - **`propagation`**: The pure field-edit reducer and its cascade down
//!   the chain, plus the nightly predicted-window refresh
//! - **`lifecycle`**: planned → in-progress → completed transitions and
//!   the `can_act` authorization predicate
//! - **`timeline`**: Date-to-pixel mapping inside a bounded window and
//!   per-operation bar layout
//! - **`validation`**: Structural integrity checks over ingested chains
//! - **`store`**: The persistence collaborator interface
//! - **`sync`**: Optimistic local-first editing with stale-response
//!   protection
//! - **`timeutil`**: Timezone-naive date/time arithmetic
//!
//! # Example
//!
//! ```
//! use chainplan::models::{Chain, Operation};
//! use chainplan::propagation::{apply_field_change, FieldChange};
//! use chainplan::timeline::{layout_operations, Viewport};
//! use chrono::{NaiveDate, NaiveTime};
//!
//! let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
//! let window = |h| day.and_hms_opt(h, 0, 0).unwrap();
//! let chain = Chain::from_operations(vec![
//!     Operation::new("cut", "Cutting", window(8), window(20)),
//!     Operation::new("weld", "Welding", window(8), window(20)).with_previous("cut"),
//! ]);
//!
//! // Pushing the cut's end out drags the weld behind it.
//! let out = apply_field_change(
//!     chain,
//!     "cut",
//!     FieldChange::EndTime(NaiveTime::from_hms_opt(22, 0, 0).unwrap()),
//! )
//! .unwrap();
//! assert_eq!(out.chain.get("weld").unwrap().start, window(22));
//!
//! // Chart geometry is a pure function of (window, chain, now).
//! let viewport = Viewport::new(day, 14);
//! let layout = layout_operations(&out.chain, &viewport, window(12), None);
//! assert_eq!(layout.rows.len(), 2);
//! ```

pub mod lifecycle;
pub mod models;
pub mod propagation;
pub mod store;
pub mod sync;
pub mod timeline;
pub mod timeutil;
pub mod validation;

pub use lifecycle::{
    can_act, finish_operation, start_operation, LifecycleError, ResourceAssignment,
};
pub use models::{Actor, Chain, Operation, OperationId, OperationStatus, Order, RelinkPolicy, Role};
pub use propagation::{
    apply_field_change, refresh_predictions, remove_operation, ChangeFlag, ChangeOutcome,
    FieldChange, PropagationError,
};
pub use store::{OperationPayload, OperationStore, SavedOperation, StoreError};
pub use sync::{Revision, SyncSession};
pub use timeline::{layout_operations, Bar, GanttLayout, LineAlign, OperationRow, Viewport};
