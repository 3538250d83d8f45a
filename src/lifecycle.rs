//! Operation lifecycle state machine.
//!
//! States: planned -> in-progress -> completed. No state is skipped and
//! nothing moves backwards; reverting a completed operation is a matter
//! for deletion/edit flows outside the core.
//!
//! Starting requires a resource assignment (workshop plus a non-empty
//! executor set) and stamps `actual_start`; finishing stamps
//! `actual_end`. Both are gated by the single authorization predicate
//! `can_act`, a pure function of operation state and actor identity.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Actor, Operation, OperationId, OperationStatus};

/// Resources committed when an operation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    /// Workshop the operation runs in.
    pub workshop: String,
    /// Executors doing the work. Must not be empty.
    pub executors: Vec<String>,
}

impl ResourceAssignment {
    /// Creates an assignment.
    pub fn new(workshop: impl Into<String>, executors: Vec<String>) -> Self {
        Self { workshop: workshop.into(), executors }
    }
}

/// Rejected lifecycle transitions. No state change occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// The actor may not act on this operation.
    #[error("actor {actor} may not act on operation {operation}")]
    NotAuthorized { actor: String, operation: OperationId },
    /// Start requested on an operation that is not planned.
    #[error("operation {0} has already started")]
    AlreadyStarted(OperationId),
    /// Finish requested on an operation that is not in progress.
    #[error("operation {0} is not in progress")]
    NotInProgress(OperationId),
    /// Start requested without any executors.
    #[error("operation {0} cannot start without executors")]
    NoExecutors(OperationId),
}

/// Whether `actor` may trigger a transition on `operation`.
///
/// Completed operations are never actionable. Otherwise an elevated role
/// always may, an unassigned operation is open to anyone, and an assigned
/// operation is open to exactly its approver.
pub fn can_act(operation: &Operation, actor: &Actor) -> bool {
    if operation.is_completed() {
        return false;
    }
    match &operation.master {
        None => true,
        Some(master) => actor.role.is_elevated() || master == &actor.id,
    }
}

/// Transition planned -> in-progress.
///
/// Commits the resource assignment and stamps `actual_start = now`.
pub fn start_operation(
    operation: &mut Operation,
    actor: &Actor,
    assignment: ResourceAssignment,
    now: NaiveDateTime,
) -> Result<(), LifecycleError> {
    if !can_act(operation, actor) {
        return Err(LifecycleError::NotAuthorized {
            actor: actor.id.clone(),
            operation: operation.id.clone(),
        });
    }
    if operation.status() != OperationStatus::Planned {
        return Err(LifecycleError::AlreadyStarted(operation.id.clone()));
    }
    if assignment.executors.is_empty() {
        return Err(LifecycleError::NoExecutors(operation.id.clone()));
    }

    operation.workshop = Some(assignment.workshop);
    operation.executors = assignment.executors;
    operation.actual_start = Some(now);
    debug!(operation = %operation.id, actor = %actor.id, "operation started");
    Ok(())
}

/// Transition in-progress -> completed.
///
/// Stamps `actual_end = now`. Needs no further input.
pub fn finish_operation(
    operation: &mut Operation,
    actor: &Actor,
    now: NaiveDateTime,
) -> Result<(), LifecycleError> {
    if !can_act(operation, actor) {
        return Err(LifecycleError::NotAuthorized {
            actor: actor.id.clone(),
            operation: operation.id.clone(),
        });
    }
    if operation.status() != OperationStatus::InProgress {
        return Err(LifecycleError::NotInProgress(operation.id.clone()));
    }

    operation.actual_end = Some(now);
    debug!(operation = %operation.id, actor = %actor.id, "operation finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn op() -> Operation {
        Operation::new("op-1", "Milling", dt(10, 8), dt(10, 20))
    }

    fn assignment() -> ResourceAssignment {
        ResourceAssignment::new("shop-1", vec!["e-1".into(), "e-2".into()])
    }

    #[test]
    fn test_full_lifecycle() {
        let mut operation = op();
        let actor = Actor::new("u-1", Role::Technologist);

        start_operation(&mut operation, &actor, assignment(), dt(10, 9)).unwrap();
        assert_eq!(operation.status(), OperationStatus::InProgress);
        assert_eq!(operation.actual_start, Some(dt(10, 9)));
        assert_eq!(operation.workshop, Some("shop-1".to_string()));
        assert_eq!(operation.executors.len(), 2);

        finish_operation(&mut operation, &actor, dt(10, 18)).unwrap();
        assert_eq!(operation.status(), OperationStatus::Completed);
        assert_eq!(operation.actual_end, Some(dt(10, 18)));
    }

    #[test]
    fn test_cannot_skip_planned_state() {
        let mut operation = op();
        let actor = Actor::new("u-1", Role::Admin);
        let err = finish_operation(&mut operation, &actor, dt(10, 18)).unwrap_err();
        assert_eq!(err, LifecycleError::NotInProgress("op-1".into()));
        assert_eq!(operation.status(), OperationStatus::Planned);
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut operation = op();
        let actor = Actor::new("u-1", Role::Admin);
        start_operation(&mut operation, &actor, assignment(), dt(10, 9)).unwrap();
        let err = start_operation(&mut operation, &actor, assignment(), dt(10, 10)).unwrap_err();
        assert_eq!(err, LifecycleError::AlreadyStarted("op-1".into()));
        assert_eq!(operation.actual_start, Some(dt(10, 9)));
    }

    #[test]
    fn test_start_requires_executors() {
        let mut operation = op();
        let actor = Actor::new("u-1", Role::Admin);
        let empty = ResourceAssignment::new("shop-1", vec![]);
        let err = start_operation(&mut operation, &actor, empty, dt(10, 9)).unwrap_err();
        assert_eq!(err, LifecycleError::NoExecutors("op-1".into()));
        assert_eq!(operation.status(), OperationStatus::Planned);
    }

    #[test]
    fn test_can_act_completed_always_false() {
        let mut operation = op();
        operation.actual_start = Some(dt(10, 9));
        operation.actual_end = Some(dt(10, 18));
        for role in [Role::Admin, Role::Technologist, Role::Master] {
            assert!(!can_act(&operation, &Actor::new("anyone", role)));
        }
    }

    #[test]
    fn test_can_act_unassigned_open_to_all() {
        let operation = op();
        assert!(can_act(&operation, &Actor::new("u-1", Role::Master)));
        assert!(can_act(&operation, &Actor::new("u-2", Role::Admin)));
    }

    #[test]
    fn test_can_act_assigned_gates_on_identity_or_elevation() {
        let operation = op().with_master("m-7");
        assert!(can_act(&operation, &Actor::new("m-7", Role::Master)));
        assert!(!can_act(&operation, &Actor::new("m-8", Role::Master)));
        assert!(can_act(&operation, &Actor::new("u-1", Role::Technologist)));
        assert!(can_act(&operation, &Actor::new("u-2", Role::Admin)));
    }

    #[test]
    fn test_unauthorized_start_changes_nothing() {
        let mut operation = op().with_master("m-7");
        let outsider = Actor::new("m-8", Role::Master);
        let err = start_operation(&mut operation, &outsider, assignment(), dt(10, 9)).unwrap_err();
        assert!(matches!(err, LifecycleError::NotAuthorized { .. }));
        assert_eq!(operation.status(), OperationStatus::Planned);
        assert!(operation.workshop.is_none());
    }
}
