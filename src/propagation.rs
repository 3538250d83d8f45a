//! Schedule dependency propagation.
//!
//! A single pure reducer applies one field edit to one operation and
//! cascades the consequences down the chain: `(chain, event) -> chain'`.
//!
//! # Rules
//!
//! - Start edits move the operation and hold its duration: the end is
//!   recomputed as start + duration. With a zero duration the end is left
//!   alone; a duration must exist before a start edit can mean anything.
//! - Duration edits recompute the end from the start.
//! - End edits re-derive the duration and are the one field that
//!   cascades: every transitive successor snaps to start at its
//!   predecessor's end, keeping its own duration.
//! - Re-linking snaps the operation behind its new predecessor and
//!   cascades immediately, since its end just moved.
//!
//! The cascade is an iterative walk over the successor table guarded by a
//! visited set: a revisit means the link data is cyclic and the pass
//! aborts with an error instead of looping. Completed operations are
//! frozen anchors: their window is never rewritten, and the walk
//! continues past them from their existing end.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{Chain, OperationId, RelinkPolicy};
use crate::timeutil;

/// One field edit on one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldChange {
    /// Move the start to another calendar date, keeping the start time.
    StartDate(NaiveDate),
    /// Move the start to another wall-clock time, keeping the date.
    StartTime(NaiveTime),
    /// Move the end to another calendar date, keeping the end time.
    EndDate(NaiveDate),
    /// Move the end to another wall-clock time, keeping the date.
    EndTime(NaiveTime),
    /// Set the duration in minutes. Negative input clamps to zero.
    Duration(i64),
    /// Re-link to a new predecessor, or detach (`None`).
    PreviousOperation(Option<OperationId>),
}

/// Non-fatal conditions observed while applying a change.
///
/// Carried next to the resulting chain the way a schedule carries its
/// violations; the edit itself still applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeFlag {
    /// The edited window ended before it started. The duration clamped
    /// to zero and no cascade ran.
    InvertedWindow { operation: OperationId },
    /// A completed successor kept its window; the cascade continued past
    /// it from its existing end.
    FrozenAnchor { operation: OperationId },
}

/// Fatal propagation failures. The chain is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropagationError {
    /// The edited or referenced operation does not exist.
    #[error("unknown operation: {0}")]
    UnknownOperation(OperationId),
    /// The edited operation is completed and frozen to the propagator.
    #[error("operation {0} is completed and can no longer be rescheduled")]
    CompletedOperation(OperationId),
    /// The successor walk revisited an operation: the link data is
    /// cyclic. Not correctable by a field edit.
    #[error("dependency cycle detected at operation {0}")]
    CycleDetected(OperationId),
    /// An operation was linked to itself.
    #[error("operation {0} cannot depend on itself")]
    SelfReference(OperationId),
}

/// Result of a successful change application.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOutcome {
    /// The updated chain.
    pub chain: Chain,
    /// Non-fatal conditions observed during the pass.
    pub flags: Vec<ChangeFlag>,
    /// Ids whose windows were rewritten, in cascade order (the edited
    /// operation first).
    pub touched: Vec<OperationId>,
}

/// Applies one field edit and cascades it.
///
/// Pure with respect to its inputs: the incoming chain is consumed and
/// either returned updated or dropped on error.
pub fn apply_field_change(
    mut chain: Chain,
    operation_id: &str,
    change: FieldChange,
) -> Result<ChangeOutcome, PropagationError> {
    if !chain.contains(operation_id) {
        return Err(PropagationError::UnknownOperation(operation_id.to_string()));
    }
    if chain.get(operation_id).is_some_and(|op| op.is_completed()) {
        return Err(PropagationError::CompletedOperation(operation_id.to_string()));
    }

    let mut flags = Vec::new();
    let mut touched = vec![operation_id.to_string()];
    let mut cascade_needed = false;

    match change {
        FieldChange::StartDate(date) => {
            let op = chain.get_mut(operation_id).expect("presence checked above");
            op.start = timeutil::to_instant(date, op.start.time());
            if op.duration_minutes > 0 {
                op.end = timeutil::add_minutes(op.start, op.duration_minutes);
            }
        }
        FieldChange::StartTime(time) => {
            let op = chain.get_mut(operation_id).expect("presence checked above");
            op.start = timeutil::to_instant(op.start.date(), time);
            if op.duration_minutes > 0 {
                op.end = timeutil::add_minutes(op.start, op.duration_minutes);
            }
        }
        FieldChange::Duration(minutes) => {
            let op = chain.get_mut(operation_id).expect("presence checked above");
            op.duration_minutes = minutes.max(0);
            op.end = timeutil::add_minutes(op.start, op.duration_minutes);
        }
        FieldChange::EndDate(date) => {
            let op = chain.get_mut(operation_id).expect("presence checked above");
            op.end = timeutil::to_instant(date, op.end.time());
            cascade_needed = finish_end_edit(operation_id, &mut chain, &mut flags);
        }
        FieldChange::EndTime(time) => {
            let op = chain.get_mut(operation_id).expect("presence checked above");
            op.end = timeutil::to_instant(op.end.date(), time);
            cascade_needed = finish_end_edit(operation_id, &mut chain, &mut flags);
        }
        FieldChange::PreviousOperation(previous) => {
            if let Some(prev_id) = &previous {
                if prev_id == operation_id {
                    return Err(PropagationError::SelfReference(operation_id.to_string()));
                }
                if !chain.contains(prev_id) {
                    return Err(PropagationError::UnknownOperation(prev_id.clone()));
                }
            }
            chain.relink(operation_id, previous.clone());
            if let Some(prev_id) = previous {
                let parent_end = chain.get(&prev_id).expect("presence checked above").end;
                let op = chain.get_mut(operation_id).expect("presence checked above");
                op.start = parent_end;
                op.end = timeutil::add_minutes(op.start, op.duration_minutes);
                // The end just moved, so successors move with it.
                cascade_needed = true;
            }
        }
    }

    if cascade_needed {
        cascade(&mut chain, operation_id, &mut flags, &mut touched)?;
    }

    debug!(
        operation = operation_id,
        touched = touched.len(),
        flags = flags.len(),
        "field change applied"
    );
    Ok(ChangeOutcome { chain, flags, touched })
}

/// Removes an operation and re-propagates the surviving stretch.
///
/// With `RelinkPolicy::Bridge` the successor is snapped behind its new
/// predecessor and the cascade continues from there; with `LeaveGap` the
/// successor keeps its window and becomes a chain head.
pub fn remove_operation(
    mut chain: Chain,
    operation_id: &str,
    policy: RelinkPolicy,
) -> Result<ChangeOutcome, PropagationError> {
    if !chain.contains(operation_id) {
        return Err(PropagationError::UnknownOperation(operation_id.to_string()));
    }
    let successor = chain.successor_of(operation_id).cloned();
    let removed = chain
        .remove(operation_id, policy)
        .expect("presence checked above");

    let mut flags = Vec::new();
    let mut touched = Vec::new();

    if policy == RelinkPolicy::Bridge {
        if let (Some(succ_id), Some(prev_id)) = (successor, removed.previous_operation) {
            let parent_end = chain
                .get(&prev_id)
                .ok_or_else(|| PropagationError::UnknownOperation(prev_id.clone()))?
                .end;
            let succ = chain
                .get_mut(&succ_id)
                .expect("successor survives the removal");
            if succ.is_completed() {
                flags.push(ChangeFlag::FrozenAnchor { operation: succ_id.clone() });
            } else {
                succ.start = parent_end;
                succ.end = timeutil::add_minutes(succ.start, succ.duration_minutes);
                touched.push(succ_id.clone());
            }
            cascade(&mut chain, &succ_id, &mut flags, &mut touched)?;
        }
    }

    Ok(ChangeOutcome { chain, flags, touched })
}

/// Refreshes predicted windows the way the nightly server job does.
///
/// For every chain head that has not started and whose predicted start
/// has slipped before `today`, the predicted window shifts to `today`
/// (same wall-clock time) and the forecast rolls down the chain: each
/// successor's predicted start is its predecessor's reference end
/// (predicted end, else actual end, else planned end), and its predicted
/// end follows from its own duration.
pub fn refresh_predictions(mut chain: Chain, today: NaiveDate) -> Result<Chain, PropagationError> {
    let heads: Vec<OperationId> = chain
        .iter()
        .filter(|op| op.previous_operation.is_none() && op.actual_start.is_none())
        .map(|op| op.id.clone())
        .collect();

    for head_id in heads {
        let head = chain.get_mut(&head_id).expect("head id came from the chain");
        let Some(predicted_start) = head.predicted_start else {
            continue;
        };
        if predicted_start.date() >= today {
            continue;
        }
        let shifted = timeutil::to_instant(today, predicted_start.time());
        head.predicted_start = Some(shifted);
        head.predicted_end = Some(timeutil::add_minutes(shifted, head.duration_minutes));
        debug!(operation = %head_id, "predicted window shifted to today");

        roll_predictions(&mut chain, &head_id)?;
    }
    Ok(chain)
}

/// Rolls predicted windows from `from` down its successor stretch.
fn roll_predictions(chain: &mut Chain, from: &str) -> Result<(), PropagationError> {
    let mut visited: HashSet<OperationId> = HashSet::new();
    visited.insert(from.to_string());

    let mut reference_end = reference_end_of(chain, from);
    let mut cursor = chain.successor_of(from).cloned();
    while let Some(id) = cursor {
        if !visited.insert(id.clone()) {
            return Err(PropagationError::CycleDetected(id));
        }
        let op = chain.get_mut(&id).expect("successor table points into the arena");
        if let Some(start) = reference_end {
            op.predicted_start = Some(start);
            op.predicted_end = Some(timeutil::add_minutes(start, op.duration_minutes));
        }
        reference_end = reference_end_of(chain, &id);
        cursor = chain.successor_of(&id).cloned();
    }
    Ok(())
}

/// The instant a successor's forecast hangs off: predicted end, else
/// actual end, else planned end.
fn reference_end_of(chain: &Chain, id: &str) -> Option<NaiveDateTime> {
    let op = chain.get(id)?;
    op.predicted_end.or(op.actual_end).or(Some(op.planned_end))
}

/// Re-derives the edited operation's duration after an end edit.
///
/// Returns whether the cascade should run: an inverted window clamps to
/// zero, flags, and stays local.
fn finish_end_edit(operation_id: &str, chain: &mut Chain, flags: &mut Vec<ChangeFlag>) -> bool {
    let op = chain.get_mut(operation_id).expect("presence checked by caller");
    if op.rederive_duration() {
        true
    } else {
        flags.push(ChangeFlag::InvertedWindow { operation: operation_id.to_string() });
        false
    }
}

/// Walks the successor stretch of `from`, snapping each operation behind
/// its predecessor's end while preserving its own duration.
fn cascade(
    chain: &mut Chain,
    from: &str,
    flags: &mut Vec<ChangeFlag>,
    touched: &mut Vec<OperationId>,
) -> Result<(), PropagationError> {
    let mut visited: HashSet<OperationId> = HashSet::new();
    visited.insert(from.to_string());

    let mut parent_end = chain.get(from).expect("caller validated the id").end;
    let mut cursor = chain.successor_of(from).cloned();
    while let Some(id) = cursor {
        if !visited.insert(id.clone()) {
            return Err(PropagationError::CycleDetected(id));
        }
        let op = chain.get_mut(&id).expect("successor table points into the arena");
        if op.is_completed() {
            // Frozen anchor: keep its window, continue from its end.
            parent_end = op.end;
            flags.push(ChangeFlag::FrozenAnchor { operation: id.clone() });
        } else {
            op.start = parent_end;
            op.end = timeutil::add_minutes(op.start, op.duration_minutes);
            parent_end = op.end;
            touched.push(id.clone());
        }
        cursor = chain.successor_of(&id).cloned();
    }
    Ok(())
}
