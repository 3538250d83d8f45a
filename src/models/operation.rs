//! Operation model.
//!
//! An operation is the smallest schedulable unit of a manufacturing
//! order: a named step with a working time window, a minute-granular
//! duration, at most one predecessor link, and lifecycle timestamps.
//!
//! # Windows
//!
//! Each operation carries up to four windows:
//! - **Planned**: the immutable baseline set at creation, never moved by
//!   propagation. Rendered as the "plan" track.
//! - **Working** (`start`/`end`): the current schedule, moved by field
//!   edits and cascades.
//! - **Predicted**: an externally computed forecast; optional.
//! - **Actual**: real execution timestamps set by lifecycle transitions.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timeutil;

/// Stable operation identifier.
///
/// Persisted operations carry store-assigned ids; locally created drafts
/// carry generated UUIDs until first save.
pub type OperationId = String;

/// Lifecycle state, derived from the actual timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Not yet started.
    Planned,
    /// Started (`actual_start` set) but not finished.
    InProgress,
    /// Finished (`actual_end` set). Terminal.
    Completed,
}

/// A single manufacturing operation.
///
/// `PartialEq` is derived so sessions can detect local edits by snapshot
/// comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    pub id: OperationId,
    /// Human-readable name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Working window start.
    pub start: NaiveDateTime,
    /// Working window end. Kept equal to `start + duration_minutes`.
    pub end: NaiveDateTime,
    /// Declared duration in whole minutes. Never negative.
    pub duration_minutes: i64,
    /// Predecessor link. `None` marks a chain head.
    pub previous_operation: Option<OperationId>,
    /// Successor back-reference. Derived from `previous_operation` by the
    /// chain index; never authoritative on its own.
    pub next_operation: Option<OperationId>,
    /// Assigned approver (master). Gates lifecycle transitions.
    pub master: Option<String>,
    /// Assigned workshop, set when the operation starts.
    pub workshop: Option<String>,
    /// Assigned executors, set when the operation starts.
    pub executors: Vec<String>,
    /// Baseline window start. Set once at creation.
    pub planned_start: NaiveDateTime,
    /// Baseline window end. Set once at creation.
    pub planned_end: NaiveDateTime,
    /// Forecast window start, externally computed.
    pub predicted_start: Option<NaiveDateTime>,
    /// Forecast window end, externally computed.
    pub predicted_end: Option<NaiveDateTime>,
    /// Real start timestamp. Presence means in progress (or completed).
    pub actual_start: Option<NaiveDateTime>,
    /// Real end timestamp. Presence means completed.
    pub actual_end: Option<NaiveDateTime>,
}

impl Operation {
    /// Creates an operation with the given working window.
    ///
    /// The planned baseline is snapshotted from the window and the
    /// duration derived from it.
    pub fn new(
        id: impl Into<OperationId>,
        name: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            start,
            end,
            duration_minutes: timeutil::duration_minutes(start, end),
            previous_operation: None,
            next_operation: None,
            master: None,
            workshop: None,
            executors: Vec::new(),
            planned_start: start,
            planned_end: end,
            predicted_start: None,
            predicted_end: None,
            actual_start: None,
            actual_end: None,
        }
    }

    /// Creates a draft operation with a generated id and the default
    /// workshop-day window: `base_date` 08:00 to 20:00.
    pub fn draft(name: impl Into<String>, base_date: NaiveDate) -> Self {
        let start = base_date.and_hms_opt(8, 0, 0).expect("valid wall-clock time");
        let end = base_date.and_hms_opt(20, 0, 0).expect("valid wall-clock time");
        Self::new(Uuid::new_v4().to_string(), name, start, end)
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the predecessor link.
    pub fn with_previous(mut self, previous: impl Into<OperationId>) -> Self {
        self.previous_operation = Some(previous.into());
        self
    }

    /// Sets the assigned approver.
    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master = Some(master.into());
        self
    }

    /// Sets the forecast window.
    pub fn with_predicted(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.predicted_start = Some(start);
        self.predicted_end = Some(end);
        self
    }

    /// Lifecycle state derived from actual timestamps.
    pub fn status(&self) -> OperationStatus {
        if self.actual_end.is_some() {
            OperationStatus::Completed
        } else if self.actual_start.is_some() {
            OperationStatus::InProgress
        } else {
            OperationStatus::Planned
        }
    }

    /// Whether the operation is completed and thus frozen to propagation.
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.actual_end.is_some()
    }

    /// Re-derives `duration_minutes` from the working window.
    ///
    /// Returns `false` when the window is inverted (end before start), in
    /// which case the duration clamps to zero.
    pub fn rederive_duration(&mut self) -> bool {
        self.duration_minutes = timeutil::duration_minutes(self.start, self.end);
        self.end >= self.start
    }

    /// Normalizes externally ingested actual timestamps.
    ///
    /// Store data may carry an `actual_end` without an `actual_start`
    /// (an operation finished without ever being explicitly started). The
    /// start is backfilled from the planned duration so the actual track
    /// stays renderable.
    pub fn normalize_actuals(&mut self) {
        if let (Some(end), None) = (self.actual_end, self.actual_start) {
            let planned = self.planned_end - self.planned_start;
            self.actual_start = Some(end - planned);
        }
    }
}
