//! Gantt layout engine.
//!
//! Turns an operation chain into renderable geometry for one frame: per
//! operation up to three clipped bars (plan, predicted, actual) plus the
//! "today" and deadline markers. Pure with respect to its inputs: "now"
//! is a parameter, never read from an ambient clock, so two calls with
//! the same arguments produce the same layout.
//!
//! # Tracks
//!
//! - **Plan**: the immutable baseline window.
//! - **Predicted**: the forecast window when present, else the current
//!   working window.
//! - **Actual**: real execution. An in-progress operation's actual bar
//!   runs from its actual start to `now` and grows with each frame.
//!
//! A missing bar means "draw nothing", not an error.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::viewport::{Bar, LineAlign, Viewport};
use crate::models::{Chain, Operation, OperationId, OperationStatus};

/// Geometry for one operation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRow {
    /// Operation id.
    pub id: OperationId,
    /// Operation name, for the label column.
    pub name: String,
    /// Lifecycle state at layout time.
    pub status: OperationStatus,
    /// Baseline bar.
    pub plan: Option<Bar>,
    /// Forecast bar (or working-window fallback).
    pub predicted: Option<Bar>,
    /// Execution bar.
    pub actual: Option<Bar>,
}

/// A full frame of chart geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttLayout {
    /// One row per operation, in chain display order.
    pub rows: Vec<OperationRow>,
    /// Pixel offset of the "today" marker (center of today's cell).
    pub today: Option<f32>,
    /// Pixel offset of the deadline marker (end of the deadline cell).
    pub deadline: Option<f32>,
    /// Total drawable width of the window.
    pub total_width: f32,
}

/// Lays out a chain inside a viewport.
///
/// `now` drives both the "today" marker and the open end of in-progress
/// actual bars. `deadline` is the order deadline, if any.
pub fn layout_operations(
    chain: &Chain,
    viewport: &Viewport,
    now: NaiveDateTime,
    deadline: Option<NaiveDate>,
) -> GanttLayout {
    let rows = chain
        .iter()
        .map(|op| layout_row(op, viewport, now))
        .collect();

    GanttLayout {
        rows,
        today: viewport.map_line(now.date(), LineAlign::Center),
        deadline: deadline.and_then(|d| viewport.map_line(d, LineAlign::End)),
        total_width: viewport.total_width(),
    }
}

fn layout_row(op: &Operation, viewport: &Viewport, now: NaiveDateTime) -> OperationRow {
    let plan = viewport.map_interval(op.planned_start, op.planned_end);

    let predicted = match (op.predicted_start, op.predicted_end) {
        (Some(start), Some(end)) => viewport.map_interval(start, end),
        _ => viewport.map_interval(op.start, op.end),
    };

    let actual = match (op.actual_start, op.actual_end) {
        (Some(start), Some(end)) => viewport.map_interval(start, end),
        // In progress: open-ended up to "now".
        (Some(start), None) => viewport.map_interval(start, now),
        _ => None,
    };

    OperationRow {
        id: op.id.clone(),
        name: op.name.clone(),
        status: op.status(),
        plan,
        predicted,
        actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Operation;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    /// Window: 2025-03-01 + 10 days, 40px cells.
    fn viewport() -> Viewport {
        Viewport::new(date(1), 10)
    }

    fn chain_one(op: Operation) -> Chain {
        Chain::from_operations(vec![op])
    }

    #[test]
    fn test_plan_bar_from_baseline() {
        // Working window moved to day 6; the plan track stays on the
        // day-4 baseline.
        let mut op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        op.start = dt(6, 8);
        op.end = dt(6, 20);
        let layout = layout_operations(&chain_one(op), &viewport(), dt(2, 12), None);

        let row = &layout.rows[0];
        assert_eq!(row.plan, Some(Bar { left: 120.0, width: 40.0 }));
        assert_eq!(row.predicted, Some(Bar { left: 200.0, width: 40.0 }));
    }

    #[test]
    fn test_predicted_bar_prefers_forecast() {
        let op = Operation::new("a", "A", dt(4, 8), dt(4, 20)).with_predicted(dt(5, 8), dt(5, 20));
        let layout = layout_operations(&chain_one(op), &viewport(), dt(2, 12), None);
        assert_eq!(layout.rows[0].predicted, Some(Bar { left: 160.0, width: 40.0 }));
    }

    #[test]
    fn test_actual_bar_closed() {
        let mut op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        op.actual_start = Some(dt(4, 9));
        op.actual_end = Some(dt(5, 18));
        let layout = layout_operations(&chain_one(op), &viewport(), dt(6, 12), None);
        let row = &layout.rows[0];
        assert_eq!(row.status, OperationStatus::Completed);
        assert_eq!(row.actual, Some(Bar { left: 120.0, width: 80.0 }));
    }

    #[test]
    fn test_in_progress_actual_bar_grows_with_now() {
        let mut op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        op.actual_start = Some(dt(4, 9));
        let chain = chain_one(op);
        let vp = viewport();

        let early = layout_operations(&chain, &vp, dt(5, 12), None);
        let late = layout_operations(&chain, &vp, dt(7, 12), None);

        let early_bar = early.rows[0].actual.unwrap();
        let late_bar = late.rows[0].actual.unwrap();
        assert_eq!(early_bar.left, late_bar.left);
        assert!(late_bar.width > early_bar.width);
        assert_eq!(early.rows[0].status, OperationStatus::InProgress);
    }

    #[test]
    fn test_no_actual_bar_before_start() {
        let op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        let layout = layout_operations(&chain_one(op), &viewport(), dt(2, 12), None);
        assert_eq!(layout.rows[0].actual, None);
        assert_eq!(layout.rows[0].status, OperationStatus::Planned);
    }

    #[test]
    fn test_offscreen_operation_has_no_bars() {
        let op = Operation::new("a", "A", dt(20, 8), dt(21, 20));
        let layout = layout_operations(&chain_one(op), &viewport(), dt(2, 12), None);
        let row = &layout.rows[0];
        assert_eq!(row.plan, None);
        assert_eq!(row.predicted, None);
        assert_eq!(row.actual, None);
    }

    #[test]
    fn test_markers() {
        let op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        let layout =
            layout_operations(&chain_one(op), &viewport(), dt(3, 12), Some(date(8)));
        // Today centered in day-2's cell, deadline at the end of day-7's.
        assert_eq!(layout.today, Some(2.0 * 40.0 + 20.0));
        assert_eq!(layout.deadline, Some(7.0 * 40.0 + 40.0));
        assert_eq!(layout.total_width, 400.0);
    }

    #[test]
    fn test_markers_outside_window() {
        let op = Operation::new("a", "A", dt(4, 8), dt(4, 20));
        let layout = layout_operations(
            &chain_one(op),
            &viewport(),
            dt(25, 12),
            Some(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        );
        assert_eq!(layout.today, None);
        assert_eq!(layout.deadline, None);
    }

    #[test]
    fn test_rows_follow_display_order() {
        let chain = Chain::from_operations(vec![
            Operation::new("a", "A", dt(2, 8), dt(2, 20)),
            Operation::new("b", "B", dt(3, 8), dt(3, 20)).with_previous("a"),
        ]);
        let layout = layout_operations(&chain, &viewport(), dt(2, 12), None);
        let ids: Vec<_> = layout.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
