//! Timeline coordinate mapping.
//!
//! Converts absolute calendar dates into pixel positions inside a
//! bounded visible window: a start date, a length in days, and a fixed
//! day-cell width. The mapper is stateless; geometry is re-derived from
//! (window, data) on every call.
//!
//! # Clipping
//!
//! Intervals are mapped at day granularity: the start offset floors to
//! whole days since the window start, the span ceils with a one-day
//! minimum (a same-day operation still gets a visible bar), and the
//! result clips to the window. Fully outside means `None`: the caller
//! renders nothing.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Default day-cell width in pixels.
pub const DEFAULT_CELL_WIDTH: f32 = 40.0;

const SECS_PER_DAY: i64 = 86_400;

/// Where a single-instant marker sits within its day cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAlign {
    /// Left edge of the cell.
    Start,
    /// Middle of the cell.
    Center,
    /// Right edge of the cell (the boundary to the next day).
    End,
}

/// A clipped horizontal bar extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Left edge in pixels from the window start.
    pub left: f32,
    /// Width in pixels. Always positive.
    pub width: f32,
}

/// The visible window of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// First visible calendar date (day 0).
    pub start: NaiveDate,
    /// Number of visible days. At least 1.
    pub days: i64,
    /// Pixel width of one day cell.
    pub cell_width: f32,
}

impl Viewport {
    /// Creates a viewport with the default cell width.
    pub fn new(start: NaiveDate, days: i64) -> Self {
        Self {
            start,
            days: days.max(1),
            cell_width: DEFAULT_CELL_WIDTH,
        }
    }

    /// Sets the day-cell width.
    pub fn with_cell_width(mut self, cell_width: f32) -> Self {
        self.cell_width = cell_width.max(0.0);
        self
    }

    /// Days between the window start and `date`. Negative before the
    /// window, beyond `days` after it.
    #[inline]
    pub fn offset_of(&self, date: NaiveDate) -> i64 {
        (date - self.start).num_days()
    }

    /// Total pixel width of the window.
    pub fn total_width(&self) -> f32 {
        self.days as f32 * self.cell_width
    }

    /// The visible dates, in order. Handy for rendering the header row.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start;
        (0..self.days).map(move |i| start + chrono::Duration::days(i))
    }

    /// Maps an interval to a clipped bar, or `None` when it lies fully
    /// outside the window.
    ///
    /// A zero-length (or inverted) interval maps to one day cell.
    pub fn map_interval(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<Bar> {
        let start_offset = self.offset_of(start.date());
        let span_secs = (end - start).num_seconds();
        let duration_days = ceil_days(span_secs).max(1);

        let visible_left = start_offset.max(0);
        let visible_right = (start_offset + duration_days).min(self.days);
        if visible_right <= visible_left {
            return None;
        }
        Some(Bar {
            left: visible_left as f32 * self.cell_width,
            width: (visible_right - visible_left) as f32 * self.cell_width,
        })
    }

    /// Maps a single date to a marker offset, or `None` when the date is
    /// outside the window.
    ///
    /// An `End`-aligned marker on the last visible day sits exactly on
    /// the window's right edge.
    pub fn map_line(&self, date: NaiveDate, align: LineAlign) -> Option<f32> {
        let offset = self.offset_of(date);
        if offset < 0 || offset > self.days {
            return None;
        }
        let base = offset as f32 * self.cell_width;
        Some(match align {
            LineAlign::Start => base,
            LineAlign::Center => base + self.cell_width / 2.0,
            LineAlign::End => base + self.cell_width,
        })
    }
}

/// Ceiling division of seconds into whole days; non-positive spans yield
/// zero.
fn ceil_days(secs: i64) -> i64 {
    if secs <= 0 {
        0
    } else {
        (secs + SECS_PER_DAY - 1) / SECS_PER_DAY
    }
}
