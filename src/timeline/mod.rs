//! Timeline coordinate mapping and Gantt layout.
//!
//! `viewport` maps calendar dates into a bounded visible window;
//! `gantt` composes per-operation bar geometry and markers on top of it.
//! Both are pure: geometry is a function of (window, chain, now).

mod gantt;
mod viewport;

pub use gantt::{layout_operations, GanttLayout, OperationRow};
pub use viewport::{Bar, LineAlign, Viewport, DEFAULT_CELL_WIDTH};
