//! Output formatting for utilization reports.
//!
//! This module handles the one-shot `query` command output:
//! - [`report`] - Table and JSON rendering of a utilization response
//! - [`terminal`] - Field alignment helpers

mod report;
mod terminal;

pub use report::{print_utilization, render_json, render_table};
pub use terminal::format_field;
