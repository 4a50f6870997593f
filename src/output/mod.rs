//! Output module for read-time views of a task
//!
//! This module handles:
//! - Deduplicating recorded API calls for display
//! - Generating Markdown reports of a task's results

mod api_calls;
mod report;

pub use api_calls::{dedupe_api_calls, ApiCallSummary};
pub use report::{format_task_report, write_task_report, OutputError, OutputResult};
