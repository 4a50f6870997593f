//! Markdown report generation
//!
//! This module generates a human-readable Markdown report of one task:
//! status, sitemap, screenshot links, API calls and any error.

use crate::output::ApiCallSummary;
use crate::tasks::TaskSnapshot;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Keeps tree indentation from collapsing outside a code block
const NBSP: &str = "\u{a0}";

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes the Markdown report of a task to `output_path`
pub fn write_task_report(
    task: &TaskSnapshot,
    sitemap: &[String],
    api_calls: &[ApiCallSummary],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_task_report(task, sitemap, api_calls);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a task as Markdown
///
/// `sitemap` is the rendered tree listing (plain or linked) and `api_calls`
/// the deduplicated call list.
pub fn format_task_report(
    task: &TaskSnapshot,
    sitemap: &[String],
    api_calls: &[ApiCallSummary],
) -> String {
    let mut md = String::new();

    md.push_str("# Site-Recce Report\n\n");

    // Task metadata
    md.push_str("## Task\n\n");
    md.push_str(&format!("- **Task ID**: {}\n", task.id));
    md.push_str(&format!("- **Seed**: {}\n", task.seed));
    md.push_str(&format!("- **Status**: {}\n", task.status));
    md.push_str(&format!("- **Started**: {}\n", task.created_at.to_rfc3339()));
    md.push_str(&format!("- **Updated**: {}\n", task.updated_at.to_rfc3339()));
    if let Some(addresses) = &task.addresses {
        md.push_str(&format!("- **Pages Discovered**: {}\n", addresses.len()));
    }
    md.push_str(&format!("- **Screenshots**: {}\n", task.captures.len()));
    md.push_str(&format!(
        "- **API Calls**: {} ({} distinct)\n\n",
        task.api_calls.len(),
        api_calls.len()
    ));

    if let Some(error) = &task.error {
        md.push_str("## Error\n\n");
        md.push_str(&format!("```\n{}\n```\n\n", error));
    }

    // Sitemap
    if task.addresses.is_some() {
        md.push_str("## Sitemap\n\n");
        // Unfenced: labels are Markdown links, one per hard-broken line
        md.push_str("/  \n");
        for line in sitemap {
            md.push_str(&line.replace(' ', NBSP));
            md.push_str("  \n");
        }
        md.push('\n');
    }

    // Screenshots
    if !task.captures.is_empty() {
        md.push_str("## Screenshots\n\n");
        md.push_str("| # | Page | Screenshot |\n");
        md.push_str("|---|------|------------|\n");
        for capture in &task.captures {
            md.push_str(&format!(
                "| {} | {} | [{}]({}) |\n",
                capture.index + 1,
                capture.address,
                capture.filename,
                capture.retrieval_url
            ));
        }
        md.push('\n');
    }

    // API calls
    if !api_calls.is_empty() {
        md.push_str("## API Calls\n\n");
        md.push_str("| Method | URL | Count |\n");
        md.push_str("|--------|-----|-------|\n");
        for call in api_calls {
            md.push_str(&format!("| {} | {} | {} |\n", call.method, call.url, call.count));
        }
        md.push('\n');
    }

    md
}
