//! State module for tracking task progress
//!
//! This module defines the per-task status state machine.
//!
//! # Components
//!
//! - `TaskStatus`: where a task is in its discovery → capture lifecycle, and
//!   which transitions between statuses are legal

mod task_status;

// Re-export main types
pub use task_status::TaskStatus;
