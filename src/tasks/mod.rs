//! Task table and pipeline orchestration
//!
//! - `TaskStore`: the injectable, process-wide table of task records
//! - `Orchestrator`: starts tasks and sequences discovery then capture

mod orchestrator;
mod store;

pub use orchestrator::Orchestrator;
pub use store::{ApiCallRecord, CaptureResult, TaskId, TaskSnapshot, TaskStore};
