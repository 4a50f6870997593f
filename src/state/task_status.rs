/// Task status definitions for tracking pipeline progress
///
/// This module defines every status a task can be in and the legal edges
/// between them.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current status of a crawl-and-capture task
///
/// ```text
/// running -> sitemap_complete -> capturing_screenshots -> complete
///    \              \                     \
///     +--------------+---------------------+--> failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    // ===== Active States =====
    /// Link discovery (phase 1) is in progress
    Running,

    /// Discovery finished; capture has not started yet
    SitemapComplete,

    /// Screenshots (phase 2) are being captured
    CapturingScreenshots,

    // ===== Terminal States =====
    /// Both phases finished
    Complete,

    /// A phase-level error stopped the task; accumulated data is kept
    Failed,
}

impl TaskStatus {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is a legal edge
    ///
    /// Only the forward chain and `-> failed` from any non-terminal status are
    /// allowed; nothing leaves `complete` or `failed`.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::SitemapComplete)
                | (Self::SitemapComplete, Self::CapturingScreenshots)
                | (Self::CapturingScreenshots, Self::Complete)
                | (Self::Running, Self::Failed)
                | (Self::SitemapComplete, Self::Failed)
                | (Self::CapturingScreenshots, Self::Failed)
        )
    }

    /// Wire name used in status responses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::SitemapComplete => "sitemap_complete",
            Self::CapturingScreenshots => "capturing_screenshots",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
