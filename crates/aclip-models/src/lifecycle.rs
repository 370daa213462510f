//! Project lifecycle status and tracked item types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse lifecycle status of a tracked project.
///
/// The server is authoritative for every transition except
/// `downloading -> processing`, which may be inferred locally once the
/// download reaches 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStatus {
    /// Waiting for a worker
    #[default]
    Pending,
    /// Importing a local file
    Importing,
    /// Downloading the source video
    Downloading,
    /// Running the clipping pipeline
    Processing,
    /// Pipeline finished successfully
    Completed,
    /// Download or pipeline failed
    Failed,
    /// Any status this client does not recognize; rendered as waiting
    #[serde(other)]
    Unknown,
}

impl LifecycleStatus {
    /// Every status, including `Unknown`.
    pub const ALL: [LifecycleStatus; 7] = [
        LifecycleStatus::Pending,
        LifecycleStatus::Importing,
        LifecycleStatus::Downloading,
        LifecycleStatus::Processing,
        LifecycleStatus::Completed,
        LifecycleStatus::Failed,
        LifecycleStatus::Unknown,
    ];

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Pending => "pending",
            LifecycleStatus::Importing => "importing",
            LifecycleStatus::Downloading => "downloading",
            LifecycleStatus::Processing => "processing",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Failed => "failed",
            LifecycleStatus::Unknown => "unknown",
        }
    }

    /// Parse a status string as reported by the server.
    ///
    /// `error` is an alias for `failed`; anything unrecognized is `Unknown`.
    pub fn from_server(value: &str) -> Self {
        match value.trim() {
            "pending" => LifecycleStatus::Pending,
            "importing" => LifecycleStatus::Importing,
            "downloading" => LifecycleStatus::Downloading,
            "processing" => LifecycleStatus::Processing,
            "completed" => LifecycleStatus::Completed,
            "failed" | "error" => LifecycleStatus::Failed,
            _ => LifecycleStatus::Unknown,
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleStatus::Completed | LifecycleStatus::Failed)
    }

    /// Whether pipeline-stage polling should run in this state.
    pub fn polls_pipeline(&self) -> bool {
        matches!(self, LifecycleStatus::Pending | LifecycleStatus::Processing)
    }

    /// Whether project-record (download progress) polling should run in this state.
    pub fn polls_download(&self) -> bool {
        matches!(
            self,
            LifecycleStatus::Importing | LifecycleStatus::Downloading | LifecycleStatus::Processing
        )
    }
}

impl std::fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LifecycleStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_server(s))
    }
}

/// Rejected tracked item parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTrackedItem {
    #[error("project id must not be empty")]
    EmptyId,
}

/// One unit of work whose progress is being observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    /// Opaque project identifier
    pub id: String,
    /// Initial lifecycle status
    pub status: LifecycleStatus,
    /// Initial download progress (0-100)
    #[serde(default)]
    pub download_progress: f64,
}

impl TrackedItem {
    /// Create a tracked item with zero download progress.
    pub fn new(id: impl Into<String>, status: LifecycleStatus) -> Result<Self, InvalidTrackedItem> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InvalidTrackedItem::EmptyId);
        }

        Ok(Self {
            id,
            status,
            download_progress: 0.0,
        })
    }

    /// Set the initial download progress, clamped to 0-100.
    pub fn with_download_progress(mut self, percent: f64) -> Self {
        self.download_progress = clamp_percent(percent);
        self
    }
}

/// Clamp a percentage to `[0, 100]`, mapping NaN to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
