//! Tracker error types.

use thiserror::Error;

use aclip_client::ClientError;
use aclip_models::InvalidTrackedItem;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors surfaced to code that owns a tracker.
///
/// Poll failures never show up here; they are logged and the cycle skipped.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid tracked item: {0}")]
    InvalidItem(#[from] InvalidTrackedItem),

    #[error("Tracker for project {0} is no longer running")]
    TrackerClosed(String),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}
