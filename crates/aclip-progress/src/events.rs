//! Status change events.
//!
//! Trackers publish changes over an unbounded channel instead of invoking
//! callbacks. Each event is emitted at most once per actual change.

use tokio::sync::mpsc;

use aclip_models::{LifecycleStatus, Projection};

/// A change observed for one tracked project.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// Lifecycle status changed
    LifecycleChanged {
        project_id: String,
        from: LifecycleStatus,
        to: LifecycleStatus,
    },
    /// Cached download progress changed
    DownloadProgress { project_id: String, percent: f64 },
    /// Rendered projection changed
    Projection {
        project_id: String,
        projection: Projection,
    },
}

impl StatusEvent {
    /// Project the event belongs to.
    pub fn project_id(&self) -> &str {
        match self {
            StatusEvent::LifecycleChanged { project_id, .. }
            | StatusEvent::DownloadProgress { project_id, .. }
            | StatusEvent::Projection { project_id, .. } => project_id,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<StatusEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<StatusEvent>;

/// Create an event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
