//! Progress reconciliation for tracked projects.
//!
//! This crate merges download progress (from the project record) and pipeline
//! stage progress (from the progress snapshot) into a single projection per
//! project, and owns the polling loops that keep it current:
//! - `ProgressStore`: keyed cache of the latest pipeline progress
//! - `PipelinePoller`: fixed-interval snapshot polling into the store
//! - `ProgressReconciler`: status/progress state machine for one project
//! - `ProgressTracker`: background driver owning both loops for one project

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod pipeline_poller;
pub mod reconciler;
pub mod store;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use events::{EventReceiver, EventSender, StatusEvent};
pub use pipeline_poller::PipelinePoller;
pub use reconciler::{project, DeferredTransition, DownloadState, ProgressReconciler, FALLBACK_CAP};
pub use store::ProgressStore;
pub use tracker::{fetch_tracked_item, ProgressTracker, TrackerSources};
