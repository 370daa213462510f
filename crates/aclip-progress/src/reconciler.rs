//! Progress reconciliation for a single tracked project.
//!
//! `ProgressReconciler` holds the locally cached download state and lifecycle
//! status of one project, applies poll responses to it, and maps the result to
//! a `Projection`. It performs no scheduling itself; `ProgressTracker` drives it.

use std::time::Duration;

use tracing::{debug, info, warn};

use aclip_client::{ClientResult, ProjectSource};
use aclip_models::{
    processing_fallback_message, stage_display_name, translate_download_message,
    LifecycleStatus, PipelineProgress, ProjectRecord, Projection, Tone, TrackedItem,
};

use crate::error::TrackerResult;
use crate::events::{EventSender, StatusEvent};
use crate::metrics::{self, kind};
use crate::store::ProgressStore;

/// Highest percent shown while processing without pipeline data.
pub const FALLBACK_CAP: f64 = 95.0;

/// Caption shown for a project that failed.
const FAILED_CAPTION: &str = "Fallo de procesamiento";

/// Locally cached download progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadState {
    /// Percent (0-100)
    pub percent: f64,
    /// Translated download message
    pub message: String,
}

/// A locally inferred transition to apply after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredTransition {
    pub to: LifecycleStatus,
    pub after: Duration,
}

/// Map a lifecycle status and the cached progress to a projection.
///
/// Total over every status; unknown statuses render as waiting.
pub fn project(
    status: LifecycleStatus,
    download: &DownloadState,
    pipeline: Option<&PipelineProgress>,
) -> Projection {
    match status {
        LifecycleStatus::Importing => {
            let caption = if download.message.is_empty() {
                "Importando"
            } else {
                "Procesando importacion"
            };
            Projection::percent(download.percent, caption, Tone::Importing)
        }
        LifecycleStatus::Downloading => {
            Projection::percent(download.percent, "Descargando", Tone::Downloading)
        }
        LifecycleStatus::Processing => match pipeline {
            // Clamps 96-99 to the cap as well, not only a finished download
            None => Projection::percent(
                download.percent.min(FALLBACK_CAP),
                processing_fallback_message(&download.message),
                Tone::Processing,
            ),
            Some(progress) if progress.is_failed() => Projection::failure(progress.percent, ""),
            Some(progress) => Projection::percent(
                f64::from(progress.percent),
                stage_display_name(&progress.stage),
                Tone::Processing,
            ),
        },
        LifecycleStatus::Completed => Projection::completed(),
        LifecycleStatus::Failed => Projection::failure(0, FAILED_CAPTION),
        LifecycleStatus::Pending | LifecycleStatus::Unknown => Projection::waiting(),
    }
}

/// Status and progress state machine for one project.
pub struct ProgressReconciler {
    project_id: String,
    status: LifecycleStatus,
    download: DownloadState,
    store: ProgressStore,
    inference_delay: Duration,
    events: Option<EventSender>,
    last_projection: Option<Projection>,
}

impl ProgressReconciler {
    /// Create a reconciler for a tracked item.
    pub fn new(item: TrackedItem, store: ProgressStore) -> TrackerResult<Self> {
        // Fields are public, so revalidate
        let item = TrackedItem::new(item.id, item.status)?.with_download_progress(item.download_progress);

        Ok(Self {
            project_id: item.id,
            status: item.status,
            download: DownloadState {
                percent: item.download_progress,
                message: String::new(),
            },
            store,
            inference_delay: Duration::from_millis(1000),
            events: None,
            last_projection: None,
        })
    }

    /// Publish change events to the given channel.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Delay applied to the local `downloading -> processing` inference.
    pub fn with_inference_delay(mut self, delay: Duration) -> Self {
        self.inference_delay = delay;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status
    }

    pub fn download(&self) -> &DownloadState {
        &self.download
    }

    /// Latest pipeline progress for this project.
    pub fn pipeline_progress(&self) -> Option<PipelineProgress> {
        self.store.get(&self.project_id)
    }

    /// Projection for `status` given the currently cached progress.
    pub fn reconcile(&self, status: LifecycleStatus) -> Projection {
        project(status, &self.download, self.pipeline_progress().as_ref())
    }

    /// Projection for the current status.
    pub fn projection(&self) -> Projection {
        self.reconcile(self.status)
    }

    // =========================================================================
    // State changes
    // =========================================================================

    /// Set the lifecycle status. Returns `false` if it was already set.
    pub fn set_lifecycle_status(&mut self, to: LifecycleStatus) -> bool {
        if self.status == to {
            return false;
        }

        let from = self.status;
        self.status = to;

        info!(
            project_id = %self.project_id,
            from = %from,
            to = %to,
            "Lifecycle status changed"
        );
        metrics::record_transition(to);
        self.emit(StatusEvent::LifecycleChanged {
            project_id: self.project_id.clone(),
            from,
            to,
        });
        self.publish_projection();
        true
    }

    /// Override the cached download percent. Returns `false` if unchanged.
    pub fn set_download_progress(&mut self, percent: f64) -> bool {
        let percent = aclip_models::clamp_percent(percent);
        let changed = self.update_download(percent, None);
        self.publish_projection();
        changed
    }

    fn update_download(&mut self, percent: f64, message: Option<String>) -> bool {
        if let Some(message) = message {
            self.download.message = message;
        }
        if self.download.percent == percent {
            return false;
        }

        self.download.percent = percent;
        debug!(project_id = %self.project_id, percent, "Download progress updated");
        self.emit(StatusEvent::DownloadProgress {
            project_id: self.project_id.clone(),
            percent,
        });
        true
    }

    /// Apply a project record fetched from the server.
    ///
    /// Returns a deferred transition when the download finished locally but the
    /// server has not confirmed processing yet.
    pub fn apply_project_record(&mut self, record: &ProjectRecord) -> Option<DeferredTransition> {
        let snapshot = record.download_snapshot();

        // Transient empty responses must not reset visible progress
        if !snapshot.is_empty() {
            let message = translate_download_message(&snapshot.message);
            self.update_download(snapshot.percent, Some(message));
        }

        let deferred = match record.reported_transition() {
            Some(to) => {
                self.set_lifecycle_status(to);
                None
            }
            None if snapshot.percent >= 100.0 && self.status == LifecycleStatus::Downloading => {
                debug!(
                    project_id = %self.project_id,
                    "Download complete without server confirmation, scheduling processing"
                );
                Some(DeferredTransition {
                    to: LifecycleStatus::Processing,
                    after: self.inference_delay,
                })
            }
            None => None,
        };

        self.publish_projection();
        deferred
    }

    /// Apply the outcome of a project fetch. Failures are logged and skipped.
    pub fn handle_fetch_result(
        &mut self,
        result: ClientResult<ProjectRecord>,
    ) -> Option<DeferredTransition> {
        match result {
            Ok(record) => {
                metrics::record_poll(kind::DOWNLOAD, true);
                self.apply_project_record(&record)
            }
            Err(e) => {
                metrics::record_poll(kind::DOWNLOAD, false);
                warn!(
                    project_id = %self.project_id,
                    transient = e.is_transient(),
                    "Failed to fetch download progress: {}", e
                );
                None
            }
        }
    }

    /// Fetch the project record and apply it.
    pub async fn poll_download_progress(
        &mut self,
        source: &dyn ProjectSource,
    ) -> Option<DeferredTransition> {
        let result = source.fetch_project(&self.project_id).await;
        self.handle_fetch_result(result)
    }

    /// React to a pipeline progress record.
    ///
    /// A finished stage completes the project; a failure message fails it.
    pub fn apply_pipeline_progress(&mut self, progress: &PipelineProgress) {
        if progress.project_id != self.project_id {
            return;
        }

        if progress.is_completed() {
            self.set_lifecycle_status(LifecycleStatus::Completed);
        } else if progress.is_failed() {
            warn!(
                project_id = %self.project_id,
                stage = %progress.stage,
                "Pipeline reported failure: {}", progress.message
            );
            self.set_lifecycle_status(LifecycleStatus::Failed);
        }
        self.publish_projection();
    }

    /// Apply a previously deferred transition.
    ///
    /// Only takes effect while the project is still downloading, so a status
    /// confirmed by the server in the meantime is never overwritten.
    pub fn apply_deferred(&mut self, transition: DeferredTransition) -> bool {
        if self.status != LifecycleStatus::Downloading {
            debug!(
                project_id = %self.project_id,
                status = %self.status,
                "Dropping deferred transition, status already changed"
            );
            return false;
        }

        metrics::record_inference();
        self.set_lifecycle_status(transition.to)
    }

    /// Emit the current projection if it differs from the last one emitted.
    pub fn publish_projection(&mut self) {
        let projection = self.projection();
        if self.last_projection.as_ref() == Some(&projection) {
            return;
        }

        self.last_projection = Some(projection.clone());
        self.emit(StatusEvent::Projection {
            project_id: self.project_id.clone(),
            projection,
        });
    }

    fn emit(&self, event: StatusEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is watching anymore
            let _ = events.send(event);
        }
    }
}
