//! Background tracking of a single project.
//!
//! `ProgressTracker::spawn` starts one driver task per project. The driver
//! owns the reconciler and every timer for that project:
//! - the download poll interval, active while importing/downloading/processing
//! - the pipeline poller, active while pending/processing
//! - the delayed local `downloading -> processing` inference
//!
//! All state changes happen on the driver task, so they are applied in the
//! order poll responses arrive. Tracking ends when the project reaches a
//! terminal status, when `stop` is called, or when the handle is dropped.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, info_span, warn, Instrument};

use aclip_client::{ClientResult, PipelineSource, ProjectSource};
use aclip_models::{LifecycleStatus, PipelineProgress, ProjectRecord, TrackedItem};

use crate::config::{sane_interval, TrackerConfig};
use crate::error::{TrackerError, TrackerResult};
use crate::events::{self, EventReceiver};
use crate::pipeline_poller::PipelinePoller;
use crate::reconciler::{DeferredTransition, ProgressReconciler};
use crate::store::ProgressStore;

/// Data sources a tracker polls.
#[derive(Clone)]
pub struct TrackerSources {
    pub projects: Arc<dyn ProjectSource>,
    pub pipeline: Arc<dyn PipelineSource>,
}

impl TrackerSources {
    pub fn new(projects: Arc<dyn ProjectSource>, pipeline: Arc<dyn PipelineSource>) -> Self {
        Self { projects, pipeline }
    }

    /// Use one client for both endpoints.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: ProjectSource + PipelineSource + 'static,
    {
        Self {
            projects: client.clone(),
            pipeline: client,
        }
    }
}

enum DriverMsg {
    SetStatus(LifecycleStatus),
    SetDownloadProgress(f64),
    Fetched {
        generation: u64,
        result: ClientResult<ProjectRecord>,
    },
    Deferred(DeferredTransition),
    Stop,
}

/// Handle to a running project tracker.
pub struct ProgressTracker {
    project_id: String,
    inbox: mpsc::UnboundedSender<DriverMsg>,
    task: Option<JoinHandle<()>>,
}

impl ProgressTracker {
    /// Start tracking a project.
    ///
    /// Returns the handle and the receiving end of the project's event channel.
    /// The channel closes once tracking ends.
    pub fn spawn(
        item: TrackedItem,
        sources: TrackerSources,
        store: ProgressStore,
        config: TrackerConfig,
    ) -> TrackerResult<(Self, EventReceiver)> {
        let (events_tx, events_rx) = events::channel();
        let reconciler = ProgressReconciler::new(item, store.clone())?
            .with_events(events_tx)
            .with_inference_delay(config.inference_delay);
        let project_id = reconciler.project_id().to_string();

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            pipeline: PipelinePoller::new(Arc::clone(&sources.pipeline), store.clone()),
            updates: store.subscribe(),
            reconciler,
            sources,
            config,
            inbox: inbox_rx,
            outbox: inbox_tx.clone(),
            download_ticker: None,
            ticker_status: None,
            generation: 0,
            deferred: None,
        };

        let span = info_span!("tracker", project_id = %project_id);
        let task = tokio::spawn(driver.run().instrument(span));

        Ok((
            Self {
                project_id,
                inbox: inbox_tx,
                task: Some(task),
            },
            events_rx,
        ))
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Override the lifecycle status (e.g. from an externally pushed update).
    pub fn set_lifecycle_status(&self, status: LifecycleStatus) -> TrackerResult<()> {
        self.send(DriverMsg::SetStatus(status))
    }

    /// Override the cached download progress.
    pub fn set_download_progress(&self, percent: f64) -> TrackerResult<()> {
        self.send(DriverMsg::SetDownloadProgress(percent))
    }

    /// Whether tracking has ended.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop tracking and wait for all timers to be released.
    pub async fn stop(mut self) {
        let _ = self.inbox.send(DriverMsg::Stop);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!(project_id = %self.project_id, "Tracker task failed: {}", e);
                }
            }
        }
    }

    fn send(&self, msg: DriverMsg) -> TrackerResult<()> {
        self.inbox
            .send(msg)
            .map_err(|_| TrackerError::TrackerClosed(self.project_id.clone()))
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Driver {
    reconciler: ProgressReconciler,
    sources: TrackerSources,
    config: TrackerConfig,
    pipeline: PipelinePoller,
    updates: broadcast::Receiver<PipelineProgress>,
    inbox: mpsc::UnboundedReceiver<DriverMsg>,
    outbox: mpsc::UnboundedSender<DriverMsg>,
    download_ticker: Option<Interval>,
    /// Status the download ticker was started for
    ticker_status: Option<LifecycleStatus>,
    /// Bumped whenever download polling stops; stale responses are dropped
    generation: u64,
    deferred: Option<JoinHandle<()>>,
}

impl Driver {
    async fn run(mut self) {
        info!(status = %self.reconciler.status(), "Tracking started");
        self.reconciler.publish_projection();
        self.sync_polling();

        while !self.reconciler.status().is_terminal() {
            tokio::select! {
                _ = next_tick(&mut self.download_ticker) => self.spawn_fetch(),
                msg = self.inbox.recv() => match msg {
                    Some(DriverMsg::Stop) | None => break,
                    Some(msg) => self.handle(msg),
                },
                update = self.updates.recv() => match update {
                    Ok(progress) => self.reconciler.apply_pipeline_progress(&progress),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Progress updates lagged, resyncing from store");
                        if let Some(progress) = self.reconciler.pipeline_progress() {
                            self.reconciler.apply_pipeline_progress(&progress);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
            self.sync_polling();
        }

        self.teardown();
        info!(status = %self.reconciler.status(), "Tracking stopped");
    }

    fn handle(&mut self, msg: DriverMsg) {
        match msg {
            DriverMsg::SetStatus(status) => {
                self.reconciler.set_lifecycle_status(status);
            }
            DriverMsg::SetDownloadProgress(percent) => {
                self.reconciler.set_download_progress(percent);
            }
            DriverMsg::Fetched { generation, result } => {
                if generation != self.generation || self.download_ticker.is_none() {
                    debug!("Discarding project response from a stopped poll loop");
                    return;
                }
                if let Some(transition) = self.reconciler.handle_fetch_result(result) {
                    self.schedule(transition);
                }
            }
            DriverMsg::Deferred(transition) => {
                self.deferred = None;
                self.reconciler.apply_deferred(transition);
            }
            DriverMsg::Stop => {}
        }
    }

    /// Start or stop each poll loop to match the current status.
    fn sync_polling(&mut self) {
        let status = self.reconciler.status();

        if status.polls_pipeline() {
            let ids = vec![self.reconciler.project_id().to_string()];
            self.pipeline.start_polling(ids, self.config.pipeline_interval);
        } else {
            self.pipeline.stop_polling();
        }

        if status.polls_download() {
            // Restart on every status change so the new state is fetched immediately
            if self.ticker_status != Some(status) {
                let mut ticker = interval(sane_interval(self.config.download_interval));
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.download_ticker = Some(ticker);
                self.ticker_status = Some(status);
            }
        } else if self.download_ticker.take().is_some() {
            debug!(status = %status, "Stopping download progress polling");
            self.ticker_status = None;
            self.generation += 1;
        }
    }

    /// Fetch the project record without blocking the driver.
    ///
    /// The request is never aborted; its response is matched against the
    /// current generation when it arrives.
    fn spawn_fetch(&self) {
        let source = Arc::clone(&self.sources.projects);
        let outbox = self.outbox.clone();
        let project_id = self.reconciler.project_id().to_string();
        let generation = self.generation;

        tokio::spawn(async move {
            let result = source.fetch_project(&project_id).await;
            let _ = outbox.send(DriverMsg::Fetched { generation, result });
        });
    }

    fn schedule(&mut self, transition: DeferredTransition) {
        if self.deferred.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let outbox = self.outbox.clone();
        self.deferred = Some(tokio::spawn(async move {
            tokio::time::sleep(transition.after).await;
            let _ = outbox.send(DriverMsg::Deferred(transition));
        }));
    }

    fn teardown(&mut self) {
        self.pipeline.stop_polling();
        if self.download_ticker.take().is_some() {
            self.generation += 1;
        }
        if let Some(task) = self.deferred.take() {
            task.abort();
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        // Also reached when the driver task is aborted mid-loop
        if let Some(task) = self.deferred.take() {
            task.abort();
        }
    }
}

/// Build a tracked item from the project's current server state.
///
/// Statuses the client does not recognize start as `Pending`.
pub async fn fetch_tracked_item(
    source: &dyn ProjectSource,
    project_id: &str,
) -> TrackerResult<TrackedItem> {
    let mut item = TrackedItem::new(project_id, LifecycleStatus::Pending)?;
    let record = source.fetch_project(&item.id).await?;

    if let Some(status) = record.lifecycle_status() {
        if status != LifecycleStatus::Unknown {
            item.status = status;
        }
    }
    debug!(project_id = %item.id, status = %item.status, "Fetched initial project state");
    Ok(item.with_download_progress(record.download_snapshot().percent))
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
