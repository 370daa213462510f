//! Fixed-interval pipeline progress polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use aclip_client::PipelineSource;

use crate::config::sane_interval;
use crate::metrics::{self, kind};
use crate::store::ProgressStore;

struct ActivePoll {
    ids: Vec<String>,
    interval: Duration,
    task: JoinHandle<()>,
}

/// Polls the pipeline snapshot for a set of projects and writes it to a store.
///
/// At most one polling task runs per poller. Dropping the poller stops it.
pub struct PipelinePoller {
    source: Arc<dyn PipelineSource>,
    store: ProgressStore,
    active: Option<ActivePoll>,
}

impl PipelinePoller {
    pub fn new(source: Arc<dyn PipelineSource>, store: ProgressStore) -> Self {
        Self {
            source,
            store,
            active: None,
        }
    }

    /// Start polling `ids` every `every`.
    ///
    /// Returns `false` if the same poll is already running. A running poll
    /// with different ids or interval is replaced.
    pub fn start_polling(&mut self, ids: Vec<String>, every: Duration) -> bool {
        let every = sane_interval(every);

        if let Some(active) = &self.active {
            if active.ids == ids && active.interval == every && !active.task.is_finished() {
                return false;
            }
        }
        self.stop_polling();

        if ids.is_empty() {
            return false;
        }

        info!(projects = ?ids, interval_ms = every.as_millis() as u64, "Starting pipeline progress polling");
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            self.store.clone(),
            ids.clone(),
            every,
        ));

        self.active = Some(ActivePoll {
            ids,
            interval: every,
            task,
        });
        true
    }

    /// Stop polling. Returns `false` if nothing was running.
    pub fn stop_polling(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                info!(projects = ?active.ids, "Stopping pipeline progress polling");
                active.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.task.is_finished())
    }

    /// Ids currently being polled.
    pub fn polled_ids(&self) -> &[String] {
        self.active.as_ref().map(|a| a.ids.as_slice()).unwrap_or(&[])
    }
}

impl Drop for PipelinePoller {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.task.abort();
        }
    }
}

async fn poll_loop(
    source: Arc<dyn PipelineSource>,
    store: ProgressStore,
    ids: Vec<String>,
    every: Duration,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match source.fetch_snapshot(&ids).await {
            Ok(records) => {
                metrics::record_poll(kind::PIPELINE, true);
                let mut changed = 0usize;
                for record in records {
                    if !ids.contains(&record.project_id) {
                        debug!(project_id = %record.project_id, "Ignoring progress for untracked project");
                        continue;
                    }
                    if store.set(record) {
                        changed += 1;
                    }
                }
                debug!(changed, "Pipeline progress poll complete");
            }
            Err(e) => {
                metrics::record_poll(kind::PIPELINE, false);
                warn!(projects = ?ids, "Failed to fetch pipeline progress: {}", e);
            }
        }
    }
}
