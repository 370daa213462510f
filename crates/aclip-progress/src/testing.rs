//! In-memory sources for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use aclip_client::{ClientError, ClientResult, PipelineSource, ProjectSource};
use aclip_models::{DownloadFields, PipelineProgress, ProjectRecord};

/// Build a project record with download fields under `processing_config`.
pub fn record(status: &str, percent: f64, message: &str) -> ProjectRecord {
    ProjectRecord {
        id: Some("p1".to_string()),
        status: Some(status.to_string()),
        processing_config: Some(DownloadFields {
            download_progress: Some(percent),
            download_message: message.to_string(),
        }),
        settings: None,
    }
}

/// Project source replaying queued responses, then repeating the last record.
pub struct ScriptedProjects {
    queue: Mutex<VecDeque<ClientResult<ProjectRecord>>>,
    fallback: Mutex<ProjectRecord>,
    calls: AtomicUsize,
}

impl ScriptedProjects {
    pub fn repeating(record: ProjectRecord) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(record),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a one-off response served before the repeating record.
    pub fn push(&self, response: ClientResult<ProjectRecord>) {
        self.queue.lock().unwrap().push_back(response);
    }

    /// Replace the repeating record.
    pub fn set(&self, record: ProjectRecord) {
        *self.fallback.lock().unwrap() = record;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectSource for ScriptedProjects {
    async fn fetch_project(&self, _project_id: &str) -> ClientResult<ProjectRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.queue.lock().unwrap().pop_front() {
            return response;
        }
        Ok(self.fallback.lock().unwrap().clone())
    }
}

/// Project source answering each call after its own scripted delay.
///
/// Calls beyond the script never complete.
pub struct DelayedProjects {
    script: Mutex<VecDeque<(Duration, ProjectRecord)>>,
    calls: AtomicUsize,
}

impl DelayedProjects {
    pub fn new(script: Vec<(Duration, ProjectRecord)>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProjectSource for DelayedProjects {
    async fn fetch_project(&self, _project_id: &str) -> ClientResult<ProjectRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some((delay, record)) => {
                tokio::time::sleep(delay).await;
                Ok(record)
            }
            None => std::future::pending().await,
        }
    }
}

/// Pipeline source serving a settable snapshot.
pub struct FakePipeline {
    records: Mutex<Vec<PipelineProgress>>,
    failures: AtomicUsize,
    calls: AtomicUsize,
}

impl FakePipeline {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, records: Vec<PipelineProgress>) {
        *self.records.lock().unwrap() = records;
    }

    /// Fail the next `n` fetches with a server error.
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineSource for FakePipeline {
    async fn fetch_snapshot(&self, project_ids: &[String]) -> ClientResult<Vec<PipelineProgress>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::from_http_status(503, "unavailable"));
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| project_ids.contains(&r.project_id))
            .cloned()
            .collect())
    }
}
