//! Shared pipeline progress store.
//!
//! Holds the latest `PipelineProgress` per project and broadcasts every change.
//! One store is created by the owner of the trackers and handed to each of them.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::trace;

use aclip_models::PipelineProgress;

/// Default broadcast buffer per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// Keyed cache of the latest pipeline progress per project.
#[derive(Clone)]
pub struct ProgressStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    records: RwLock<HashMap<String, PipelineProgress>>,
    updates: broadcast::Sender<PipelineProgress>,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("records", &self.len())
            .field("subscribers", &self.inner.updates.receiver_count())
            .finish()
    }
}

impl ProgressStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store with the given broadcast buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (updates, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(StoreInner {
                records: RwLock::new(HashMap::new()),
                updates,
            }),
        }
    }

    /// Latest progress for a project.
    pub fn get(&self, project_id: &str) -> Option<PipelineProgress> {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .cloned()
    }

    /// Store a record. Returns `true` and notifies subscribers only if it changed.
    pub fn set(&self, record: PipelineProgress) -> bool {
        {
            let mut records = self
                .inner
                .records
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            if records.get(&record.project_id) == Some(&record) {
                return false;
            }
            records.insert(record.project_id.clone(), record.clone());
        }

        trace!(
            project_id = %record.project_id,
            stage = %record.stage,
            percent = record.percent,
            "Pipeline progress updated"
        );
        // No subscribers is fine
        let _ = self.inner.updates.send(record);
        true
    }

    /// Forget a project's progress.
    pub fn remove(&self, project_id: &str) -> Option<PipelineProgress> {
        self.inner
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project_id)
    }

    /// Subscribe to record changes for all projects.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineProgress> {
        self.inner.updates.subscribe()
    }

    /// Number of projects with progress.
    pub fn len(&self) -> usize {
        self.inner
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = ProgressStore::new();
        assert!(store.get("p1").is_none());

        assert!(store.set(PipelineProgress::new("p1", "ANALYZE", 20, "analyzing")));
        assert_eq!(store.get("p1").unwrap().percent, 20);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_set_broadcasts_only_changes() {
        let store = ProgressStore::new();
        let mut rx = store.subscribe();

        let record = PipelineProgress::new("p1", "SCORING", 40, "scoring clips");
        assert!(store.set(record.clone()));
        assert!(!store.set(record.clone()));
        assert!(store.set(PipelineProgress::new("p1", "SCORING", 41, "scoring clips")));

        assert_eq!(rx.recv().await.unwrap(), record);
        assert_eq!(rx.recv().await.unwrap().percent, 41);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let store = ProgressStore::new();
        let other = store.clone();
        other.set(PipelineProgress::new("p2", "EXPORT", 90, ""));
        assert_eq!(store.get("p2").unwrap().stage, "EXPORT");

        assert!(store.remove("p2").is_some());
        assert!(other.is_empty());
    }
}
