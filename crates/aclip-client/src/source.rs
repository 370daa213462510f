//! Progress data sources.
//!
//! Trackers depend on these traits rather than on `ApiClient` directly so the
//! polling logic can be exercised against in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;

use aclip_models::{PipelineProgress, ProjectRecord};

use crate::error::ClientResult;

/// Source of project records (status and download progress).
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Fetch the current record for a project.
    async fn fetch_project(&self, project_id: &str) -> ClientResult<ProjectRecord>;
}

/// Source of pipeline stage progress.
#[async_trait]
pub trait PipelineSource: Send + Sync {
    /// Fetch the latest pipeline progress for the given projects.
    ///
    /// Projects without pipeline data are simply absent from the result.
    async fn fetch_snapshot(&self, project_ids: &[String]) -> ClientResult<Vec<PipelineProgress>>;
}

#[async_trait]
impl<T: ProjectSource + ?Sized> ProjectSource for Arc<T> {
    async fn fetch_project(&self, project_id: &str) -> ClientResult<ProjectRecord> {
        (**self).fetch_project(project_id).await
    }
}

#[async_trait]
impl<T: PipelineSource + ?Sized> PipelineSource for Arc<T> {
    async fn fetch_snapshot(&self, project_ids: &[String]) -> ClientResult<Vec<PipelineProgress>> {
        (**self).fetch_snapshot(project_ids).await
    }
}
