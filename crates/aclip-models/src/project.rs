//! Project records returned by the projects API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lifecycle::{clamp_percent, LifecycleStatus};
use crate::pipeline::null_as_empty;

/// Download progress fields nested in a project record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadFields {
    /// Download progress (0-100); numbers and numeric strings are accepted
    #[serde(default, deserialize_with = "lenient_number")]
    pub download_progress: Option<f64>,
    /// Raw download status message
    #[serde(default, deserialize_with = "null_as_empty")]
    pub download_message: String,
}

/// Project record as returned by `GET /api/v1/projects/{id}`.
///
/// Only the fields used for progress tracking are modeled; everything else
/// in the response is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Project identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Server lifecycle status string
    #[serde(default)]
    pub status: Option<String>,
    /// Processing configuration, preferred source of download fields
    #[serde(default)]
    pub processing_config: Option<DownloadFields>,
    /// Legacy settings object, used when `processing_config` is absent
    #[serde(default)]
    pub settings: Option<DownloadFields>,
}

/// Download state extracted from a project record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSnapshot {
    /// Download percent, clamped to 0-100
    pub percent: f64,
    /// Raw (untranslated) message
    pub message: String,
}

impl DownloadSnapshot {
    /// True if the snapshot carries neither progress nor a message.
    ///
    /// Empty snapshots must not overwrite previously cached progress.
    pub fn is_empty(&self) -> bool {
        self.percent <= 0.0 && self.message.trim().is_empty()
    }
}

impl ProjectRecord {
    /// Extract the download fields, preferring `processing_config` over `settings`.
    pub fn download_snapshot(&self) -> DownloadSnapshot {
        let fields = self
            .processing_config
            .as_ref()
            .or(self.settings.as_ref());

        match fields {
            Some(fields) => DownloadSnapshot {
                percent: clamp_percent(fields.download_progress.unwrap_or(0.0)),
                message: fields.download_message.clone(),
            },
            None => DownloadSnapshot::default(),
        }
    }

    /// Server status parsed into a lifecycle status, if any was reported.
    pub fn lifecycle_status(&self) -> Option<LifecycleStatus> {
        self.status.as_deref().map(LifecycleStatus::from_server)
    }

    /// Transition the server status demands, if it is authoritative.
    ///
    /// Only `processing`, `completed` and `failed`/`error` are acted upon;
    /// other server statuses leave the local status untouched.
    pub fn reported_transition(&self) -> Option<LifecycleStatus> {
        match self.lifecycle_status()? {
            status @ (LifecycleStatus::Processing
            | LifecycleStatus::Completed
            | LifecycleStatus::Failed) => Some(status),
            _ => None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
