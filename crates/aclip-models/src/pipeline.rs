//! Pipeline stage progress and stage helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Tokens that mark a pipeline message as a failure (case-sensitive).
pub const FAILURE_TOKENS: &[&str] = &["失败", "错误", "failed", "Error"];

/// Stage name reported once the pipeline has finished.
pub const DONE_STAGE: &str = "DONE";

/// Color used for stages this client does not know.
const DEFAULT_STAGE_COLOR: &str = "#d9d9d9";

/// Known stages: (wire name, display name, color).
const STAGES: &[(&str, &str, &str)] = &[
    ("INGEST", "Preparando material", "#1890ff"),
    ("SUBTITLE", "Procesando subtitulos", "#13c2c2"),
    ("ANALYZE", "Analizando contenido", "#722ed1"),
    ("SCORING", "Puntuando clips", "#eb2f96"),
    ("HIGHLIGHT", "Localizando fragmentos", "#fa8c16"),
    ("EXPORT", "Exportando video", "#52c41a"),
    (DONE_STAGE, "Procesamiento completo", "#52c41a"),
];

/// Latest pipeline progress reported for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineProgress {
    /// Project this record belongs to
    pub project_id: String,
    /// Pipeline stage name
    pub stage: String,
    /// Stage progress (0-100)
    #[serde(default, deserialize_with = "deserialize_percent")]
    pub percent: u8,
    /// Human readable stage message
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Server timestamp of the record
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ts_seconds_opt")]
    pub ts: Option<DateTime<Utc>>,
}

impl PipelineProgress {
    /// Create a record without a timestamp.
    pub fn new(
        project_id: impl Into<String>,
        stage: impl Into<String>,
        percent: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            stage: stage.into(),
            percent: percent.min(100),
            message: message.into(),
            ts: None,
        }
    }

    /// Whether the pipeline reached its final stage.
    pub fn is_completed(&self) -> bool {
        is_completed(&self.stage)
    }

    /// Whether the stage message reports a failure.
    pub fn is_failed(&self) -> bool {
        is_failed(&self.message)
    }
}

fn known_stage(stage: &str) -> Option<&'static (&'static str, &'static str, &'static str)> {
    STAGES.iter().find(|(name, _, _)| name.eq_ignore_ascii_case(stage.trim()))
}

/// Display name for a pipeline stage; unknown stages display as-is.
pub fn stage_display_name(stage: &str) -> String {
    known_stage(stage)
        .map(|(_, display, _)| (*display).to_string())
        .unwrap_or_else(|| stage.to_string())
}

/// Color for a pipeline stage.
pub fn stage_color(stage: &str) -> &'static str {
    known_stage(stage)
        .map(|(_, _, color)| *color)
        .unwrap_or(DEFAULT_STAGE_COLOR)
}

/// Whether the stage marks pipeline completion.
pub fn is_completed(stage: &str) -> bool {
    stage.trim().eq_ignore_ascii_case(DONE_STAGE)
}

/// Whether a pipeline message reports a failure.
pub fn is_failed(message: &str) -> bool {
    FAILURE_TOKENS.iter().any(|token| message.contains(token))
}

/// Accept integer or float percentages and clamp them into `0..=100`.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    Ok(crate::lifecycle::clamp_percent(value).round() as u8)
}

/// Treat a JSON `null` string as empty.
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unix timestamps in (fractional) seconds.
mod ts_seconds_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_f64(ts.timestamp_millis() as f64 / 1000.0),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.and_then(|s| DateTime::from_timestamp_millis((s * 1000.0) as i64)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_name() {
        assert_eq!(stage_display_name("ANALYZE"), "Analizando contenido");
        assert_eq!(stage_display_name("scoring"), "Puntuando clips");
        assert_eq!(stage_display_name("RENDER_PREVIEW"), "RENDER_PREVIEW");
    }

    #[test]
    fn test_stage_color() {
        assert_eq!(stage_color("export"), "#52c41a");
        assert_eq!(stage_color("mystery"), DEFAULT_STAGE_COLOR);
    }

    #[test]
    fn test_is_completed() {
        assert!(is_completed("DONE"));
        assert!(is_completed("done"));
        assert!(!is_completed("EXPORT"));
    }

    #[test]
    fn test_is_failed_is_case_sensitive() {
        assert!(is_failed("处理失败"));
        assert!(is_failed("export failed: disk full"));
        assert!(is_failed("Error in ASR"));
        assert!(!is_failed("FAILED"));
        assert!(!is_failed("scoring clips"));
        assert!(!is_failed(""));
    }

    #[test]
    fn test_deserialize_float_percent_and_ts() {
        let json = r#"{"project_id":"p1","stage":"SCORING","percent":41.6,"message":"scoring clips","ts":1700000000.5}"#;
        let progress: PipelineProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.percent, 42);
        assert_eq!(progress.ts.unwrap().timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_deserialize_out_of_range_percent() {
        let json = r#"{"project_id":"p1","stage":"EXPORT","percent":250}"#;
        let progress: PipelineProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.message, "");
        assert!(progress.ts.is_none());
    }

    #[test]
    fn test_deserialize_null_message() {
        let json = r#"{"project_id":"p1","stage":"INGEST","percent":null,"message":null}"#;
        let progress: PipelineProgress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.percent, 0);
        assert_eq!(progress.message, "");
    }
}
