//! Render-ready progress projection.

use serde::{Deserialize, Serialize};

/// Visual tone of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Importing,
    Downloading,
    Processing,
    Success,
    Error,
    Idle,
}

impl Tone {
    /// Foreground color for this tone.
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Importing => "#ffc107",
            Tone::Downloading => "#1890ff",
            Tone::Processing | Tone::Success => "#52c41a",
            Tone::Error => "#ff4d4f",
            Tone::Idle => "#d9d9d9",
        }
    }
}

/// Normalized progress handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Progress percentage (0-100)
    pub percentage: u8,
    /// Secondary caption; may be empty for a failed pipeline
    pub caption: String,
    /// Whether the item is shown as failed
    pub failed: bool,
    /// Primary label, e.g. `45%` or `✓`
    pub headline: String,
    /// Visual tone
    pub tone: Tone,
}

impl Projection {
    /// Projection showing a percentage headline.
    pub fn percent(percentage: f64, caption: impl Into<String>, tone: Tone) -> Self {
        let percentage = crate::lifecycle::clamp_percent(percentage).round() as u8;
        Self {
            percentage,
            caption: caption.into(),
            failed: false,
            headline: format!("{}%", percentage),
            tone,
        }
    }

    /// Terminal success projection.
    pub fn completed() -> Self {
        Self {
            percentage: 100,
            caption: "Completado".to_string(),
            failed: false,
            headline: "✓".to_string(),
            tone: Tone::Success,
        }
    }

    /// Failure projection with the given caption.
    pub fn failure(percentage: u8, caption: impl Into<String>) -> Self {
        Self {
            percentage: percentage.min(100),
            caption: caption.into(),
            failed: true,
            headline: "✗ Error".to_string(),
            tone: Tone::Error,
        }
    }

    /// Waiting projection for pending or unrecognized statuses.
    pub fn waiting() -> Self {
        Self {
            percentage: 0,
            caption: "Esperando proceso".to_string(),
            failed: false,
            headline: "○ En espera".to_string(),
            tone: Tone::Idle,
        }
    }
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.caption.is_empty() {
            write!(f, "{}", self.headline)
        } else {
            write!(f, "{} {}", self.headline, self.caption)
        }
    }
}
