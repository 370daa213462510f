//! Terminal rendering of projections.

use serde::Serialize;

use aclip_models::{stage_color, stage_display_name, LifecycleStatus, PipelineProgress, Projection};

/// Width of the text progress bar.
const BAR_WIDTH: usize = 20;

/// Pipeline details shown under a processing project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Details<'a> {
    pub stage: String,
    pub stage_color: &'static str,
    pub percent: u8,
    pub message: &'a str,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    project_id: &'a str,
    status: LifecycleStatus,
    #[serde(flatten)]
    projection: &'a Projection,
    color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Details<'a>>,
}

/// One human readable status line.
pub fn text_line(project_id: &str, projection: &Projection) -> String {
    format!("{:<24} {} {}", project_id, bar(projection), projection)
}

/// Pipeline details, available only while processing with pipeline data.
pub fn details(
    status: LifecycleStatus,
    pipeline: Option<&PipelineProgress>,
) -> Option<Details<'_>> {
    match (status, pipeline) {
        (LifecycleStatus::Processing, Some(progress)) => Some(Details {
            stage: stage_display_name(&progress.stage),
            stage_color: stage_color(&progress.stage),
            percent: progress.percent,
            message: &progress.message,
        }),
        _ => None,
    }
}

/// Indented details line printed under the status line.
pub fn details_line(details: &Details<'_>) -> String {
    let line = format!(
        "{:<24} {} {}% [{}]",
        "", details.stage, details.percent, details.stage_color
    );
    if details.message.is_empty() {
        line
    } else {
        format!("{} {}", line, details.message)
    }
}

/// One JSON status line.
pub fn json_line(
    project_id: &str,
    status: LifecycleStatus,
    projection: &Projection,
    details: Option<&Details<'_>>,
) -> serde_json::Result<String> {
    serde_json::to_string(&JsonLine {
        project_id,
        status,
        projection,
        color: projection.tone.color(),
        details,
    })
}

fn bar(projection: &Projection) -> String {
    let filled = usize::from(projection.percentage) * BAR_WIDTH / 100;
    let fill = if projection.failed { 'x' } else { '#' };
    format!(
        "[{}{}]",
        fill.to_string().repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}
