//! Progress tracking metrics.
//!
//! Counters for poll outcomes, lifecycle transitions and local inferences.

use metrics::counter;

use aclip_models::LifecycleStatus;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total polls by kind (`download` / `pipeline`) and outcome.
    pub const POLLS_TOTAL: &str = "aclip_polls_total";

    /// Total lifecycle transitions by target status.
    pub const TRANSITIONS_TOTAL: &str = "aclip_transitions_total";

    /// Total locally inferred downloading -> processing transitions.
    pub const INFERENCES_TOTAL: &str = "aclip_inferences_total";
}

/// Poll kind label values.
pub mod kind {
    pub const DOWNLOAD: &str = "download";
    pub const PIPELINE: &str = "pipeline";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record the outcome of one poll.
pub fn record_poll(kind: &'static str, ok: bool) {
    counter!(
        names::POLLS_TOTAL,
        "kind" => kind,
        "outcome" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

/// Record a lifecycle transition.
pub fn record_transition(to: LifecycleStatus) {
    counter!(names::TRANSITIONS_TOTAL, "to" => to.as_str()).increment(1);
}

/// Record an applied local inference.
pub fn record_inference() {
    counter!(names::INFERENCES_TOTAL).increment(1);
}
