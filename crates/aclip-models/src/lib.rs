//! Shared data models for AutoClip progress tracking.
//!
//! This crate provides Serde-serializable types for:
//! - Project lifecycle statuses and tracked items
//! - Project records returned by the projects API
//! - Pipeline stage progress and stage helpers
//! - Download status message translation
//! - Render-ready progress projections

pub mod lifecycle;
pub mod message;
pub mod pipeline;
pub mod project;
pub mod projection;

// Re-export common types
pub use lifecycle::{clamp_percent, InvalidTrackedItem, LifecycleStatus, TrackedItem};
pub use message::{processing_fallback_message, translate_download_message};
pub use pipeline::{is_completed, is_failed, stage_color, stage_display_name, PipelineProgress};
pub use project::{DownloadFields, DownloadSnapshot, ProjectRecord};
pub use projection::{Projection, Tone};
