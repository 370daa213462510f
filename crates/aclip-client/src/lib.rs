//! HTTP client for the AutoClip projects and progress APIs.
//!
//! This crate provides:
//! - `ApiClient` for fetching project records and pipeline progress snapshots
//! - `ProjectSource` / `PipelineSource` traits so trackers can be driven by
//!   in-memory fakes in tests
//! - Environment-driven configuration

pub mod client;
pub mod config;
pub mod error;
pub mod source;

#[cfg(test)]
mod client_tests;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use source::{PipelineSource, ProjectSource};
