//! Queue-driven video frame extraction worker.
//!
//! This crate provides:
//! - The pipeline controller (receive, claim, download, extract, archive, upload, notify)
//! - Scratch path guards for guaranteed cleanup
//! - Worker configuration from the environment
//! - Best-effort notifications and Prometheus metrics
//! - Local extract-and-archive for the HTTP surface

pub mod cleanup;
pub mod config;
pub mod error;
pub mod local;
pub mod logging;
pub mod metrics;
pub mod notifications;
pub mod pipeline;

pub use cleanup::{ScratchDir, ScratchFile};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use local::LocalVideoProcessor;
pub use logging::ItemLogger;
pub use notifications::Notifications;
pub use pipeline::{Collaborators, Pipeline, PollSummary};
