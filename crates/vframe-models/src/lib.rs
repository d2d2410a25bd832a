//! Shared data models for the vframe pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Queued work items and their wire format
//! - Pipeline processing results
//! - Worker identity and filesystem namespaces
//! - Completion/failure notification events
//! - Local upload and processed-archive listings

pub mod event;
pub mod file;
pub mod result;
pub mod video;
pub mod work_item;
pub mod worker;

// Re-export common types
pub use event::{EventData, EventType, EventUser, NotificationEvent};
pub use file::{ProcessedFile, VideoFile};
pub use result::ProcessingResult;
pub use video::{is_video_file, VideoId, VIDEO_EXTENSIONS};
pub use work_item::{derive_video_key, QueueMessage, WorkItem, FRAMES_SUBDIR};
pub use worker::WorkerIdentity;
