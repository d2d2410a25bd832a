//! Queued work items.
//!
//! A [`QueueMessage`] is the JSON body published by upstream services; the
//! worker turns it into a [`WorkItem`] once it knows the delivery's claim token.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Subdirectory of a worker's temp directory holding per-item frame directories.
pub const FRAMES_SUBDIR: &str = "frames";

/// Wire format of a queued video message.
///
/// Every field is optional on input. The Portuguese aliases are accepted so
/// messages from the original upload service keep deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueMessage {
    #[serde(alias = "id_video")]
    pub video_id: String,
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(alias = "autor")]
    pub author: String,
    pub status: String,
    /// Full object location, usually `s3://{bucket}/{key}`.
    pub file_path: String,
    #[serde(alias = "data_criacao")]
    pub created_at: String,
    #[serde(alias = "data_upload")]
    pub uploaded_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Bare object key, written by producers that already know it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_key: Option<String>,
}

impl QueueMessage {
    /// Build a message for an object key that is already in the blob store.
    pub fn for_key(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            video_id: key.clone(),
            status: "pending".to_string(),
            file_path: key.clone(),
            created_at: Utc::now().to_rfc3339(),
            video_key: Some(key),
            ..Default::default()
        }
    }

    /// Attach the delivery's claim token and resolve the object key.
    pub fn into_work_item(self, claim_token: impl Into<String>, bucket_prefix: &str) -> WorkItem {
        let source = if self.file_path.is_empty() {
            self.video_key.unwrap_or_default()
        } else {
            self.file_path
        };

        WorkItem {
            video_id: VideoId::from(self.video_id),
            video_key: derive_video_key(&source, bucket_prefix),
            claim_token: claim_token.into(),
            title: self.title,
            author: self.author,
            recipient_email: self.email.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Strip `bucket_prefix` (e.g. `s3://video-service-bucket/`) from a path.
///
/// Anything that does not carry the prefix, or would be empty once stripped,
/// is returned unchanged.
pub fn derive_video_key(file_path: &str, bucket_prefix: &str) -> String {
    if bucket_prefix.is_empty() {
        return file_path.to_string();
    }
    match file_path.strip_prefix(bucket_prefix) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => file_path.to_string(),
    }
}

/// One claimed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Correlation ID carried into notifications.
    pub video_id: VideoId,
    /// Source object key in the blob store.
    pub video_key: String,
    /// Opaque handle used to delete the delivery from the queue.
    pub claim_token: String,
    pub title: String,
    pub author: String,
    pub recipient_email: Option<String>,
}

impl WorkItem {
    /// Recipient for notifications, falling back to `default`.
    pub fn recipient_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.recipient_email.as_deref().unwrap_or(default)
    }

    /// Base name of the source object (`videos/u1/clip.mp4` -> `clip.mp4`).
    pub fn source_file_name(&self) -> &str {
        Path::new(&self.video_key)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("video")
    }

    /// Archive file name (`clip.mp4` -> `clip_frames.zip`).
    ///
    /// Only the last extension is removed, so `.mp4` gives `_frames.zip`.
    pub fn archive_name(&self) -> String {
        let name = self.source_file_name();
        let stem = name.rfind('.').map(|i| &name[..i]).unwrap_or(name);
        format!("{}_frames.zip", stem)
    }

    /// Filesystem-safe name derived from the claim token.
    pub fn scratch_name(&self) -> String {
        self.claim_token
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    /// Frames directory for this item, under [`FRAMES_SUBDIR`] of `temp_dir`
    /// so it never shares a parent with the downloaded video.
    pub fn frames_dir(&self, temp_dir: &Path) -> PathBuf {
        temp_dir.join(FRAMES_SUBDIR).join(self.scratch_name())
    }
}
