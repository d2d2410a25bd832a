//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vframe_media::{ArchiveBuilder, FrameExtractor, MediaError, MediaResult};
use vframe_models::{NotificationEvent, QueueMessage, WorkItem};
use vframe_queue::{Notifier, QueueError, QueueGateway, QueueResult};
use vframe_storage::{BlobStore, StorageError, StorageResult};

pub const BUCKET: &str = "test-bucket";

/// Ordered record of calls across every fake.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

pub fn work_item(token: &str, key: &str) -> WorkItem {
    let message = QueueMessage {
        video_id: format!("vid-{}", token),
        title: "Test Video".to_string(),
        author: "Test User".to_string(),
        file_path: format!("s3://{}/{}", BUCKET, key),
        ..QueueMessage::default()
    };
    message.into_work_item(token, &format!("s3://{}/", BUCKET))
}

pub struct FakeQueue {
    pub journal: Journal,
    pending: Mutex<Vec<WorkItem>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_delete: HashSet<String>,
    pub fail_receive: bool,
}

impl FakeQueue {
    pub fn new(journal: Journal, items: Vec<WorkItem>) -> Self {
        Self {
            journal,
            pending: Mutex::new(items),
            deleted: Mutex::new(Vec::new()),
            fail_delete: HashSet::new(),
            fail_receive: false,
        }
    }
}

#[async_trait]
impl QueueGateway for FakeQueue {
    async fn receive_batch(&self) -> QueueResult<Vec<WorkItem>> {
        if self.fail_receive {
            return Err(QueueError::connection_failed("queue unreachable"));
        }
        Ok(std::mem::take(&mut *self.pending.lock().unwrap()))
    }

    async fn delete_by_token(&self, claim_token: &str) -> QueueResult<()> {
        if self.fail_delete.contains(claim_token) {
            return Err(QueueError::connection_failed("delete rejected"));
        }
        self.journal.push(format!("delete:{}", claim_token));
        self.deleted.lock().unwrap().push(claim_token.to_string());
        Ok(())
    }

    async fn enqueue(&self, video_key: &str) -> QueueResult<String> {
        let token = format!("{}-0", self.pending.lock().unwrap().len() + 1);
        self.pending.lock().unwrap().push(work_item(&token, video_key));
        Ok(token)
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub journal: Journal,
    pub objects: HashMap<String, Vec<u8>>,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_upload: bool,
}

impl FakeStore {
    pub fn with_object(journal: Journal, key: &str) -> Self {
        Self {
            journal,
            objects: HashMap::from([(key.to_string(), b"fake video bytes".to_vec())]),
            ..Self::default()
        }
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[async_trait]
impl BlobStore for FakeStore {
    async fn download(&self, remote_key: &str, local_path: &Path) -> StorageResult<()> {
        self.journal.push(format!("download:{}", remote_key));
        let bytes = self
            .objects
            .get(remote_key)
            .ok_or_else(|| StorageError::not_found(remote_key))?;
        tokio::fs::write(local_path, bytes).await?;
        Ok(())
    }

    async fn upload(&self, local_path: &Path, remote_key: &str) -> StorageResult<()> {
        self.journal.push(format!("upload:{}", remote_key));
        if self.fail_upload {
            return Err(StorageError::upload_failed("access denied"));
        }
        let bytes = tokio::fs::read(local_path).await?;
        self.uploads.lock().unwrap().push((remote_key.to_string(), bytes));
        Ok(())
    }

    async fn list_videos(&self) -> StorageResult<Vec<String>> {
        Ok(self.objects.keys().cloned().collect())
    }

    fn bucket(&self) -> &str {
        BUCKET
    }
}

/// What the fake extractor does when called.
#[derive(Debug, Clone)]
pub enum Extraction {
    Frames(usize),
    Nothing,
    Fail(String),
}

pub struct FakeExtractor {
    pub journal: Journal,
    pub behavior: Extraction,
    /// Whether the downloaded video existed when extraction ran
    pub saw_video: Mutex<Vec<bool>>,
    /// Directory each extraction wrote into
    pub output_dirs: Mutex<Vec<PathBuf>>,
}

impl FakeExtractor {
    pub fn new(journal: Journal, behavior: Extraction) -> Self {
        Self {
            journal,
            behavior,
            saw_video: Mutex::new(Vec::new()),
            output_dirs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl FrameExtractor for FakeExtractor {
    async fn extract_frames(&self, video_path: &Path, output_dir: &Path) -> MediaResult<Vec<PathBuf>> {
        self.journal.push("extract");
        self.saw_video.lock().unwrap().push(video_path.exists());
        self.output_dirs.lock().unwrap().push(output_dir.to_path_buf());

        match &self.behavior {
            Extraction::Frames(count) => {
                let mut frames = Vec::new();
                for n in 1..=*count {
                    let path = output_dir.join(format!("frame_{:04}.png", n));
                    tokio::fs::write(&path, format!("frame {}", n)).await?;
                    frames.push(path);
                }
                Ok(frames)
            }
            Extraction::Nothing => Ok(Vec::new()),
            Extraction::Fail(output) => Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with status 1",
                output.clone(),
                Some(1),
            )),
        }
    }
}

/// Writes a partial archive, then fails.
pub struct BrokenArchiver;

#[async_trait]
impl ArchiveBuilder for BrokenArchiver {
    async fn create_archive(&self, _files: &[PathBuf], dest: &Path) -> MediaResult<()> {
        tokio::fs::write(dest, b"PK partial").await?;
        Err(MediaError::internal("disk full"))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<NotificationEvent>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: &NotificationEvent) -> QueueResult<()> {
        if self.fail {
            return Err(QueueError::PublishFailed("broker down".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
