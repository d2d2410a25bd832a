//! The queue-driven pipeline controller.
//!
//! Each cycle receives a batch, claims every item by deleting it from the
//! queue, then runs download, extraction, archiving, upload and notification
//! for it. Items are isolated from each other: a failure is logged, reported
//! through a failure event and never stops the batch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn, Instrument};
use vframe_media::{ArchiveBuilder, FrameExtractor};
use vframe_models::result::NO_FRAMES_MESSAGE;
use vframe_models::{ProcessingResult, WorkItem, WorkerIdentity, FRAMES_SUBDIR};
use vframe_queue::QueueGateway;
use vframe_storage::BlobStore;

use crate::cleanup::{ScratchDir, ScratchFile};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::ItemLogger;
use crate::metrics;
use crate::notifications::Notifications;

#[cfg(test)]
mod fakes;

/// Remote prefix archives are uploaded under.
pub const PROCESSED_PREFIX: &str = "processed";

/// Counts for one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub received: usize,
    pub claimed: usize,
    pub succeeded: usize,
    /// Claimed items that did not succeed, including empty extractions
    pub failed: usize,
    pub claim_failures: usize,
}

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct Collaborators {
    pub queue: Arc<dyn QueueGateway>,
    pub store: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn FrameExtractor>,
    pub archiver: Arc<dyn ArchiveBuilder>,
    pub notifications: Notifications,
}

/// Sequential pipeline controller for one worker process.
pub struct Pipeline {
    identity: WorkerIdentity,
    base_dir: PathBuf,
    default_email: String,
    poll_interval: std::time::Duration,
    queue: Arc<dyn QueueGateway>,
    store: Arc<dyn BlobStore>,
    extractor: Arc<dyn FrameExtractor>,
    archiver: Arc<dyn ArchiveBuilder>,
    notifications: Notifications,
}

impl Pipeline {
    pub fn new(config: &WorkerConfig, collaborators: Collaborators) -> Self {
        Self {
            identity: config.identity.clone(),
            base_dir: config.base_dir.clone(),
            default_email: config.default_email.clone(),
            poll_interval: config.poll_interval,
            queue: collaborators.queue,
            store: collaborators.store,
            extractor: collaborators.extractor,
            archiver: collaborators.archiver,
            notifications: collaborators.notifications,
        }
    }

    pub fn identity(&self) -> &WorkerIdentity {
        &self.identity
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.identity.temp_dir(&self.base_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.identity.output_dir(&self.base_dir)
    }

    /// Create this worker's temp, frames and output directories. Idempotent.
    pub async fn ensure_dirs(&self) -> WorkerResult<()> {
        tokio::fs::create_dir_all(self.temp_dir().join(FRAMES_SUBDIR)).await?;
        tokio::fs::create_dir_all(self.output_dir()).await?;
        Ok(())
    }

    /// Poll forever, sleeping `poll_interval` between cycles.
    pub async fn run_forever(&self) {
        info!(
            worker = %self.identity.name,
            interval_secs = self.poll_interval.as_secs(),
            "Watching queue"
        );

        loop {
            let summary = self.poll_once().await;
            if summary.received > 0 {
                info!(
                    worker = %self.identity.name,
                    received = summary.received,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    claim_failures = summary.claim_failures,
                    "Cycle finished"
                );
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Run one receive-claim-process cycle.
    pub async fn poll_once(&self) -> PollSummary {
        let mut summary = PollSummary::default();

        let items = match self.queue.receive_batch().await {
            Ok(items) => items,
            Err(e) => {
                error!(worker = %self.identity.name, "Failed to receive work items: {}", e);
                return summary;
            }
        };

        summary.received = items.len();
        if items.is_empty() {
            return summary;
        }
        metrics::record_received(items.len());
        info!(worker = %self.identity.name, count = items.len(), "Received work items");

        for item in items {
            // Claim before doing any work so no other worker picks the item up
            if let Err(e) = self.queue.delete_by_token(&item.claim_token).await {
                let err = WorkerError::claim(e);
                warn!(
                    worker = %self.identity.name,
                    video_id = %item.video_id,
                    stage = err.stage(),
                    "Skipping item: {}", err
                );
                metrics::record_claim_failure();
                summary.claim_failures += 1;
                continue;
            }
            summary.claimed += 1;

            match self.process_item(&item).await {
                Ok(result) if result.success => summary.succeeded += 1,
                _ => summary.failed += 1,
            }
        }

        summary
    }

    /// Process one claimed item end to end.
    ///
    /// Every exit path sends exactly one notification. An extraction that
    /// yields no frames returns `Ok` with an unsuccessful result.
    pub async fn process_item(&self, item: &WorkItem) -> WorkerResult<ProcessingResult> {
        let logger = ItemLogger::new(&self.identity.name, item);
        let email = item.recipient_or(&self.default_email);

        let outcome = self
            .run_stages(item, &logger)
            .instrument(logger.create_span())
            .await;

        match outcome {
            Ok(result) => {
                let location = self.store.object_url(&remote_key(&result.archive_path));
                self.notifications.success(item, &location, email).await;
                metrics::record_outcome("success");
                logger.log_completion(&format!("{} -> {}", result.message, location));
                Ok(result)
            }
            Err(WorkerError::EmptyResult) => {
                logger.log_warning("extract", NO_FRAMES_MESSAGE);
                self.notifications.failure(item, NO_FRAMES_MESSAGE, email).await;
                metrics::record_outcome("empty");
                Ok(ProcessingResult::empty(item.video_id.clone()))
            }
            Err(e) => {
                logger.log_error(e.stage(), &e.to_string());
                self.notifications.failure(item, &e.to_string(), email).await;
                metrics::record_outcome(e.stage());
                Err(e)
            }
        }
    }

    async fn run_stages(&self, item: &WorkItem, logger: &ItemLogger) -> WorkerResult<ProcessingResult> {
        logger.log_start(&item.title);
        self.ensure_dirs().await?;

        let temp_dir = self.temp_dir();

        let video_path = temp_dir.join(item.source_file_name());
        let _video = ScratchFile::new(&video_path);
        timed("download", self.store.download(&item.video_key, &video_path))
            .await
            .map_err(WorkerError::download)?;
        logger.log_progress("download", &format!("saved to {}", video_path.display()));

        let frames_dir = ScratchDir::create(item.frames_dir(&temp_dir)).await?;
        let frames = timed(
            "extract",
            self.extractor.extract_frames(&video_path, frames_dir.path()),
        )
        .await
        .map_err(WorkerError::extraction)?;

        if frames.is_empty() {
            return Err(WorkerError::EmptyResult);
        }
        metrics::record_frames(frames.len());
        logger.log_progress("extract", &format!("{} frames", frames.len()));

        let archive_name = item.archive_name();
        let archive = ScratchFile::new(self.output_dir().join(&archive_name));
        timed("archive", self.archiver.create_archive(&frames, archive.path()))
            .await
            .map_err(WorkerError::archive)?;

        let key = remote_key(&archive_name);
        timed("upload", self.store.upload(archive.path(), &key))
            .await
            .map_err(WorkerError::upload)?;
        logger.log_progress("upload", &key);

        Ok(ProcessingResult::succeeded(
            item.video_id.clone(),
            archive_name,
            frame_names(&frames),
        ))
    }
}

/// `processed/{archive_name}`
pub fn remote_key(archive_name: &str) -> String {
    format!("{}/{}", PROCESSED_PREFIX, archive_name)
}

fn frame_names(frames: &[PathBuf]) -> Vec<String> {
    frames
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect()
}

async fn timed<T>(stage: &'static str, fut: impl std::future::Future<Output = T>) -> T {
    let started = Instant::now();
    let output = fut.await;
    metrics::record_stage(stage, started.elapsed());
    output
}
