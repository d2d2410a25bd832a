//! Structured per-item logging.

use tracing::{error, info, warn, Span};
use vframe_models::WorkItem;

/// Logger carrying the worker and item context on every line.
#[derive(Debug, Clone)]
pub struct ItemLogger {
    worker: String,
    video_id: String,
    video_key: String,
}

impl ItemLogger {
    pub fn new(worker: &str, item: &WorkItem) -> Self {
        Self {
            worker: worker.to_string(),
            video_id: item.video_id.to_string(),
            video_key: item.video_key.clone(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            worker = %self.worker,
            video_id = %self.video_id,
            video_key = %self.video_key,
            "Item started: {}", message
        );
    }

    pub fn log_progress(&self, stage: &str, message: &str) {
        info!(
            worker = %self.worker,
            video_id = %self.video_id,
            stage,
            "Item progress: {}", message
        );
    }

    pub fn log_warning(&self, stage: &str, message: &str) {
        warn!(
            worker = %self.worker,
            video_id = %self.video_id,
            stage,
            "Item warning: {}", message
        );
    }

    pub fn log_error(&self, stage: &str, message: &str) {
        error!(
            worker = %self.worker,
            video_id = %self.video_id,
            video_key = %self.video_key,
            stage,
            "Item error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            worker = %self.worker,
            video_id = %self.video_id,
            "Item completed: {}", message
        );
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Span wrapping every stage of the item.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "item",
            worker = %self.worker,
            video_id = %self.video_id,
            video_key = %self.video_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vframe_models::QueueMessage;

    #[test]
    fn test_item_logger_context() {
        let item = QueueMessage::for_key("videos/clip.mp4").into_work_item("1-0", "");
        let logger = ItemLogger::new("video-worker-1", &item);

        assert_eq!(logger.video_id(), "videos/clip.mp4");
        logger.log_progress("download", "no subscriber installed");
    }
}
