//! Queue capability consumed by the worker pipeline.

use async_trait::async_trait;
use vframe_models::WorkItem;

use crate::error::QueueResult;

/// Pending work as seen by the pipeline.
#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Receive up to one batch of pending items, waiting for the long-poll window.
    async fn receive_batch(&self) -> QueueResult<Vec<WorkItem>>;

    /// Surrender a delivery. After this returns the item will not be redelivered.
    async fn delete_by_token(&self, claim_token: &str) -> QueueResult<()>;

    /// Publish a new item for an object key already in the blob store.
    async fn enqueue(&self, video_key: &str) -> QueueResult<String>;
}
