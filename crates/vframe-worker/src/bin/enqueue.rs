//! Enqueue videos for processing.
//!
//! Usage: `vframe-enqueue [KEY...]`. With no keys, every video in the bucket
//! is enqueued.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use vframe_queue::{QueueGateway, WorkQueue};
use vframe_storage::{BlobStore, S3Client};
use vframe_worker::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vframe=info".parse()?))
        .init();

    let config = WorkerConfig::from_env();
    let queue = WorkQueue::new(config.queue.clone()).context("creating work queue")?;
    queue.init().await.context("initializing work queue")?;

    let mut keys: Vec<String> = std::env::args().skip(1).collect();
    if keys.is_empty() {
        let store = S3Client::new(config.storage.clone()).context("creating storage client")?;
        keys = BlobStore::list_videos(&store)
            .await
            .context("listing videos")?;
        info!("Found {} videos in bucket {}", keys.len(), config.storage.bucket_name);
    }

    for key in &keys {
        let id = queue
            .enqueue(key)
            .await
            .with_context(|| format!("enqueueing {}", key))?;
        println!("{}\t{}", id, key);
    }

    info!(
        "Enqueued {} items on {} (length now {})",
        keys.len(),
        config.queue.stream_name,
        queue.len().await?
    );
    Ok(())
}
