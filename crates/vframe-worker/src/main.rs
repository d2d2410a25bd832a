//! Video frame extraction worker binary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vframe_media::{check_ffmpeg, ZipArchiveBuilder};
use vframe_queue::{Notifier, RedisNotifier, WorkQueue};
use vframe_storage::S3Client;
use vframe_worker::{metrics, Collaborators, Notifications, Pipeline, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env().add_directive("vframe=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let config = WorkerConfig::from_env();
    info!(
        worker = %config.identity.name,
        id = %config.identity.id,
        bucket = %config.storage.bucket_name,
        stream = %config.queue.stream_name,
        topic = %config.notifier.topic,
        "Starting vframe-worker"
    );

    if let Some(port) = config.metrics_port {
        match metrics::init_metrics(port) {
            Ok(()) => info!("Metrics exporter listening on port {}", port),
            Err(e) => warn!("{}", e),
        }
    }

    if let Err(e) = check_ffmpeg(&config.ffmpeg_path) {
        warn!("{}; extraction will fail until it is installed", e);
    }

    let store = match S3Client::new(config.storage.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };

    let queue = match WorkQueue::new(config.queue.clone()) {
        Ok(q) => q,
        Err(e) => {
            error!("Failed to create work queue: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = queue.init().await {
        error!("Failed to initialize work queue: {}", e);
        std::process::exit(1);
    }

    // Notifications are optional; the worker runs without them
    let notifier: Option<Arc<dyn Notifier>> = if config.notifier.enabled {
        match RedisNotifier::new(&config.notifier) {
            Ok(n) => {
                info!("Publishing events to channel {}", n.topic());
                Some(Arc::new(n) as Arc<dyn Notifier>)
            }
            Err(e) => {
                warn!("Notifier unavailable, continuing without notifications: {}", e);
                None
            }
        }
    } else {
        info!("Notifications disabled");
        None
    };

    let pipeline = Pipeline::new(
        &config,
        Collaborators {
            queue: Arc::new(queue),
            store: Arc::new(store),
            extractor: Arc::new(config.frame_extractor()),
            archiver: Arc::new(ZipArchiveBuilder::new()),
            notifications: Notifications::new(notifier),
        },
    );

    if let Err(e) = pipeline.ensure_dirs().await {
        error!("Failed to create worker directories: {}", e);
        std::process::exit(1);
    }

    tokio::select! {
        _ = pipeline.run_forever() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Worker shutdown complete");
}
