//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use vframe_media::{FfmpegFrameExtractor, FfmpegRunner};
use vframe_models::WorkerIdentity;
use vframe_queue::{NotifierConfig, QueueConfig};
use vframe_storage::S3Config;

/// Worker configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub identity: WorkerIdentity,
    /// Root under which `temp/worker-{id}` and `outputs/worker-{id}` live
    pub base_dir: PathBuf,
    /// Sleep between polling cycles
    pub poll_interval: Duration,
    /// Recipient for items whose message carries no email
    pub default_email: String,
    /// Frames sampled per second of video
    pub frame_rate: u32,
    pub ffmpeg_path: String,
    /// Kill ffmpeg after this long
    pub extract_timeout: Option<Duration>,
    /// Prometheus exporter port; disabled when unset
    pub metrics_port: Option<u16>,
    pub storage: S3Config,
    pub queue: QueueConfig,
    pub notifier: NotifierConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let identity = WorkerIdentity::default();
        let storage = S3Config::default();
        let queue = QueueConfig {
            consumer_name: identity.name.clone(),
            bucket_prefix: storage.bucket_prefix(),
            ..QueueConfig::default()
        };

        Self {
            identity,
            base_dir: PathBuf::from("."),
            poll_interval: Duration::from_secs(5),
            default_email: "user@example.com".to_string(),
            frame_rate: 1,
            ffmpeg_path: "ffmpeg".to_string(),
            extract_timeout: None,
            metrics_port: None,
            storage,
            queue,
            notifier: NotifierConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let id = std::env::var("WORKER_ID").unwrap_or_else(|_| defaults.identity.id.clone());
        let identity = WorkerIdentity::new(id, std::env::var("WORKER_NAME").unwrap_or_default());

        let storage = S3Config::from_env();
        let queue = QueueConfig {
            consumer_name: identity.name.clone(),
            bucket_prefix: storage.bucket_prefix(),
            ..QueueConfig::from_env()
        };

        Self {
            identity,
            base_dir: std::env::var("WORKER_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            default_email: std::env::var("DEFAULT_USER_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_email),
            frame_rate: std::env::var("FRAME_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.frame_rate),
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_path),
            extract_timeout: std::env::var("EXTRACT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            storage,
            queue,
            notifier: NotifierConfig::from_env(),
        }
    }

    /// FFmpeg extractor honoring the binary path, frame rate and timeout.
    pub fn frame_extractor(&self) -> FfmpegFrameExtractor {
        let mut runner = FfmpegRunner::new().with_program(&self.ffmpeg_path);
        if let Some(timeout) = self.extract_timeout {
            runner = runner.with_timeout(timeout.as_secs());
        }
        FfmpegFrameExtractor::new(runner).with_fps(self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let config = WorkerConfig::default();
        assert_eq!(config.identity.name, "video-worker-1");
        assert_eq!(config.queue.consumer_name, config.identity.name);
        assert_eq!(config.queue.bucket_prefix, "s3://video-service-bucket/");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.notifier.enabled);
    }

    #[test]
    fn test_frame_extractor_uses_frame_rate() {
        let config = WorkerConfig {
            frame_rate: 4,
            ..WorkerConfig::default()
        };
        assert_eq!(config.frame_extractor().fps(), 4);
    }
}
