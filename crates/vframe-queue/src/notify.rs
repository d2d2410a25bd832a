//! Completion and failure events over Redis Pub/Sub.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;
use vframe_models::NotificationEvent;

use crate::error::{QueueError, QueueResult};

/// Notifier configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub redis_url: String,
    /// Pub/Sub channel events are published to
    pub topic: String,
    pub enabled: bool,
    pub dial_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            topic: "video-events".to_string(),
            enabled: true,
            dial_timeout: Duration::from_secs(10),
        }
    }
}

impl NotifierConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("NOTIFY_REDIS_URL")
                .or_else(|_| std::env::var("REDIS_URL"))
                .unwrap_or(defaults.redis_url),
            topic: std::env::var("NOTIFY_TOPIC").unwrap_or(defaults.topic),
            enabled: std::env::var("NOTIFICATIONS_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.enabled),
            dial_timeout: std::env::var("DIAL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.dial_timeout),
        }
    }
}

/// Emits structured events about finished pipeline runs.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: &NotificationEvent) -> QueueResult<()>;

    async fn notify_success(
        &self,
        video_id: &str,
        title: &str,
        archive_location: &str,
        author: &str,
        email: &str,
    ) -> QueueResult<()> {
        let event = NotificationEvent::processed(video_id, title, archive_location, author, email);
        self.publish(&event).await
    }

    async fn notify_failure(
        &self,
        video_id: &str,
        title: &str,
        reason: &str,
        author: &str,
        email: &str,
    ) -> QueueResult<()> {
        let event = NotificationEvent::failed(video_id, title, reason, author, email);
        self.publish(&event).await
    }
}

/// Publishes events as JSON on a Redis channel.
pub struct RedisNotifier {
    client: redis::Client,
    topic: String,
    dial_timeout: Duration,
}

impl RedisNotifier {
    pub fn new(config: &NotifierConfig) -> QueueResult<Self> {
        Ok(Self {
            client: redis::Client::open(config.redis_url.as_str())?,
            topic: config.topic.clone(),
            dial_timeout: config.dial_timeout,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl Notifier for RedisNotifier {
    async fn publish(&self, event: &NotificationEvent) -> QueueResult<()> {
        let payload = serde_json::to_string(event)?;

        let mut conn = tokio::time::timeout(
            self.dial_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| QueueError::connection_failed("timed out connecting to Redis"))??;

        let receivers: i64 = conn
            .publish(&self.topic, &payload)
            .await
            .map_err(|e| QueueError::PublishFailed(e.to_string()))?;

        debug!(
            event_type = event.event_type.as_str(),
            video_id = %event.data.video_id,
            receivers,
            "Published event to {}",
            self.topic
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<NotificationEvent>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn publish(&self, event: &NotificationEvent) -> QueueResult<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_helpers_build_events() {
        let notifier = Recording::default();
        notifier
            .notify_success("v1", "Clip", "s3://b/processed/clip_frames.zip", "Ana", "a@x.io")
            .await
            .unwrap();
        notifier
            .notify_failure("v2", "Other", "download failed", "Bo", "b@x.io")
            .await
            .unwrap();

        let events = notifier.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data.archive_location.as_deref(), Some("s3://b/processed/clip_frames.zip"));
        assert_eq!(events[1].data.error_message.as_deref(), Some("download failed"));
        assert_eq!(events[1].user.name, "Bo");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = NotifierConfig {
            redis_url: "not a url".to_string(),
            ..NotifierConfig::default()
        };
        assert!(RedisNotifier::new(&config).is_err());
    }
}
