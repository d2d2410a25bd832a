//! Work queue using Redis Streams.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::streams::{StreamAutoClaimReply, StreamId, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};
use vframe_models::{QueueMessage, WorkItem};

use crate::error::{QueueError, QueueResult};
use crate::gateway::QueueGateway;

/// Stream entry field holding the JSON message.
const BODY_FIELD: &str = "body";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    /// Stream name for work items
    pub stream_name: String,
    pub consumer_group: String,
    /// Consumer name within the group, usually the worker name
    pub consumer_name: String,
    /// Maximum entries per receive
    pub batch_size: usize,
    /// Long-poll wait per receive
    pub wait: Duration,
    /// Prefix stripped from `file_path` to get the object key
    pub bucket_prefix: String,
    pub dial_timeout: Duration,
    /// Idle time after which a delivered but unclaimed entry is redelivered
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "video-processing-queue".to_string(),
            consumer_group: "vframe-workers".to_string(),
            consumer_name: "video-worker-1".to_string(),
            batch_size: 10,
            wait: Duration::from_secs(20),
            bucket_prefix: "s3://video-service-bucket/".to_string(),
            dial_timeout: Duration::from_secs(10),
            visibility_timeout: Duration::from_secs(300),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    ///
    /// `consumer_name` and `bucket_prefix` keep their defaults; the worker
    /// sets them from its own identity and storage settings.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            batch_size: std::env::var("QUEUE_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.batch_size),
            wait: std::env::var("QUEUE_WAIT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.wait),
            dial_timeout: std::env::var("DIAL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.dial_timeout),
            visibility_timeout: std::env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.visibility_timeout),
            ..defaults
        }
    }
}

/// Work queue client.
pub struct WorkQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl WorkQueue {
    /// Create a new work queue. No connection is made until first use.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    async fn connection(&self) -> QueueResult<MultiplexedConnection> {
        match tokio::time::timeout(
            self.config.dial_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(conn) => Ok(conn?),
            Err(_) => Err(QueueError::connection_failed(format!(
                "timed out after {:?} connecting to Redis",
                self.config.dial_timeout
            ))),
        }
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        // Start at 0 so entries published before the first worker came up are delivered
        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Read the next batch for this consumer.
    ///
    /// Entries delivered earlier but left unclaimed for longer than the
    /// visibility timeout come first; new entries are read only when there
    /// are none.
    pub async fn receive(&self) -> QueueResult<Vec<WorkItem>> {
        let reclaimed = self.claim_stale().await?;
        if !reclaimed.is_empty() {
            return Ok(reclaimed);
        }

        let mut conn = self.connection().await?;

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_name)
            .arg("COUNT")
            .arg(self.config.batch_size);

        // BLOCK 0 would wait forever
        let block_ms = self.config.wait.as_millis() as u64;
        if block_ms > 0 {
            cmd.arg("BLOCK").arg(block_ms);
        }

        let reply: Option<StreamReadReply> = cmd
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let entries = reply
            .map(|r| r.keys)
            .unwrap_or_default()
            .into_iter()
            .flat_map(|key| key.ids)
            .collect();

        Ok(self.decode_entries(entries).await)
    }

    /// Take over pending entries idle longer than the visibility timeout.
    ///
    /// Covers entries whose claim failed and entries held by a worker that
    /// died before claiming them.
    pub async fn claim_stale(&self) -> QueueResult<Vec<WorkItem>> {
        let mut conn = self.connection().await?;
        let min_idle_ms = self.config.visibility_timeout.as_millis() as u64;

        let mut cursor = "0-0".to_string();
        let mut entries: Vec<StreamId> = Vec::new();

        loop {
            let reply: StreamAutoClaimReply = redis::cmd("XAUTOCLAIM")
                .arg(&self.config.stream_name)
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_name)
                .arg(min_idle_ms)
                .arg(&cursor)
                .arg("COUNT")
                .arg((self.config.batch_size - entries.len()).max(1))
                .query_async(&mut conn)
                .await?;

            if !reply.deleted_ids.is_empty() {
                debug!("Dropped {} pending entries already deleted", reply.deleted_ids.len());
            }
            entries.extend(reply.claimed);

            cursor = reply.next_stream_id;
            if cursor == "0-0" || entries.len() >= self.config.batch_size {
                break;
            }
        }

        if !entries.is_empty() {
            info!("Reclaimed {} idle entries", entries.len());
        }

        Ok(self.decode_entries(entries).await)
    }

    async fn decode_entries(&self, entries: Vec<StreamId>) -> Vec<WorkItem> {
        let mut items = Vec::with_capacity(entries.len());

        for entry in entries {
            match parse_entry(&entry.id, &entry.map, &self.config.bucket_prefix) {
                Ok(item) => {
                    debug!("Received video {} as entry {}", item.video_id, entry.id);
                    items.push(item);
                }
                Err(e) => {
                    warn!("Dropping entry: {}", e);
                    // Remove the malformed entry so it is never redelivered
                    self.ack(&entry.id).await.ok();
                }
            }
        }

        items
    }

    /// Acknowledge and delete an entry in one transaction.
    ///
    /// Fails with [`QueueError::NotPending`] when the entry was already
    /// acknowledged, e.g. after another worker reclaimed and claimed it.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let (acked, _deleted): (u64, u64) = redis::pipe()
            .atomic()
            .cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async(&mut conn)
            .await?;

        if acked == 0 {
            return Err(QueueError::not_pending(message_id));
        }

        debug!("Deleted entry: {}", message_id);
        Ok(())
    }

    /// Publish a message.
    pub async fn publish(&self, message: &QueueMessage) -> QueueResult<String> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(message)?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(&payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::enqueue_failed(e.to_string()))?;

        info!("Enqueued video {} as entry {}", message.video_id, message_id);
        Ok(message_id)
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }
}

#[async_trait]
impl QueueGateway for WorkQueue {
    async fn receive_batch(&self) -> QueueResult<Vec<WorkItem>> {
        self.receive().await
    }

    async fn delete_by_token(&self, claim_token: &str) -> QueueResult<()> {
        self.ack(claim_token).await
    }

    async fn enqueue(&self, video_key: &str) -> QueueResult<String> {
        self.publish(&QueueMessage::for_key(video_key)).await
    }
}

/// Decode one stream entry into a work item whose claim token is the entry ID.
pub(crate) fn parse_entry(
    id: &str,
    fields: &HashMap<String, redis::Value>,
    bucket_prefix: &str,
) -> QueueResult<WorkItem> {
    let payload = match fields.get(BODY_FIELD) {
        Some(redis::Value::BulkString(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
        Some(redis::Value::SimpleString(s)) => s.clone(),
        Some(_) => return Err(QueueError::malformed(id, "body is not a string")),
        None => return Err(QueueError::malformed(id, "missing body field")),
    };

    let message: QueueMessage =
        serde_json::from_str(&payload).map_err(|e| QueueError::malformed(id, e.to_string()))?;

    let item = message.into_work_item(id, bucket_prefix);
    if item.video_key.is_empty() {
        return Err(QueueError::malformed(id, "no file_path or video_key"));
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "s3://video-service-bucket/";

    fn fields(body: &str) -> HashMap<String, redis::Value> {
        HashMap::from([(
            BODY_FIELD.to_string(),
            redis::Value::BulkString(body.as_bytes().to_vec()),
        )])
    }

    #[test]
    fn test_parse_entry() {
        let body = r#"{
            "id_video": "abc-123",
            "titulo": "Holiday",
            "autor": "Ana",
            "status": "uploaded",
            "file_path": "s3://video-service-bucket/videos/clip.mp4",
            "email": "ana@example.com"
        }"#;

        let item = parse_entry("1700000000000-0", &fields(body), PREFIX).unwrap();
        assert_eq!(item.video_id.as_str(), "abc-123");
        assert_eq!(item.video_key, "videos/clip.mp4");
        assert_eq!(item.claim_token, "1700000000000-0");
        assert_eq!(item.title, "Holiday");
        assert_eq!(item.recipient_email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_parse_entry_rejects_garbage() {
        let err = parse_entry("1-0", &fields("not json"), PREFIX).unwrap_err();
        assert!(matches!(err, QueueError::Malformed { .. }));

        let err = parse_entry("1-0", &HashMap::new(), PREFIX).unwrap_err();
        assert!(matches!(err, QueueError::Malformed { .. }));

        let err = parse_entry("1-0", &fields(r#"{"video_id":"x"}"#), PREFIX).unwrap_err();
        assert!(err.to_string().contains("no file_path"));
    }

    #[test]
    fn test_enqueued_message_parses_back() {
        let body = serde_json::to_string(&QueueMessage::for_key("videos/clip.mp4")).unwrap();
        let item = parse_entry("2-0", &fields(&body), PREFIX).unwrap();
        assert_eq!(item.video_key, "videos/clip.mp4");
        assert_eq!(item.video_id.as_str(), "videos/clip.mp4");
        assert!(item.recipient_email.is_none());
    }

    #[test]
    fn test_default_config() {
        let config = QueueConfig::default();
        assert_eq!(config.stream_name, "video-processing-queue");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.wait, Duration::from_secs(20));
        assert_eq!(config.visibility_timeout, Duration::from_secs(300));
    }
}
