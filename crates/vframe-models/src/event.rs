//! Completion and failure events published after each pipeline run.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "VIDEO_PROCESSED")]
    Processed,
    #[serde(rename = "VIDEO_FAILED")]
    Failed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Processed => "VIDEO_PROCESSED",
            EventType::Failed => "VIDEO_FAILED",
        }
    }
}

/// Recipient block of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Video block of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub video_id: String,
    pub video_title: String,
    /// Only set on [`EventType::Processed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_location: Option<String>,
    /// Only set on [`EventType::Failed`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Notification event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Fresh UUID per send.
    pub event_id: String,
    pub event_type: EventType,
    /// RFC3339, UTC.
    pub timestamp: String,
    pub user: EventUser,
    pub data: EventData,
}

impl NotificationEvent {
    /// Successful run with the uploaded archive's location.
    pub fn processed(
        video_id: &str,
        title: &str,
        archive_location: &str,
        author: &str,
        email: &str,
    ) -> Self {
        Self::build(
            EventType::Processed,
            video_id,
            title,
            author,
            email,
            Some(archive_location.to_string()),
            None,
        )
    }

    /// Failed run with a human-readable reason.
    pub fn failed(video_id: &str, title: &str, reason: &str, author: &str, email: &str) -> Self {
        Self::build(
            EventType::Failed,
            video_id,
            title,
            author,
            email,
            None,
            Some(reason.to_string()),
        )
    }

    fn build(
        event_type: EventType,
        video_id: &str,
        title: &str,
        author: &str,
        email: &str,
        archive_location: Option<String>,
        error_message: Option<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            // Queue messages carry no user ID, so the video ID stands in.
            user: EventUser {
                id: video_id.to_string(),
                name: author.to_string(),
                email: email.to_string(),
            },
            data: EventData {
                video_id: video_id.to_string(),
                video_title: title.to_string(),
                archive_location,
                error_message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_processed_event_shape() {
        let event = NotificationEvent::processed(
            "video-123",
            "Test Video",
            "s3://bucket/processed/clip_frames.zip",
            "Test User",
            "test@example.com",
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "VIDEO_PROCESSED");
        assert_eq!(json["user"]["id"], "video-123");
        assert_eq!(json["user"]["email"], "test@example.com");
        assert_eq!(json["data"]["videoId"], "video-123");
        assert_eq!(json["data"]["archiveLocation"], "s3://bucket/processed/clip_frames.zip");
        assert!(json["data"].get("errorMessage").is_none());
        assert!(Uuid::parse_str(&event.event_id).is_ok());
        assert!(DateTime::parse_from_rfc3339(&event.timestamp).is_ok());
    }

    #[test]
    fn test_failed_event_shape() {
        let event = NotificationEvent::failed("v1", "T", "ffmpeg exploded", "A", "a@example.com");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventType"], "VIDEO_FAILED");
        assert_eq!(json["data"]["errorMessage"], "ffmpeg exploded");
        assert!(json["data"].get("archiveLocation").is_none());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = NotificationEvent::failed("v1", "", "", "", "");
        let b = NotificationEvent::failed("v1", "", "", "", "");
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_special_characters_survive_round_trip() {
        let event = NotificationEvent::processed(
            "v1",
            "Title with áéíóú & #@$%",
            "loc",
            "User with \"quotes\" and \n newlines",
            "e",
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
