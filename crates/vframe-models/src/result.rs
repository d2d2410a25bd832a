//! Pipeline processing results.

use serde::{Deserialize, Serialize};

use crate::video::VideoId;

/// Fixed message for a run whose extractor produced no frames.
pub const NO_FRAMES_MESSAGE: &str = "no frames extracted from video";

/// Outcome of one pipeline run.
///
/// Built only through the constructors below so that a successful result
/// always names an archive and at least one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub message: String,
    /// Archive file name; empty when the run stopped before archiving.
    pub archive_path: String,
    pub frame_count: usize,
    /// Frame base names in extraction order.
    pub frame_names: Vec<String>,
    pub video_id: VideoId,
}

impl ProcessingResult {
    /// A completed run.
    pub fn succeeded(
        video_id: VideoId,
        archive_name: impl Into<String>,
        frame_names: Vec<String>,
    ) -> Self {
        let archive_path = archive_name.into();
        debug_assert!(!frame_names.is_empty(), "successful result needs frames");
        debug_assert!(!archive_path.is_empty(), "successful result needs an archive");

        Self {
            success: true,
            message: format!(
                "Processing complete: {} frames extracted.",
                frame_names.len()
            ),
            archive_path,
            frame_count: frame_names.len(),
            frame_names,
            video_id,
        }
    }

    /// A run that extracted nothing. Not an error, but not a success either.
    pub fn empty(video_id: VideoId) -> Self {
        Self::failed(video_id, NO_FRAMES_MESSAGE)
    }

    /// A run that stopped at a failing stage.
    pub fn failed(video_id: VideoId, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            archive_path: String::new(),
            frame_count: 0,
            frame_names: Vec::new(),
            video_id,
        }
    }

    /// Whether this is the "no frames" outcome.
    pub fn is_empty_result(&self) -> bool {
        !self.success && self.message == NO_FRAMES_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_counts_frames() {
        let result = ProcessingResult::succeeded(
            VideoId::from("v1"),
            "clip_frames.zip",
            vec!["frame_0001.png".into(), "frame_0002.png".into()],
        );
        assert!(result.success);
        assert_eq!(result.frame_count, 2);
        assert_eq!(result.archive_path, "clip_frames.zip");
        assert_eq!(result.frame_names[0], "frame_0001.png");
        assert!(result.message.contains('2'));
    }

    #[test]
    fn test_empty_is_not_success() {
        let result = ProcessingResult::empty(VideoId::from("v1"));
        assert!(!result.success);
        assert!(result.is_empty_result());
        assert_eq!(result.frame_count, 0);
        assert!(result.archive_path.is_empty());
    }

    #[test]
    fn test_failed_serializes_snake_case() {
        let result = ProcessingResult::failed(VideoId::from("v1"), "boom");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "boom");
        assert_eq!(json["archive_path"], "");
        assert_eq!(json["frame_count"], 0);
        assert_eq!(json["video_id"], "v1");
        assert!(!result.is_empty_result());
    }
}
