//! Local processing for videos uploaded over HTTP.
//!
//! Runs extraction and archiving on a file that is already on disk and keeps
//! the archive in the output directory for download. No queue, store or
//! notifications are involved.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use vframe_media::{ArchiveBuilder, FrameExtractor};
use vframe_models::{ProcessingResult, VideoId};

use crate::cleanup::{ScratchDir, ScratchFile};

/// Extract-and-archive for local files.
#[derive(Clone)]
pub struct LocalVideoProcessor {
    extractor: Arc<dyn FrameExtractor>,
    archiver: Arc<dyn ArchiveBuilder>,
    temp_dir: PathBuf,
    output_dir: PathBuf,
}

impl LocalVideoProcessor {
    pub fn new(
        extractor: Arc<dyn FrameExtractor>,
        archiver: Arc<dyn ArchiveBuilder>,
        temp_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            archiver,
            temp_dir: temp_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Archive name for an upload ID.
    pub fn archive_name(id: &str) -> String {
        format!("frames_{}.zip", id)
    }

    /// Turn `video_path` into `outputs/frames_{id}.zip`.
    ///
    /// Failures are reported in the result, never as an error.
    pub async fn process(&self, video_path: &Path, id: &str) -> ProcessingResult {
        let video_id = VideoId::from_string(id);

        let frames_dir = match ScratchDir::create(self.temp_dir.join(format!("frames_{}", id))).await {
            Ok(dir) => dir,
            Err(e) => return ProcessingResult::failed(video_id, format!("Failed to create temp directory: {}", e)),
        };

        let frames = match self.extractor.extract_frames(video_path, frames_dir.path()).await {
            Ok(frames) => frames,
            Err(e) => {
                warn!(id, "Frame extraction failed: {}", e);
                return ProcessingResult::failed(video_id, format!("Frame extraction failed: {}", e));
            }
        };

        if frames.is_empty() {
            return ProcessingResult::empty(video_id);
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            return ProcessingResult::failed(video_id, format!("Failed to create output directory: {}", e));
        }

        let archive_name = Self::archive_name(id);
        let archive = ScratchFile::new(self.output_dir.join(&archive_name));
        if let Err(e) = self.archiver.create_archive(&frames, archive.path()).await {
            warn!(id, "Archive creation failed: {}", e);
            return ProcessingResult::failed(video_id, format!("Archive creation failed: {}", e));
        }
        let archive_path = archive.keep();

        let frame_names = frames
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        info!(id, archive = %archive_path.display(), "Local processing finished");
        ProcessingResult::succeeded(video_id, archive_name, frame_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use vframe_media::{MediaError, MediaResult, ZipArchiveBuilder};

    struct StubExtractor(Option<usize>);

    #[async_trait]
    impl FrameExtractor for StubExtractor {
        async fn extract_frames(&self, _video: &Path, output_dir: &Path) -> MediaResult<Vec<PathBuf>> {
            let Some(count) = self.0 else {
                return Err(MediaError::ffmpeg_failed("exit 1", "moov atom not found", Some(1)));
            };
            let mut frames = Vec::new();
            for n in 1..=count {
                let path = output_dir.join(format!("frame_{:04}.png", n));
                tokio::fs::write(&path, b"png").await?;
                frames.push(path);
            }
            Ok(frames)
        }
    }

    fn processor(root: &Path, frames: Option<usize>) -> LocalVideoProcessor {
        LocalVideoProcessor::new(
            Arc::new(StubExtractor(frames)),
            Arc::new(ZipArchiveBuilder::new()),
            root.join("temp"),
            root.join("outputs"),
        )
    }

    #[tokio::test]
    async fn test_archive_is_kept() {
        let root = TempDir::new().unwrap();
        let result = processor(root.path(), Some(2))
            .process(Path::new("upload.mp4"), "20240101_120000")
            .await;

        assert!(result.success);
        assert_eq!(result.archive_path, "frames_20240101_120000.zip");
        assert!(root.path().join("outputs/frames_20240101_120000.zip").exists());
        assert!(!root.path().join("temp/frames_20240101_120000").exists());
    }

    #[tokio::test]
    async fn test_failure_in_result() {
        let root = TempDir::new().unwrap();
        let result = processor(root.path(), None).process(Path::new("upload.mp4"), "1").await;

        assert!(!result.success);
        assert!(result.message.contains("moov atom not found"));
        assert!(!root.path().join("outputs/frames_1.zip").exists());
    }

    #[tokio::test]
    async fn test_no_frames() {
        let root = TempDir::new().unwrap();
        let result = processor(root.path(), Some(0)).process(Path::new("upload.mp4"), "1").await;
        assert!(result.is_empty_result());
    }
}
