//! Frame extraction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Output pattern for extracted frames. Zero padding keeps lexical order numeric.
pub const FRAME_PATTERN: &str = "frame_%04d.png";

/// Samples frames from a local video into a directory.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Extract frames into `output_dir` and return their paths in frame order.
    ///
    /// An extraction that succeeds but yields no frames returns an empty list.
    async fn extract_frames(&self, video_path: &Path, output_dir: &Path) -> MediaResult<Vec<PathBuf>>;
}

/// FFmpeg-backed extractor sampling at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    runner: FfmpegRunner,
    fps: u32,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new(FfmpegRunner::new())
    }
}

impl FfmpegFrameExtractor {
    /// One frame per second.
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner, fps: 1 }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    fn build_command(&self, video_path: &Path, output_dir: &Path) -> FfmpegCommand {
        FfmpegCommand::new(video_path, output_dir.join(FRAME_PATTERN)).frame_rate(self.fps)
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frames(&self, video_path: &Path, output_dir: &Path) -> MediaResult<Vec<PathBuf>> {
        info!(
            video = %video_path.display(),
            fps = self.fps,
            "Extracting frames"
        );

        let cmd = self.build_command(video_path, output_dir);
        self.runner
            .run_with_progress(&cmd, |progress| {
                debug!(frames = progress.frame, "Extraction progress");
            })
            .await?;

        let frames = collect_frames(output_dir).await?;
        info!(count = frames.len(), "Frame extraction finished");
        Ok(frames)
    }
}

/// List `.png` files in `dir`, sorted by name.
pub async fn collect_frames(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    if !tokio::fs::try_exists(dir).await? {
        return Err(MediaError::FileNotFound(dir.to_path_buf()));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("png"))
            .unwrap_or(false);

        if is_png && entry.file_type().await?.is_file() {
            frames.push(path);
        }
    }

    frames.sort();
    Ok(frames)
}
