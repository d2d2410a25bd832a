//! Application state.

use std::sync::Arc;

use vframe_media::{FfmpegFrameExtractor, FfmpegRunner, ZipArchiveBuilder};
use vframe_worker::LocalVideoProcessor;

use crate::config::ApiConfig;
use crate::files::FileStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub files: FileStore,
    pub processor: Arc<LocalVideoProcessor>,
}

impl AppState {
    /// Create state backed by ffmpeg and zip archives.
    pub fn new(config: ApiConfig) -> Self {
        let mut runner = FfmpegRunner::new().with_program(&config.ffmpeg_path);
        if let Some(timeout) = config.extract_timeout {
            runner = runner.with_timeout(timeout.as_secs());
        }
        let extractor = FfmpegFrameExtractor::new(runner).with_fps(config.frame_rate);

        let files = FileStore::new(&config.base_dir);
        let processor = LocalVideoProcessor::new(
            Arc::new(extractor),
            Arc::new(ZipArchiveBuilder::new()),
            files.temp_dir(),
            files.outputs_dir(),
        );

        Self::with_processor(config, processor)
    }

    /// Create state around an existing processor.
    pub fn with_processor(config: ApiConfig, processor: LocalVideoProcessor) -> Self {
        Self {
            files: FileStore::new(&config.base_dir),
            config: Arc::new(config),
            processor: Arc::new(processor),
        }
    }
}
