//! FFmpeg frame extraction and frame archiving.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - A process runner that captures FFmpeg diagnostics and progress
//! - The [`FrameExtractor`] capability with an FFmpeg implementation
//! - The [`ArchiveBuilder`] capability with a zip implementation

pub mod archive;
pub mod command;
pub mod error;
pub mod frames;
pub mod progress;

pub use archive::{ArchiveBuilder, ZipArchiveBuilder};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use frames::{collect_frames, FfmpegFrameExtractor, FrameExtractor, FRAME_PATTERN};
pub use progress::FfmpegProgress;
