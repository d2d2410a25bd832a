//! Worker error types.

use std::fmt::Display;

use thiserror::Error;
use vframe_models::result::NO_FRAMES_MESSAGE;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failures of one pipeline run, named by the stage that produced them.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Claim failed: {0}")]
    Claim(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Frame extraction failed: {0}")]
    Extraction(String),

    #[error("{}", NO_FRAMES_MESSAGE)]
    EmptyResult,

    #[error("Archive creation failed: {0}")]
    Archive(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WorkerError {
    pub fn claim(err: impl Display) -> Self {
        Self::Claim(err.to_string())
    }

    pub fn download(err: impl Display) -> Self {
        Self::Download(err.to_string())
    }

    pub fn extraction(err: impl Display) -> Self {
        Self::Extraction(err.to_string())
    }

    pub fn archive(err: impl Display) -> Self {
        Self::Archive(err.to_string())
    }

    pub fn upload(err: impl Display) -> Self {
        Self::Upload(err.to_string())
    }

    pub fn notification(err: impl Display) -> Self {
        Self::Notification(err.to_string())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Pipeline stage, used as a log field and metric label.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkerError::Claim(_) => "claim",
            WorkerError::Download(_) => "download",
            WorkerError::Extraction(_) | WorkerError::EmptyResult => "extract",
            WorkerError::Archive(_) => "archive",
            WorkerError::Upload(_) => "upload",
            WorkerError::Notification(_) => "notify",
            WorkerError::Io(_) => "io",
            WorkerError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_stage() {
        assert_eq!(
            WorkerError::download("NoSuchKey").to_string(),
            "Download failed: NoSuchKey"
        );
        assert_eq!(WorkerError::EmptyResult.to_string(), NO_FRAMES_MESSAGE);
        assert_eq!(WorkerError::EmptyResult.stage(), "extract");
        assert_eq!(WorkerError::upload("denied").stage(), "upload");
    }
}
