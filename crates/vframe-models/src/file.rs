//! Local files handled by the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An uploaded video saved to local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A frames archive available for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub filename: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub download_url: String,
}

impl ProcessedFile {
    pub fn new(filename: impl Into<String>, size: u64, created_at: DateTime<Utc>) -> Self {
        let filename = filename.into();
        let download_url = format!("/download/{}", filename);
        Self {
            filename,
            size,
            created_at,
            download_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processed_file_download_url() {
        let file = ProcessedFile::new("frames_123.zip", 2048, Utc::now());
        assert_eq!(file.download_url, "/download/frames_123.zip");
        assert_eq!(file.size, 2048);
    }
}
