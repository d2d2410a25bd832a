//! Local file layout for the HTTP surface.
//!
//! ```text
//! {base}/uploads/{timestamp}_{name}   saved uploads
//! {base}/outputs/frames_{id}.zip      archives ready for download
//! {base}/temp/                        per-upload frame directories
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use vframe_models::ProcessedFile;

use crate::error::{ApiError, ApiResult};

/// Entry in the plain file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

/// Destination chosen for a new upload.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub id: String,
    pub filename: String,
    pub path: PathBuf,
}

/// Upload, output and temp directories under one base.
#[derive(Debug, Clone)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.base.join("uploads")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.base.join("outputs")
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.base.join("temp")
    }

    pub async fn create_dirs(&self) -> std::io::Result<()> {
        for dir in [self.uploads_dir(), self.outputs_dir(), self.temp_dir()] {
            tokio::fs::create_dir_all(&dir).await?;
        }
        Ok(())
    }

    /// Pick an ID and path for an upload named `original_name`.
    ///
    /// Only the base name of `original_name` is used.
    pub fn new_upload(&self, original_name: &str) -> PendingUpload {
        let id = Utc::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let name = base_name(original_name);
        let filename = format!("{}_{}", id, name);
        let path = self.uploads_dir().join(&filename);
        PendingUpload { id, filename, path }
    }

    /// Archives in the output directory, sorted by name.
    pub async fn list_processed(&self) -> ApiResult<Vec<ProcessedFile>> {
        let mut files: Vec<ProcessedFile> = self
            .zip_entries()
            .await?
            .into_iter()
            .map(|(name, meta)| {
                let created_at = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                ProcessedFile::new(name, meta.len(), created_at)
            })
            .collect();
        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    /// Name and size of every archive in the output directory.
    pub async fn list_files(&self) -> ApiResult<Vec<FileInfo>> {
        let mut files: Vec<FileInfo> = self
            .zip_entries()
            .await?
            .into_iter()
            .map(|(name, meta)| FileInfo {
                name,
                size: meta.len(),
            })
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Resolve a download name to a file in the output directory.
    pub async fn resolve_download(&self, filename: &str) -> ApiResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(ApiError::bad_request("Invalid filename"));
        }

        let path = self.outputs_dir().join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(ApiError::not_found("File not found")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ApiError::not_found("File not found"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a saved upload.
    pub async fn remove_upload(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove upload: {}", e);
            }
        }
    }

    async fn zip_entries(&self) -> ApiResult<Vec<(String, std::fs::Metadata)>> {
        let mut entries = match tokio::fs::read_dir(self.outputs_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_zip = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("zip"))
                .unwrap_or(false);
            if !is_zip {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            out.push((entry.file_name().to_string_lossy().into_owned(), meta));
        }
        Ok(out)
    }
}

/// Final path component of a client-supplied name.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_upload_strips_directories() {
        let store = FileStore::new("/data");
        let upload = store.new_upload("../../etc/clip.mp4");

        assert_eq!(upload.filename, format!("{}_clip.mp4", upload.id));
        assert_eq!(upload.path, PathBuf::from("/data/uploads").join(&upload.filename));
    }

    #[test]
    fn test_base_name_windows_separators() {
        assert_eq!(base_name(r"C:\Users\me\clip.mov"), "clip.mov");
        assert_eq!(base_name("clip.mov"), "clip.mov");
    }

    #[tokio::test]
    async fn test_listing_only_zips() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.create_dirs().await.unwrap();

        let outputs = store.outputs_dir();
        tokio::fs::write(outputs.join("frames_b.zip"), b"bb").await.unwrap();
        tokio::fs::write(outputs.join("frames_a.zip"), b"a").await.unwrap();
        tokio::fs::write(outputs.join("notes.txt"), b"x").await.unwrap();
        tokio::fs::create_dir(outputs.join("worker-1")).await.unwrap();

        let files = store.list_files().await.unwrap();
        assert_eq!(
            files,
            vec![
                FileInfo { name: "frames_a.zip".into(), size: 1 },
                FileInfo { name: "frames_b.zip".into(), size: 2 },
            ]
        );

        let processed = store.list_processed().await.unwrap();
        assert_eq!(processed.len(), 2);
        assert_eq!(processed[0].download_url, "/download/frames_a.zip");
    }

    #[tokio::test]
    async fn test_listing_without_outputs_dir() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("missing"));
        assert!(store.list_files().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_download() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        store.create_dirs().await.unwrap();
        tokio::fs::write(store.outputs_dir().join("frames_1.zip"), b"z").await.unwrap();

        assert!(store.resolve_download("frames_1.zip").await.is_ok());
        assert!(matches!(
            store.resolve_download("frames_2.zip").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            store.resolve_download("..").await,
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            store.resolve_download("a/b.zip").await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
