//! Frame archiving.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{MediaError, MediaResult};

/// Bundles local files into one archive.
#[async_trait]
pub trait ArchiveBuilder: Send + Sync {
    /// Write every file in `files` to `dest`, each entry named by its base name.
    ///
    /// A partially written `dest` is left in place on error.
    async fn create_archive(&self, files: &[PathBuf], dest: &Path) -> MediaResult<()>;
}

/// Deflate-compressed zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveBuilder;

impl ZipArchiveBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchiveBuilder for ZipArchiveBuilder {
    async fn create_archive(&self, files: &[PathBuf], dest: &Path) -> MediaResult<()> {
        let files = files.to_vec();
        let dest = dest.to_path_buf();

        tokio::task::spawn_blocking(move || write_zip(&files, &dest))
            .await
            .map_err(|e| MediaError::internal(format!("archive task failed: {}", e)))?
    }
}

fn write_zip(files: &[PathBuf], dest: &Path) -> MediaResult<()> {
    let mut zip = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| MediaError::internal(format!("invalid file name: {}", path.display())))?;

        let mut source = File::open(path)?;
        zip.start_file(name, options)?;
        std::io::copy(&mut source, &mut zip)?;
    }

    zip.finish()?.flush()?;
    debug!(entries = files.len(), dest = %dest.display(), "Archive written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    #[tokio::test]
    async fn test_entries_stored_by_base_name() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("frames");
        std::fs::create_dir(&nested).unwrap();

        let a = nested.join("frame_0001.png");
        let b = nested.join("frame_0002.png");
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();

        let dest = dir.path().join("clip_frames.zip");
        ZipArchiveBuilder::new()
            .create_archive(&[a, b], &dest)
            .await
            .unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);

        let mut contents = String::new();
        archive
            .by_name("frame_0002.png")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "second");
        assert!(archive.by_name("frames/frame_0001.png").is_err());
    }

    #[tokio::test]
    async fn test_empty_archive_is_valid() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.zip");

        ZipArchiveBuilder::new().create_archive(&[], &dest).await.unwrap();

        let archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.zip");

        let err = ZipArchiveBuilder::new()
            .create_archive(&[dir.path().join("missing.png")], &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }

    #[tokio::test]
    async fn test_unwritable_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("out.zip");

        let err = ZipArchiveBuilder::new().create_archive(&[], &dest).await.unwrap_err();
        assert!(matches!(err, MediaError::Io(_)));
    }
}
