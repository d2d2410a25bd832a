//! Scratch path guards.
//!
//! Each guard removes its path when dropped, so every early return out of a
//! pipeline stage leaves the worker directories as they were.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Removes a file on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    /// Guard `path`. The file does not need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file and hand back its path.
    pub fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove scratch file: {}", e),
        }
    }
}

/// Removes a directory tree on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the directory and guard it.
    pub async fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let guard = Self::new(path);
        tokio::fs::create_dir_all(&guard.path).await?;
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove scratch directory: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();

        drop(ScratchFile::new(&path));
        assert!(!path.exists());

        // Missing files are fine
        drop(ScratchFile::new(dir.path().join("never-created")));
    }

    #[test]
    fn test_kept_file_survives() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frames_1.zip");
        std::fs::write(&path, b"x").unwrap();

        let kept = ScratchFile::new(&path).keep();
        assert_eq!(kept, path);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_dir_removed_with_contents() {
        let dir = TempDir::new().unwrap();
        let frames = dir.path().join("frames_1-0");

        {
            let guard = ScratchDir::create(&frames).await.unwrap();
            std::fs::write(guard.path().join("frame_0001.png"), b"x").unwrap();
        }

        assert!(!frames.exists());
        assert!(dir.path().exists());
    }
}
