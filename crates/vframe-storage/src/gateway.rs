//! Blob store capability consumed by the worker pipeline.

use std::path::Path;

use async_trait::async_trait;

use crate::client::{content_type_for, S3Client};
use crate::error::StorageResult;

/// Remote object storage as seen by the pipeline.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch `remote_key` into `local_path`.
    async fn download(&self, remote_key: &str, local_path: &Path) -> StorageResult<()>;

    /// Store `local_path` under `remote_key`.
    async fn upload(&self, local_path: &Path, remote_key: &str) -> StorageResult<()>;

    /// Keys of every stored video.
    async fn list_videos(&self) -> StorageResult<Vec<String>>;

    fn bucket(&self) -> &str;

    /// `s3://{bucket}/{key}`
    fn object_url(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket(), key)
    }
}

#[async_trait]
impl BlobStore for S3Client {
    async fn download(&self, remote_key: &str, local_path: &Path) -> StorageResult<()> {
        self.download_file(remote_key, local_path).await.map(|_| ())
    }

    async fn upload(&self, local_path: &Path, remote_key: &str) -> StorageResult<()> {
        self.upload_file(local_path, remote_key, content_type_for(local_path))
            .await
    }

    async fn list_videos(&self) -> StorageResult<Vec<String>> {
        S3Client::list_videos(self).await
    }

    fn bucket(&self) -> &str {
        S3Client::bucket(self)
    }
}
