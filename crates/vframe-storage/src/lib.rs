//! S3-compatible blob storage client.
//!
//! This crate provides:
//! - Streaming object download to local files
//! - File upload with content-type detection
//! - Video key listing
//! - The [`BlobStore`] capability used by the worker pipeline

pub mod client;
pub mod error;
pub mod gateway;

pub use client::{ObjectInfo, S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use gateway::BlobStore;
