//! Object store abstraction
//!
//! The transfer orchestrator and the multipart engine only talk to the remote
//! side through [`ObjectStore`], which keeps them independent of the S3 SDK
//! and lets tests run against an in-memory store.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::multipart::Chunk;
use crate::path::RemotePath;
use crate::progress::ProgressSink;

/// An initiated multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSession {
    pub path: RemotePath,
    pub upload_id: String,
}

/// A part accepted by the store, needed to complete the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: Option<String>,
}

/// Remote object store operations used by get/put
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Whether the bucket exists. Access failures are errors, not `false`.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    async fn object_exists(&self, path: &RemotePath) -> Result<bool>;

    /// Download an object into `local`, returning the number of bytes written
    async fn get_to_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<u64>;

    /// Upload a whole file in a single request, replacing any existing object
    async fn put_from_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<()>;

    async fn create_multipart_upload(&self, path: &RemotePath) -> Result<MultipartSession>;

    /// Upload one byte range of `local`. Re-uploading a part number replaces it.
    async fn upload_part(
        &self,
        session: &MultipartSession,
        local: &Path,
        chunk: &Chunk,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedPart>;

    async fn complete_multipart_upload(
        &self,
        session: &MultipartSession,
        parts: Vec<CompletedPart>,
    ) -> Result<()>;

    async fn abort_multipart_upload(&self, session: &MultipartSession) -> Result<()>;
}
