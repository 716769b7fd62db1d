//! Chunked multipart upload
//!
//! Oversized files are split into fixed-size byte ranges and uploaded one
//! part at a time. A failed part aborts the remote session before the error
//! is returned.

use std::path::Path;

use crate::config::MAX_PARTS;
use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::progress::ProgressSink;
use crate::traits::{MultipartSession, ObjectStore};

/// A contiguous byte range of a local file, uploaded as one part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u64,
    pub length: u64,
    /// 1-based part number
    pub part_number: u32,
}

/// `ceil(total_size / chunk_size)`
pub fn chunk_count(total_size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    total_size.div_ceil(chunk_size)
}

/// Split `total_size` bytes into parts of at most `chunk_size` bytes
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::Config("chunk size must be greater than zero".to_string()));
    }
    if total_size == 0 {
        return Err(Error::General(
            "cannot split an empty file into parts".to_string(),
        ));
    }

    let count = chunk_count(total_size, chunk_size);
    if count > MAX_PARTS {
        return Err(Error::Config(format!(
            "{total_size} bytes in {chunk_size} byte chunks needs {count} parts, more than the {MAX_PARTS} allowed"
        )));
    }

    Ok((1..=count)
        .map(|n| {
            let offset = chunk_size * (n - 1);
            Chunk {
                offset,
                length: chunk_size.min(total_size - offset),
                part_number: n as u32,
            }
        })
        .collect())
}

/// Drives a multipart upload against an [`ObjectStore`]
pub struct MultipartUploader<'a> {
    store: &'a dyn ObjectStore,
    chunk_size: u64,
}

impl<'a> MultipartUploader<'a> {
    pub fn new(store: &'a dyn ObjectStore, chunk_size: u64) -> Self {
        Self { store, chunk_size }
    }

    /// Upload `local` to `path` in sequential parts
    ///
    /// The progress sink is re-armed before each part so every part gets its
    /// own throughput and ETA.
    pub async fn upload(
        &self,
        path: &RemotePath,
        local: &Path,
        total_size: u64,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let chunks = plan_chunks(total_size, self.chunk_size)?;
        let session = self.store.create_multipart_upload(path).await?;

        tracing::info!(
            key = %path.key,
            upload_id = %session.upload_id,
            parts = chunks.len(),
            "Started multipart upload"
        );

        let mut completed = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            progress.rearm();
            tracing::debug!(
                part = chunk.part_number,
                offset = chunk.offset,
                length = chunk.length,
                "Uploading part"
            );
            match self.store.upload_part(&session, local, chunk, progress).await {
                Ok(part) => completed.push(part),
                Err(e) => {
                    tracing::warn!(part = chunk.part_number, error = %e, "Part upload failed");
                    self.abort(&session).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self
            .store
            .complete_multipart_upload(&session, completed)
            .await
        {
            self.abort(&session).await;
            return Err(e);
        }

        tracing::info!(key = %path.key, "Completed multipart upload");
        Ok(())
    }

    async fn abort(&self, session: &MultipartSession) {
        if let Err(e) = self.store.abort_multipart_upload(session).await {
            tracing::warn!(
                upload_id = %session.upload_id,
                error = %e,
                "Failed to abort multipart upload"
            );
        }
    }
}
