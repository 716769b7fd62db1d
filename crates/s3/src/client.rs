//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3u-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as SdkCompletedPart};
use aws_smithy_types::byte_stream::Length;
use s3u_core::multipart::Chunk;
use s3u_core::{
    Alias, CompletedPart, Error, MultipartSession, ObjectStore, ProgressSink, RemotePath, Result,
    RetryConfig, retry_check,
};
use tokio::io::AsyncWriteExt;

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    retry: RetryConfig,
}

impl S3Client {
    /// Create a new S3 client from an alias configuration
    pub async fn new(alias: Alias) -> Result<Self> {
        alias.validate()?;
        if alias.insecure {
            tracing::warn!(
                alias = %alias.name,
                "Certificate verification cannot be disabled for this backend; 'insecure' is ignored"
            );
        }

        let credentials = aws_credential_types::Credentials::new(
            alias.access_key.clone(),
            alias.secret_key.clone(),
            None, // session token
            None, // expiry
            "s3u-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(alias.region.clone()))
            .endpoint_url(&alias.endpoint)
            .load()
            .await;

        // Path-style addressing for S3-compatible endpoints
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(alias.bucket_lookup == "path" || alias.bucket_lookup == "auto")
            .build();

        tracing::debug!(
            alias = %alias.name,
            endpoint = %alias.endpoint,
            region = %alias.region,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            retry: alias.retry_config(),
        })
    }

    /// Format AWS SDK error into a detailed error message
    fn format_sdk_error<E: std::fmt::Display>(error: &SdkError<E>) -> String {
        match error {
            SdkError::ServiceError(service_err) => {
                let err = service_err.err();
                let meta = service_err.raw();
                let mut msg = format!("Service error: {}", err);
                if let Some(code) = meta.headers().get("x-amz-error-code")
                    && let Ok(code_str) = std::str::from_utf8(code.as_bytes())
                {
                    msg.push_str(&format!(" (code: {})", code_str));
                }
                msg
            }
            SdkError::ConstructionFailure(err) => {
                format!("Request construction failed: {:?}", err)
            }
            SdkError::TimeoutError(_) => "Request timeout".to_string(),
            SdkError::DispatchFailure(err) => {
                format!("Network dispatch error: {:?}", err)
            }
            SdkError::ResponseError(err) => {
                format!("Response error: {:?}", err)
            }
            _ => error.to_string(),
        }
    }

    /// Map an SDK error to a core error using the HTTP status when present
    fn map_sdk_error<E: std::fmt::Display>(error: &SdkError<E>, context: &str) -> Error {
        let status = error.raw_response().map(|r| r.status().as_u16());
        classify_status(status, format!("{context}: {}", Self::format_sdk_error(error)))
    }
}

/// Error kind for a failed request with an optional HTTP status
fn classify_status(status: Option<u16>, message: String) -> Error {
    match status {
        Some(401 | 403) => Error::Auth(message),
        Some(404) => Error::NotFound(message),
        Some(code) => Error::Network(format!("{message} (HTTP {code})")),
        None => Error::Network(message),
    }
}

/// Content type stored with an object, guessed from its key
fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let client = &self.inner;
        retry_check(&self.retry, "head bucket", || async move {
            match client.head_bucket().bucket(bucket).send().await {
                Ok(_) => Ok(true),
                Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
                Err(e) => Err(Self::map_sdk_error(&e, &format!("head bucket '{bucket}'"))),
            }
        })
        .await
    }

    async fn object_exists(&self, path: &RemotePath) -> Result<bool> {
        let client = &self.inner;
        retry_check(&self.retry, "head object", || async move {
            match client
                .head_object()
                .bucket(&path.bucket)
                .key(&path.key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
                Err(e) => match Self::map_sdk_error(&e, &format!("head object '{path}'")) {
                    Error::NotFound(_) => Ok(false),
                    other => Err(other),
                },
            }
        })
        .await
    }

    async fn get_to_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<u64> {
        let mut response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(&e, &format!("get object '{path}'")))?;

        let total = response.content_length().unwrap_or(0).max(0) as u64;
        let mut file = tokio::fs::File::create(local).await?;
        let mut written = 0u64;
        progress.update(0, total);

        while let Some(bytes) = response
            .body
            .try_next()
            .await
            .map_err(|e| Error::Network(format!("reading '{path}': {e}")))?
        {
            file.write_all(&bytes).await?;
            written += bytes.len() as u64;
            progress.update(written, total.max(written));
        }
        file.flush().await?;

        tracing::debug!(key = %path.key, bytes = written, "Downloaded object body");
        Ok(written)
    }

    async fn put_from_file(
        &self,
        path: &RemotePath,
        local: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let size = tokio::fs::metadata(local).await?.len();
        let body = ByteStream::from_path(local)
            .await
            .map_err(|e| Error::General(format!("cannot read '{}': {e}", local.display())))?;

        progress.update(0, size);
        self.inner
            .put_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .content_type(content_type_for(&path.key))
            .content_length(size as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(&e, &format!("put object '{path}'")))?;
        progress.update(size, size);

        Ok(())
    }

    async fn create_multipart_upload(&self, path: &RemotePath) -> Result<MultipartSession> {
        let response = self
            .inner
            .create_multipart_upload()
            .bucket(&path.bucket)
            .key(&path.key)
            .content_type(content_type_for(&path.key))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(&e, &format!("create multipart upload '{path}'")))?;

        let upload_id = response.upload_id().ok_or_else(|| {
            Error::General(format!("no upload id returned for '{path}'"))
        })?;

        Ok(MultipartSession {
            path: path.clone(),
            upload_id: upload_id.to_string(),
        })
    }

    async fn upload_part(
        &self,
        session: &MultipartSession,
        local: &Path,
        chunk: &Chunk,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedPart> {
        let body = ByteStream::read_from()
            .path(local)
            .offset(chunk.offset)
            .length(Length::Exact(chunk.length))
            .build()
            .await
            .map_err(|e| Error::General(format!("cannot read '{}': {e}", local.display())))?;

        progress.update(0, chunk.length);
        let response = self
            .inner
            .upload_part()
            .bucket(&session.path.bucket)
            .key(&session.path.key)
            .upload_id(&session.upload_id)
            .part_number(chunk.part_number as i32)
            .content_length(chunk.length as i64)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                Self::map_sdk_error(&e, &format!("upload part {}", chunk.part_number))
            })?;
        progress.update(chunk.length, chunk.length);

        Ok(CompletedPart {
            part_number: chunk.part_number,
            etag: response.e_tag().map(str::to_string),
        })
    }

    async fn complete_multipart_upload(
        &self,
        session: &MultipartSession,
        parts: Vec<CompletedPart>,
    ) -> Result<()> {
        let parts = parts
            .into_iter()
            .map(|p| {
                SdkCompletedPart::builder()
                    .part_number(p.part_number as i32)
                    .set_e_tag(p.etag)
                    .build()
            })
            .collect();
        let upload = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();

        self.inner
            .complete_multipart_upload()
            .bucket(&session.path.bucket)
            .key(&session.path.key)
            .upload_id(&session.upload_id)
            .multipart_upload(upload)
            .send()
            .await
            .map_err(|e| {
                Self::map_sdk_error(&e, &format!("complete multipart upload '{}'", session.path))
            })?;

        Ok(())
    }

    async fn abort_multipart_upload(&self, session: &MultipartSession) -> Result<()> {
        self.inner
            .abort_multipart_upload()
            .bucket(&session.path.bucket)
            .key(&session.path.key)
            .upload_id(&session.upload_id)
            .send()
            .await
            .map_err(|e| {
                Self::map_sdk_error(&e, &format!("abort multipart upload '{}'", session.path))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3u_core::is_transient;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(Some(403), "denied".to_string()),
            Error::Auth(_)
        ));
        assert!(matches!(
            classify_status(Some(404), "missing".to_string()),
            Error::NotFound(_)
        ));
        assert!(matches!(
            classify_status(None, "Request timeout".to_string()),
            Error::Network(_)
        ));
    }

    #[test]
    fn test_server_errors_are_retryable() {
        let err = classify_status(Some(503), "head bucket 'b'".to_string());
        assert!(is_transient(&err));

        let err = classify_status(Some(400), "head bucket 'b'".to_string());
        assert!(!is_transient(&err));

        let err = classify_status(Some(403), "head bucket 'b'".to_string());
        assert!(!is_transient(&err));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("logs/app.json"), "application/json");
        assert_eq!(content_type_for("notes.txt"), "text/plain");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_endpoint() {
        let alias = Alias::new("bad", "ftp://example.com", "ak", "sk");
        assert!(matches!(S3Client::new(alias).await, Err(Error::Config(_))));
    }
}
