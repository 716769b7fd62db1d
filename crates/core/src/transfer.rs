//! Transfer orchestration
//!
//! `get` downloads an object and runs the post-hook chain on the local file.
//! `put` runs the pre-hook chain, uploads the original unless a hook modified
//! it, and uploads every file the hooks produced. Each upload picks a direct
//! or multipart transfer by size and honors the overwrite policy.
//!
//! Downloads land in a temporary file next to the destination, which is
//! renamed over it only once the body has been received in full.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::TransferSettings;
use crate::error::{Error, Result};
use crate::hooks::{ChainResult, HookChain, HookRegistry, HookSpec};
use crate::multipart::MultipartUploader;
use crate::path::RemotePath;
use crate::progress::{Direction, ProgressSink, TransferMonitor};
use crate::traits::ObjectStore;

/// What to do when the destination already holds data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Leave the existing destination untouched
    Skip,
    /// Replace the existing destination
    #[default]
    Replace,
    /// Write next to the existing destination under a suffixed name
    Suffix,
    /// Keep the existing destination as an older version
    Version,
}

impl OverwritePolicy {
    /// Fail for policies that are recognized but not implemented
    pub fn ensure_supported(self) -> Result<Self> {
        match self {
            OverwritePolicy::Skip | OverwritePolicy::Replace => Ok(self),
            OverwritePolicy::Suffix | OverwritePolicy::Version => Err(Error::UnsupportedFeature(
                format!("overwrite policy '{self}' is not supported"),
            )),
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverwritePolicy::Skip => write!(f, "skip"),
            OverwritePolicy::Replace => write!(f, "replace"),
            OverwritePolicy::Suffix => write!(f, "suffix"),
            OverwritePolicy::Version => write!(f, "version"),
        }
    }
}

impl FromStr for OverwritePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(OverwritePolicy::Skip),
            "replace" => Ok(OverwritePolicy::Replace),
            "suffix" => Ok(OverwritePolicy::Suffix),
            "version" => Ok(OverwritePolicy::Version),
            _ => Err(format!("Invalid overwrite policy: {s}")),
        }
    }
}

/// One get or put
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub remote: RemotePath,
    pub local_path: PathBuf,
    pub overwrite: OverwritePolicy,
    pub hooks: Vec<HookSpec>,
}

impl TransferRequest {
    pub fn new(remote: RemotePath, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            local_path: local_path.into(),
            overwrite: OverwritePolicy::default(),
            hooks: Vec::new(),
        }
    }

    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    pub fn hooks(mut self, hooks: Vec<HookSpec>) -> Self {
        self.hooks = hooks;
        self
    }
}

/// How a single file was moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMethod {
    Direct,
    Multipart,
    /// Destination existed and the policy is `skip`
    Skipped,
}

/// A file moved (or planned to be moved) by a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileTransfer {
    pub key: String,
    pub local_path: PathBuf,
    pub size_bytes: u64,
    pub method: TransferMethod,
}

/// Outcome of a get or put
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReport {
    pub bucket: String,
    pub chain: ChainResult,
    pub transfers: Vec<FileTransfer>,
    pub dry_run: bool,
}

/// Progress sink used when nobody is watching
struct Unobserved;

impl ProgressSink for Unobserved {
    fn update(&self, _bytes_transmitted: u64, _bytes_total: u64) {}
}

/// Sequences hooks and byte transfers against an [`ObjectStore`]
pub struct Transfer<'a> {
    store: &'a dyn ObjectStore,
    registry: &'a HookRegistry,
    settings: TransferSettings,
    monitor: Option<&'a dyn TransferMonitor>,
}

impl<'a> Transfer<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        registry: &'a HookRegistry,
        settings: TransferSettings,
    ) -> Self {
        Self {
            store,
            registry,
            settings,
            monitor: None,
        }
    }

    /// Report each file moved, and its progress, to `monitor`
    pub fn with_monitor(mut self, monitor: &'a dyn TransferMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    fn begin(
        &self,
        direction: Direction,
        source: &str,
        destination: &str,
    ) -> Box<dyn ProgressSink> {
        match self.monitor {
            Some(monitor) => monitor.begin(direction, source, destination),
            None => Box::new(Unobserved),
        }
    }

    fn chain(&self) -> HookChain<'a> {
        HookChain::new(self.registry).with_timeout(self.settings.hook_timeout())
    }

    /// Download `request.remote` to `request.local_path`, then run post-hooks
    pub async fn get(&self, request: &TransferRequest) -> Result<TransferReport> {
        let remote = &request.remote;
        let local = request.local_path.as_path();
        request.overwrite.ensure_supported()?;

        self.check_bucket(&remote.bucket).await?;
        if !self.store.object_exists(remote).await? {
            return Err(Error::NotFound(format!(
                "object {}/{} does not exist",
                remote.bucket, remote.key
            )));
        }

        let parent = match local.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
            tracing::debug!(dir = %parent.display(), "Created download directory");
        }

        let transfer = if local.exists() && request.overwrite == OverwritePolicy::Skip {
            tracing::info!(path = %local.display(), "Local file exists, skipping download");
            FileTransfer {
                key: remote.key.clone(),
                local_path: local.to_path_buf(),
                size_bytes: tokio::fs::metadata(local).await?.len(),
                method: TransferMethod::Skipped,
            }
        } else {
            let size = self.download(remote, local, parent).await?;
            FileTransfer {
                key: remote.key.clone(),
                local_path: local.to_path_buf(),
                size_bytes: size,
                method: TransferMethod::Direct,
            }
        };

        let chain = self
            .chain()
            .apply(&remote.bucket, &remote.key, local, &request.hooks, false)
            .await?;

        Ok(TransferReport {
            bucket: remote.bucket.clone(),
            chain,
            transfers: vec![transfer],
            dry_run: false,
        })
    }

    /// Stream `remote` into a temporary file in `dir`, then move it to `local`
    ///
    /// A failed download removes the temporary file and leaves any existing
    /// `local` untouched.
    async fn download(&self, remote: &RemotePath, local: &Path, dir: &Path) -> Result<u64> {
        let partial = tempfile::Builder::new()
            .prefix(".s3u-")
            .suffix(".part")
            .tempfile_in(dir)?;

        let progress = self.begin(
            Direction::Download,
            &format!("{}/{}", remote.bucket, remote.key),
            &local.display().to_string(),
        );
        let size = self
            .store
            .get_to_file(remote, partial.path(), progress.as_ref())
            .await?;
        partial.persist(local).map_err(|e| Error::Io(e.error))?;
        progress.finish();

        tracing::info!(key = %remote.key, bytes = size, "Downloaded object");
        Ok(size)
    }

    /// Run pre-hooks on `request.local_path` and upload the results
    pub async fn put(&self, request: &TransferRequest) -> Result<TransferReport> {
        self.run_put(request, false).await
    }

    /// Dry-run the pre-hooks and report what `put` would upload
    ///
    /// Neither the store nor the filesystem is modified.
    pub async fn plan_put(&self, request: &TransferRequest) -> Result<TransferReport> {
        self.run_put(request, true).await
    }

    async fn run_put(&self, request: &TransferRequest, dry: bool) -> Result<TransferReport> {
        let remote = &request.remote;
        let local = request.local_path.as_path();
        request.overwrite.ensure_supported()?;

        if !dry {
            self.check_bucket(&remote.bucket).await?;
        }

        let chain = self
            .chain()
            .apply(&remote.bucket, &remote.key, local, &request.hooks, dry)
            .await?;

        let mut uploads: Vec<(String, PathBuf)> = Vec::new();
        if !chain.modified {
            uploads.push((remote.key.clone(), local.to_path_buf()));
        }
        for (key, path) in chain.produced() {
            if !uploads.iter().any(|(k, p)| k == key && p == path) {
                uploads.push((key.to_string(), path.to_path_buf()));
            }
        }

        let mut transfers = Vec::with_capacity(uploads.len());
        for (key, path) in uploads {
            let target = remote.with_key(key);
            let transfer = if dry {
                self.plan_upload(&target, &path).await
            } else {
                self.upload_file(&target, &path, request.overwrite).await?
            };
            transfers.push(transfer);
        }

        Ok(TransferReport {
            bucket: remote.bucket.clone(),
            chain,
            transfers,
            dry_run: dry,
        })
    }

    async fn upload_file(
        &self,
        remote: &RemotePath,
        local: &Path,
        policy: OverwritePolicy,
    ) -> Result<FileTransfer> {
        let size = match tokio::fs::metadata(local).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound(local.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        match policy {
            OverwritePolicy::Skip => {
                if self.store.object_exists(remote).await? {
                    tracing::info!(key = %remote.key, "Object exists, skipping upload");
                    return Ok(FileTransfer {
                        key: remote.key.clone(),
                        local_path: local.to_path_buf(),
                        size_bytes: size,
                        method: TransferMethod::Skipped,
                    });
                }
            }
            OverwritePolicy::Replace => {}
            OverwritePolicy::Suffix | OverwritePolicy::Version => {
                policy.ensure_supported()?;
            }
        }

        let progress = self.begin(
            Direction::Upload,
            &local.display().to_string(),
            &format!("{}/{}", remote.bucket, remote.key),
        );
        let method = if size >= self.settings.multipart_threshold {
            MultipartUploader::new(self.store, self.settings.chunk_size)
                .upload(remote, local, size, progress.as_ref())
                .await?;
            TransferMethod::Multipart
        } else {
            self.store.put_from_file(remote, local, progress.as_ref()).await?;
            TransferMethod::Direct
        };
        progress.finish();

        tracing::info!(key = %remote.key, bytes = size, ?method, "Uploaded file");
        Ok(FileTransfer {
            key: remote.key.clone(),
            local_path: local.to_path_buf(),
            size_bytes: size,
            method,
        })
    }

    async fn plan_upload(&self, remote: &RemotePath, local: &Path) -> FileTransfer {
        // Hook outputs do not exist yet in a dry run
        let size = tokio::fs::metadata(local)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        let method = if size >= self.settings.multipart_threshold {
            TransferMethod::Multipart
        } else {
            TransferMethod::Direct
        };
        FileTransfer {
            key: remote.key.clone(),
            local_path: local.to_path_buf(),
            size_bytes: size,
            method,
        }
    }

    async fn check_bucket(&self, bucket: &str) -> Result<()> {
        match self.store.bucket_exists(bucket).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::NotFound(format!("bucket '{bucket}' does not exist"))),
            Err(Error::Auth(msg)) | Err(Error::General(msg)) => Err(Error::Auth(format!(
                "unable to access bucket '{bucket}': {msg}"
            ))),
            Err(Error::Network(msg)) => Err(Error::Network(format!(
                "unable to access bucket '{bucket}': {msg}"
            ))),
            Err(e) => Err(Error::Auth(format!("unable to access bucket '{bucket}': {e}"))),
        }
    }
}
