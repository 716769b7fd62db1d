//! s3u-core: Core library for the s3u object transfer tool
//!
//! This crate provides:
//! - Configuration and alias management
//! - Remote path parsing
//! - The transform hook chain (registry, filters, compression hooks)
//! - Progress estimation
//! - The multipart upload engine
//! - Get/put orchestration over the `ObjectStore` trait
//!
//! Nothing here depends on a specific S3 SDK; the `s3u-s3` crate provides
//! the AWS SDK backed store.

pub mod alias;
pub mod config;
pub mod error;
pub mod hooks;
pub mod multipart;
pub mod path;
pub mod progress;
pub mod retry;
pub mod traits;
pub mod transfer;

pub use alias::{Alias, AliasManager, RetryConfig};
pub use config::{Config, ConfigManager, TransferSettings};
pub use error::{Error, Result};
pub use hooks::{
    ChainResult, Hook, HookChain, HookContext, HookOutcome, HookRecord, HookRegistry, HookSpec,
};
pub use multipart::{Chunk, MultipartUploader, plan_chunks};
pub use path::{RemotePath, parse_remote_path};
pub use progress::{Direction, ProgressEstimator, ProgressSink, TransferMonitor};
pub use retry::{Backoff, is_transient, retry_check};
pub use traits::{CompletedPart, MultipartSession, ObjectStore};
pub use transfer::{
    FileTransfer, OverwritePolicy, Transfer, TransferMethod, TransferReport, TransferRequest,
};
