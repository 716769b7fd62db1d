//! s3u-s3: S3 backend for s3u
//!
//! Implements the `ObjectStore` trait from s3u-core on top of aws-sdk-s3.

pub mod client;

pub use client::S3Client;
