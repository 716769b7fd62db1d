//! Error types for s3u-core
//!
//! Every fallible operation in the library returns [`Result`], so the CLI can
//! map failures to exit codes in one place.

use std::path::PathBuf;

/// Result alias used throughout s3u-core
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by configuration, hooks and transfers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or unreadable configuration (including hook options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Alias lookup failed
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// Remote path could not be parsed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Remote object or bucket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local file required by a hook chain does not exist
    #[error("File '{}' does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// Bucket could not be accessed with the configured credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport level failure talking to the object store
    #[error("Network error: {0}")]
    Network(String),

    /// Requested behavior is recognized but not implemented
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// External transform process failed, timed out or could not start
    #[error("Command failed: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether the error came from an unsupported option rather than a failure
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedFeature(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_message() {
        let err = Error::FileNotFound(PathBuf::from("/tmp/missing.log"));
        assert_eq!(err.to_string(), "File '/tmp/missing.log' does not exist");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_unsupported());
    }
}
