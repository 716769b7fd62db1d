//! Remote path parsing
//!
//! Remote paths take the form `alias/bucket/key`. The key may be empty or end
//! with `/`, in which case callers treat it as a prefix.

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// A parsed `alias/bucket/key` location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    pub alias: String,
    pub bucket: String,
    pub key: String,
}

impl RemotePath {
    pub fn new(alias: impl Into<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Same alias and bucket, different key
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(&self.alias, &self.bucket, key)
    }

    /// Whether the key names a prefix rather than an object
    pub fn is_prefix(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Resolve a prefix key against a local file name (`dir/` + `file.txt`)
    pub fn join_file_name(&self, local: &Path) -> Result<Self> {
        if !self.is_prefix() {
            return Ok(self.clone());
        }
        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidPath(format!("cannot derive object key from '{}'", local.display()))
            })?;
        Ok(self.with_key(format!("{}{name}", self.key)))
    }

    /// Final component of the key
    pub fn base_name(&self) -> Option<&str> {
        self.key.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.alias, self.bucket, self.key)
    }
}

/// Parse `alias/bucket[/key]`
pub fn parse_remote_path(input: &str) -> Result<RemotePath> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(3, '/');

    let alias = parts.next().unwrap_or_default();
    let bucket = parts.next().unwrap_or_default();
    let key = parts.next().unwrap_or_default();

    if alias.is_empty() {
        return Err(Error::InvalidPath(format!("missing alias in '{input}'")));
    }
    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!("missing bucket in '{input}'")));
    }

    Ok(RemotePath::new(alias, bucket, key))
}
