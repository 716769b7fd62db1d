//! Configuration file management
//!
//! The configuration lives in `config.toml` inside the s3u config directory.
//! The directory can be overridden with the `S3U_CONFIG_DIR` environment
//! variable, which the tests rely on for isolation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::error::{Error, Result};
use crate::transfer::OverwritePolicy;

/// Current config schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "S3U_CONFIG_DIR";

/// Default multipart chunk size (100 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Objects at or above this size are uploaded in parts (5 GiB)
pub const DEFAULT_MULTIPART_THRESHOLD: u64 = 5 * 1024 * 1024 * 1024;

/// Smallest part size accepted by S3 (5 MiB)
pub const MIN_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum number of parts in one multipart upload
pub const MAX_PARTS: u64 = 10_000;

/// Default limit for a single transform process (one hour)
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 3600;

/// Tunables for get/put
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSettings {
    pub chunk_size: u64,
    pub multipart_threshold: u64,
    pub hook_timeout_secs: u64,
    pub overwrite: OverwritePolicy,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
            hook_timeout_secs: DEFAULT_HOOK_TIMEOUT_SECS,
            overwrite: OverwritePolicy::default(),
        }
    }
}

impl TransferSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::Config(format!(
                "chunk_size must be at least {MIN_CHUNK_SIZE} bytes, got {}",
                self.chunk_size
            )));
        }
        if self.multipart_threshold == 0 {
            return Err(Error::Config(
                "multipart_threshold must be greater than zero".to_string(),
            ));
        }
        if self.hook_timeout_secs == 0 {
            return Err(Error::Config(
                "hook_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn hook_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.hook_timeout_secs)
    }
}

/// On-disk configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub aliases: Vec<Alias>,

    #[serde(default)]
    pub transfer: TransferSettings,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            aliases: Vec::new(),
            transfer: TransferSettings::default(),
        }
    }
}

/// Loads and saves [`Config`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use `$S3U_CONFIG_DIR/config.toml`, or the platform config dir
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("cannot determine config directory".to_string()))?
                .join("s3u"),
        };
        Ok(Self::with_path(dir.join("config.toml")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, returning defaults when the file does not exist yet
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content)?;
        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "config schema version {} is newer than supported version {SCHEMA_VERSION}",
                config.schema_version
            )));
        }
        config.transfer.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.transfer.chunk_size, 104_857_600);
        assert_eq!(config.transfer.multipart_threshold, 5_368_709_120);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested/config.toml"));

        let mut config = Config::default();
        config.transfer.overwrite = OverwritePolicy::Skip;
        config.transfer.hook_timeout_secs = 30;
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.transfer.overwrite, OverwritePolicy::Skip);
        assert_eq!(loaded.transfer.hook_timeout_secs, 30);
    }

    #[test]
    fn test_partial_transfer_section_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[transfer]\nchunk_size = 10485760\n").unwrap();

        let config = ConfigManager::with_path(&path).load().unwrap();
        assert_eq!(config.transfer.chunk_size, 10_485_760);
        assert_eq!(config.transfer.multipart_threshold, DEFAULT_MULTIPART_THRESHOLD);
        assert_eq!(config.transfer.overwrite, OverwritePolicy::Replace);
    }

    #[test]
    fn test_validate_rejects_small_chunks() {
        let settings = TransferSettings {
            chunk_size: 1024,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_newer_schema_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "schema_version = 99\n").unwrap();
        assert!(ConfigManager::with_path(&path).load().is_err());
    }
}
