//! Alias management
//!
//! An alias is a named connection profile for an S3-compatible endpoint.
//! Aliases are stored in the main configuration file.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// Retry settings applied to idempotent object store calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

/// A named S3 endpoint with credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Bucket lookup style: auto, path, or dns
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl Alias {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: default_region(),
            bucket_lookup: default_bucket_lookup(),
            insecure: false,
            retry: None,
        }
    }

    /// Retry configuration, falling back to defaults
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    /// Check that the endpoint is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("alias name cannot be empty".to_string()));
        }
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::Config(format!(
                "unsupported endpoint scheme '{other}' (expected http or https)"
            ))),
        }
    }
}

/// Reads and writes aliases through the config file
pub struct AliasManager {
    config: ConfigManager,
}

impl AliasManager {
    /// Create a manager bound to the default config location
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: ConfigManager::new()?,
        })
    }

    pub fn with_config(config: ConfigManager) -> Self {
        Self { config }
    }

    pub fn get(&self, name: &str) -> Result<Alias> {
        let config = self.config.load()?;
        config
            .aliases
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// Add an alias or replace one with the same name
    pub fn set(&self, alias: Alias) -> Result<()> {
        alias.validate()?;
        let mut config = self.config.load()?;
        config.aliases.retain(|a| a.name != alias.name);
        config.aliases.push(alias);
        config.aliases.sort_by(|a, b| a.name.cmp(&b.name));
        self.config.save(&config)
    }

    pub fn list(&self) -> Result<Vec<Alias>> {
        let mut aliases = self.config.load()?.aliases;
        aliases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(aliases)
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config.load()?;
        let before = config.aliases.len();
        config.aliases.retain(|a| a.name != name);
        if config.aliases.len() == before {
            return Err(Error::AliasNotFound(name.to_string()));
        }
        self.config.save(&config)
    }
}
