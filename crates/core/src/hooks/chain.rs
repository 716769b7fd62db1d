//! Hook chain execution
//!
//! Hooks run in the order they were declared. Unregistered names are skipped,
//! filtered-out hooks contribute the untouched `(key, path)`, and the first
//! hook that modifies the working file ends the chain.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::{HookContext, HookRegistry, HookSpec};
use crate::config::DEFAULT_HOOK_TIMEOUT_SECS;
use crate::error::{Error, Result};

/// One hook's contribution to a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookRecord {
    pub hook: String,
    pub key: String,
    pub path: Option<PathBuf>,
    /// False when the filter skipped the hook and `key`/`path` are the inputs
    pub applied: bool,
}

/// Result of running a chain over one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainResult {
    pub original_path: PathBuf,
    /// A hook altered or removed the original and stopped the chain
    pub modified: bool,
    /// Per-hook results in execution order
    pub hooks: Vec<HookRecord>,
}

impl ChainResult {
    /// Files the applied hooks produced, as `(key, path)` pairs
    pub fn produced(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.hooks
            .iter()
            .filter(|r| r.applied)
            .filter_map(|r| r.path.as_deref().map(|p| (r.key.as_str(), p)))
    }

    /// Record for the first hook with the given name
    pub fn get(&self, hook: &str) -> Option<&HookRecord> {
        self.hooks.iter().find(|r| r.hook == hook)
    }
}

/// Executes hook specs against a registry
#[derive(Debug, Clone, Copy)]
pub struct HookChain<'a> {
    registry: &'a HookRegistry,
    timeout: Duration,
}

impl<'a> HookChain<'a> {
    pub fn new(registry: &'a HookRegistry) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(DEFAULT_HOOK_TIMEOUT_SECS),
        }
    }

    /// Limit for each external process a hook starts
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `specs` over `path`
    ///
    /// Outside dry-run mode the file must exist. In dry-run mode hooks only
    /// compute their outcomes.
    pub async fn apply(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        specs: &[HookSpec],
        dry: bool,
    ) -> Result<ChainResult> {
        if !dry && !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let ctx = HookContext {
            bucket: bucket.to_string(),
            key: key.to_string(),
            path: path.to_path_buf(),
            timeout: self.timeout,
        };
        let path_str = path.to_string_lossy();
        let mut records = Vec::with_capacity(specs.len());

        for spec in specs {
            let Some(factory) = self.registry.resolve(&spec.name) else {
                tracing::warn!(hook = %spec.name, "Hook is not registered, skipping");
                continue;
            };
            let hook = factory(&spec.options)?;

            if let Some(filter) = hook.filter()
                && filter.should_skip(&path_str)
            {
                tracing::debug!(
                    hook = %spec.name,
                    filter = %filter.pattern(),
                    path = %path_str,
                    "Filter skipped hook"
                );
                records.push(HookRecord {
                    hook: spec.name.clone(),
                    key: key.to_string(),
                    path: Some(path.to_path_buf()),
                    applied: false,
                });
                continue;
            }

            let outcome = if dry {
                hook.dry_run(&ctx)?
            } else {
                hook.call(&ctx).await?
            };
            tracing::debug!(
                hook = %spec.name,
                key = %outcome.key,
                modified = outcome.modified,
                dry,
                "Applied hook"
            );

            records.push(HookRecord {
                hook: spec.name.clone(),
                key: outcome.key,
                path: outcome.path,
                applied: true,
            });

            if outcome.modified {
                return Ok(ChainResult {
                    original_path: path.to_path_buf(),
                    modified: true,
                    hooks: records,
                });
            }
        }

        Ok(ChainResult {
            original_path: path.to_path_buf(),
            modified: false,
            hooks: records,
        })
    }
}
