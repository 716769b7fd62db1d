//! Decompression hook
//!
//! Unlike compression, the decompressor can be deduced from the file
//! extension. An explicit `command` option overrides the deduction.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::command::run_transform;
use super::{FilterRule, Hook, HookContext, HookOptions, HookOutcome, build_filter, parse_options};
use crate::error::{Error, Result};

/// Extension to decompressor table used when no command is given
pub const DECOMPRESSORS: &[(&str, &str)] = &[(".gz", "gunzip"), (".bz2", "bunzip2")];

/// Look up the decompressor for a path's extension
pub fn deduce_decompressor(path: &Path) -> Option<&'static str> {
    let ext = extension_of(path)?;
    DECOMPRESSORS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, command)| *command)
}

/// Last extension with its leading dot
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DecompressionOptions {
    keep: bool,
    command: Option<String>,
    filter: Option<String>,
}

/// Decompresses the working file, producing the path without its extension
#[derive(Debug, Clone, Default)]
pub struct DecompressionHook {
    command: Option<String>,
    keep: bool,
    filter: Option<FilterRule>,
}

impl DecompressionHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(name: &str, options: &HookOptions) -> Result<Self> {
        let opts: DecompressionOptions = parse_options(name, options)?;
        Ok(Self {
            command: opts.command,
            keep: opts.keep,
            filter: build_filter(opts.filter.as_deref())?,
        })
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Keep the compressed original
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_filter(mut self, filter: FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Decompressor command plus the extension it strips
    fn resolve(&self, path: &Path) -> Result<(String, String)> {
        let extension = extension_of(path);
        let command = match &self.command {
            Some(command) => command.clone(),
            None => deduce_decompressor(path).map(str::to_string).ok_or_else(|| {
                Error::UnsupportedFeature(format!(
                    "cannot deduce the decompressor for file type '{}'",
                    extension.as_deref().unwrap_or_default()
                ))
            })?,
        };
        let extension = extension.ok_or_else(|| {
            Error::UnsupportedFeature(format!(
                "cannot derive a decompressed name for '{}' without an extension",
                path.display()
            ))
        })?;
        Ok((command, extension))
    }
}

#[async_trait]
impl Hook for DecompressionHook {
    fn filter(&self) -> Option<&FilterRule> {
        self.filter.as_ref()
    }

    fn dry_run(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let (_, extension) = self.resolve(&ctx.path)?;
        let key = ctx.key.strip_suffix(&extension).unwrap_or(&ctx.key);
        Ok(HookOutcome {
            key: key.to_string(),
            path: Some(ctx.path.with_extension("")),
            modified: !self.keep,
        })
    }

    async fn call(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let (command, _) = self.resolve(&ctx.path)?;
        let outcome = self.dry_run(ctx)?;
        let target: PathBuf = ctx.path.with_extension("");

        let mut args = vec![OsString::from("-f")];
        if self.keep {
            args.push(OsString::from("-k"));
        }
        args.push(ctx.path.clone().into_os_string());

        run_transform(&command, &args, &target, ctx.timeout).await?;

        tracing::info!(
            source = %ctx.path.display(),
            target = %target.display(),
            command = %command,
            "Decompressed file"
        );
        Ok(outcome)
    }
}
