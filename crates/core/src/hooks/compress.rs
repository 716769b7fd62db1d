//! Compression hooks
//!
//! One hook type covers every compressor that follows the
//! `<command> -f [-k] <file>` convention and writes `<file><extension>`.
//! `gzip` and `bzip2` are presets; `compress` takes both from its options.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::command::run_transform;
use super::{FilterRule, Hook, HookContext, HookOptions, HookOutcome, build_filter, parse_options};
use crate::error::{Error, Result};

/// External compressor and the extension it appends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codec {
    pub command: String,
    /// Extension including the leading dot, e.g. `.gz`
    pub extension: String,
}

impl Codec {
    pub fn new(command: impl Into<String>, extension: impl AsRef<str>) -> Self {
        let extension = extension.as_ref();
        let extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };
        Self {
            command: command.into(),
            extension,
        }
    }

    pub fn gzip() -> Self {
        Self::new("gzip", ".gz")
    }

    pub fn bzip2() -> Self {
        Self::new("bzip2", ".bz2")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompressionOptions {
    keep: bool,
    overwrite: bool,
    filter: Option<String>,
    command: Option<String>,
    extension: Option<String>,
}

/// Compresses the working file, producing `<path><extension>`
#[derive(Debug, Clone)]
pub struct CompressionHook {
    codec: Codec,
    keep: bool,
    overwrite: bool,
    filter: Option<FilterRule>,
}

impl CompressionHook {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            keep: false,
            overwrite: false,
            filter: None,
        }
    }

    /// Build from hook options
    ///
    /// `command` and `extension` override the preset; without a preset both
    /// are required.
    pub fn from_options(name: &str, preset: Option<Codec>, options: &HookOptions) -> Result<Self> {
        let opts: CompressionOptions = parse_options(name, options)?;

        let codec = match (preset, opts.command, opts.extension) {
            (_, Some(command), Some(extension)) => Codec::new(command, extension),
            (Some(preset), command, extension) => Codec::new(
                command.unwrap_or(preset.command),
                extension.unwrap_or(preset.extension),
            ),
            (None, _, _) => {
                return Err(Error::Config(format!(
                    "hook '{name}' requires both 'command' and 'extension' options"
                )));
            }
        };

        Ok(Self {
            codec,
            keep: opts.keep,
            overwrite: opts.overwrite,
            filter: build_filter(opts.filter.as_deref())?,
        })
    }

    /// Keep the uncompressed original
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    /// Re-run the compressor even if the target already exists
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_filter(mut self, filter: FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    fn target_path(&self, path: &Path) -> PathBuf {
        let mut target = OsString::from(path.as_os_str());
        target.push(&self.codec.extension);
        PathBuf::from(target)
    }
}

#[async_trait]
impl Hook for CompressionHook {
    fn filter(&self) -> Option<&FilterRule> {
        self.filter.as_ref()
    }

    fn dry_run(&self, ctx: &HookContext) -> Result<HookOutcome> {
        Ok(HookOutcome {
            key: format!("{}{}", ctx.key, self.codec.extension),
            path: Some(self.target_path(&ctx.path)),
            modified: !self.keep,
        })
    }

    async fn call(&self, ctx: &HookContext) -> Result<HookOutcome> {
        let outcome = self.dry_run(ctx)?;
        let target = self.target_path(&ctx.path);

        if target.exists() && !self.overwrite {
            tracing::info!(
                target = %target.display(),
                "Compressed file already exists, not recompressing"
            );
            return Ok(outcome);
        }

        let mut args = vec![OsString::from("-f")];
        if self.keep {
            args.push(OsString::from("-k"));
        }
        args.push(ctx.path.clone().into_os_string());

        run_transform(&self.codec.command, &args, &target, ctx.timeout).await?;

        tracing::info!(
            source = %ctx.path.display(),
            target = %target.display(),
            command = %self.codec.command,
            "Compressed file"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn ctx(path: impl Into<PathBuf>) -> HookContext {
        HookContext {
            bucket: "b".to_string(),
            key: "obj".to_string(),
            path: path.into(),
            timeout: Duration::from_secs(30),
        }
    }

    fn options(value: serde_json::Value) -> HookOptions {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_gzip_dry_run() {
        let hook = CompressionHook::new(Codec::gzip());
        let outcome = hook.dry_run(&ctx("/tmp/obj")).unwrap();
        assert_eq!(
            outcome,
            HookOutcome {
                key: "obj.gz".to_string(),
                path: Some(PathBuf::from("/tmp/obj.gz")),
                modified: true,
            }
        );

        let outcome = hook.keep(true).dry_run(&ctx("/tmp/obj")).unwrap();
        assert!(!outcome.modified);
    }

    #[test]
    fn test_bzip2_dry_run() {
        let hook = CompressionHook::new(Codec::bzip2());
        let outcome = hook.dry_run(&ctx("/tmp/obj")).unwrap();
        assert_eq!(outcome.key, "obj.bz2");
        assert_eq!(outcome.path, Some(PathBuf::from("/tmp/obj.bz2")));
    }

    #[test]
    fn test_codec_extension_normalized() {
        assert_eq!(Codec::new("zstd", "zst").extension, ".zst");
        assert_eq!(Codec::new("zstd", ".zst").extension, ".zst");
    }

    #[test]
    fn test_from_options_preset() {
        let hook = CompressionHook::from_options(
            "gzip",
            Some(Codec::gzip()),
            &options(json!({"keep": true, "filter": "*.log"})),
        )
        .unwrap();
        assert_eq!(hook.codec(), &Codec::gzip());
        assert!(hook.keep);
        assert!(hook.filter().is_some());
    }

    #[test]
    fn test_from_options_command_override() {
        let hook = CompressionHook::from_options(
            "gzip",
            Some(Codec::gzip()),
            &options(json!({"command": "pigz"})),
        )
        .unwrap();
        assert_eq!(hook.codec(), &Codec::new("pigz", ".gz"));
    }

    #[test]
    fn test_generic_requires_codec() {
        let err = CompressionHook::from_options("compress", None, &HookOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let hook = CompressionHook::from_options(
            "compress",
            None,
            &options(json!({"command": "xz", "extension": "xz"})),
        )
        .unwrap();
        assert_eq!(hook.codec(), &Codec::new("xz", ".xz"));
    }

    #[test]
    fn test_invalid_options() {
        let err = CompressionHook::from_options(
            "gzip",
            Some(Codec::gzip()),
            &options(json!({"keep": "yes please"})),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_target_skips_compressor() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("obj");
        std::fs::write(&source, b"data").unwrap();
        std::fs::write(dir.path().join("obj.gz"), b"already").unwrap();

        // `false` would fail if it were invoked
        let hook = CompressionHook::new(Codec::new("false", ".gz"));
        let outcome = hook.call(&ctx(&source)).await.unwrap();
        assert_eq!(outcome, hook.dry_run(&ctx(&source)).unwrap());
        assert!(source.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overwrite_runs_compressor() {
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("obj");
        std::fs::write(&source, b"data").unwrap();
        std::fs::write(dir.path().join("obj.gz"), b"already").unwrap();

        let hook = CompressionHook::new(Codec::new("false", ".gz")).overwrite(true);
        let err = hook.call(&ctx(&source)).await.unwrap_err();
        assert!(matches!(err, Error::Command(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_gzip_round_trip_when_available() {
        if std::process::Command::new("gzip").arg("--version").output().is_err() {
            return;
        }
        let dir = tempfile::TempDir::new().unwrap();
        let source = dir.path().join("obj");
        std::fs::write(&source, b"hello hooks").unwrap();

        let hook = CompressionHook::new(Codec::gzip()).keep(true);
        let outcome = hook.call(&ctx(&source)).await.unwrap();
        assert!(!outcome.modified);
        assert!(source.exists());
        assert!(dir.path().join("obj.gz").exists());

        let hook = CompressionHook::new(Codec::gzip()).overwrite(true);
        let outcome = hook.call(&ctx(&source)).await.unwrap();
        assert!(outcome.modified);
        assert!(!source.exists());
    }
}
