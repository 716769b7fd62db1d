//! Transform hooks
//!
//! A hook transforms the working file before upload (pre-hooks) or after
//! download (post-hooks), e.g. compressing or decompressing it. Hooks are
//! declared as an ordered list of [`HookSpec`]s, resolved through a
//! [`HookRegistry`] and executed by a [`HookChain`].
//!
//! Every hook implements both a real invocation and a side-effect free dry
//! run. For deterministic hooks the two agree on the returned
//! [`HookOutcome`].

pub mod chain;
pub mod command;
pub mod compress;
pub mod decompress;
pub mod filter;
pub mod registry;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub use chain::{ChainResult, HookChain, HookRecord};
pub use compress::{Codec, CompressionHook};
pub use decompress::DecompressionHook;
pub use filter::FilterRule;
pub use registry::{HookFactory, HookRegistry};

/// Free-form hook options (`keep`, `overwrite`, `command`, `filter`, ...)
pub type HookOptions = serde_json::Map<String, Value>;

/// A hook as declared by the caller: a registered name plus its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookSpec {
    pub name: String,
    #[serde(default)]
    pub options: HookOptions,
}

impl HookSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: HookOptions::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Parses `name`, `name:key=value,key=value` or `name:{"key": value}`
///
/// In the `key=value` form, `true`/`false` become booleans and integers
/// become numbers; everything else stays a string.
impl FromStr for HookSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.split_once(':') {
            Some((name, rest)) => (name.trim(), Some(rest.trim())),
            None => (s, None),
        };
        if name.is_empty() {
            return Err(Error::Config(format!("missing hook name in '{s}'")));
        }

        let mut spec = HookSpec::new(name);
        let Some(rest) = rest.filter(|r| !r.is_empty()) else {
            return Ok(spec);
        };

        if rest.starts_with('{') {
            spec.options = serde_json::from_str(rest)
                .map_err(|e| Error::Config(format!("invalid options for hook '{name}': {e}")))?;
            return Ok(spec);
        }

        for pair in rest.split(',') {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::Config(format!("expected key=value in options for hook '{name}', got '{pair}'"))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config(format!("empty option key for hook '{name}'")));
            }
            spec.options.insert(key.to_string(), option_value(value.trim()));
        }
        Ok(spec)
    }
}

fn option_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

/// Deserialize a hook's options into its typed option struct
pub(crate) fn parse_options<T: DeserializeOwned>(hook: &str, options: &HookOptions) -> Result<T> {
    serde_json::from_value(Value::Object(options.clone()))
        .map_err(|e| Error::Config(format!("invalid options for hook '{hook}': {e}")))
}

/// The object and working file a hook operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookContext {
    pub bucket: String,
    pub key: String,
    pub path: PathBuf,
    /// Upper bound for any external process the hook runs
    pub timeout: Duration,
}

/// What a hook produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookOutcome {
    /// Object key for the produced file
    pub key: String,
    /// Produced file, if any
    pub path: Option<PathBuf>,
    /// The working file was altered or removed; later hooks must not run
    pub modified: bool,
}

/// A transform applied to the working file
#[async_trait]
pub trait Hook: Send + Sync {
    /// Filter gating this hook; `None` applies it to every path
    fn filter(&self) -> Option<&FilterRule> {
        None
    }

    /// Compute the outcome without touching the filesystem
    fn dry_run(&self, ctx: &HookContext) -> Result<HookOutcome>;

    /// Perform the transform
    async fn call(&self, ctx: &HookContext) -> Result<HookOutcome>;
}

/// Build the optional filter shared by all built-in hooks
pub(crate) fn build_filter(pattern: Option<&str>) -> Result<Option<FilterRule>> {
    pattern.map(FilterRule::build).transpose()
}
