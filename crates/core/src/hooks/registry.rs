//! Hook registry
//!
//! Maps stable hook names to factories. The registry is built once and is
//! read-only afterwards, so a single instance can be shared by every chain in
//! the process. Unknown names resolve to `None`; the chain skips them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{Codec, CompressionHook, DecompressionHook, Hook, HookOptions};
use crate::error::Result;

/// Builds a hook instance from its options
pub type HookFactory = Arc<dyn Fn(&HookOptions) -> Result<Box<dyn Hook>> + Send + Sync>;

/// Name to factory table
#[derive(Clone, Default)]
pub struct HookRegistry {
    factories: HashMap<String, HookFactory>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

impl HookRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `gzip`, `bzip2`, `compress` and `decompress`
    pub fn with_builtin_hooks() -> Self {
        let mut registry = Self::new();
        registry.register("gzip", |options| {
            let hook = CompressionHook::from_options("gzip", Some(Codec::gzip()), options)?;
            Ok(Box::new(hook) as Box<dyn Hook>)
        });
        registry.register("bzip2", |options| {
            let hook = CompressionHook::from_options("bzip2", Some(Codec::bzip2()), options)?;
            Ok(Box::new(hook) as Box<dyn Hook>)
        });
        registry.register("compress", |options| {
            let hook = CompressionHook::from_options("compress", None, options)?;
            Ok(Box::new(hook) as Box<dyn Hook>)
        });
        registry.register("decompress", |options| {
            let hook = DecompressionHook::from_options("decompress", options)?;
            Ok(Box::new(hook) as Box<dyn Hook>)
        });
        registry
    }

    /// Process-wide registry with the built-in hooks
    pub fn global() -> &'static HookRegistry {
        static REGISTRY: OnceLock<HookRegistry> = OnceLock::new();
        REGISTRY.get_or_init(HookRegistry::with_builtin_hooks)
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&HookOptions) -> Result<Box<dyn Hook>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn resolve(&self, name: &str) -> Option<&HookFactory> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
