//! Filename filters gating hook execution
//!
//! Two pattern forms are accepted:
//! - regex: `/body/`, or `~/body/` to invert
//! - wildcard: `*.log`, or `~*.log` to invert. `*` matches any sequence and
//!   `.` is literal; other characters are passed to the regex engine as-is.
//!
//! Patterns are anchored at the start of the path only, so `*.log` also
//! matches `/var/log/access.log.1`.

use regex::Regex;

use crate::error::{Error, Result};

/// Compiled filter deciding whether a hook is skipped for a path
#[derive(Debug, Clone)]
pub struct FilterRule {
    pattern: String,
    matcher: Regex,
    invert: bool,
}

impl FilterRule {
    pub fn build(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(Error::Config("filter pattern cannot be empty".to_string()));
        }

        let (invert, body) = match split_regex(trimmed) {
            Some((invert, body)) => (invert, body.to_string()),
            None => {
                let (invert, wildcard) = match trimmed.strip_prefix('~') {
                    Some(rest) => (true, rest),
                    None => (false, trimmed),
                };
                (invert, wildcard.replace('.', "\\.").replace('*', ".*"))
            }
        };

        let matcher = Regex::new(&format!("^(?:{body})"))
            .map_err(|e| Error::Config(format!("invalid filter '{pattern}': {e}")))?;

        Ok(Self {
            pattern: trimmed.to_string(),
            matcher,
            invert,
        })
    }

    /// Raw pattern match, before inversion
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Whether a hook carrying this filter should be skipped for `path`
    ///
    /// A plain filter skips paths it does not match. An inverted filter
    /// skips paths it does match.
    pub fn should_skip(&self, path: &str) -> bool {
        let matched = self.is_match(path);
        if self.invert { matched } else { !matched }
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// `^(~?)/(.+)/$` without a regex
fn split_regex(pattern: &str) -> Option<(bool, &str)> {
    let (invert, rest) = match pattern.strip_prefix('~') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let body = rest.strip_prefix('/')?.strip_suffix('/')?;
    if body.is_empty() {
        return None;
    }
    Some((invert, body))
}
