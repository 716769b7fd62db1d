//! Retries for the store's existence checks
//!
//! `HeadBucket` and `HeadObject` are idempotent, so a throttled or dropped
//! request is sent again after an exponential backoff. Object bodies are
//! never retried here; a failed part aborts its multipart session instead.

use std::future::Future;
use std::time::{Duration, SystemTime};

use crate::alias::RetryConfig;
use crate::error::{Error, Result};

/// Delays between attempts of one check
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            config: config.clone(),
            attempt: 1,
        }
    }

    /// Attempts made so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next attempt, `None` once `max_attempts` is used up
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        let shift = (self.attempt - 1).min(10);
        let base = self
            .config
            .initial_backoff_ms
            .saturating_mul(1 << shift)
            .min(self.config.max_backoff_ms);
        self.attempt += 1;
        Some(Duration::from_millis(base + jitter(base)))
    }
}

/// Up to `max` extra milliseconds so parallel clients do not retry in step
fn jitter(max: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// HTTP status the S3 adapter appends to network errors, e.g. `(HTTP 503)`
fn http_status(message: &str) -> Option<u16> {
    let start = message.rfind("(HTTP ")? + "(HTTP ".len();
    let end = message[start..].find(')')? + start;
    message[start..end].parse().ok()
}

/// Whether a failed existence check may succeed if sent again
///
/// Connection-level failures carry no status and are retried, as are
/// throttling (429) and server-side (5xx) responses. Auth and not-found
/// answers are final.
pub fn is_transient(error: &Error) -> bool {
    match error {
        Error::Network(msg) => match http_status(msg) {
            Some(status) => status == 429 || status >= 500,
            None => true,
        },
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        _ => false,
    }
}

/// Run an existence check, retrying transient failures
pub async fn retry_check<F, Fut>(config: &RetryConfig, what: &str, mut check: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut backoff = Backoff::new(config);
    loop {
        let error = match check().await {
            Ok(found) => return Ok(found),
            Err(e) if is_transient(&e) => e,
            Err(e) => return Err(e),
        };
        let Some(delay) = backoff.next_delay() else {
            tracing::warn!(check = what, attempts = backoff.attempt(), error = %error, "Giving up");
            return Err(error);
        };
        tracing::debug!(
            check = what,
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying existence check"
        );
        tokio::time::sleep(delay).await;
    }
}
