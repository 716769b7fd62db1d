//! External transform process execution

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Run `command args...` expecting it to produce `target`
///
/// The process is killed once `timeout` elapses. On any failure, `target` is
/// removed if it did not exist before the call.
pub async fn run_transform(
    command: &str,
    args: &[OsString],
    target: &Path,
    timeout: Duration,
) -> Result<()> {
    let target_existed = target.exists();

    tracing::debug!(command, ?args, target = %target.display(), "Running transform");

    let child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let failure = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) if output.status.success() => return Ok(()),
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                format!("'{command}' exited with {}", output.status)
            } else {
                format!("'{command}' exited with {}: {stderr}", output.status)
            }
        }
        Ok(Err(e)) => format!("failed to run '{command}': {e}"),
        Err(_) => format!("'{command}' timed out after {}s", timeout.as_secs()),
    };

    if !target_existed && target.exists() {
        match tokio::fs::remove_file(target).await {
            Ok(()) => tracing::debug!(target = %target.display(), "Removed partial output"),
            Err(e) => tracing::warn!(
                target = %target.display(),
                error = %e,
                "Failed to remove partial output"
            ),
        }
    }

    Err(Error::Command(failure))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_success() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        run_transform("true", &[], &target, Duration::from_secs(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let err = run_transform("false", &[], &target, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command(_)));
    }

    #[tokio::test]
    async fn test_missing_command_is_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let err = run_transform(
            "s3u-definitely-not-a-command",
            &[],
            &target,
            Duration::from_secs(10),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }

    #[tokio::test]
    async fn test_partial_output_removed_on_failure() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("partial.gz");
        let script = format!("echo partial > '{}'; exit 3", target.display());
        let args = vec![OsString::from("-c"), OsString::from(script)];

        let err = run_transform("sh", &args, &target, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Command(_)));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_existing_target_kept_on_failure() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("previous.gz");
        std::fs::write(&target, b"old").unwrap();

        run_transform("false", &[], &target, Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(target.exists());
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        let args = vec![OsString::from("5")];
        let err = run_transform("sleep", &args, &target, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
