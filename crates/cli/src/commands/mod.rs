//! Command implementations

pub mod alias;
pub mod get;
pub mod hooks;
pub mod put;

use comfy_table::{Table, presets};
use serde::Serialize;
use s3u_core::{
    ConfigManager, Error, FileTransfer, HookRecord, Result, TransferMethod, TransferReport,
    TransferSettings,
};
use s3u_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// A connected store and the transfer settings it should run with
pub(crate) struct Session {
    pub client: S3Client,
    pub settings: TransferSettings,
}

/// Load the config file and connect to `alias`
pub(crate) async fn open_session(alias: &str) -> Result<Session> {
    let config = ConfigManager::new()?.load()?;
    let alias = config
        .aliases
        .into_iter()
        .find(|a| a.name == alias)
        .ok_or_else(|| Error::AliasNotFound(alias.to_string()))?;
    tracing::debug!(alias = %alias.name, endpoint = %alias.endpoint, "Opening session");
    let client = S3Client::new(alias).await?;
    Ok(Session {
        client,
        settings: config.transfer,
    })
}

/// Print `error` and return its exit code
pub(crate) fn report_error(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from_error(error)
}

/// JSON output for get and put
#[derive(Serialize)]
struct TransferOutput<'a> {
    operation: &'static str,
    bucket: &'a str,
    dry_run: bool,
    modified: bool,
    transfers: &'a [FileTransfer],
    hooks: &'a [HookRecord],
    elapsed_ms: u64,
    completed_at: jiff::Timestamp,
}

fn method_label(method: TransferMethod, dry_run: bool) -> &'static str {
    match (method, dry_run) {
        (TransferMethod::Direct, false) => "direct",
        (TransferMethod::Multipart, false) => "multipart",
        (TransferMethod::Skipped, _) => "skipped (exists)",
        (TransferMethod::Direct, true) => "direct (planned)",
        (TransferMethod::Multipart, true) => "multipart (planned)",
    }
}

fn hook_label(record: &HookRecord) -> String {
    if record.applied {
        record.key.clone()
    } else {
        format!("{} (filtered)", record.key)
    }
}

/// Print a transfer report as JSON or as a summary table
pub(crate) fn print_report(
    formatter: &Formatter,
    operation: &'static str,
    report: &TransferReport,
    elapsed: std::time::Duration,
) {
    if formatter.is_json() {
        formatter.json(&TransferOutput {
            operation,
            bucket: &report.bucket,
            dry_run: report.dry_run,
            modified: report.chain.modified,
            transfers: &report.transfers,
            hooks: &report.chain.hooks,
            elapsed_ms: elapsed.as_millis() as u64,
            completed_at: jiff::Timestamp::now(),
        });
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_header(vec!["Key", "Local path", "Size", "Method"]);
    for transfer in &report.transfers {
        table.add_row(vec![
            formatter.style_key(&transfer.key),
            formatter.style_path(&transfer.local_path.display().to_string()),
            formatter.style_size(&humansize::format_size(transfer.size_bytes, humansize::BINARY)),
            formatter.style_detail(method_label(transfer.method, report.dry_run)),
        ]);
    }
    formatter.println(&table.to_string());

    for record in &report.chain.hooks {
        formatter.println(&format!(
            "  hook {} -> {}",
            formatter.style_name(&record.hook),
            hook_label(record)
        ));
    }

    let count = report
        .transfers
        .iter()
        .filter(|t| t.method != TransferMethod::Skipped)
        .count();
    if report.dry_run {
        formatter.success(&format!(
            "Dry run: {count} file(s) would be uploaded to '{}'",
            formatter.style_name(&report.bucket)
        ));
    } else {
        let verb = if operation == "get" { "Downloaded" } else { "Uploaded" };
        formatter.success(&format!(
            "{verb} {count} file(s) in {:.1}s",
            elapsed.as_secs_f64()
        ));
    }
}
