//! put command - Run pre-hooks on a local file and upload the results

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use s3u_core::{
    HookRegistry, HookSpec, OverwritePolicy, Transfer, TransferRequest, parse_remote_path,
};

use super::{open_session, print_report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local file after running pre-hooks on it
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination (alias/bucket/key); a key ending in '/' gets the file name appended
    pub target: String,

    /// Pre-hook to run before uploading, repeatable (name[:key=value,...])
    #[arg(long = "hook", value_name = "HOOK")]
    pub hooks: Vec<HookSpec>,

    /// What to do when the object exists: skip or replace
    #[arg(long, value_name = "POLICY")]
    pub overwrite: Option<OverwritePolicy>,

    /// Show what would be uploaded without running hook commands or uploading
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Execute the put command
pub async fn execute(args: PutArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    if args.source.is_dir() {
        formatter.error(&format!(
            "'{}' is a directory; put uploads a single file",
            args.source.display()
        ));
        return ExitCode::UsageError;
    }

    let remote = match parse_remote_path(&args.target).and_then(|p| p.join_file_name(&args.source))
    {
        Ok(p) => p,
        Err(e) => return report_error(&formatter, &e),
    };

    let session = match open_session(&remote.alias).await {
        Ok(s) => s,
        Err(e) => return report_error(&formatter, &e),
    };

    let request = TransferRequest::new(remote, &args.source)
        .overwrite(args.overwrite.unwrap_or(session.settings.overwrite))
        .hooks(args.hooks);
    let progress = output_config.progress();
    let transfer = Transfer::new(&session.client, HookRegistry::global(), session.settings.clone())
        .with_monitor(&progress);

    let started = Instant::now();
    let result = if args.dry_run {
        transfer.plan_put(&request).await
    } else {
        transfer.put(&request).await
    };

    match result {
        Ok(report) => {
            print_report(&formatter, "put", &report, started.elapsed());
            ExitCode::Success
        }
        Err(e) => report_error(&formatter, &e),
    }
}
