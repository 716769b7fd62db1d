//! get command - Download an object and run post-hooks on it

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use s3u_core::{
    Error, HookRegistry, HookSpec, OverwritePolicy, RemotePath, Result, Transfer,
    TransferRequest, parse_remote_path,
};

use super::{open_session, print_report, report_error};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Download an object and run post-hooks on it
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Source object (alias/bucket/key)
    pub source: String,

    /// Local file or directory (default: the object name in the current directory)
    pub destination: Option<PathBuf>,

    /// Post-hook to run on the downloaded file, repeatable (name[:key=value,...])
    #[arg(long = "hook", value_name = "HOOK")]
    pub hooks: Vec<HookSpec>,

    /// What to do when the local file exists: skip or replace
    #[arg(long, value_name = "POLICY")]
    pub overwrite: Option<OverwritePolicy>,
}

/// Execute the get command
pub async fn execute(args: GetArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let remote = match parse_remote_path(&args.source) {
        Ok(p) => p,
        Err(e) => return report_error(&formatter, &e),
    };
    if remote.is_prefix() {
        formatter.error("Source must name an object, not a prefix");
        return ExitCode::UsageError;
    }

    let local = match resolve_destination(&remote, args.destination.as_deref()) {
        Ok(p) => p,
        Err(e) => return report_error(&formatter, &e),
    };

    let session = match open_session(&remote.alias).await {
        Ok(s) => s,
        Err(e) => return report_error(&formatter, &e),
    };

    let request = TransferRequest::new(remote, local)
        .overwrite(args.overwrite.unwrap_or(session.settings.overwrite))
        .hooks(args.hooks);
    let progress = output_config.progress();
    let transfer = Transfer::new(&session.client, HookRegistry::global(), session.settings.clone())
        .with_monitor(&progress);

    let started = Instant::now();
    match transfer.get(&request).await {
        Ok(report) => {
            print_report(&formatter, "get", &report, started.elapsed());
            ExitCode::Success
        }
        Err(e) => report_error(&formatter, &e),
    }
}

/// Local path for a download: an existing directory gets the object name appended
fn resolve_destination(remote: &RemotePath, destination: Option<&Path>) -> Result<PathBuf> {
    let name = remote.base_name().ok_or_else(|| {
        Error::InvalidPath(format!("cannot derive a file name from '{remote}'"))
    })?;
    Ok(match destination {
        None => PathBuf::from(name),
        Some(dir) if dir.is_dir() => dir.join(name),
        Some(path) => path.to_path_buf(),
    })
}
