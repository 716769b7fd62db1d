//! hooks command - List the registered transform hooks

use clap::Args;
use serde::Serialize;
use s3u_core::HookRegistry;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List the hooks available to --hook
#[derive(Args, Debug)]
pub struct HooksArgs {}

#[derive(Serialize)]
struct HooksOutput<'a> {
    hooks: Vec<HookInfo<'a>>,
}

#[derive(Serialize)]
struct HookInfo<'a> {
    name: &'a str,
    description: &'static str,
}

fn describe(name: &str) -> &'static str {
    match name {
        "gzip" => "compress with gzip, producing <key>.gz",
        "bzip2" => "compress with bzip2, producing <key>.bz2",
        "compress" => "compress with the 'command' option, appending the 'extension' option",
        "decompress" => "decompress .gz/.bz2 (or with the 'command' option), stripping the extension",
        _ => "",
    }
}

/// Execute the hooks command
pub async fn execute(_args: HooksArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let registry = HookRegistry::global();
    let hooks: Vec<HookInfo> = registry
        .names()
        .into_iter()
        .map(|name| HookInfo {
            name,
            description: describe(name),
        })
        .collect();

    if formatter.is_json() {
        formatter.json(&HooksOutput { hooks });
    } else {
        for hook in &hooks {
            let styled = formatter.style_name(&format!("{:<12}", hook.name));
            formatter.println(&format!("{styled} {}", hook.description));
        }
        formatter.println("");
        formatter.println("Options: keep, overwrite, filter (glob, ~glob, /regex/ or ~/regex/)");
    }
    ExitCode::Success
}
