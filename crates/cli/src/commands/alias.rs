//! alias command - Manage named S3 endpoints
//!
//! `get` and `put` address objects as `alias/bucket/key`. The alias supplies
//! the endpoint, credentials, region and retry budget for the session.

use clap::Subcommand;
use s3u_core::{Alias, AliasManager, Result, RetryConfig};
use serde::Serialize;

use super::report_error;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Add or replace an alias
    Set(SetArgs),

    /// List configured aliases
    List,

    /// Remove an alias
    Remove {
        /// Alias to remove
        name: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Alias name used as the first path segment, e.g. "local"
    pub name: String,

    /// Endpoint URL, e.g. `http://localhost:9000`
    pub endpoint: String,

    pub access_key: String,

    pub secret_key: String,

    #[arg(long, default_value = "us-east-1")]
    pub region: String,

    /// Bucket addressing style
    #[arg(long, default_value = "auto", value_parser = ["auto", "path", "dns"])]
    pub bucket_lookup: String,

    /// Recorded in the config; certificate checks stay enabled
    #[arg(long)]
    pub insecure: bool,

    /// Attempts for bucket and object existence checks
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,
}

impl SetArgs {
    fn into_alias(self) -> Alias {
        let mut alias = Alias::new(self.name, self.endpoint, self.access_key, self.secret_key);
        alias.region = self.region;
        alias.bucket_lookup = self.bucket_lookup;
        alias.insecure = self.insecure;
        alias.retry = self.max_attempts.map(|max_attempts| RetryConfig {
            max_attempts,
            ..RetryConfig::default()
        });
        alias
    }
}

/// JSON shape of an alias; credentials are never printed
#[derive(Serialize)]
struct AliasInfo<'a> {
    name: &'a str,
    endpoint: &'a str,
    region: &'a str,
    bucket_lookup: &'a str,
}

impl<'a> From<&'a Alias> for AliasInfo<'a> {
    fn from(alias: &'a Alias) -> Self {
        Self {
            name: &alias.name,
            endpoint: &alias.endpoint,
            region: &alias.region,
            bucket_lookup: &alias.bucket_lookup,
        }
    }
}

#[derive(Serialize)]
struct AliasListOutput<'a> {
    aliases: Vec<AliasInfo<'a>>,
}

#[derive(Serialize)]
struct AliasChangeOutput<'a> {
    success: bool,
    alias: &'a str,
    message: String,
}

/// Execute an alias subcommand
pub async fn execute(cmd: AliasCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);
    let result = AliasManager::new().and_then(|manager| match cmd {
        AliasCommands::Set(args) => set(&manager, args, &formatter),
        AliasCommands::List => list(&manager, &formatter),
        AliasCommands::Remove { name } => remove(&manager, &name, &formatter),
    });
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => report_error(&formatter, &e),
    }
}

fn set(manager: &AliasManager, args: SetArgs, formatter: &Formatter) -> Result<()> {
    let alias = args.into_alias();
    let name = alias.name.clone();
    manager.set(alias)?;
    tracing::debug!(alias = %name, "Saved alias");
    confirm(formatter, &name, "configured")
}

fn list(manager: &AliasManager, formatter: &Formatter) -> Result<()> {
    let aliases = manager.list()?;
    if formatter.is_json() {
        formatter.json(&AliasListOutput {
            aliases: aliases.iter().map(AliasInfo::from).collect(),
        });
    } else if aliases.is_empty() {
        formatter.println("No aliases configured.");
    } else {
        for alias in &aliases {
            formatter.println(&format!(
                "{} {} {}",
                formatter.style_name(&format!("{:<12}", alias.name)),
                formatter.style_endpoint(&alias.endpoint),
                formatter.style_detail(&format!(
                    "(region: {}, lookup: {})",
                    alias.region, alias.bucket_lookup
                )),
            ));
        }
    }
    Ok(())
}

fn remove(manager: &AliasManager, name: &str, formatter: &Formatter) -> Result<()> {
    manager.remove(name)?;
    confirm(formatter, name, "removed")
}

fn confirm(formatter: &Formatter, name: &str, action: &str) -> Result<()> {
    if formatter.is_json() {
        formatter.json(&AliasChangeOutput {
            success: true,
            alias: name,
            message: format!("Alias '{name}' {action} successfully"),
        });
    } else {
        formatter.success(&format!(
            "Alias '{}' {action} successfully.",
            formatter.style_name(name)
        ));
    }
    Ok(())
}
