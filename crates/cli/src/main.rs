//! s3u - upload and download S3 objects through transform hooks

mod commands;
mod exit_code;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use commands::alias::AliasCommands;
use commands::get::GetArgs;
use commands::hooks::HooksArgs;
use commands::put::PutArgs;
use exit_code::ExitCode;
use output::OutputConfig;

/// Upload and download S3 objects through a chain of transform hooks
#[derive(Parser, Debug)]
#[command(name = "s3u", version, about, propagate_version = true)]
struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Suppress status lines and progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage storage service aliases
    #[command(subcommand)]
    Alias(AliasCommands),

    /// Download an object and run post-hooks on it
    Get(GetArgs),

    /// Run pre-hooks on a local file and upload the results
    Put(PutArgs),

    /// List the available hooks
    Hooks(HooksArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Commands::Alias(cmd) => commands::alias::execute(cmd, output_config).await,
        Commands::Get(args) => commands::get::execute(args, output_config).await,
        Commands::Put(args) => commands::put::execute(args, output_config).await,
        Commands::Hooks(args) => commands::hooks::execute(args, output_config).await,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "s3u", &mut std::io::stdout());
            ExitCode::Success
        }
    };

    code.into()
}
