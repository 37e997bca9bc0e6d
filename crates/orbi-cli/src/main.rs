#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use orbi_core::config::Overrides;
use output::{CliError, OutputMode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "orbi",
    author,
    version,
    about = "orbi: publish file versions as signed events to relays",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Relay URL to publish to. Repeat for several relays.
    #[arg(long = "relay", value_name = "URL", global = true)]
    relays: Vec<String>,

    /// Per-relay timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Count a relay as accepting once the event is sent, without waiting
    /// for its OK.
    #[arg(long, global = true)]
    no_ack: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.json)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            relays: self.relays.clone(),
            timeout_secs: self.timeout,
            no_ack: self.no_ack,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Chain",
        about = "Publish the first version of a file",
        long_about = "Publish the first version of a file and record its root event id in .orbi/.\n\nFails if the file already has a root; use `orbi commit` for later versions.",
        after_help = "EXAMPLES:\n    # Publish a draft\n    orbi publish draft.md\n\n    # Publish to a specific relay only\n    orbi publish draft.md --relay wss://nos.lol"
    )]
    Publish(cmd::publish::PublishArgs),

    #[command(
        next_help_heading = "Chain",
        about = "Publish a new version of a published file",
        long_about = "Publish a new version of a file. The event replies to the file's root.\n\nLocal pointers are not changed.",
        after_help = "EXAMPLES:\n    # Commit with a message\n    orbi commit draft.md \"fix typo\"\n\n    # Same, flag form\n    orbi commit draft.md -m \"fix typo\""
    )]
    Commit(cmd::commit::CommitArgs),

    #[command(
        next_help_heading = "Chain",
        about = "Publish an event referencing several events or files",
        long_about = "Publish a confluence event. Each reference is an event id (64 hex) or a file name.\n\nWith no references, every tracked file is referenced.",
        after_help = "EXAMPLES:\n    # Reference every tracked file\n    orbi confluence -m \"weekly merge\"\n\n    # Reference specific files\n    orbi confluence a.md b.md -m \"merge\""
    )]
    Confluence(cmd::confluence::ConfluenceArgs),

    #[command(
        next_help_heading = "Local state",
        about = "Show tracked files and their pointers",
        after_help = "EXAMPLES:\n    orbi status\n    orbi status --json"
    )]
    Status,

    #[command(
        next_help_heading = "Local state",
        about = "Show or set a file's head pointer",
        long_about = "Show a file's root and head pointers, or record an explicit head event id.",
        after_help = "EXAMPLES:\n    # Show pointers\n    orbi head draft.md\n\n    # Move the head explicitly\n    orbi head draft.md <event-id>"
    )]
    Head(cmd::head::HeadArgs),

    #[command(
        next_help_heading = "Identity",
        about = "Print the public key of the configured secret key"
    )]
    Whoami,

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    orbi completions bash > /etc/bash_completion.d/orbi"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env("ORBI_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "orbi=debug,orbi_core=debug,info"
        } else if quiet {
            "error"
        } else {
            "orbi=info,orbi_core=info,warn"
        })
    });

    let format = env::var("ORBI_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

async fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;

    if let Commands::Completions(ref args) = cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let ctx = cmd::Context::load(&project_root, &cli.overrides())?;
    debug!(root = %project_root.display(), "project root");

    match cli.command {
        Commands::Publish(ref args) => cmd::publish::run_publish(args, &ctx, output).await,
        Commands::Commit(ref args) => cmd::commit::run_commit(args, &ctx, output).await,
        Commands::Confluence(ref args) => {
            cmd::confluence::run_confluence(args, &ctx, output).await
        }
        Commands::Status => cmd::status::run_status(&ctx, output),
        Commands::Head(ref args) => cmd::head::run_head(args, &ctx, output),
        Commands::Whoami => cmd::whoami::run_whoami(&ctx, output),
        Commands::Completions(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let output = cli.output_mode();

    match run(cli, output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(render_err) = output::render_error(output, &CliError::from(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
