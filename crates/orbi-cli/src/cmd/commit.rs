use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use orbi_core::chain::CommitOutcome;

use super::{Context, write_report};
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `orbi commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Previously published file.
    pub file: PathBuf,

    /// Commit message.
    #[arg(conflicts_with = "message_flag")]
    pub message: Option<String>,

    /// Commit message (alternative to the positional form).
    #[arg(short = 'm', long = "message", id = "message_flag")]
    pub message_flag: Option<String>,
}

impl CommitArgs {
    fn message(&self) -> Option<&str> {
        self.message_flag.as_deref().or(self.message.as_deref())
    }
}

/// Publish a new version of an already published file.
///
/// # Errors
///
/// Fails if the file has no root, cannot be read, the key cannot be
/// loaded, or no relay accepts the event.
pub async fn run_commit(args: &CommitArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let chain = ctx.chain()?;
    let outcome = chain.commit(&args.file, args.message()).await?;

    render_mode(
        output,
        &outcome,
        |o: &CommitOutcome, w: &mut dyn Write| writeln!(w, "{}", o.event_id),
        |o: &CommitOutcome, w: &mut dyn Write| {
            writeln!(w, "Committed {}", o.file)?;
            pretty_kv(w, "Event", &o.event_id)?;
            pretty_kv(w, "Root", &o.root)?;
            pretty_kv(w, "Head", o.head.as_deref().unwrap_or("(latest)"))?;
            write_report(w, &o.report)
        },
    )
}
