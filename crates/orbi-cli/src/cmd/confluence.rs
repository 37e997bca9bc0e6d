use std::io::Write;

use anyhow::Result;
use clap::Args;
use orbi_core::chain::ConfluenceOutcome;

use super::{Context, write_report};
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `orbi confluence`.
#[derive(Args, Debug)]
pub struct ConfluenceArgs {
    /// Event ids (64 hex) or file names. Defaults to every tracked file.
    pub refs: Vec<String>,

    /// Message carried as the event content.
    #[arg(short, long, default_value = "")]
    pub message: String,
}

/// Publish an event aggregating references to other events or files.
///
/// # Errors
///
/// Fails if there is nothing to reference, the key cannot be loaded, or no
/// relay accepts the event.
pub async fn run_confluence(
    args: &ConfluenceArgs,
    ctx: &Context,
    output: OutputMode,
) -> Result<()> {
    let chain = ctx.chain()?;
    let outcome = chain.confluence(&args.refs, &args.message).await?;

    render_mode(
        output,
        &outcome,
        |o: &ConfluenceOutcome, w: &mut dyn Write| writeln!(w, "{}", o.event_id),
        |o: &ConfluenceOutcome, w: &mut dyn Write| {
            writeln!(w, "Published confluence")?;
            pretty_kv(w, "Event", &o.event_id)?;
            pretty_kv(w, "References", o.references.join(", "))?;
            write_report(w, &o.report)
        },
    )
}
