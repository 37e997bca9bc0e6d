use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use orbi_core::chain::PublishOutcome;

use super::{Context, write_report};
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `orbi publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// File whose first version to publish.
    pub file: PathBuf,

    /// Optional message attached to the version.
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Publish the first version of a file and record its root.
///
/// # Errors
///
/// Fails if the file is already published, cannot be read, the key cannot
/// be loaded, or no relay accepts the event.
pub async fn run_publish(args: &PublishArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let chain = ctx.chain()?;
    let outcome = chain
        .publish(&args.file, args.message.as_deref())
        .await?;

    render_mode(
        output,
        &outcome,
        |o: &PublishOutcome, w: &mut dyn Write| writeln!(w, "{}", o.root),
        |o: &PublishOutcome, w: &mut dyn Write| {
            writeln!(w, "Published {}", o.file)?;
            pretty_kv(w, "Root", &o.root)?;
            write_report(w, &o.report)
        },
    )
}
