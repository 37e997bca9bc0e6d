use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use orbi_core::chain::{self, FileStatus};

use super::Context;
use crate::output::{OutputMode, pretty_kv, render_mode};

/// Arguments for `orbi head`.
#[derive(Args, Debug)]
pub struct HeadArgs {
    /// Published file.
    pub file: PathBuf,

    /// Event id to record as the explicit head. Omit to show the pointers.
    pub event_id: Option<String>,
}

/// Show or explicitly move a file's head pointer.
///
/// # Errors
///
/// Fails if the id is malformed, the file was never published, or the
/// pointer records cannot be read or written.
pub fn run_head(args: &HeadArgs, ctx: &Context, output: OutputMode) -> Result<()> {
    let store = ctx.store();
    let status = match args.event_id {
        Some(ref id) => chain::set_head(&store, &args.file, id)?,
        None => chain::pointers(&store, &args.file)?,
    };

    render_mode(
        output,
        &status,
        |s: &FileStatus, w: &mut dyn Write| {
            writeln!(
                w,
                "{}",
                s.pointers
                    .head
                    .as_deref()
                    .or(s.pointers.root.as_deref())
                    .unwrap_or("-")
            )
        },
        |s: &FileStatus, w: &mut dyn Write| {
            writeln!(w, "{}", s.file)?;
            pretty_kv(w, "Root", s.pointers.root.as_deref().unwrap_or("(unpublished)"))?;
            pretty_kv(w, "Head", s.pointers.head.as_deref().unwrap_or("(latest)"))
        },
    )
}
