use std::io::Write;

use anyhow::Result;
use orbi_core::chain::{self, FileStatus};

use super::Context;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Show every tracked file with its root and head pointers.
///
/// Reads local state only; no key or network is needed.
///
/// # Errors
///
/// Fails if the `.orbi/` records cannot be read.
pub fn run_status(ctx: &Context, output: OutputMode) -> Result<()> {
    let files = chain::status(&ctx.store())?;

    render_mode(
        output,
        &files,
        |files: &Vec<FileStatus>, w: &mut dyn Write| {
            for f in files {
                writeln!(
                    w,
                    "{}\t{}\t{}",
                    f.file,
                    f.pointers.root.as_deref().unwrap_or("-"),
                    f.pointers.head.as_deref().unwrap_or("-"),
                )?;
            }
            Ok(())
        },
        |files: &Vec<FileStatus>, w: &mut dyn Write| {
            if files.is_empty() {
                return writeln!(w, "No tracked files. Run `orbi publish <file>` to start.");
            }
            pretty_section(w, &format!("Tracked files ({})", files.len()))?;
            for f in files {
                writeln!(w, "{}", f.file)?;
                pretty_kv(w, "  root", f.pointers.root.as_deref().unwrap_or("(missing)"))?;
                pretty_kv(w, "  head", f.pointers.head.as_deref().unwrap_or("(latest)"))?;
            }
            Ok(())
        },
    )
}
