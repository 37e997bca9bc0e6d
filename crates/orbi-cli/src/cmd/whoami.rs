use std::io::Write;

use anyhow::Result;
use orbi_core::Signer;
use serde::Serialize;

use super::Context;
use crate::output::{OutputMode, render};

#[derive(Debug, Serialize)]
struct Identity {
    pubkey: String,
    secret_path: String,
}

/// Print the public key derived from the configured secret key.
///
/// # Errors
///
/// Fails if the key file is missing, empty or malformed.
pub fn run_whoami(ctx: &Context, output: OutputMode) -> Result<()> {
    let signer = ctx.signer()?;
    let identity = Identity {
        pubkey: signer.public_key().to_string(),
        secret_path: ctx.config.secret_path.display().to_string(),
    };

    render(output, &identity, |id, w: &mut dyn Write| {
        writeln!(w, "{}", id.pubkey)
    })
}
