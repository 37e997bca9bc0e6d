pub mod commit;
pub mod completions;
pub mod confluence;
pub mod head;
pub mod publish;
pub mod status;
pub mod whoami;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use orbi_core::config::{EffectiveConfig, Overrides, ProcessEnv, load_user_config};
use orbi_core::relay::BroadcastReport;
use orbi_core::{Broadcaster, Chain, ChainStore, SecretKeySigner, WsRelayClient};
use tracing::debug;

use crate::output::pretty_kv;

/// Chain wired to the real key file and WebSocket relays.
pub type LiveChain = Chain<SecretKeySigner, WsRelayClient>;

/// Resolved settings for one invocation.
#[derive(Debug)]
pub struct Context {
    pub project_root: PathBuf,
    pub config: EffectiveConfig,
}

impl Context {
    /// Load the user config and merge it with flags and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the user config file is unreadable or malformed.
    pub fn load(project_root: &Path, overrides: &Overrides) -> Result<Self> {
        let user = load_user_config()?;
        let config = EffectiveConfig::resolve(overrides, &user, &ProcessEnv);
        debug!(
            relays = ?config.broadcast.relays,
            timeout = ?config.broadcast.per_relay_timeout,
            ack = ?config.broadcast.ack,
            secret_path = %config.secret_path.display(),
            "resolved config"
        );
        Ok(Self {
            project_root: project_root.to_path_buf(),
            config,
        })
    }

    pub fn store(&self) -> ChainStore {
        ChainStore::new(&self.project_root)
    }

    /// Load the secret key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key file is missing, empty or malformed.
    pub fn signer(&self) -> Result<SecretKeySigner> {
        Ok(SecretKeySigner::load(&self.config.secret_path)?)
    }

    /// Build a chain. The key is loaded here, before any relay is contacted.
    ///
    /// # Errors
    ///
    /// As for [`signer`](Self::signer).
    pub fn chain(&self) -> Result<LiveChain> {
        let signer = self.signer()?;
        Ok(Chain::new(
            self.store(),
            signer,
            Broadcaster::new(WsRelayClient, self.config.broadcast.clone()),
        ))
    }
}

/// Pretty lines describing which relays took an event.
pub fn write_report(w: &mut dyn Write, report: &BroadcastReport) -> io::Result<()> {
    let total = report.accepted.len() + report.failed.len();
    pretty_kv(w, "Relays", format!("{}/{total} accepted", report.accepted.len()))?;
    for relay in &report.accepted {
        writeln!(w, "  ok    {relay}")?;
    }
    for failure in &report.failed {
        writeln!(w, "  fail  {}  ({})", failure.relay, failure.reason)?;
    }
    Ok(())
}
