//! Layered configuration: CLI flag, then environment, then user config file,
//! then built-in defaults.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ErrorCode;
use crate::relay::{AckPolicy, BroadcastConfig};

/// Relays used when nothing else names any.
pub const DEFAULT_RELAYS: [&str; 3] = [
    "wss://relay.damus.io",
    "wss://relay.primal.net",
    "wss://nos.lol",
];

pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DEADLINE_SLACK_SECS: u64 = 5;
pub const DEFAULT_SECRET_PATH: &str = "~/.nostr/secret";

/// Comma-separated relay URLs.
pub const RELAYS_ENV: &str = "ORBI_RELAYS";
pub const SECRET_PATH_ENV: &str = "NOSTR_SECRET_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

/// Contents of `<config_dir>/orbi/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub relays: Vec<String>,
    #[serde(default)]
    pub relay_timeout_secs: Option<u64>,
    #[serde(default)]
    pub deadline_slack_secs: Option<u64>,
    #[serde(default)]
    pub require_ack: Option<bool>,
    #[serde(default)]
    pub secret_path: Option<String>,
}

/// Location of the user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orbi").join("config.toml"))
}

/// Load the user config, or defaults when there is no file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match user_config_path() {
        Some(path) => load_user_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load a user config from an explicit path.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
pub fn load_user_config_from(path: &Path) -> Result<UserConfig, ConfigError> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded user config");

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Source of environment variables.
pub trait EnvReader {
    /// Value of `key`, treating empty values as unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvReader for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl EnvReader for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub relays: Vec<String>,
    pub timeout_secs: Option<u64>,
    pub no_ack: bool,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub broadcast: BroadcastConfig,
    pub secret_path: PathBuf,
}

impl EffectiveConfig {
    /// Merge every layer. An empty relay list at any layer falls through to
    /// the next one, ending at [`DEFAULT_RELAYS`].
    #[must_use]
    pub fn resolve(overrides: &Overrides, user: &UserConfig, env: &dyn EnvReader) -> Self {
        let relays = non_empty(overrides.relays.clone())
            .or_else(|| env.get(RELAYS_ENV).and_then(|raw| non_empty(split_relays(&raw))))
            .or_else(|| non_empty(user.relays.clone()))
            .unwrap_or_else(default_relays);

        let per_relay_timeout = Duration::from_secs(
            overrides
                .timeout_secs
                .or(user.relay_timeout_secs)
                .unwrap_or(DEFAULT_RELAY_TIMEOUT_SECS),
        );
        let deadline_slack = Duration::from_secs(
            user.deadline_slack_secs
                .unwrap_or(DEFAULT_DEADLINE_SLACK_SECS),
        );
        let ack = if overrides.no_ack || user.require_ack == Some(false) {
            AckPolicy::Sent
        } else {
            AckPolicy::Confirmed
        };

        let secret_path = env
            .get(SECRET_PATH_ENV)
            .or_else(|| user.secret_path.clone())
            .map_or_else(|| expand_path(DEFAULT_SECRET_PATH), |p| expand_path(&p));

        Self {
            broadcast: BroadcastConfig {
                relays,
                per_relay_timeout,
                deadline_slack,
                ack,
            },
            secret_path,
        }
    }
}

#[must_use]
pub fn default_relays() -> Vec<String> {
    DEFAULT_RELAYS.iter().map(ToString::to_string).collect()
}

fn split_relays(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

fn non_empty(relays: Vec<String>) -> Option<Vec<String>> {
    let relays: Vec<String> = relays
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    (!relays.is_empty()).then_some(relays)
}

/// Expand a leading `~` to the home directory.
#[must_use]
pub fn expand_path(raw: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(raw);
    };
    if raw == "~" {
        return home;
    }
    raw.strip_prefix("~/")
        .map_or_else(|| PathBuf::from(raw), |rest| home.join(rest))
}
