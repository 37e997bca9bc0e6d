use std::fmt;

/// Machine-readable error codes surfaced by the CLI and in JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    KeyMissing,
    KeyMalformed,
    ConfigParseError,
    AlreadyPublished,
    NotPublished,
    NothingTracked,
    InvalidEventId,
    InvalidFileName,
    NoRelayAccepted,
    StoreReadFailed,
    StoreWriteFailed,
    SourceReadFailed,
    SigningFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::KeyMissing => "E1001",
            Self::KeyMalformed => "E1002",
            Self::ConfigParseError => "E1003",
            Self::AlreadyPublished => "E2001",
            Self::NotPublished => "E2002",
            Self::NothingTracked => "E2003",
            Self::InvalidEventId => "E2004",
            Self::InvalidFileName => "E2005",
            Self::NoRelayAccepted => "E4001",
            Self::StoreReadFailed => "E5001",
            Self::StoreWriteFailed => "E5002",
            Self::SourceReadFailed => "E5003",
            Self::SigningFailed => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::KeyMissing => "Secret key not found",
            Self::KeyMalformed => "Secret key malformed",
            Self::ConfigParseError => "Config file parse error",
            Self::AlreadyPublished => "File already published",
            Self::NotPublished => "File not yet published",
            Self::NothingTracked => "No tracked files",
            Self::InvalidEventId => "Invalid event id",
            Self::InvalidFileName => "Invalid file name",
            Self::NoRelayAccepted => "No relay accepted the event",
            Self::StoreReadFailed => "Chain store read failed",
            Self::StoreWriteFailed => "Chain store write failed",
            Self::SourceReadFailed => "Source file read failed",
            Self::SigningFailed => "Event signing failed",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::KeyMissing => {
                Some("Write your key to ~/.nostr/secret or point NOSTR_SECRET_PATH at it.")
            }
            Self::KeyMalformed => Some("Use an nsec1 bech32 key or 64 hex characters."),
            Self::ConfigParseError => Some("Fix syntax in orbi/config.toml and retry."),
            Self::AlreadyPublished => Some("Use `orbi commit <file>` to publish a new version."),
            Self::NotPublished => Some("Run `orbi publish <file>` first."),
            Self::NothingTracked => {
                Some("Publish a file first or pass references to `orbi confluence`.")
            }
            Self::InvalidEventId => Some("Use the full 64-character hex event id."),
            Self::InvalidFileName => None,
            Self::NoRelayAccepted => {
                Some("Check connectivity or pass other relays with `--relay <url>`.")
            }
            Self::StoreReadFailed | Self::StoreWriteFailed => {
                Some("Check permissions on the .orbi/ directory.")
            }
            Self::SourceReadFailed => Some("Check that the file exists and is readable."),
            Self::SigningFailed => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
