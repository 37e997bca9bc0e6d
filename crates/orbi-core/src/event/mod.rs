//! Version event data model.
//!
//! Events follow the NIP-01 shape: an author public key, a creation
//! timestamp, a numeric kind, a list of string tags, and a string content.
//! The event id is the SHA-256 of the canonical serialization (see
//! [`canonical`]) and only exists on a [`SignedEvent`].
//!
//! # Tags
//!
//! ```text
//! ["f", "draft.md"]                 file tag / file reference
//! ["e", <root>, "", "root"]         chain root
//! ["e", <parent>, "", "reply"]      chain parent
//! ["m", "fix typo"]                 human message
//! ["e", <id>]                       event reference (confluence)
//! ```

pub mod builder;
pub mod canonical;

pub use builder::{ChainLink, Reference, classify_reference, confluence, file_version};
pub use canonical::{canonical_event_json, compute_event_id};

use serde::{Deserialize, Serialize};

/// Kind number for a file version event.
pub const KIND_FILE_VERSION: u16 = 4444;

/// Kind number for a confluence event.
pub const KIND_CONFLUENCE: u16 = 4445;

/// Length of a hex-encoded event id.
pub const EVENT_ID_HEX_LEN: usize = 64;

/// Returns true if `s` is exactly 64 ASCII hex characters.
#[must_use]
pub fn is_event_id(s: &str) -> bool {
    s.len() == EVENT_ID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Logical kind of an orbi event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Kind {
    /// One version of a tracked file.
    FileVersion,
    /// Aggregation of references to other events or files.
    Confluence,
}

impl Kind {
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            Self::FileVersion => KIND_FILE_VERSION,
            Self::Confluence => KIND_CONFLUENCE,
        }
    }
}

impl From<Kind> for u16 {
    fn from(kind: Kind) -> Self {
        kind.as_u16()
    }
}

/// Error returned when a kind number is not one orbi produces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind {0}")]
pub struct UnknownKind(pub u16);

impl TryFrom<u16> for Kind {
    type Error = UnknownKind;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            KIND_FILE_VERSION => Ok(Self::FileVersion),
            KIND_CONFLUENCE => Ok(Self::Confluence),
            other => Err(UnknownKind(other)),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileVersion => write!(f, "file-version"),
            Self::Confluence => write!(f, "confluence"),
        }
    }
}

/// A single tag: a non-empty list of strings, first element is the tag name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// `["f", name]`
    #[must_use]
    pub fn file(name: &str) -> Self {
        Self(vec!["f".into(), name.into()])
    }

    /// `["e", root, "", "root"]`
    #[must_use]
    pub fn chain_root(id: &str) -> Self {
        Self(vec!["e".into(), id.into(), String::new(), "root".into()])
    }

    /// `["e", parent, "", "reply"]`
    #[must_use]
    pub fn chain_parent(id: &str) -> Self {
        Self(vec!["e".into(), id.into(), String::new(), "reply".into()])
    }

    /// `["m", text]`
    #[must_use]
    pub fn message(text: &str) -> Self {
        Self(vec!["m".into(), text.into()])
    }

    /// `["e", id]`
    #[must_use]
    pub fn event_ref(id: &str) -> Self {
        Self(vec!["e".into(), id.into()])
    }

    /// Tag name (first element), empty for a malformed empty tag.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// Tag value (second element).
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// NIP-10 marker (fourth element) on `e` tags.
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        self.0.get(3).map(String::as_str).filter(|m| !m.is_empty())
    }
}

/// Unsigned event content produced by the builder.
///
/// The signer stamps the author key and creation time; a draft carries no
/// identity of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub kind: Kind,
    pub tags: Vec<Tag>,
    pub content: String,
}

/// A signed event ready to broadcast.
///
/// Fields are private so that a `SignedEvent` with an id and signature can
/// only come from a [`Signer`](crate::signer::Signer) or from parsing a
/// relay frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    id: String,
    pubkey: String,
    created_at: i64,
    kind: Kind,
    tags: Vec<Tag>,
    content: String,
    sig: String,
}

impl SignedEvent {
    pub(crate) fn from_parts(
        id: String,
        pubkey: String,
        created_at: i64,
        draft: EventDraft,
        sig: String,
    ) -> Self {
        let EventDraft {
            kind,
            tags,
            content,
        } = draft;
        Self {
            id,
            pubkey,
            created_at,
            kind,
            tags,
            content,
            sig,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn pubkey(&self) -> &str {
        &self.pubkey
    }

    #[must_use]
    pub const fn created_at(&self) -> i64 {
        self.created_at
    }

    #[must_use]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn sig(&self) -> &str {
        &self.sig
    }

    /// Value of the first `f` tag.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name() == "f")
            .and_then(Tag::value)
    }

    /// Value of the `m` tag.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name() == "m")
            .and_then(Tag::value)
    }

    /// Id referenced by the `e` tag marked `root`.
    #[must_use]
    pub fn chain_root(&self) -> Option<&str> {
        self.marked_e_tag("root")
    }

    /// Id referenced by the `e` tag marked `reply`.
    #[must_use]
    pub fn chain_parent(&self) -> Option<&str> {
        self.marked_e_tag("reply")
    }

    /// Unmarked `e` tag values (confluence event references).
    #[must_use]
    pub fn event_refs(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.name() == "e" && t.marker().is_none())
            .filter_map(Tag::value)
            .collect()
    }

    /// All `f` tag values.
    #[must_use]
    pub fn file_refs(&self) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|t| t.name() == "f")
            .filter_map(Tag::value)
            .collect()
    }

    fn marked_e_tag(&self, marker: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name() == "e" && t.marker() == Some(marker))
            .and_then(Tag::value)
    }
}
