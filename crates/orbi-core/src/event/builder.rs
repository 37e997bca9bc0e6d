//! Pure construction of unsigned version and confluence events.
//!
//! Nothing here signs or touches the network. The first version of a file is
//! distinguished from later versions only by the absence of chain tags.

use super::{EventDraft, Kind, Tag, is_event_id};

/// Chain linkage for a commit: the file's root and the resolved parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub root: String,
    pub parent: String,
}

impl ChainLink {
    /// Linkage where every version replies directly to the root.
    #[must_use]
    pub fn anchored(root: &str) -> Self {
        Self {
            root: root.to_string(),
            parent: root.to_string(),
        }
    }
}

/// How a confluence reference is tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// A 64-hex event id, either case. Tagged lowercase.
    Event(&'a str),
    /// Anything else is a file name.
    File(&'a str),
}

impl Reference<'_> {
    fn to_tag(self) -> Tag {
        match self {
            Reference::Event(id) => Tag::event_ref(&id.to_ascii_lowercase()),
            Reference::File(name) => Tag::file(name),
        }
    }
}

/// Classify a confluence reference by its shape.
#[must_use]
pub fn classify_reference(reference: &str) -> Reference<'_> {
    if is_event_id(reference) {
        Reference::Event(reference)
    } else {
        Reference::File(reference)
    }
}

/// Build a file version event.
///
/// `content` is the raw file bytes; invalid UTF-8 sequences are replaced
/// because event content is a JSON string.
#[must_use]
pub fn file_version(
    content: &[u8],
    file_name: &str,
    chain: Option<&ChainLink>,
    message: Option<&str>,
) -> EventDraft {
    let mut tags = vec![Tag::file(file_name)];
    if let Some(link) = chain {
        tags.push(Tag::chain_root(&link.root));
        tags.push(Tag::chain_parent(&link.parent));
    }
    if let Some(text) = message.filter(|m| !m.is_empty()) {
        tags.push(Tag::message(text));
    }

    EventDraft {
        kind: Kind::FileVersion,
        tags,
        content: String::from_utf8_lossy(content).into_owned(),
    }
}

/// Build a confluence event aggregating `references`.
#[must_use]
pub fn confluence(references: &[String], message: &str) -> EventDraft {
    let tags = references
        .iter()
        .map(|r| classify_reference(r).to_tag())
        .collect();

    EventDraft {
        kind: Kind::Confluence,
        tags,
        content: message.to_string(),
    }
}
