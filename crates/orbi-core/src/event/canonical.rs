//! Canonical event serialization and id computation.
//!
//! The id of an event is the SHA-256 of the compact JSON array
//!
//! ```text
//! [0,<pubkey>,<created_at>,<kind>,<tags>,<content>]
//! ```
//!
//! Rules:
//! - Compact: no whitespace between tokens.
//! - UTF-8 throughout; non-ASCII characters are written verbatim.
//! - Only `"` `\` and the control characters `\n` `\r` `\t` `\b` `\f` are
//!   escaped. Every other character is written as is.
//!
//! Relays recompute the id with the same rules, so this must match them
//! byte for byte.

use sha2::{Digest, Sha256};

use super::Tag;

/// Produce the canonical serialization of an event's signed fields.
///
/// # Examples
///
/// ```
/// use orbi_core::event::{Tag, canonical_event_json};
///
/// let json = canonical_event_json("ab", 7, 4444, &[Tag::file("a.md")], "hi\n");
/// assert_eq!(json, r#"[0,"ab",7,4444,[["f","a.md"]],"hi\n"]"#);
/// ```
#[must_use]
pub fn canonical_event_json(
    pubkey: &str,
    created_at: i64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> String {
    let mut buf = String::with_capacity(content.len() + 128);
    buf.push_str("[0,");
    write_string(pubkey, &mut buf);
    buf.push(',');
    buf.push_str(&created_at.to_string());
    buf.push(',');
    buf.push_str(&kind.to_string());
    buf.push(',');

    buf.push('[');
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        buf.push('[');
        for (j, item) in tag.0.iter().enumerate() {
            if j > 0 {
                buf.push(',');
            }
            write_string(item, &mut buf);
        }
        buf.push(']');
    }
    buf.push(']');

    buf.push(',');
    write_string(content, &mut buf);
    buf.push(']');
    buf
}

/// SHA-256 of [`canonical_event_json`].
#[must_use]
pub fn compute_event_id(
    pubkey: &str,
    created_at: i64,
    kind: u16,
    tags: &[Tag],
    content: &str,
) -> [u8; 32] {
    let serialized = canonical_event_json(pubkey, created_at, kind, tags, content);
    Sha256::digest(serialized.as_bytes()).into()
}

fn write_string(s: &str, buf: &mut String) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            '\u{08}' => buf.push_str("\\b"),
            '\u{0c}' => buf.push_str("\\f"),
            other => buf.push(other),
        }
    }
    buf.push('"');
}
