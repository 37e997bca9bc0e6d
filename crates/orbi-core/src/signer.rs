//! Event signing and secret key loading.
//!
//! Keys are secp256k1 scalars and signatures are BIP-340 Schnorr over the
//! 32-byte event id, the same scheme relays verify.
//!
//! Key material is read from a file holding either an `nsec1...` bech32
//! string or 64 hex characters, surrounding whitespace ignored.

use std::fmt;
use std::path::{Path, PathBuf};

use k256::schnorr::{Signature, SigningKey, VerifyingKey};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::ErrorCode;
use crate::event::{EventDraft, SignedEvent, compute_event_id};

/// Human-readable prefix of bech32 secret keys.
const NSEC_HRP: &str = "nsec";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Key material could not be loaded. Always raised before any network use.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to read secret key at {path}: {source}")]
    Missing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("secret key file {0} is empty")]
    Empty(PathBuf),

    #[error("invalid key format: {0}")]
    Malformed(String),
}

impl KeyError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Missing { .. } => ErrorCode::KeyMissing,
            Self::Empty(_) | Self::Malformed(_) => ErrorCode::KeyMalformed,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("schnorr signing failed: {0}")]
    Schnorr(String),
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Turns drafts into signed events under one author identity.
pub trait Signer: Send + Sync {
    /// Hex x-only public key of the author.
    fn public_key(&self) -> &str;

    /// Stamp author and time onto `draft`, compute its id, and sign it.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] if the signature cannot be produced. No event
    /// is returned in that case.
    fn sign(&self, draft: EventDraft) -> Result<SignedEvent, SignError>;
}

/// Signer backed by an in-memory secp256k1 secret key.
pub struct SecretKeySigner {
    key: SigningKey,
    public_key: String,
}

impl fmt::Debug for SecretKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretKeySigner")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl SecretKeySigner {
    /// Parse key material: `nsec1...` or 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Malformed`] for any other shape or for a value
    /// that is not a valid secp256k1 scalar.
    pub fn parse(material: &str) -> Result<Self, KeyError> {
        let material = material.trim();
        let bytes = if material.starts_with("nsec1") {
            decode_nsec(material)?
        } else if material.len() == 64 {
            hex::decode(material).map_err(|e| KeyError::Malformed(e.to_string()))?
        } else {
            return Err(KeyError::Malformed(
                "expected nsec1 bech32 or 64 hex characters".into(),
            ));
        };

        let key = SigningKey::from_bytes(&bytes).map_err(|e| KeyError::Malformed(e.to_string()))?;
        let public_key = hex::encode(key.verifying_key().to_bytes());
        Ok(Self { key, public_key })
    }

    /// Load key material from a file.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Missing`] if the file cannot be read,
    /// [`KeyError::Empty`] if it holds only whitespace, or
    /// [`KeyError::Malformed`] as for [`parse`](Self::parse).
    pub fn load(path: &Path) -> Result<Self, KeyError> {
        let content = std::fs::read_to_string(path).map_err(|source| KeyError::Missing {
            path: path.to_path_buf(),
            source,
        })?;
        if content.trim().is_empty() {
            return Err(KeyError::Empty(path.to_path_buf()));
        }
        Self::parse(&content)
    }
}

impl Signer for SecretKeySigner {
    fn public_key(&self) -> &str {
        &self.public_key
    }

    fn sign(&self, draft: EventDraft) -> Result<SignedEvent, SignError> {
        let created_at = chrono::Utc::now().timestamp();
        let id = compute_event_id(
            &self.public_key,
            created_at,
            draft.kind.as_u16(),
            &draft.tags,
            &draft.content,
        );

        let mut aux_rand = [0u8; 32];
        OsRng.fill_bytes(&mut aux_rand);
        let signature = self
            .key
            .sign_raw(&id, &aux_rand)
            .map_err(|e| SignError::Schnorr(e.to_string()))?;

        Ok(SignedEvent::from_parts(
            hex::encode(id),
            self.public_key.clone(),
            created_at,
            draft,
            hex::encode(signature.to_bytes()),
        ))
    }
}

fn decode_nsec(material: &str) -> Result<Vec<u8>, KeyError> {
    let (hrp, data) = bech32::decode(material).map_err(|e| KeyError::Malformed(e.to_string()))?;
    if hrp.as_str() != NSEC_HRP {
        return Err(KeyError::Malformed(format!(
            "expected {NSEC_HRP} prefix, found {}",
            hrp.as_str()
        )));
    }
    if data.len() != 32 {
        return Err(KeyError::Malformed(format!(
            "decoded key is {} bytes, expected 32",
            data.len()
        )));
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("event id does not match its content")]
    IdMismatch,
    #[error("malformed {0}")]
    Malformed(&'static str),
    #[error("signature does not verify")]
    BadSignature,
}

/// Recompute an event's id and check its signature against its pubkey.
///
/// # Errors
///
/// Returns [`VerifyError`] describing the first check that failed.
pub fn verify(event: &SignedEvent) -> Result<(), VerifyError> {
    let id = compute_event_id(
        event.pubkey(),
        event.created_at(),
        event.kind().as_u16(),
        event.tags(),
        event.content(),
    );
    if hex::encode(id) != event.id() {
        return Err(VerifyError::IdMismatch);
    }

    let pubkey = hex::decode(event.pubkey()).map_err(|_| VerifyError::Malformed("pubkey"))?;
    let key = VerifyingKey::from_bytes(&pubkey).map_err(|_| VerifyError::Malformed("pubkey"))?;
    let sig = hex::decode(event.sig()).map_err(|_| VerifyError::Malformed("signature"))?;
    let sig =
        Signature::try_from(sig.as_slice()).map_err(|_| VerifyError::Malformed("signature"))?;

    key.verify_raw(&id, &sig)
        .map_err(|_| VerifyError::BadSignature)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
