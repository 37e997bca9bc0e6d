//! Chain resolution: the publish, commit and confluence flows.
//!
//! A file moves through three states:
//!
//! ```text
//! Untracked --publish--> Published(root) --commit--> Committed(root, latest)
//!                                           <--commit--
//! ```
//!
//! Every commit replies directly to the root, so the chain is a star rather
//! than a linked list. The explicit head pointer is only ever written by
//! [`Chain::set_head`]; commits read it for display and leave it alone.
//!
//! Local state is written only after a broadcast has been accepted by at
//! least one relay.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::event::{self, ChainLink, EventDraft, SignedEvent, is_event_id};
use crate::relay::{BroadcastError, BroadcastReport, Broadcaster, RelayClient};
use crate::signer::{SignError, Signer};
use crate::store::{ChainPointers, ChainStore, StoreError, normalize_file_name};

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("{file} is already published (root {root})")]
    AlreadyPublished { file: String, root: String },

    #[error("{0} has not been published yet")]
    NotPublished(String),

    #[error("no references given and no files are tracked")]
    NothingTracked,

    #[error("invalid event id: {0}")]
    InvalidEventId(String),

    #[error("failed to read {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),
}

impl ChainError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AlreadyPublished { .. } => ErrorCode::AlreadyPublished,
            Self::NotPublished(_) => ErrorCode::NotPublished,
            Self::NothingTracked => ErrorCode::NothingTracked,
            Self::InvalidEventId(_) => ErrorCode::InvalidEventId,
            Self::ReadSource { .. } => ErrorCode::SourceReadFailed,
            Self::Store(e) => e.code(),
            Self::Sign(_) => ErrorCode::SigningFailed,
            Self::Broadcast(e) => e.code(),
        }
    }
}

/// Result of publishing a file's first version.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub file: String,
    pub root: String,
    /// `false` when the file was already listed or the list could not be
    /// updated.
    pub tracked: bool,
    pub report: BroadcastReport,
}

/// Result of publishing a later version.
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub file: String,
    pub event_id: String,
    pub root: String,
    pub parent: String,
    /// Explicit head at the time of the commit; not advanced by it.
    pub head: Option<String>,
    pub report: BroadcastReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfluenceOutcome {
    pub event_id: String,
    pub references: Vec<String>,
    pub report: BroadcastReport,
}

/// Pointers of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    pub file: String,
    #[serde(flatten)]
    pub pointers: ChainPointers,
}

/// Drives the chain flows over a store, a signer and a broadcaster.
#[derive(Debug)]
pub struct Chain<S, C> {
    store: ChainStore,
    signer: S,
    broadcaster: Broadcaster<C>,
}

impl<S: Signer, C: RelayClient> Chain<S, C> {
    pub const fn new(store: ChainStore, signer: S, broadcaster: Broadcaster<C>) -> Self {
        Self {
            store,
            signer,
            broadcaster,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &ChainStore {
        &self.store
    }

    #[must_use]
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// Publish the first version of `path` and record its root.
    ///
    /// # Errors
    ///
    /// - [`ChainError::AlreadyPublished`] if a root exists (no network use).
    /// - [`ChainError::ReadSource`] if the file cannot be read.
    /// - [`ChainError::Broadcast`] if no relay accepted; nothing is written.
    /// - [`ChainError::Store`] if the root cannot be recorded.
    pub async fn publish(
        &self,
        path: &Path,
        message: Option<&str>,
    ) -> Result<PublishOutcome, ChainError> {
        let file = normalize_file_name(path)?;
        if let Some(root) = self.store.read_root(&file)? {
            return Err(ChainError::AlreadyPublished { file, root });
        }

        let content = read_source(path)?;
        let draft = event::file_version(&content, &file, None, message);
        let (event, report) = self.sign_and_broadcast(draft).await?;

        self.store.write_root(&file, event.id())?;
        let tracked = match self.store.track_file(&file) {
            Ok(added) => added,
            Err(e) => {
                warn!(file = %file, error = %e, "could not update tracked files");
                false
            }
        };

        info!(file = %file, root = event.id(), "published root version");
        Ok(PublishOutcome {
            file,
            root: event.id().to_string(),
            tracked,
            report,
        })
    }

    /// Publish a later version of `path`, anchored to its root.
    ///
    /// Local pointers are not modified.
    ///
    /// # Errors
    ///
    /// - [`ChainError::NotPublished`] if the file has no root (no network
    ///   use).
    /// - [`ChainError::ReadSource`] if the file cannot be read.
    /// - [`ChainError::Broadcast`] if no relay accepted.
    pub async fn commit(
        &self,
        path: &Path,
        message: Option<&str>,
    ) -> Result<CommitOutcome, ChainError> {
        let file = normalize_file_name(path)?;
        let Some(root) = self.store.read_root(&file)? else {
            return Err(ChainError::NotPublished(file));
        };
        let head = self.store.read_head(&file)?;

        let content = read_source(path)?;
        let link = ChainLink::anchored(&root);
        let draft = event::file_version(&content, &file, Some(&link), message);
        let (event, report) = self.sign_and_broadcast(draft).await?;

        info!(file = %file, event_id = event.id(), root = %root, "committed version");
        Ok(CommitOutcome {
            file,
            event_id: event.id().to_string(),
            root: link.root,
            parent: link.parent,
            head,
            report,
        })
    }

    /// Publish a confluence event over `references`, or over every tracked
    /// file when none are given.
    ///
    /// # Errors
    ///
    /// - [`ChainError::NothingTracked`] if there is nothing to reference.
    /// - [`ChainError::Broadcast`] if no relay accepted.
    pub async fn confluence(
        &self,
        references: &[String],
        message: &str,
    ) -> Result<ConfluenceOutcome, ChainError> {
        let references = if references.is_empty() {
            self.store.list_tracked()?
        } else {
            references.to_vec()
        };
        if references.is_empty() {
            return Err(ChainError::NothingTracked);
        }

        let draft = event::confluence(&references, message);
        let (event, report) = self.sign_and_broadcast(draft).await?;

        info!(
            event_id = event.id(),
            references = references.len(),
            "published confluence"
        );
        Ok(ConfluenceOutcome {
            event_id: event.id().to_string(),
            references,
            report,
        })
    }

    /// See [`pointers`].
    ///
    /// # Errors
    ///
    /// As for [`pointers`].
    pub fn pointers(&self, path: &Path) -> Result<FileStatus, ChainError> {
        pointers(&self.store, path)
    }

    /// See [`set_head`].
    ///
    /// # Errors
    ///
    /// As for [`set_head`].
    pub fn set_head(&self, path: &Path, id: &str) -> Result<FileStatus, ChainError> {
        set_head(&self.store, path, id)
    }

    /// See [`status`].
    ///
    /// # Errors
    ///
    /// As for [`status`].
    pub fn status(&self) -> Result<Vec<FileStatus>, ChainError> {
        status(&self.store)
    }

    async fn sign_and_broadcast(
        &self,
        draft: EventDraft,
    ) -> Result<(SignedEvent, BroadcastReport), ChainError> {
        let event = self.signer.sign(draft)?;
        let report = self.broadcaster.publish(&event).await?;
        Ok((event, report))
    }
}

/// Read a file's pointers. Needs no key and no network.
///
/// # Errors
///
/// Returns [`ChainError::Store`] for an unusable name or unreadable
/// pointer records.
pub fn pointers(store: &ChainStore, path: &Path) -> Result<FileStatus, ChainError> {
    let file = normalize_file_name(path)?;
    let pointers = store.pointers(&file)?;
    Ok(FileStatus { file, pointers })
}

/// Explicitly move a published file's head pointer to `id`.
///
/// # Errors
///
/// - [`ChainError::InvalidEventId`] if `id` is not 64 hex characters.
/// - [`ChainError::NotPublished`] if the file has no root.
/// - [`ChainError::Store`] if the pointer cannot be written.
pub fn set_head(store: &ChainStore, path: &Path, id: &str) -> Result<FileStatus, ChainError> {
    let file = normalize_file_name(path)?;
    let id = id.trim().to_ascii_lowercase();
    if !is_event_id(&id) {
        return Err(ChainError::InvalidEventId(id));
    }
    if store.read_root(&file)?.is_none() {
        return Err(ChainError::NotPublished(file));
    }

    store.write_head(&file, &id)?;
    info!(file = %file, head = %id, "head moved");
    let pointers = store.pointers(&file)?;
    Ok(FileStatus { file, pointers })
}

/// Every tracked file with its pointers, in tracking order.
///
/// # Errors
///
/// Returns [`ChainError::Store`] if any record is unreadable.
pub fn status(store: &ChainStore) -> Result<Vec<FileStatus>, ChainError> {
    store
        .list_tracked()?
        .into_iter()
        .map(|file| {
            let pointers = store.pointers(&file)?;
            Ok(FileStatus { file, pointers })
        })
        .collect()
}

fn read_source(path: &Path) -> Result<Vec<u8>, ChainError> {
    std::fs::read(path).map_err(|source| ChainError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}
