//! Local chain pointers for tracked files.
//!
//! Pointers live under a hidden `.orbi/` directory in the project root.
//!
//! # Directory Layout
//!
//! ```text
//! .orbi/
//!   tracked_files         # one basename per line, first-publish order
//!   draft.md/
//!     root_event_id       # id of the first published version
//!     HEAD                # optional explicit head pointer
//! ```
//!
//! # Invariants
//!
//! - Pointer files hold a single trimmed id followed by a newline.
//! - `tracked_files` is append-only and holds each basename at most once.
//! - Directories are created on first write and never removed here.
//! - Nothing guards against two processes writing the same directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ErrorCode;

/// Name of the hidden project directory.
pub const ORBI_DIR: &str = ".orbi";

/// Per-file root pointer record.
pub const ROOT_FILE: &str = "root_event_id";

/// Per-file explicit head pointer record.
pub const HEAD_FILE: &str = "HEAD";

/// Flat list of tracked basenames.
pub const TRACKED_FILE: &str = "tracked_files";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The argument has no usable base file name.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StoreReadFailed,
            Self::Write { .. } => ErrorCode::StoreWriteFailed,
            Self::InvalidFileName(_) => ErrorCode::InvalidFileName,
        }
    }
}

/// Normalize a path argument to the basename used as the file's identity.
///
/// # Errors
///
/// Returns [`StoreError::InvalidFileName`] if the path has no final
/// component, the component is not UTF-8, it would escape `.orbi/`, or it
/// would not survive a line of `tracked_files` (line breaks, surrounding
/// whitespace).
pub fn normalize_file_name(path: &Path) -> Result<String, StoreError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidFileName(path.display().to_string()))?;

    // One name per line in `tracked_files`, read back trimmed.
    let storable = !name.contains(['\n', '\r']) && name.trim() == name;
    if !storable || name.is_empty() || name == "." || name == ".." || name == TRACKED_FILE {
        return Err(StoreError::InvalidFileName(name.to_string()));
    }
    Ok(name.to_string())
}

/// Both pointers of one tracked file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChainPointers {
    pub root: Option<String>,
    pub head: Option<String>,
}

// ---------------------------------------------------------------------------
// ChainStore
// ---------------------------------------------------------------------------

/// Reads and writes chain pointers under `<project>/.orbi/`.
///
/// Callers pass normalized basenames (see [`normalize_file_name`]).
#[derive(Debug, Clone)]
pub struct ChainStore {
    orbi_dir: PathBuf,
}

impl ChainStore {
    /// Create a store rooted at `project_root`. No I/O happens until the
    /// first read or write.
    #[must_use]
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            orbi_dir: project_root.as_ref().join(ORBI_DIR),
        }
    }

    /// Path to the `.orbi/` directory.
    #[must_use]
    pub fn orbi_dir(&self) -> &Path {
        &self.orbi_dir
    }

    /// Directory holding one file's pointers.
    #[must_use]
    pub fn file_dir(&self, file: &str) -> PathBuf {
        self.orbi_dir.join(file)
    }

    /// Path to a file's root pointer.
    #[must_use]
    pub fn root_path(&self, file: &str) -> PathBuf {
        self.file_dir(file).join(ROOT_FILE)
    }

    /// Path to a file's head pointer.
    #[must_use]
    pub fn head_path(&self, file: &str) -> PathBuf {
        self.file_dir(file).join(HEAD_FILE)
    }

    /// Path to the tracked-files list.
    #[must_use]
    pub fn tracked_path(&self) -> PathBuf {
        self.orbi_dir.join(TRACKED_FILE)
    }

    // -----------------------------------------------------------------------
    // Pointers
    // -----------------------------------------------------------------------

    /// Root event id, or `None` if the file was never published.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the record exists but is unreadable.
    pub fn read_root(&self, file: &str) -> Result<Option<String>, StoreError> {
        read_pointer(&self.root_path(file))
    }

    /// Explicit head id, or `None` for the implicit (latest) head.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the record exists but is unreadable.
    pub fn read_head(&self, file: &str) -> Result<Option<String>, StoreError> {
        read_pointer(&self.head_path(file))
    }

    /// Read both pointers.
    ///
    /// # Errors
    ///
    /// Same as [`read_root`](Self::read_root).
    pub fn pointers(&self, file: &str) -> Result<ChainPointers, StoreError> {
        Ok(ChainPointers {
            root: self.read_root(file)?,
            head: self.read_head(file)?,
        })
    }

    /// Record the root id. Does not check for an existing root; callers
    /// must refuse to publish a file that already has one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the directory or record cannot be
    /// written.
    pub fn write_root(&self, file: &str, id: &str) -> Result<(), StoreError> {
        self.write_pointer(file, &self.root_path(file), id)
    }

    /// Record an explicit head id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the directory or record cannot be
    /// written.
    pub fn write_head(&self, file: &str, id: &str) -> Result<(), StoreError> {
        self.write_pointer(file, &self.head_path(file), id)
    }

    fn write_pointer(&self, file: &str, path: &Path, id: &str) -> Result<(), StoreError> {
        let dir = self.file_dir(file);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write { path: dir, source })?;
        fs::write(path, format!("{}\n", id.trim())).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    // -----------------------------------------------------------------------
    // Tracked files
    // -----------------------------------------------------------------------

    /// Append `file` to the tracked list unless already present.
    ///
    /// Returns `true` if the name was appended.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the list cannot be read or appended to.
    pub fn track_file(&self, file: &str) -> Result<bool, StoreError> {
        if self.list_tracked()?.iter().any(|f| f == file) {
            return Ok(false);
        }

        fs::create_dir_all(&self.orbi_dir).map_err(|source| StoreError::Write {
            path: self.orbi_dir.clone(),
            source,
        })?;

        let path = self.tracked_path();
        let mut handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        handle
            .write_all(format!("{file}\n").as_bytes())
            .and_then(|()| handle.flush())
            .map_err(|source| StoreError::Write { path, source })?;
        Ok(true)
    }

    /// Tracked basenames in first-insertion order. Empty when nothing has
    /// been tracked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the list exists but is unreadable.
    pub fn list_tracked(&self) -> Result<Vec<String>, StoreError> {
        let path = self.tracked_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let mut files: Vec<String> = Vec::new();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !files.iter().any(|f| f == line) {
                files.push(line.to_string());
            }
        }
        Ok(files)
    }
}

fn read_pointer(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            let id = content.trim();
            Ok((!id.is_empty()).then(|| id.to_string()))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
