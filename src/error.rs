//! Error taxonomy for manifest patching.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a patch, rewrite or commit.
///
/// Structural errors (`Section*`, `DuplicatePath`, `InvalidPath`,
/// `GroupNotFound`) are raised before any byte is written.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("section {section} not found: missing `{marker}`")]
    SectionNotFound {
        section: &'static str,
        marker: String,
    },

    #[error("section {section} is ambiguous: `{marker}` occurs {count} times")]
    SectionAmbiguous {
        section: &'static str,
        marker: String,
        count: usize,
    },

    #[error("section {section} ends before it begins")]
    SectionOutOfOrder { section: &'static str },

    #[error("path already registered: {0}")]
    DuplicatePath(String),

    #[error("invalid file path: {0:?}")]
    InvalidPath(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write backup {backup}: {source}")]
    BackupWriteFailed {
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path} (previous content kept in {backup}): {source}")]
    CommitWriteFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no backup at {backup}")]
    BackupMissing { backup: PathBuf },
}

impl PatchError {
    /// Backup holding the pre-mutation content, when one was written.
    pub fn backup_path(&self) -> Option<&PathBuf> {
        match self {
            Self::CommitWriteFailed { backup, .. } => Some(backup),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
