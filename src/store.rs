//! Backup-and-commit of manifest files.
//!
//! The backup is always written first. A manifest is only overwritten once
//! its pre-mutation bytes are safely on disk at `<path>.<suffix>`.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

pub const DEFAULT_BACKUP_SUFFIX: &str = "bak";
const TEMP_SUFFIX: &str = "pbxpatch-tmp";

/// Outcome of a successful [`commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub manifest: PathBuf,
    pub backup: PathBuf,
    pub bytes_written: usize,
}

/// `<original>.<suffix>`, e.g. `project.pbxproj.bak`.
pub fn backup_path(original: &Path, suffix: &str) -> PathBuf {
    with_suffix(original, suffix)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

pub fn read_manifest(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| PatchError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Snapshots the current content of `original` to its backup path, then
/// replaces `original` with `patched`.
///
/// An existing backup is overwritten with the most recent snapshot.
pub fn commit(original: &Path, patched: &str, suffix: &str) -> Result<CommitReport> {
    let snapshot = fs::read(original).map_err(|source| PatchError::ManifestRead {
        path: original.to_path_buf(),
        source,
    })?;

    let backup = backup_path(original, suffix);
    write_atomic(&backup, &snapshot).map_err(|source| PatchError::BackupWriteFailed {
        backup: backup.clone(),
        source,
    })?;

    write_atomic(original, patched.as_bytes()).map_err(|source| {
        PatchError::CommitWriteFailed {
            path: original.to_path_buf(),
            backup: backup.clone(),
            source,
        }
    })?;

    tracing::info!(
        manifest = %original.display(),
        backup = %backup.display(),
        bytes = patched.len(),
        "committed manifest"
    );
    Ok(CommitReport {
        manifest: original.to_path_buf(),
        backup,
        bytes_written: patched.len(),
    })
}

/// Writes the backup content back over `original`. Returns the backup path.
pub fn restore(original: &Path, suffix: &str) -> Result<PathBuf> {
    let backup = backup_path(original, suffix);
    let content = fs::read(&backup).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => PatchError::BackupMissing {
            backup: backup.clone(),
        },
        _ => PatchError::ManifestRead {
            path: backup.clone(),
            source,
        },
    })?;

    write_atomic(original, &content).map_err(|source| PatchError::CommitWriteFailed {
        path: original.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;

    tracing::info!(manifest = %original.display(), backup = %backup.display(), "restored manifest");
    Ok(backup)
}

/// Writes through a sibling temp file and renames it into place, so readers
/// see either the old or the new content.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = with_suffix(path, TEMP_SUFFIX);
    let result = (|| {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        let path = Path::new("/tmp/App.xcodeproj/project.pbxproj");
        assert_eq!(
            backup_path(path, "bak"),
            PathBuf::from("/tmp/App.xcodeproj/project.pbxproj.bak")
        );
        assert_eq!(
            backup_path(path, "missing_files_backup"),
            PathBuf::from("/tmp/App.xcodeproj/project.pbxproj.missing_files_backup")
        );
    }

    #[test]
    fn test_commit_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.pbxproj");
        fs::write(&path, "before").unwrap();

        commit(&path, "after", DEFAULT_BACKUP_SUFFIX).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2, "unexpected files: {names:?}");
    }
}
