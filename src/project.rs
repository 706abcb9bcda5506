use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::manifest::{
    rewrite_paths, section_report, IdentifierSource, ManifestPatcher, PathRewrite, Patched,
    Rewritten, SectionIndex, SectionState,
};
use crate::models::{LogicalFile, SectionKind};
use crate::store::{self, CommitReport, DEFAULT_BACKUP_SUFFIX};

/// A manifest file on disk and where its backup goes.
///
/// Every mutating operation reads the file fresh, patches in memory and only
/// then goes through [`store::commit`]. A failed patch never touches the disk.
#[derive(Debug, Clone)]
pub struct Project {
    path: PathBuf,
    backup_suffix: String,
}

/// A patch that was written to disk.
#[derive(Debug, Clone)]
pub struct Registration {
    pub patched: Patched,
    pub commit: CommitReport,
}

impl Project {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
        }
    }

    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        store::backup_path(&self.path, &self.backup_suffix)
    }

    pub fn read(&self) -> Result<String> {
        store::read_manifest(&self.path)
    }

    /// Patches the manifest in memory without writing anything.
    pub fn preview<S: IdentifierSource>(
        &self,
        patcher: &mut ManifestPatcher<S>,
        files: &[LogicalFile],
    ) -> Result<Patched> {
        let text = self.read()?;
        patcher.patch(&text, files)
    }

    pub fn register<S: IdentifierSource>(
        &self,
        patcher: &mut ManifestPatcher<S>,
        files: &[LogicalFile],
    ) -> Result<Registration> {
        let patched = self.preview(patcher, files)?;
        let commit = store::commit(&self.path, &patched.text, &self.backup_suffix)?;
        for registered in &patched.registered {
            tracing::info!(path = %registered.path, reference = %registered.reference, "registered file");
        }
        Ok(Registration { patched, commit })
    }

    pub fn preview_rewrite(&self, rules: &[PathRewrite]) -> Result<Rewritten> {
        let text = self.read()?;
        rewrite_paths(&text, rules)
    }

    /// Rewrites file reference paths. Nothing is written when no rule matched.
    pub fn rewrite(&self, rules: &[PathRewrite]) -> Result<(Rewritten, Option<CommitReport>)> {
        let rewritten = self.preview_rewrite(rules)?;
        if rewritten.changes.is_empty() {
            return Ok((rewritten, None));
        }
        let commit = store::commit(&self.path, &rewritten.text, &self.backup_suffix)?;
        Ok((rewritten, Some(commit)))
    }

    pub fn restore(&self) -> Result<PathBuf> {
        store::restore(&self.path, &self.backup_suffix)
    }

    pub fn sections(&self) -> Result<Vec<(SectionKind, SectionState)>> {
        let text = self.read()?;
        Ok(section_report(&text))
    }

    /// Sections present in the manifest that pbxpatch never edits.
    pub fn other_sections(&self) -> Result<Vec<String>> {
        let text = self.read()?;
        Ok(SectionIndex::scan(&text)
            .names()
            .into_iter()
            .filter(|name| SectionKind::from_name(name).is_none())
            .map(str::to_string)
            .collect())
    }
}
