use std::fmt;

/// What an [`Entry`] registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    FileReference,
    BuildFile,
    GroupChild,
    BuildPhaseMember,
    Group,
}

/// Rendered manifest text for one object or membership, newline terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    text: String,
}

impl Entry {
    pub(crate) fn new(kind: EntryKind, text: String) -> Self {
        Self { kind, text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
