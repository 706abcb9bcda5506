/// A manifest table the patcher reads from or writes into.
///
/// Each kind is delimited by `/* Begin <name> section */` and
/// `/* End <name> section */` comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    FileReference,
    BuildFile,
    Group,
    SourcesBuildPhase,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        Self::BuildFile,
        Self::FileReference,
        Self::Group,
        Self::SourcesBuildPhase,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::FileReference => "PBXFileReference",
            Self::BuildFile => "PBXBuildFile",
            Self::Group => "PBXGroup",
            Self::SourcesBuildPhase => "PBXSourcesBuildPhase",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn begin_marker(&self) -> String {
        format!("/* Begin {} section */", self.name())
    }

    pub fn end_marker(&self) -> String {
        format!("/* End {} section */", self.name())
    }
}

/// A located section.
///
/// `start` is the offset of the begin marker and `end` the offset of the end
/// marker. `insert_at` is the start of the line holding the end marker, where
/// new entries go so they keep the table's indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan<'a> {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
    pub insert_at: usize,
    /// Both markers and everything between them.
    pub raw: &'a str,
}

impl SectionSpan<'_> {
    /// Offset of the first byte after the begin marker.
    pub fn body_start(&self) -> usize {
        self.start + self.kind.begin_marker().len()
    }
}
