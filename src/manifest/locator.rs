//! Section location by explicit marker offsets.
//!
//! [`SectionIndex::scan`] walks the manifest once and records every
//! `/* Begin X section */` and `/* End X section */` marker it sees. Sections
//! are then resolved from the index, so a patch touching four sections still
//! reads the text a single time. A marker seen more than once is an error:
//! inserting at the wrong occurrence would corrupt the file.

use std::collections::HashMap;

use super::blocks::scan_blocks;
use crate::error::{PatchError, Result};
use crate::models::{SectionKind, SectionSpan};

#[derive(Debug, Default, Clone)]
struct Markers {
    begins: Vec<usize>,
    ends: Vec<usize>,
}

/// Positions of every section marker in a manifest.
#[derive(Debug, Default, Clone)]
pub struct SectionIndex {
    markers: HashMap<String, Markers>,
}

impl SectionIndex {
    pub fn scan(text: &str) -> Self {
        let mut markers: HashMap<String, Markers> = HashMap::new();

        for (at, _) in text.match_indices("/* ") {
            let rest = &text[at + 3..];
            let (is_begin, rest) = if let Some(rest) = rest.strip_prefix("Begin ") {
                (true, rest)
            } else if let Some(rest) = rest.strip_prefix("End ") {
                (false, rest)
            } else {
                continue;
            };

            let name = rest.split(char::is_whitespace).next().unwrap_or_default();
            if name.is_empty() || !rest[name.len()..].starts_with(" section */") {
                continue;
            }

            let entry = markers.entry(name.to_string()).or_default();
            if is_begin {
                entry.begins.push(at);
            } else {
                entry.ends.push(at);
            }
        }

        Self { markers }
    }

    /// Names of every section with at least one marker, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.markers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn locate<'a>(&self, text: &'a str, kind: SectionKind) -> Result<SectionSpan<'a>> {
        let section = kind.name();
        let found = self.markers.get(section).cloned().unwrap_or_default();

        let start = single(section, &found.begins, kind.begin_marker())?;
        let end = single(section, &found.ends, kind.end_marker())?;
        if end < start {
            return Err(PatchError::SectionOutOfOrder { section });
        }

        let span = SectionSpan {
            kind,
            start,
            end,
            insert_at: line_start(text, end),
            raw: &text[start..end + kind.end_marker().len()],
        };
        tracing::debug!(section, start, end, "located section");
        Ok(span)
    }
}

fn single(section: &'static str, positions: &[usize], marker: String) -> Result<usize> {
    match positions {
        [] => Err(PatchError::SectionNotFound { section, marker }),
        [at] => Ok(*at),
        many => Err(PatchError::SectionAmbiguous {
            section,
            marker,
            count: many.len(),
        }),
    }
}

/// Locates one section. Prefer [`SectionIndex`] when several are needed.
pub fn locate(text: &str, kind: SectionKind) -> Result<SectionSpan<'_>> {
    SectionIndex::scan(text).locate(text, kind)
}

/// Start of the line containing `offset`.
pub(crate) fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// The terminator of the line containing `offset`, so inserted lines match
/// their neighbours.
pub(crate) fn line_ending(text: &str, offset: usize) -> &'static str {
    match text[offset..].find('\n') {
        Some(i) if text[..offset + i].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// How a known section looks in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    Located { entries: usize },
    Missing,
    Ambiguous { count: usize },
    OutOfOrder,
}

/// The state of every [`SectionKind`], for inspection output.
pub fn section_report(text: &str) -> Vec<(SectionKind, SectionState)> {
    let index = SectionIndex::scan(text);
    SectionKind::ALL
        .into_iter()
        .map(|kind| {
            let state = match index.locate(text, kind) {
                Ok(span) => SectionState::Located {
                    entries: scan_blocks(text, span.body_start(), span.insert_at).len(),
                },
                Err(PatchError::SectionAmbiguous { count, .. }) => {
                    SectionState::Ambiguous { count }
                }
                Err(PatchError::SectionOutOfOrder { .. }) => SectionState::OutOfOrder,
                Err(_) => SectionState::Missing,
            };
            (kind, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "// !$*UTF8*$!\n{\n\tobjects = {\n\n\
/* Begin PBXBuildFile section */\n\
\t\tAAAAAAAAAAAAAAAAAAAAAAAA /* A.swift in Sources */ = {isa = PBXBuildFile; fileRef = BBBBBBBBBBBBBBBBBBBBBBBB /* A.swift */; };\n\
/* End PBXBuildFile section */\n\n\
/* Begin PBXFileReference section */\n\
/* End PBXFileReference section */\n\
\t};\n}\n";

    #[test]
    fn test_locates_span_and_insertion_point() {
        let span = locate(TEXT, SectionKind::BuildFile).unwrap();
        assert!(span.raw.starts_with("/* Begin PBXBuildFile section */"));
        assert!(span.raw.ends_with("/* End PBXBuildFile section */"));
        assert_eq!(span.insert_at, span.end);
        assert_eq!(&TEXT[span.insert_at..span.insert_at + 6], "/* End");
    }

    #[test]
    fn test_insertion_point_is_start_of_indented_end_line() {
        let text = "\t/* Begin PBXGroup section */\n\t/* End PBXGroup section */\n";
        let span = locate(text, SectionKind::Group).unwrap();
        assert_eq!(span.end, span.insert_at + 1);
        assert_eq!(span.body_start(), "\t/* Begin PBXGroup section */".len() + 1);
    }

    #[test]
    fn test_missing_section() {
        let err = locate(TEXT, SectionKind::Group).unwrap_err();
        assert!(matches!(
            err,
            PatchError::SectionNotFound { section: "PBXGroup", .. }
        ));
    }

    #[test]
    fn test_missing_end_marker() {
        let text = "/* Begin PBXGroup section */\n";
        let err = locate(text, SectionKind::Group).unwrap_err();
        match err {
            PatchError::SectionNotFound { marker, .. } => {
                assert_eq!(marker, "/* End PBXGroup section */")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_line_ending_follows_the_line() {
        let text = "a\r\nb\nc";
        assert_eq!(line_ending(text, 0), "\r\n");
        assert_eq!(line_ending(text, 3), "\n");
        assert_eq!(line_ending(text, 5), "\n");
    }

    #[test]
    fn test_repeated_marker_is_ambiguous() {
        let text = format!("{TEXT}/* End PBXFileReference section */\n");
        let err = locate(&text, SectionKind::FileReference).unwrap_err();
        assert!(matches!(err, PatchError::SectionAmbiguous { count: 2, .. }));
    }

    #[test]
    fn test_end_before_begin() {
        let text = "/* End PBXGroup section */\n/* Begin PBXGroup section */\n";
        assert!(matches!(
            locate(text, SectionKind::Group),
            Err(PatchError::SectionOutOfOrder { .. })
        ));
    }

    #[test]
    fn test_index_records_unknown_sections() {
        let index = SectionIndex::scan(TEXT);
        assert_eq!(index.names(), vec!["PBXBuildFile", "PBXFileReference"]);
    }

    #[test]
    fn test_section_report() {
        let report = section_report(TEXT);
        assert_eq!(report[0], (SectionKind::BuildFile, SectionState::Located { entries: 1 }));
        assert_eq!(report[1], (SectionKind::FileReference, SectionState::Located { entries: 0 }));
        assert_eq!(report[2], (SectionKind::Group, SectionState::Missing));
    }
}
