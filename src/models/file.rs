use serde::{Deserialize, Serialize};

use crate::error::{PatchError, Result};

/// A source file to register, addressed by the path the caller committed to.
///
/// The path is either project-relative (`Sources/Core/Foo.swift`) or a bare
/// file name. Its final component is the display name written into entry
/// comments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalFile {
    path: String,
    name_start: usize,
}

impl LogicalFile {
    /// Normalizes and validates a caller-supplied path.
    ///
    /// Leading `./` segments are dropped. Empty paths, paths ending in `/`
    /// and paths with empty components are rejected.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let raw = path.into();
        let mut path = raw.trim();
        while let Some(rest) = path.strip_prefix("./") {
            path = rest;
        }

        if path.is_empty() || path.ends_with('/') || path.split('/').any(str::is_empty) {
            return Err(PatchError::InvalidPath(raw));
        }

        let name_start = path.rfind('/').map_or(0, |i| i + 1);
        Ok(Self {
            path: path.to_string(),
            name_start,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path component, e.g. `Foo.swift`.
    pub fn name(&self) -> &str {
        &self.path[self.name_start..]
    }

    /// Directory part of the path, `None` for bare file names.
    pub fn directory(&self) -> Option<&str> {
        if self.name_start == 0 {
            None
        } else {
            Some(&self.path[..self.name_start - 1])
        }
    }

    pub fn file_type(&self) -> FileType {
        let extension = self.name().rsplit_once('.').map(|(_, ext)| ext);
        extension.map_or(FileType::Text, FileType::from_extension)
    }

    /// The path value written into the file reference for this file.
    pub fn manifest_path(&self, style: PathStyle) -> &str {
        match style {
            PathStyle::AsGiven => self.path(),
            PathStyle::FileName => self.name(),
        }
    }
}

/// Which form of a file's path is written into its file reference.
///
/// - `AsGiven`: the path exactly as the caller supplied it
/// - `FileName`: only the final component, relative to the enclosing group
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    #[default]
    AsGiven,
    FileName,
}

impl PathStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AsGiven => "as_given",
            Self::FileName => "file_name",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "as_given" | "as-given" => Some(Self::AsGiven),
            "file_name" | "file-name" => Some(Self::FileName),
            _ => None,
        }
    }
}

/// The `lastKnownFileType` of a file reference, inferred from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Swift,
    C,
    CHeader,
    ObjC,
    ObjCpp,
    Cpp,
    CppHeader,
    Metal,
    Text,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swift => "sourcecode.swift",
            Self::C => "sourcecode.c.c",
            Self::CHeader => "sourcecode.c.h",
            Self::ObjC => "sourcecode.c.objc",
            Self::ObjCpp => "sourcecode.cpp.objcpp",
            Self::Cpp => "sourcecode.cpp.cpp",
            Self::CppHeader => "sourcecode.cpp.h",
            Self::Metal => "sourcecode.metal",
            Self::Text => "text",
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "swift" => Self::Swift,
            "c" => Self::C,
            "h" => Self::CHeader,
            "m" => Self::ObjC,
            "mm" => Self::ObjCpp,
            "cpp" | "cc" | "cxx" => Self::Cpp,
            "hpp" | "hh" => Self::CppHeader,
            "metal" => Self::Metal,
            _ => Self::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_directory() {
        let file = LogicalFile::new("Sources/Core/Foo.swift").unwrap();
        assert_eq!(file.name(), "Foo.swift");
        assert_eq!(file.directory(), Some("Sources/Core"));

        let bare = LogicalFile::new("Foo.swift").unwrap();
        assert_eq!(bare.name(), "Foo.swift");
        assert_eq!(bare.directory(), None);
    }

    #[test]
    fn test_strips_leading_dot_segments() {
        let file = LogicalFile::new("./Sources/Foo.swift").unwrap();
        assert_eq!(file.path(), "Sources/Foo.swift");
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for path in ["", "   ", "Sources/", "Sources//Foo.swift", "/Foo.swift"] {
            assert!(
                matches!(LogicalFile::new(path), Err(PatchError::InvalidPath(_))),
                "accepted {path:?}"
            );
        }
    }

    #[test]
    fn test_file_type_from_extension() {
        let cases = [
            ("Foo.swift", FileType::Swift),
            ("Wrapper.c", FileType::C),
            ("SherpaTypes.h", FileType::CHeader),
            ("Bridge.mm", FileType::ObjCpp),
            ("README", FileType::Text),
        ];
        for (path, expected) in cases {
            assert_eq!(LogicalFile::new(path).unwrap().file_type(), expected);
        }
    }

    #[test]
    fn test_manifest_path_follows_style() {
        let file = LogicalFile::new("Sources/Core/Foo.swift").unwrap();
        assert_eq!(file.manifest_path(PathStyle::AsGiven), "Sources/Core/Foo.swift");
        assert_eq!(file.manifest_path(PathStyle::FileName), "Foo.swift");
    }
}
