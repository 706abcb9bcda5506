use std::collections::HashSet;
use std::fmt;

/// A manifest object key: 24 uppercase hexadecimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(pub(crate) String);

impl Identifier {
    pub const LEN: usize = 24;

    /// Parses a token, accepting only exactly 24 uppercase hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == Self::LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b));
        valid.then(|| Self(s.to_string()))
    }

    /// Every identifier-shaped token in `text`.
    ///
    /// Tokens are maximal runs of ASCII alphanumerics, so hex digits inside a
    /// longer word never count.
    pub fn scan(text: &str) -> HashSet<Identifier> {
        text.split(|c: char| !c.is_ascii_alphanumeric())
            .filter_map(Self::parse)
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a file reference (`PBXFileReference`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceId(pub(crate) Identifier);

/// Identifies a file's membership in the build phase (`PBXBuildFile`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MembershipId(pub(crate) Identifier);

/// Identifies a group (`PBXGroup`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) Identifier);

impl ReferenceId {
    pub fn identifier(&self) -> &Identifier {
        &self.0
    }
}

impl MembershipId {
    pub fn identifier(&self) -> &Identifier {
        &self.0
    }
}

impl GroupId {
    pub fn identifier(&self) -> &Identifier {
        &self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for MembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
