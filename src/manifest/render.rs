//! Entry rendering and the manifest's string escaping rules.
//!
//! Every renderer is a pure function of its arguments: the same inputs give
//! byte-identical output. Table entries use two tabs of indentation and end
//! in `};`, list items use four tabs and end in `,`, matching what Xcode
//! writes around them.

use std::borrow::Cow;

use crate::models::{
    Entry, EntryKind, GroupId, Identifier, LogicalFile, MembershipId, PathStyle, ReferenceId,
};

/// The build phase name carried in build-file comments.
const PHASE_NAME: &str = "Sources";

/// Quotes a string value, escaping backslashes, quotes and control characters.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Reverses [`quote`]. Unquoted values are returned as they are.
pub fn unquote(raw: &str) -> Cow<'_, str> {
    let raw = raw.trim();
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return Cow::Borrowed(raw);
    };
    if !inner.contains('\\') {
        return Cow::Borrowed(inner);
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

/// Rendered text with its `\n` terminators replaced by `eol`.
pub fn with_line_ending(rendered: &str, eol: &str) -> String {
    if eol == "\n" {
        rendered.to_string()
    } else {
        rendered.replace('\n', eol)
    }
}

/// Text safe to place between `/*` and `*/`.
fn comment(text: &str) -> Cow<'_, str> {
    if text.contains("*/") || text.contains('\n') {
        Cow::Owned(text.replace("*/", "* /").replace('\n', " "))
    } else {
        Cow::Borrowed(text)
    }
}

pub fn render_file_reference(file: &LogicalFile, reference: &ReferenceId, style: PathStyle) -> Entry {
    let text = format!(
        "\t\t{} /* {} */ = {{isa = PBXFileReference; lastKnownFileType = {}; path = {}; sourceTree = \"<group>\"; }};\n",
        reference,
        comment(file.name()),
        file.file_type().as_str(),
        quote(file.manifest_path(style)),
    );
    Entry::new(EntryKind::FileReference, text)
}

pub fn render_build_file(
    reference: &ReferenceId,
    membership: &MembershipId,
    display_name: &str,
) -> Entry {
    let name = comment(display_name);
    let text = format!(
        "\t\t{membership} /* {name} in {PHASE_NAME} */ = {{isa = PBXBuildFile; fileRef = {reference} /* {name} */; }};\n"
    );
    Entry::new(EntryKind::BuildFile, text)
}

/// A `children = ( ... )` item. Children are file references or groups.
pub fn render_group_child(child: &Identifier, display_name: &str) -> Entry {
    let text = format!("\t\t\t\t{} /* {} */,\n", child, comment(display_name));
    Entry::new(EntryKind::GroupChild, text)
}

pub fn render_build_phase_member(membership: &MembershipId, display_name: &str) -> Entry {
    let text = format!(
        "\t\t\t\t{} /* {} in {PHASE_NAME} */,\n",
        membership,
        comment(display_name)
    );
    Entry::new(EntryKind::BuildPhaseMember, text)
}

/// A complete `PBXGroup` block whose path is `name`, relative to its parent.
pub fn render_group(group: &GroupId, name: &str, children: &[Entry]) -> Entry {
    let mut text = format!(
        "\t\t{} /* {} */ = {{\n\t\t\tisa = PBXGroup;\n\t\t\tchildren = (\n",
        group,
        comment(name)
    );
    for child in children {
        text.push_str(child.as_str());
    }
    text.push_str("\t\t\t);\n");
    text.push_str(&format!("\t\t\tpath = {};\n", quote(name)));
    text.push_str("\t\t\tsourceTree = \"<group>\";\n\t\t};\n");
    Entry::new(EntryKind::Group, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ids::{IdentifierGenerator, SequentialSource};

    fn ids() -> IdentifierGenerator<SequentialSource> {
        IdentifierGenerator::new(SequentialSource::new(0xAB))
    }

    #[test]
    fn test_file_reference_line() {
        let mut ids = ids();
        let reference = ids.mint_reference();
        let file = LogicalFile::new("Sources/Core/Foo.swift").unwrap();
        let entry = render_file_reference(&file, &reference, PathStyle::AsGiven);
        assert_eq!(
            entry.as_str(),
            "\t\t000000AB0000000000000001 /* Foo.swift */ = {isa = PBXFileReference; \
             lastKnownFileType = sourcecode.swift; path = \"Sources/Core/Foo.swift\"; \
             sourceTree = \"<group>\"; };\n"
        );
    }

    #[test]
    fn test_build_file_links_reference() {
        let mut ids = ids();
        let (reference, membership) = ids.mint_pair();
        let entry = render_build_file(&reference, &membership, "Foo.swift");
        assert_eq!(
            entry.as_str(),
            "\t\t000000AB0000000000000002 /* Foo.swift in Sources */ = {isa = PBXBuildFile; \
             fileRef = 000000AB0000000000000001 /* Foo.swift */; };\n"
        );
    }

    #[test]
    fn test_list_items() {
        let mut ids = ids();
        let (reference, membership) = ids.mint_pair();
        assert_eq!(
            render_group_child(reference.identifier(), "Foo.swift").as_str(),
            "\t\t\t\t000000AB0000000000000001 /* Foo.swift */,\n"
        );
        assert_eq!(
            render_build_phase_member(&membership, "Foo.swift").as_str(),
            "\t\t\t\t000000AB0000000000000002 /* Foo.swift in Sources */,\n"
        );
    }

    #[test]
    fn test_group_block() {
        let mut ids = ids();
        let reference = ids.mint_reference();
        let group = ids.mint_group();
        let child = render_group_child(reference.identifier(), "Foo.swift");
        let entry = render_group(&group, "Core", &[child]);
        assert_eq!(
            entry.as_str(),
            "\t\t000000AB0000000000000002 /* Core */ = {\n\
             \t\t\tisa = PBXGroup;\n\
             \t\t\tchildren = (\n\
             \t\t\t\t000000AB0000000000000001 /* Foo.swift */,\n\
             \t\t\t);\n\
             \t\t\tpath = \"Core\";\n\
             \t\t\tsourceTree = \"<group>\";\n\
             \t\t};\n"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let mut ids = ids();
        let reference = ids.mint_reference();
        let file = LogicalFile::new("A.swift").unwrap();
        assert_eq!(
            render_file_reference(&file, &reference, PathStyle::AsGiven),
            render_file_reference(&file, &reference, PathStyle::AsGiven)
        );
    }

    #[test]
    fn test_quote_round_trip_with_escapes() {
        let raw = "My \"Docs\"\\notes.txt";
        let quoted = quote(raw);
        assert_eq!(quoted, "\"My \\\"Docs\\\"\\\\notes.txt\"");
        assert_eq!(unquote(&quoted), raw);
        assert_eq!(unquote("Sources"), "Sources");
    }

    #[test]
    fn test_comment_cannot_close_early() {
        let mut ids = ids();
        let membership = ids.mint_membership();
        let entry = render_build_phase_member(&membership, "weird*/name.c");
        assert!(entry.as_str().contains("/* weird* /name.c in Sources */"));
    }
}
