//! Dictionary blocks keyed by identifier, inside a located section.
//!
//! Recognizes the two shapes Xcode writes:
//!
//! ```text
//! 		ID /* Foo.swift */ = {isa = PBXFileReference; path = Foo.swift; };
//! 		ID /* Core */ = {
//! 			isa = PBXGroup;
//! 			children = (
//! 				ID /* Foo.swift */,
//! 			);
//! 			path = Core;
//! 		};
//! ```
//!
//! This is a line scanner, not a grammar: anything else is skipped.

use super::render::unquote;
use crate::models::Identifier;

/// A `key = value;` pair. `start..end` locates `value` in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub start: usize,
    pub end: usize,
}

/// One item of a `( ... )` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem<'a> {
    pub id: Identifier,
    pub comment: &'a str,
}

/// A multi-line `key = ( ... );` list. `close` is the start of the `);` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSpan<'a> {
    pub key: &'a str,
    pub items: Vec<ListItem<'a>>,
    pub close: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    pub id: Identifier,
    pub comment: &'a str,
    /// Start of the block's first line.
    pub start: usize,
    /// First byte after the block's last line.
    pub end: usize,
    pub props: Vec<Prop<'a>>,
    pub lists: Vec<ListSpan<'a>>,
}

impl<'a> Block<'a> {
    pub fn prop(&self, key: &str) -> Option<&Prop<'a>> {
        self.props.iter().find(|p| p.key == key)
    }

    /// A property value with quoting removed.
    pub fn value(&self, key: &str) -> Option<String> {
        self.prop(key).map(|p| unquote(p.value).into_owned())
    }

    pub fn list(&self, key: &str) -> Option<&ListSpan<'a>> {
        self.lists.iter().find(|l| l.key == key)
    }
}

/// Scans `text[from..to]` for blocks. Offsets in the result are absolute.
pub fn scan_blocks(text: &str, from: usize, to: usize) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();
    let mut current: Option<Block<'_>> = None;
    let mut list: Option<ListSpan<'_>> = None;
    let mut depth = 0usize;

    for (offset, line) in lines(text, from, to) {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();

        let Some(block) = current.as_mut() else {
            if let Some((id, comment, body)) = parse_header(trimmed) {
                let body_offset = offset + indent + (trimmed.len() - body.len());
                let mut block = Block {
                    id,
                    comment,
                    start: offset,
                    end: offset + line.len(),
                    props: Vec::new(),
                    lists: Vec::new(),
                };
                match body.trim_end().strip_suffix("};") {
                    Some(inline) => {
                        block.props = parse_props(inline, body_offset);
                        block.end = line_end(text, offset + line.len(), to);
                        blocks.push(block);
                    }
                    None if body.trim().is_empty() => {
                        depth = 0;
                        current = Some(block);
                    }
                    None => {}
                }
            }
            continue;
        };

        if let Some(open) = list.as_mut() {
            if trimmed == ");" || trimmed == ")," {
                open.close = offset;
                if let Some(done) = list.take() {
                    block.lists.push(done);
                }
            } else if let Some(item) = parse_list_item(trimmed) {
                open.items.push(item);
            }
            continue;
        }

        if trimmed == "};" {
            if depth == 0 {
                block.end = line_end(text, offset + line.len(), to);
                if let Some(done) = current.take() {
                    blocks.push(done);
                }
            } else {
                depth -= 1;
            }
            continue;
        }

        if depth > 0 {
            if trimmed.ends_with("= {") {
                depth += 1;
            }
            continue;
        }

        if let Some(key) = trimmed.strip_suffix("= (").map(str::trim_end) {
            list = Some(ListSpan {
                key,
                items: Vec::new(),
                close: offset,
            });
        } else if trimmed.ends_with("= {") {
            depth += 1;
        } else {
            block.props.extend(parse_props(trimmed, offset + indent));
        }
    }

    blocks
}

/// Lines of `text[from..to]` paired with their absolute offsets, without
/// line terminators.
fn lines(text: &str, from: usize, to: usize) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = from;
    text[from..to].split_inclusive('\n').map(move |chunk| {
        let start = offset;
        offset += chunk.len();
        (start, chunk.trim_end_matches(['\n', '\r']))
    })
}

/// Offset just past the newline that ends the line at `pos`.
fn line_end(text: &str, pos: usize, limit: usize) -> usize {
    match text[pos..limit].find('\n') {
        Some(i) => pos + i + 1,
        None => limit,
    }
}

/// `ID /* comment */ = {rest` → `(ID, comment, rest)`.
fn parse_header(line: &str) -> Option<(Identifier, &str, &str)> {
    let id = Identifier::parse(line.get(..Identifier::LEN)?)?;
    let mut rest = line[Identifier::LEN..].trim_start();
    let mut comment = "";
    if let Some(after) = rest.strip_prefix("/*") {
        let close = after.find("*/")?;
        comment = after[..close].trim();
        rest = after[close + 2..].trim_start();
    }
    let body = rest.strip_prefix('=')?.trim_start().strip_prefix('{')?;
    Some((id, comment, body))
}

/// `ID /* comment */,` → list item.
fn parse_list_item(line: &str) -> Option<ListItem<'_>> {
    let id = Identifier::parse(line.get(..Identifier::LEN)?)?;
    let rest = line[Identifier::LEN..].trim();
    let comment = rest
        .strip_prefix("/*")
        .and_then(|r| r.find("*/").map(|close| r[..close].trim()))
        .unwrap_or("");
    Some(ListItem { id, comment })
}

/// Parses `key = value; key = "value"; ...` starting at absolute `base`.
fn parse_props(segment: &str, base: usize) -> Vec<Prop<'_>> {
    let bytes = segment.as_bytes();
    let mut props = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' && bytes[i] != b';' {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] == b';' {
            break;
        }
        let key = segment[key_start..i].trim();
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value_start = i;
        let value_end = scan_value(bytes, &mut i);
        let value = segment[value_start..value_end].trim_end();
        props.push(Prop {
            key,
            value,
            start: base + value_start,
            end: base + value_start + value.len(),
        });

        if i < bytes.len() && bytes[i] == b';' {
            i += 1;
        }
    }

    props
}

/// Advances `i` over one value and returns where its meaningful text ends:
/// before a trailing `/* comment */` and before the terminating `;`.
fn scan_value(bytes: &[u8], i: &mut usize) -> usize {
    if *i < bytes.len() && bytes[*i] == b'"' {
        *i += 1;
        while *i < bytes.len() && bytes[*i] != b'"' {
            if bytes[*i] == b'\\' {
                *i += 1;
            }
            *i += 1;
        }
        *i = (*i + 1).min(bytes.len());
        let end = *i;
        skip_to_semicolon(bytes, i);
        return end;
    }

    if *i < bytes.len() && (bytes[*i] == b'(' || bytes[*i] == b'{') {
        let mut depth = 0usize;
        while *i < bytes.len() {
            match bytes[*i] {
                b'(' | b'{' => depth += 1,
                b')' | b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        *i += 1;
                        break;
                    }
                }
                _ => {}
            }
            *i += 1;
        }
        let end = *i;
        skip_to_semicolon(bytes, i);
        return end;
    }

    let mut end = None;
    while *i < bytes.len() && bytes[*i] != b';' {
        if bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'*') {
            end.get_or_insert(*i);
            skip_comment(bytes, i);
            continue;
        }
        *i += 1;
    }
    end.unwrap_or(*i)
}

fn skip_to_semicolon(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i] != b';' {
        if bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'*') {
            skip_comment(bytes, i);
            continue;
        }
        *i += 1;
    }
}

fn skip_comment(bytes: &[u8], i: &mut usize) {
    *i += 2;
    while *i + 1 < bytes.len() && !(bytes[*i] == b'*' && bytes[*i + 1] == b'/') {
        *i += 1;
    }
    *i = (*i + 2).min(bytes.len());
}
