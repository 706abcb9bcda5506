//! Rewriting the paths of already-registered file references.
//!
//! Rules only touch `path` values of entries inside the file-reference
//! section. Identical strings elsewhere in the manifest (group paths,
//! comments, build settings) are left alone.

use serde::{Deserialize, Serialize};

use super::blocks::scan_blocks;
use super::edit::EditPlan;
use super::locator::locate;
use super::render::quote;
use crate::error::Result;
use crate::models::{Identifier, SectionKind};

/// A path substitution.
///
/// - `Exact`: replace a path equal to `from` with `to`
/// - `Prefix`: replace the leading `from` of a path with `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathRewrite {
    Exact { from: String, to: String },
    Prefix { from: String, to: String },
}

impl PathRewrite {
    pub fn apply(&self, path: &str) -> Option<String> {
        match self {
            Self::Exact { from, to } => (path == from.as_str()).then(|| to.clone()),
            Self::Prefix { from, to } => path
                .strip_prefix(from.as_str())
                .map(|rest| format!("{to}{rest}")),
        }
    }
}

/// One changed file reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub reference: Identifier,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Rewritten {
    pub text: String,
    pub changes: Vec<PathChange>,
    /// Rules that matched no file reference.
    pub unmatched: Vec<PathRewrite>,
}

/// Applies `rules` to every file reference path. The first matching rule wins
/// for each reference.
pub fn rewrite_paths(text: &str, rules: &[PathRewrite]) -> Result<Rewritten> {
    let span = locate(text, SectionKind::FileReference)?;
    let mut plan = EditPlan::new();
    let mut changes = Vec::new();
    let mut hits = vec![0usize; rules.len()];

    for block in scan_blocks(text, span.body_start(), span.insert_at) {
        let (Some(prop), Some(current)) = (block.prop("path"), block.value("path")) else {
            continue;
        };
        let Some((rule, to)) = rules
            .iter()
            .enumerate()
            .find_map(|(i, rule)| rule.apply(&current).map(|to| (i, to)))
        else {
            continue;
        };
        if to == current {
            continue;
        }

        hits[rule] += 1;
        plan.replace(prop.start, prop.end, quote(&to));
        changes.push(PathChange {
            reference: block.id.clone(),
            from: current,
            to,
        });
    }

    let unmatched: Vec<PathRewrite> = rules
        .iter()
        .zip(&hits)
        .filter(|(_, count)| **count == 0)
        .map(|(rule, _)| rule.clone())
        .collect();
    for rule in &unmatched {
        tracing::warn!(?rule, "rewrite rule matched no file reference");
    }

    Ok(Rewritten {
        text: plan.apply(text),
        changes,
        unmatched,
    })
}
