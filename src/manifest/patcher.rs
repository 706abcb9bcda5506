//! Registration of files into a manifest.

use std::collections::{HashMap, HashSet};

use super::blocks::{scan_blocks, Block};
use super::edit::EditPlan;
use super::ids::{IdentifierGenerator, IdentifierSource, RandomSource};
use super::locator::{line_ending, SectionIndex};
use super::render::{
    render_build_file, render_build_phase_member, render_file_reference, render_group,
    render_group_child, with_line_ending,
};
use crate::error::{PatchError, Result};
use crate::models::{
    Entry, GroupId, Identifier, LogicalFile, MembershipId, PathStyle, ReferenceId, SectionKind,
    SectionSpan,
};

/// How files are registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOptions {
    pub path_style: PathStyle,
    /// Also place each file in the group mirroring its directory, creating
    /// missing groups.
    pub register_groups: bool,
    /// The sources build phase to add files to. Required when the manifest
    /// has more than one.
    pub build_phase: Option<Identifier>,
}

/// Identifiers minted for one registered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub path: String,
    pub reference: ReferenceId,
    pub membership: MembershipId,
}

/// A group created because no existing group mirrored its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGroup {
    pub path: String,
    pub group: GroupId,
}

/// Result of a successful patch. The input text is never modified.
#[derive(Debug, Clone)]
pub struct Patched {
    pub text: String,
    pub registered: Vec<Registered>,
    pub groups: Vec<CreatedGroup>,
}

/// Inserts file references, build files, build phase members and optionally
/// group memberships for a batch of files.
///
/// Every section is located and every entry rendered before the text is
/// touched; a failure anywhere returns an error and no text.
pub struct ManifestPatcher<S = RandomSource> {
    options: PatchOptions,
    source: S,
}

impl ManifestPatcher<RandomSource> {
    pub fn new(options: PatchOptions) -> Self {
        Self::with_source(options, RandomSource)
    }
}

impl<S: IdentifierSource> ManifestPatcher<S> {
    pub fn with_source(options: PatchOptions, source: S) -> Self {
        Self { options, source }
    }

    pub fn options(&self) -> &PatchOptions {
        &self.options
    }

    pub fn patch(&mut self, text: &str, files: &[LogicalFile]) -> Result<Patched> {
        let grouped = self.options.register_groups;
        // A group carries its directory, so its files are referenced by name.
        let style = if grouped {
            PathStyle::FileName
        } else {
            self.options.path_style
        };
        let index = SectionIndex::scan(text);

        let references = index.locate(text, SectionKind::FileReference)?;
        let groups = if grouped {
            Some(index.locate(text, SectionKind::Group)?)
        } else {
            index.locate(text, SectionKind::Group).ok()
        };
        let existing = registered_paths(text, &references, groups.as_ref());
        check_duplicates(files, &existing, grouped, style)?;

        let build_files = index.locate(text, SectionKind::BuildFile)?;
        let phase = index.locate(text, SectionKind::SourcesBuildPhase)?;
        let phase_close = self.select_build_phase(text, &phase)?;
        let eol = line_ending(text, references.insert_at);

        let mut ids = IdentifierGenerator::for_manifest(text, &mut self.source);
        let mut plan = EditPlan::new();
        let mut reference_batch = String::new();
        let mut build_file_batch = String::new();
        let mut phase_batch = String::new();
        let mut registered = Vec::with_capacity(files.len());

        for file in files {
            let (reference, membership) = ids.mint_pair();
            let name = file.name();
            reference_batch.push_str(render_file_reference(file, &reference, style).as_str());
            build_file_batch
                .push_str(render_build_file(&reference, &membership, name).as_str());
            phase_batch.push_str(render_build_phase_member(&membership, name).as_str());

            tracing::debug!(
                path = file.path(),
                reference = %reference,
                membership = %membership,
                "minted identifiers"
            );
            registered.push(Registered {
                path: file.path().to_string(),
                reference,
                membership,
            });
        }

        plan.insert(build_files.insert_at, with_line_ending(&build_file_batch, eol));
        plan.insert(references.insert_at, with_line_ending(&reference_batch, eol));
        plan.insert(phase_close, with_line_ending(&phase_batch, eol));

        let created = match groups.filter(|_| grouped) {
            Some(span) => {
                let mut wiring = GroupWiring::new(text, &span)?;
                for (file, reg) in files.iter().zip(&registered) {
                    wiring.attach(file, &reg.reference, &mut ids)?;
                }
                wiring.finish(&span, &mut plan, eol)
            }
            None => Vec::new(),
        };

        Ok(Patched {
            text: plan.apply(text),
            registered,
            groups: created,
        })
    }

    /// Offset of the `);` line closing the selected phase's `files` list.
    fn select_build_phase(&self, text: &str, phase: &SectionSpan<'_>) -> Result<usize> {
        let section = SectionKind::SourcesBuildPhase.name();
        let blocks = scan_blocks(text, phase.body_start(), phase.insert_at);
        let candidates: Vec<&Block<'_>> = match &self.options.build_phase {
            Some(id) => blocks.iter().filter(|b| &b.id == id).collect(),
            None => blocks.iter().collect(),
        };

        let block = match candidates.as_slice() {
            [block] => *block,
            [] => {
                return Err(PatchError::SectionNotFound {
                    section,
                    marker: self
                        .options
                        .build_phase
                        .as_ref()
                        .map_or_else(|| "build phase block".to_string(), Identifier::to_string),
                })
            }
            many => {
                return Err(PatchError::SectionAmbiguous {
                    section,
                    marker: "build phase block".to_string(),
                    count: many.len(),
                })
            }
        };

        block
            .list("files")
            .map(|files| files.close)
            .ok_or_else(|| PatchError::SectionNotFound {
                section,
                marker: format!("{} files = (", block.id),
            })
    }
}

/// Rejects repeated input paths and files the manifest already references.
///
/// Files are compared by the path they resolve to from the project root.
/// Under groups that is the full input path; otherwise it is the path written
/// into an ungrouped reference.
fn check_duplicates(
    files: &[LogicalFile],
    registered: &HashSet<String>,
    grouped: bool,
    style: PathStyle,
) -> Result<()> {
    let mut inputs = HashSet::new();
    let mut resolved = HashSet::new();
    for file in files {
        let target = if grouped {
            file.path()
        } else {
            file.manifest_path(style)
        };
        if !inputs.insert(file.path()) || !resolved.insert(target) || registered.contains(target)
        {
            return Err(PatchError::DuplicatePath(file.path().to_string()));
        }
    }
    Ok(())
}

/// Paths of existing file references as seen from the project root: each
/// reference's `path` joined under the `path` of every enclosing group, up to
/// the first one not relative to its parent.
fn registered_paths(
    text: &str,
    references: &SectionSpan<'_>,
    groups: Option<&SectionSpan<'_>>,
) -> HashSet<String> {
    let group_blocks = groups
        .map(|span| scan_blocks(text, span.body_start(), span.insert_at))
        .unwrap_or_default();
    let mut parents: HashMap<&Identifier, usize> = HashMap::new();
    for (index, block) in group_blocks.iter().enumerate() {
        if let Some(children) = block.list("children") {
            for item in &children.items {
                parents.entry(&item.id).or_insert(index);
            }
        }
    }

    let mut paths = HashSet::new();
    for block in scan_blocks(text, references.body_start(), references.insert_at) {
        let Some(path) = block.value("path") else {
            continue;
        };
        let mut parts = vec![path];
        if relative_to_group(&block) {
            let mut next = parents.get(&block.id).copied();
            let mut hops = 0;
            while let Some(index) = next {
                let group = &group_blocks[index];
                if let Some(dir) = group.value("path") {
                    parts.push(dir);
                }
                hops += 1;
                if !relative_to_group(group) || hops > group_blocks.len() {
                    break;
                }
                next = parents.get(&group.id).copied();
            }
        }
        parts.reverse();
        paths.insert(parts.join("/"));
    }
    paths
}

fn relative_to_group(block: &Block<'_>) -> bool {
    block
        .value("sourceTree")
        .map_or(true, |tree| tree == "<group>")
}

/// Where a directory's files go: an existing group block or one created in
/// this patch (index into `GroupWiring::created`).
#[derive(Debug, Clone, Copy)]
enum Target {
    Existing(usize),
    Created(usize),
}

struct PendingGroup {
    path: String,
    name: String,
    id: GroupId,
    children: Vec<Entry>,
}

/// Plans group memberships. Every insertion for a group (its block and the
/// line linking it into its parent) is collected here and handed to the plan
/// together in [`GroupWiring::finish`].
struct GroupWiring<'t> {
    blocks: Vec<Block<'t>>,
    by_id: HashMap<Identifier, usize>,
    main: usize,
    created: Vec<PendingGroup>,
    created_by_path: HashMap<String, usize>,
    /// Child lines for existing groups, keyed by the `children` close offset.
    existing_children: Vec<(usize, Entry)>,
}

impl<'t> GroupWiring<'t> {
    fn new(text: &'t str, span: &SectionSpan<'t>) -> Result<Self> {
        let blocks = scan_blocks(text, span.body_start(), span.insert_at);
        let by_id = blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (block.id.clone(), i))
            .collect::<HashMap<_, _>>();

        let main_id = main_group(text)?;
        let main = *by_id
            .get(&main_id)
            .ok_or_else(|| PatchError::GroupNotFound(format!("main group {main_id}")))?;

        Ok(Self {
            blocks,
            by_id,
            main,
            created: Vec::new(),
            created_by_path: HashMap::new(),
            existing_children: Vec::new(),
        })
    }

    fn attach<S: IdentifierSource>(
        &mut self,
        file: &LogicalFile,
        reference: &ReferenceId,
        ids: &mut IdentifierGenerator<S>,
    ) -> Result<()> {
        let components: Vec<&str> = file
            .directory()
            .map(|dir| dir.split('/').collect())
            .unwrap_or_default();

        let target = self.resolve(&components, ids)?;
        let child = render_group_child(reference.identifier(), file.name());
        match target {
            Target::Existing(index) => {
                let close = children_close(&self.blocks[index])?;
                self.existing_children.push((close, child));
            }
            Target::Created(index) => self.created[index].children.push(child),
        }
        Ok(())
    }

    /// Walks `components` down from the main group, creating groups for the
    /// part of the path no existing group mirrors.
    fn resolve<S: IdentifierSource>(
        &mut self,
        components: &[&str],
        ids: &mut IdentifierGenerator<S>,
    ) -> Result<Target> {
        let mut current = Target::Existing(self.main);
        let mut consumed = 0;

        while consumed < components.len() {
            let prefix = components[..=consumed].join("/");
            if let Some(&index) = self.created_by_path.get(&prefix) {
                current = Target::Created(index);
                consumed += 1;
                continue;
            }

            match current {
                Target::Existing(parent) => {
                    match self.find_child_group(parent, &components[consumed..])? {
                        Some((child, depth)) => {
                            current = Target::Existing(child);
                            consumed += depth;
                        }
                        None => {
                            let index = self.create(prefix, components[consumed], ids);
                            let link = self.link_line(index);
                            let close = children_close(&self.blocks[parent])?;
                            self.existing_children.push((close, link));
                            current = Target::Created(index);
                            consumed += 1;
                        }
                    }
                }
                Target::Created(parent) => {
                    let index = self.create(prefix, components[consumed], ids);
                    let link = self.link_line(index);
                    self.created[parent].children.push(link);
                    current = Target::Created(index);
                    consumed += 1;
                }
            }
        }

        Ok(current)
    }

    /// The child group of `parent` whose path matches the leading components
    /// of `remaining`, with the number of components it covers. Groups with
    /// only a `name` mirror no directory and never match.
    fn find_child_group(
        &self,
        parent: usize,
        remaining: &[&str],
    ) -> Result<Option<(usize, usize)>> {
        let Some(children) = self.blocks[parent].list("children") else {
            return Ok(None);
        };

        let mut matches = Vec::new();
        for item in &children.items {
            let Some(&child) = self.by_id.get(&item.id) else {
                continue;
            };
            let block = &self.blocks[child];
            let Some(label) = block.value("path") else {
                continue;
            };
            let parts: Vec<&str> = label.split('/').filter(|p| !p.is_empty()).collect();
            if !parts.is_empty() && remaining.starts_with(&parts) {
                matches.push((child, parts.len()));
            }
        }

        match matches.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(PatchError::SectionAmbiguous {
                section: SectionKind::Group.name(),
                marker: format!("group {}", remaining[0]),
                count: many.len(),
            }),
        }
    }

    fn create<S: IdentifierSource>(
        &mut self,
        path: String,
        name: &str,
        ids: &mut IdentifierGenerator<S>,
    ) -> usize {
        let id = ids.mint_group();
        tracing::debug!(path = %path, group = %id, "creating group");
        let index = self.created.len();
        self.created_by_path.insert(path.clone(), index);
        self.created.push(PendingGroup {
            path,
            name: name.to_string(),
            id,
            children: Vec::new(),
        });
        index
    }

    fn link_line(&self, index: usize) -> Entry {
        let group = &self.created[index];
        render_group_child(group.id.identifier(), &group.name)
    }

    fn finish(self, span: &SectionSpan<'_>, plan: &mut EditPlan, eol: &str) -> Vec<CreatedGroup> {
        for (close, child) in self.existing_children {
            plan.insert(close, with_line_ending(child.as_str(), eol));
        }

        let mut created = Vec::with_capacity(self.created.len());
        for group in self.created {
            plan.insert(
                span.insert_at,
                with_line_ending(
                    render_group(&group.id, &group.name, &group.children).as_str(),
                    eol,
                ),
            );
            created.push(CreatedGroup {
                path: group.path,
                group: group.id,
            });
        }
        created
    }
}

fn children_close(block: &Block<'_>) -> Result<usize> {
    block
        .list("children")
        .map(|children| children.close)
        .ok_or_else(|| {
            PatchError::GroupNotFound(format!("{} has no children list", block.id))
        })
}

/// The project's root group, from its single `mainGroup = ID;` property.
fn main_group(text: &str) -> Result<Identifier> {
    const KEY: &str = "mainGroup = ";

    let found: Vec<Identifier> = text
        .match_indices(KEY)
        .filter_map(|(at, _)| {
            let rest = &text[at + KEY.len()..];
            Identifier::parse(rest.get(..Identifier::LEN)?)
        })
        .collect();

    match found.as_slice() {
        [id] => Ok(id.clone()),
        [] => Err(PatchError::GroupNotFound("mainGroup".to_string())),
        many => Err(PatchError::SectionAmbiguous {
            section: "PBXProject",
            marker: KEY.trim_end().to_string(),
            count: many.len(),
        }),
    }
}
