//! Register source files in Xcode project manifests (`project.pbxproj`).
//!
//! The manifest is patched as text: sections are located by their
//! `/* Begin X section */` markers, new entries are rendered with freshly
//! minted identifiers and inserted before each section's end marker, and the
//! result is written back after the previous content is saved to a backup.
//!
//! ```no_run
//! use pbxpatch::{LogicalFile, ManifestPatcher, PatchOptions, Project};
//!
//! # fn main() -> pbxpatch::Result<()> {
//! let project = Project::open("App.xcodeproj/project.pbxproj");
//! let files = vec![LogicalFile::new("Sources/Core/EventBus.swift")?];
//! let mut patcher = ManifestPatcher::new(PatchOptions::default());
//! let registration = project.register(&mut patcher, &files)?;
//! println!("backup: {}", registration.commit.backup.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod models;
pub mod project;
pub mod store;

pub use error::{PatchError, Result};
pub use manifest::{ManifestPatcher, PatchOptions, PathRewrite};
pub use models::{Identifier, LogicalFile, PathStyle, SectionKind};
pub use project::{Project, Registration};
