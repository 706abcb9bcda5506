//! Manifest text surgery: locating sections, minting identifiers, rendering
//! entries and planning insertions.

mod blocks;
mod edit;
pub mod ids;
pub mod locator;
pub mod patcher;
pub mod render;
pub mod rewrite;

pub use ids::{IdentifierGenerator, IdentifierSource, RandomSource, SequentialSource};
pub use locator::{locate, section_report, SectionIndex, SectionState};
pub use patcher::{CreatedGroup, ManifestPatcher, PatchOptions, Patched, Registered};
pub use rewrite::{rewrite_paths, PathChange, PathRewrite, Rewritten};
