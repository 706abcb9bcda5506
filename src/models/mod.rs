//! Domain models for pbxpatch.
//!
//! # Core Concepts
//!
//! - [`LogicalFile`]: a source file the caller wants registered, identified by
//!   its path. Carries the display name used in entry comments.
//! - [`Identifier`]: a 24 digit uppercase hexadecimal object key. The typed
//!   wrappers [`ReferenceId`], [`MembershipId`] and [`GroupId`] keep the roles
//!   apart so a build-file identifier can never be rendered as a file reference.
//! - [`SectionKind`] / [`SectionSpan`]: the `/* Begin X section */` tables the
//!   patcher writes into.
//! - [`Entry`]: one rendered line (or group block) ready for insertion.
//!
//! Everything here is ephemeral. The manifest text is the only persisted state.

mod entry;
mod file;
mod identifier;
mod section;

pub use entry::*;
pub use file::*;
pub use identifier::*;
pub use section::*;
