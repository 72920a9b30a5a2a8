//! Higher-level repository actions over the dataset database.
//!
//! This crate composes the staged/working/committed three-state model into
//! the commit protocol: it takes a repository's staged and working roots,
//! folds in an in-progress merge if there is one, and records the result
//! against the current branch head.
//!
//! Table diffing, conflict detection, foreign-key validation, and
//! super-schema propagation are external collaborators reached through the
//! [`RootOps`] trait; this crate owns only their ordering and error
//! mapping.
//!
//! # Modules
//!
//! - [`error`] — The [`ActionError`] taxonomy
//! - [`traits`] — [`RepoStateReader`], [`RepoStateWriter`], [`RootOps`]
//! - [`memory`] — In-memory [`MemoryRepoState`] for tests
//! - [`config`] — User identity lookup
//! - [`commit_staged`] — The staged-commit composer

pub mod commit_staged;
pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use commit_staged::{commit_staged, CommitStagedProps};
pub use config::{resolve_identity, Config, MemoryConfig, USER_EMAIL_KEY, USER_NAME_KEY};
pub use error::{ActionError, ActionResult};
pub use memory::MemoryRepoState;
pub use traits::{RepoStateReader, RepoStateWriter, RootOps};
