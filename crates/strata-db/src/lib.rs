//! The dataset database: named references over an immutable commit DAG.
//!
//! A database maps symbolic dataset names to commits. History is a Merkle
//! DAG: each commit records a payload value ref, a set of parent commit
//! refs, and metadata, all content-addressed. The only mutable state in
//! the whole system is the chunk store's root (the hash of the current
//! [`DatasetMap`]), advanced exclusively by compare-and-swap.
//!
//! # Architecture
//!
//! - Datasets are handed out as inert [`Dataset`] snapshots; they never
//!   mutate and freely outlive the heads they observed.
//! - Commits are optimistic: writers compose and store the commit chunk
//!   first, then race to install a new dataset map. Losers get the winning
//!   head back inside the error, so retry is a plain re-call.
//! - Per dataset name, successful commits form a total order given by the
//!   root-CAS sequence. Across names there is no promised ordering.
//!
//! # Modules
//!
//! - [`error`] — The [`DbError`] taxonomy
//! - [`names`] — Dataset name grammar
//! - [`commit`] — [`Commit`] and [`CommitMeta`]
//! - [`map`] — The persisted [`DatasetMap`]
//! - [`dataset`] — Inert [`Dataset`] handles
//! - [`database`] — [`Database`] and the commit protocol
//! - [`history`] — Ancestor checks and time-sorted listings

pub mod commit;
pub mod database;
pub mod dataset;
pub mod error;
pub mod history;
pub mod map;
pub mod names;

pub use commit::{Commit, CommitMeta, COMMIT_STRUCT};
pub use database::{CommitOptions, Database, RetryPolicy};
pub use dataset::Dataset;
pub use error::{DbError, DbResult};
pub use history::{is_ancestor, time_sorted_commits};
pub use map::{DatasetMap, DATASET_MAP_STRUCT};
pub use names::{is_valid_dataset_name, validate_dataset_name};
