//! Foundation types for strata.
//!
//! This crate provides the core identity and control types used throughout
//! the strata system. Every other strata crate depends on `strata-types`.
//!
//! # Key Types
//!
//! - [`Hash`] — Fixed-width content digest addressing chunks and values
//! - [`Timestamp`] — Millisecond wall-clock timestamp with a total order
//! - [`CancelToken`] — Cooperative cancellation threaded through blocking calls

pub mod cancel;
pub mod error;
pub mod hash;
pub mod timestamp;

pub use cancel::{CancelToken, Canceled};
pub use error::TypeError;
pub use hash::{Hash, HASH_LEN};
pub use timestamp::Timestamp;
