//! Structured values and their canonical codec.
//!
//! Values are typed, structurally recursive data: strings, unsigned
//! integers, typed refs, sets of refs, and named structs. Every value has a
//! canonical serialization and therefore a stable content hash; equal values
//! hash identically regardless of the order their containers were built in.
//!
//! The [`Codec`] ties the value model to chunk storage: it encodes values
//! under a [`Format`] version tag, writes them as chunks, and reads them
//! back through typed [`Ref`]s. All values in a store share one format; two
//! values only compare equal under the same format.
//!
//! # Modules
//!
//! - [`error`] — Error types for codec operations
//! - [`value`] — [`Value`], [`Ref`], [`RefSet`], [`StructValue`], [`TypeTag`]
//! - [`codec`] — [`Format`] and the [`Codec`] itself

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{Codec, Format};
pub use error::{CodecError, CodecResult};
pub use value::{Ref, RefSet, StructValue, TypeTag, Value};
