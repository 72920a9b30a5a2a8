//! Dataset name validation.
//!
//! Valid dataset names:
//! - Must be non-empty
//! - Every character must be ASCII alphanumeric or one of `_`, `/`, `-`, `.`
//!
//! Anything else (whitespace, shell metacharacters, non-ASCII) is
//! rejected so that names never confuse the persisted-map key encoding.
//! Passing an invalid name to the database is a programmer error: callers
//! are expected to validate untrusted input with [`is_valid_dataset_name`]
//! before handing it over.

/// Returns `true` if `name` is a valid dataset name.
///
/// # Examples
///
/// ```
/// use strata_db::names::is_valid_dataset_name;
///
/// assert!(is_valid_dataset_name("foo"));
/// assert!(is_valid_dataset_name("foo/bar"));
/// assert!(!is_valid_dataset_name(""));
/// assert!(!is_valid_dataset_name("f!!"));
/// ```
pub fn is_valid_dataset_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | '-' | '.'))
}

/// Panic unless `name` is a valid dataset name.
///
/// Invalid names are unrecoverable programmer errors, distinct from the
/// typed conflict channel.
pub fn validate_dataset_name(name: &str) {
    if !is_valid_dataset_name(name) {
        panic!("invalid dataset name: {name:?}");
    }
}
