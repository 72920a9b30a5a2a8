//! User identity configuration.
//!
//! Commits are attributed to a configured name and email; missing
//! configuration surfaces as a distinct error per key so callers can point
//! the user at the exact setting to fix.

use std::collections::BTreeMap;

use crate::error::{ActionError, ActionResult};

/// Config key for the committing user's name.
pub const USER_NAME_KEY: &str = "user.name";

/// Config key for the committing user's email.
pub const USER_EMAIL_KEY: &str = "user.email";

/// Read access to string configuration.
pub trait Config: Send + Sync {
    /// Look up a config value by key.
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Resolve the committing identity from config.
pub fn resolve_identity(cfg: &dyn Config) -> ActionResult<(String, String)> {
    let name = cfg
        .get_string(USER_NAME_KEY)
        .ok_or(ActionError::NameNotConfigured)?;
    let email = cfg
        .get_string(USER_EMAIL_KEY)
        .ok_or(ActionError::EmailNotConfigured)?;
    Ok((name, email))
}

/// An in-memory [`Config`] for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryConfig {
    values: BTreeMap<String, String>,
}

impl MemoryConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl Config for MemoryConfig {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_configured_identity() {
        let cfg = MemoryConfig::new()
            .with(USER_NAME_KEY, "Ada")
            .with(USER_EMAIL_KEY, "ada@example.com");
        let (name, email) = resolve_identity(&cfg).unwrap();
        assert_eq!(name, "Ada");
        assert_eq!(email, "ada@example.com");
    }

    #[test]
    fn missing_name() {
        let cfg = MemoryConfig::new().with(USER_EMAIL_KEY, "ada@example.com");
        assert!(matches!(
            resolve_identity(&cfg).unwrap_err(),
            ActionError::NameNotConfigured
        ));
    }

    #[test]
    fn missing_email() {
        let cfg = MemoryConfig::new().with(USER_NAME_KEY, "Ada");
        assert!(matches!(
            resolve_identity(&cfg).unwrap_err(),
            ActionError::EmailNotConfigured
        ));
    }
}
