use thiserror::Error;

/// Errors from repository actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Commits require a message.
    #[error("commit message empty")]
    EmptyMessage,

    /// Nothing is staged, no merge is active, and empty commits were not
    /// allowed.
    #[error("nothing to commit")]
    NothingToCommit,

    /// A merge is in progress with unresolved conflicts.
    #[error("tables in conflict: {}", .tables.join(", "))]
    MergeHasConflicts { tables: Vec<String> },

    /// No user name configured.
    #[error("name not configured")]
    NameNotConfigured,

    /// No user email configured.
    #[error("email not configured")]
    EmailNotConfigured,

    /// Foreign-key validation rejected the staged root.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Failure from the repository-state backend.
    #[error("repo state error: {0}")]
    State(String),

    /// Failure from the database.
    #[error(transparent)]
    Db(#[from] strata_db::DbError),
}

/// Result alias for repository actions.
pub type ActionResult<T> = Result<T, ActionError>;
