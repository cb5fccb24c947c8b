// =============================================================================
// StudyQuest Engine - Error Types
// =============================================================================

/// Engine error type.
///
/// Every fallible engine operation returns this. Storage failures are never
/// swallowed; they propagate through the `Database` variant.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: i64, available: i64 },

    #[error("{0} already completed")]
    AlreadyCompleted(&'static str),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// Shorthand for a missing content record (game, material, session, task).
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
