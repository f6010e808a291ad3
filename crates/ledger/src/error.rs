use thiserror::Error;

/// Errors that can occur when interacting with the movement ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The movement is internally inconsistent (e.g. quantity does not match
    /// the before/after totals).
    #[error("Invalid movement: {0}")]
    InvalidMovement(String),

    /// Unknown movement type string.
    #[error("Unknown movement type: {0}")]
    UnknownMovementType(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
