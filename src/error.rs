use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

/// Errors surfaced by the builder, the template rewriter, and drivers.
#[derive(Debug, Error)]
pub enum SqlBuilderError {
    /// One or more placeholders had no enabled binding when an executable
    /// rewrite was requested. Carries every missing name, sorted.
    #[error("Missing SQL parameter: [{}]", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    /// Failure reported by a custom driver during prepare, execute or fetch.
    #[error("Driver error: {0}")]
    DriverError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Failure while releasing a statement or cursor, raised only after a
    /// best-effort release of whatever else could be released.
    #[error("Closing failed: {0}")]
    CloseFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// `generated_last_key` found no generated keys to read.
    #[error("No generated keys are available")]
    EmptyGeneratedKeys,

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}
