use thiserror::Error;

/// Error type for pghttp operations.
///
/// Payloads are plain strings so that one execution outcome can be shared by
/// every consumer of the same [`Query`](crate::Query).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PgHttpError {
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Transport failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status. Displays the raw body.
    #[error("{message}")]
    QueryFailed { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cannot decode {value:?} as type {type_oid}: {reason}")]
    Decode {
        type_oid: u32,
        value: String,
        reason: String,
    },

    #[error("begin only accepts queries built by the client (item {index} is {kind})")]
    NotPreparable { index: usize, kind: &'static str },

    #[error("Template needs one more segment than values, got {segments} segment(s) and {values} value(s)")]
    InvalidTemplate { segments: usize, values: usize },

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

impl From<reqwest::Error> for PgHttpError {
    fn from(err: reqwest::Error) -> Self {
        PgHttpError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for PgHttpError {
    fn from(err: serde_json::Error) -> Self {
        PgHttpError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for PgHttpError {
    fn from(err: url::ParseError) -> Self {
        PgHttpError::InvalidConnectionString(err.to_string())
    }
}

/// Result type alias for pghttp operations
pub type Result<T> = std::result::Result<T, PgHttpError>;
