//! Error types for the rate series service.

/// Errors raised while talking to the upstream rate source.
///
/// Diagnostics are kept as strings so this crate stays free of transport
/// dependencies; adapters convert their own errors into these variants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Upstream error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed payload: {0}")]
    Malformed(String),
}

/// Per-query errors recorded in a batch response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SourceError> for AppError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Transport(msg) => AppError::Unavailable(msg),
            e @ SourceError::Upstream { .. } => AppError::Unavailable(e.to_string()),
            SourceError::Malformed(msg) => AppError::Internal(msg),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidQuery(msg) => AppError::BadRequest(msg),
            QueryError::Source(e) => e.into(),
        }
    }
}
