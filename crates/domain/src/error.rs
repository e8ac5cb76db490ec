//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("Invalid HTTP method: {0}")]
    UnsupportedMethod(String),

    /// The sort order is neither "asc" nor "desc".
    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
