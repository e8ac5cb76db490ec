//! Application error types

use thiserror::Error;

use relay_domain::DomainError;

use crate::ports::FileSaverError;

/// Errors surfaced to callers of the data-access layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A dispatched request failed; `message` is the classified,
    /// human-readable form also broadcast on the error channel.
    #[error("{message}")]
    Request {
        /// HTTP status code, or 0 when the call never reached the server.
        status: u16,
        /// Classified error message.
        message: String,
    },

    /// The method name given to the string-based entry point is not
    /// dispatchable. No call was made.
    #[error(transparent)]
    InvalidMethod(#[from] DomainError),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),

    /// The response payload could not be deserialized into the
    /// requested type.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// The transport delivered a payload in the wrong format.
    #[error("expected a {expected} payload, got {got}")]
    UnexpectedPayload {
        /// Format the caller asked for.
        expected: &'static str,
        /// Format the transport delivered.
        got: &'static str,
    },

    /// The transport stream ended without delivering a value.
    #[error("transport stream ended without a response")]
    NoResponse,

    /// Handing a downloaded payload to the file-save collaborator failed.
    #[error(transparent)]
    FileSave(#[from] FileSaverError),
}

impl ApiError {
    /// The HTTP status associated with this error, when there is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for data-access operations.
pub type ApiResult<T> = Result<T, ApiError>;
