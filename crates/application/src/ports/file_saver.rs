//! File-save port

use thiserror::Error;

/// Errors from the file-save collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileSaverError {
    /// Writing the file failed.
    #[error("failed to save {filename}: {message}")]
    Io {
        /// Name the file was to be saved under.
        filename: String,
        /// Underlying io error description.
        message: String,
    },
}

/// Port for persisting a downloaded payload.
///
/// `save` is a synchronous fire-and-forget side effect; the dispatcher
/// calls it exactly once per successful blob download.
pub trait FileSaver: Send + Sync {
    /// Persists `bytes` under `filename` with the given MIME type.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be persisted.
    fn save(&self, bytes: &[u8], filename: &str, mime_type: &str) -> Result<(), FileSaverError>;
}
