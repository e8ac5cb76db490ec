//! Miscellaneous response shapes

use serde::{Deserialize, Serialize};

/// The `{ "message": ... }` acknowledgement returned by delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable acknowledgement from the server.
    pub message: String,
}
