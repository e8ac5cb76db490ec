//! Per-call request configuration

use serde::{Deserialize, Serialize};

/// How the response payload should be delivered to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Decode the body as JSON.
    #[default]
    Json,
    /// Deliver the body as raw bytes.
    Blob,
}

/// Configuration applied to a single dispatched request.
///
/// Constructed fresh per call; there is no persisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    /// Suppress the global error broadcast on a non-401 failure.
    pub ignore_error: bool,
    /// Send stored credentials (cookies) with the request.
    pub with_credentials: bool,
    /// Complete the result stream after its first value.
    pub auto_close: bool,
    /// Query parameters appended to the request URL.
    pub params: Vec<(String, String)>,
    /// Payload delivery format.
    pub response_format: ResponseFormat,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            ignore_error: false,
            with_credentials: true,
            auto_close: true,
            params: Vec::new(),
            response_format: ResponseFormat::Json,
        }
    }
}

impl RequestOptions {
    /// Creates options with the documented defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the global error broadcast for this call.
    #[must_use]
    pub const fn ignore_errors(mut self) -> Self {
        self.ignore_error = true;
        self
    }

    /// Sends the request without stored credentials.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.with_credentials = false;
        self
    }

    /// Keeps the result stream open after the first value.
    #[must_use]
    pub const fn keep_open(mut self) -> Self {
        self.auto_close = false;
        self
    }

    /// Requests the payload as raw bytes.
    #[must_use]
    pub const fn blob(mut self) -> Self {
        self.response_format = ResponseFormat::Blob;
        self
    }

    /// Replaces the query parameters for this call.
    #[must_use]
    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Appends a single query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}
