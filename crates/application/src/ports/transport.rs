//! Transport port

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;

use relay_domain::ResponseFormat;

/// Options forwarded to the transport for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOptions {
    /// Send stored credentials (cookies) with the call.
    pub with_credentials: bool,
    /// Query parameters to append to the URL.
    pub params: Vec<(String, String)>,
    /// Payload format the caller expects back.
    pub response_format: ResponseFormat,
}

/// A successfully delivered response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A decoded JSON document.
    Json(Value),
    /// Raw response bytes.
    Blob(Bytes),
}

impl Payload {
    /// A short name for the payload format, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Blob(_) => "blob",
        }
    }
}

/// A structured transport failure.
///
/// `status` is the HTTP status code, or 0 when the call never produced
/// a response (connect error, timeout, invalid URL). `body` is the
/// response body as the server sent it, when one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    /// HTTP status code, 0 for network-level failures.
    pub status: u16,
    /// The error response body, any JSON shape.
    pub body: Option<Value>,
}

/// One item delivered by a transport stream.
pub type TransportResult = Result<Payload, TransportFailure>;

/// The asynchronous result of a transport call.
///
/// Most transports deliver exactly one item, but the contract allows
/// multi-value streams for long-lived subscriptions.
pub type TransportStream = Pin<Box<dyn Stream<Item = TransportResult> + Send>>;

/// Port for method-based request execution.
///
/// This trait abstracts the HTTP client implementation, allowing the
/// dispatcher to be independent of specific HTTP libraries. It is
/// object-safe so transports can be shared as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Issues a GET request.
    fn get(&self, url: &str, options: CallOptions) -> TransportStream;

    /// Issues a DELETE request.
    fn delete(&self, url: &str, options: CallOptions) -> TransportStream;

    /// Issues a POST request.
    fn post(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream;

    /// Issues a PUT request.
    fn put(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream;

    /// Issues a PATCH request.
    fn patch(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream;
}
