//! Transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port using the reqwest
//! library. It handles all HTTP communication for the data-access layer.

use futures::stream;
use reqwest::{Client, Method, header};
use serde_json::Value;

use relay_application::ports::{CallOptions, Payload, Transport, TransportFailure, TransportStream};
use relay_domain::ResponseFormat;

/// Transport implementation wrapping `reqwest::Client`.
///
/// Each port call issues exactly one HTTP request and delivers a
/// single-item stream: the decoded payload, or a structured failure
/// carrying the status code and the error body as the server sent it.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - Cookie store: enabled, so `with_credentials` has stored
    ///   credentials to send
    /// - User-Agent: "Relay/0.1.0"
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be created.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Relay/0.1.0")
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a transport around a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        options: CallOptions,
    ) -> TransportStream {
        let client = self.client.clone();
        let url = url.to_string();

        Box::pin(stream::once(async move {
            let mut builder = client.request(method, &url);
            if !options.params.is_empty() {
                builder = builder.query(&options.params);
            }
            if !options.with_credentials {
                // An explicit empty Cookie header keeps the client's jar
                // out of this request; reqwest only injects stored
                // cookies when the header is absent.
                builder = builder.header(header::COOKIE, "");
            }
            if let Some(body) = &body {
                builder = builder.json(body);
            }

            tracing::debug!(url = %url, "transport call");
            let response = builder.send().await.map_err(network_failure)?;
            let status = response.status();
            if !status.is_success() {
                return Err(error_failure(status.as_u16(), response).await);
            }

            match options.response_format {
                ResponseFormat::Json => {
                    let value = response.json::<Value>().await.map_err(network_failure)?;
                    Ok(Payload::Json(value))
                }
                ResponseFormat::Blob => {
                    let bytes = response.bytes().await.map_err(network_failure)?;
                    Ok(Payload::Blob(bytes))
                }
            }
        }))
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, options: CallOptions) -> TransportStream {
        self.dispatch(Method::GET, url, None, options)
    }

    fn delete(&self, url: &str, options: CallOptions) -> TransportStream {
        self.dispatch(Method::DELETE, url, None, options)
    }

    fn post(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
        self.dispatch(Method::POST, url, body, options)
    }

    fn put(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
        self.dispatch(Method::PUT, url, body, options)
    }

    fn patch(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
        self.dispatch(Method::PATCH, url, body, options)
    }
}

/// Maps a reqwest-level failure (connect, timeout, invalid URL, body
/// decode) to a status-0 structured failure.
fn network_failure(error: reqwest::Error) -> TransportFailure {
    tracing::warn!(error = %error, "network-level failure");
    TransportFailure {
        status: 0,
        body: Some(Value::String(error.to_string())),
    }
}

/// Builds the structured failure for a non-2xx response, preserving the
/// error body: JSON when it parses, the raw text otherwise.
async fn error_failure(status: u16, response: reqwest::Response) -> TransportFailure {
    let bytes = response.bytes().await.unwrap_or_default();
    let body = if bytes.is_empty() {
        None
    } else {
        serde_json::from_slice(&bytes).ok().or_else(|| {
            Some(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        })
    };
    TransportFailure { status, body }
}
