//! Request dispatcher with centralized error signaling
//!
//! `ApiDispatcher` turns a method/endpoint/options/body tuple into exactly
//! one transport call, normalizes the outcome into a result stream, and
//! republishes classified failures on the shared [`ApiEvents`] channels.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use serde::de::DeserializeOwned;
use serde_json::Value;

use relay_domain::{HttpMethod, RequestOptions, ResponseFormat};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::events::ApiEvents;
use crate::ports::{CallOptions, FileSaver, Payload, Transport, TransportFailure};

/// Default MIME type for [`ApiDispatcher::download_blob`] (xlsx).
pub const SPREADSHEET_MIME: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A stream of classified results from a dispatched request.
///
/// With `auto_close` set (the default) the stream completes after its
/// first item; otherwise it stays open for every item the transport
/// delivers. Either way a single call issues exactly one transport
/// request.
pub type ResultStream<T> = Pin<Box<dyn Stream<Item = ApiResult<T>> + Send>>;

/// Dispatches requests against `base_url + controller_prefix + endpoint`.
///
/// All collaborators are injected: the transport and file-save ports, the
/// base-URL config, and the shared event channels. Cloning is cheap and
/// every clone publishes to the same channels.
#[derive(Clone)]
pub struct ApiDispatcher {
    transport: Arc<dyn Transport>,
    file_saver: Arc<dyn FileSaver>,
    events: Arc<ApiEvents>,
    config: ApiConfig,
    controller_prefix: String,
}

impl ApiDispatcher {
    /// Creates a dispatcher for one controller of the remote API.
    pub fn new(
        transport: Arc<dyn Transport>,
        file_saver: Arc<dyn FileSaver>,
        config: ApiConfig,
        controller_prefix: impl Into<String>,
        events: Arc<ApiEvents>,
    ) -> Self {
        Self {
            transport,
            file_saver,
            events,
            config,
            controller_prefix: controller_prefix.into(),
        }
    }

    /// The event channels this dispatcher publishes to.
    #[must_use]
    pub const fn events(&self) -> &Arc<ApiEvents> {
        &self.events
    }

    fn target(&self, endpoint: &str) -> String {
        format!(
            "{}{}{}",
            self.config.base_url(),
            self.controller_prefix,
            endpoint
        )
    }

    /// Dispatches a single request and returns the raw payload stream.
    ///
    /// `body` is forwarded for POST/PUT/PATCH and ignored otherwise. Every
    /// failure item is classified, published per the channel rules, and
    /// surfaced to the caller as [`ApiError::Request`].
    pub fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        options: RequestOptions,
        body: Option<Value>,
    ) -> ResultStream<Payload> {
        let url = self.target(endpoint);
        let call = CallOptions {
            with_credentials: options.with_credentials,
            params: options.params,
            response_format: options.response_format,
        };
        tracing::debug!(method = %method, url = %url, "dispatching request");

        let raw = match method {
            HttpMethod::Get => self.transport.get(&url, call),
            HttpMethod::Delete => self.transport.delete(&url, call),
            HttpMethod::Post => self.transport.post(&url, body, call),
            HttpMethod::Put => self.transport.put(&url, body, call),
            HttpMethod::Patch => self.transport.patch(&url, body, call),
        };

        let events = Arc::clone(&self.events);
        let ignore_error = options.ignore_error;
        let classified =
            raw.map(move |item| item.map_err(|failure| signal_failure(&events, &failure, ignore_error)));

        if options.auto_close {
            Box::pin(classified.take(1))
        } else {
            Box::pin(classified)
        }
    }

    /// Like [`execute`](Self::execute), but parses the method from a
    /// string. An unrecognized name fails immediately without touching
    /// the transport.
    pub fn execute_str(
        &self,
        method: &str,
        endpoint: &str,
        options: RequestOptions,
        body: Option<Value>,
    ) -> ResultStream<Payload> {
        match method.parse::<HttpMethod>() {
            Ok(method) => self.execute(method, endpoint, options, body),
            Err(error) => {
                tracing::warn!(method, "refusing to dispatch unknown method");
                Box::pin(stream::once(async move {
                    Err(ApiError::InvalidMethod(error))
                }))
            }
        }
    }

    /// Dispatches a request and deserializes each JSON payload into `T`.
    pub fn request<T>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        options: RequestOptions,
        body: Option<Value>,
    ) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Box::pin(
            self.execute(method, endpoint, options, body)
                .map(|item| item.and_then(decode)),
        )
    }

    /// Typed GET against this controller.
    pub fn get<T>(&self, endpoint: &str, options: RequestOptions) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(HttpMethod::Get, endpoint, options, None)
    }

    /// Typed DELETE against this controller.
    pub fn delete<T>(&self, endpoint: &str, options: RequestOptions) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(HttpMethod::Delete, endpoint, options, None)
    }

    /// Typed POST against this controller.
    pub fn post<T>(&self, endpoint: &str, body: Value, options: RequestOptions) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(HttpMethod::Post, endpoint, options, Some(body))
    }

    /// Typed PUT against this controller.
    pub fn put<T>(&self, endpoint: &str, body: Value, options: RequestOptions) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(HttpMethod::Put, endpoint, options, Some(body))
    }

    /// Typed PATCH against this controller.
    pub fn patch<T>(&self, endpoint: &str, body: Value, options: RequestOptions) -> ResultStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.request(HttpMethod::Patch, endpoint, options, Some(body))
    }

    /// Downloads a binary payload via POST and hands it to the file-save
    /// collaborator under the default spreadsheet MIME type.
    pub fn download_blob(&self, endpoint: &str, body: Value, filename: &str) -> ResultStream<()> {
        self.download_blob_with(endpoint, body, filename, HttpMethod::Post, SPREADSHEET_MIME)
    }

    /// Downloads a binary payload and hands it to the file-save
    /// collaborator exactly once on success. Failures propagate unchanged
    /// from [`execute`](Self::execute); the saver is not called for them.
    pub fn download_blob_with(
        &self,
        endpoint: &str,
        body: Value,
        filename: &str,
        method: HttpMethod,
        mime_type: &str,
    ) -> ResultStream<()> {
        let options = RequestOptions {
            response_format: ResponseFormat::Blob,
            ..RequestOptions::default()
        };
        let saver = Arc::clone(&self.file_saver);
        let filename = filename.to_string();
        let mime_type = mime_type.to_string();
        let body = method.has_body().then_some(body);

        Box::pin(
            self.execute(method, endpoint, options, body)
                .map(move |item| match item? {
                    Payload::Blob(bytes) => {
                        saver.save(&bytes, &filename, &mime_type)?;
                        Ok(())
                    }
                    Payload::Json(_) => Err(ApiError::UnexpectedPayload {
                        expected: "blob",
                        got: "json",
                    }),
                }),
        )
    }
}

/// Awaits the first item of a result stream, the single-value view used
/// by the CRUD operations.
pub(crate) async fn first_value<T>(mut stream: ResultStream<T>) -> ApiResult<T> {
    stream.next().await.unwrap_or(Err(ApiError::NoResponse))
}

fn decode<T: DeserializeOwned>(payload: Payload) -> ApiResult<T> {
    match payload {
        Payload::Json(value) => {
            serde_json::from_value(value).map_err(|error| ApiError::Decode(error.to_string()))
        }
        Payload::Blob(_) => Err(ApiError::UnexpectedPayload {
            expected: "json",
            got: "blob",
        }),
    }
}

fn signal_failure(events: &ApiEvents, failure: &TransportFailure, ignore_error: bool) -> ApiError {
    let message = classify_failure(failure);
    if failure.status == 401 {
        // 401 routes to the unauthorized channel only, even when the
        // caller did not ask to suppress errors.
        tracing::warn!(status = failure.status, "unauthorized response");
        events.publish_unauthorized();
    } else if ignore_error {
        tracing::debug!(status = failure.status, message = %message, "request failure suppressed");
    } else {
        tracing::warn!(status = failure.status, message = %message, "request failed");
        events.publish_error(message.clone());
    }
    ApiError::Request {
        status: failure.status,
        message,
    }
}

fn classify_failure(failure: &TransportFailure) -> String {
    let Some(body) = failure.body.as_ref().filter(|body| !body.is_null()) else {
        return format!("HTTP error! Status: {}", failure.status);
    };
    let message = match body.get("message") {
        Some(value) if !value.is_null() => value,
        _ => body,
    };
    match message {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "An unknown error occurred".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::broadcast::error::TryRecvError;

    use crate::ports::{FileSaverError, TransportResult, TransportStream};

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedCall {
        method: &'static str,
        url: String,
        body: Option<Value>,
        options: CallOptions,
    }

    /// Scripted transport: each call records its inputs and pops the next
    /// scripted batch of stream items.
    struct MockTransport {
        calls: Mutex<Vec<RecordedCall>>,
        scripts: Mutex<VecDeque<Vec<TransportResult>>>,
    }

    impl MockTransport {
        fn scripted(scripts: Vec<Vec<TransportResult>>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                scripts: Mutex::new(scripts.into()),
            }
        }

        fn single(items: Vec<TransportResult>) -> Self {
            Self::scripted(vec![items])
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        fn respond(
            &self,
            method: &'static str,
            url: &str,
            body: Option<Value>,
            options: CallOptions,
        ) -> TransportStream {
            self.calls.lock().unwrap().push(RecordedCall {
                method,
                url: url.to_string(),
                body,
                options,
            });
            let items = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
            Box::pin(stream::iter(items))
        }
    }

    impl Transport for MockTransport {
        fn get(&self, url: &str, options: CallOptions) -> TransportStream {
            self.respond("GET", url, None, options)
        }

        fn delete(&self, url: &str, options: CallOptions) -> TransportStream {
            self.respond("DELETE", url, None, options)
        }

        fn post(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
            self.respond("POST", url, body, options)
        }

        fn put(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
            self.respond("PUT", url, body, options)
        }

        fn patch(&self, url: &str, body: Option<Value>, options: CallOptions) -> TransportStream {
            self.respond("PATCH", url, body, options)
        }
    }

    #[derive(Default)]
    struct MockSaver {
        saved: Mutex<Vec<(usize, String, String)>>,
        fail: bool,
    }

    impl FileSaver for MockSaver {
        fn save(
            &self,
            bytes: &[u8],
            filename: &str,
            mime_type: &str,
        ) -> Result<(), FileSaverError> {
            if self.fail {
                return Err(FileSaverError::Io {
                    filename: filename.to_string(),
                    message: "disk full".to_string(),
                });
            }
            self.saved.lock().unwrap().push((
                bytes.len(),
                filename.to_string(),
                mime_type.to_string(),
            ));
            Ok(())
        }
    }

    struct Fixture {
        transport: Arc<MockTransport>,
        saver: Arc<MockSaver>,
        events: Arc<ApiEvents>,
        dispatcher: ApiDispatcher,
    }

    fn fixture(transport: MockTransport) -> Fixture {
        fixture_with_saver(transport, MockSaver::default())
    }

    fn fixture_with_saver(transport: MockTransport, saver: MockSaver) -> Fixture {
        let transport = Arc::new(transport);
        let saver = Arc::new(saver);
        let events = Arc::new(ApiEvents::new());
        let dispatcher = ApiDispatcher::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&saver) as Arc<dyn FileSaver>,
            ApiConfig::new("http://api.test"),
            "/users",
            Arc::clone(&events),
        );
        Fixture {
            transport,
            saver,
            events,
            dispatcher,
        }
    }

    fn failure(status: u16, body: Option<Value>) -> TransportResult {
        Err(TransportFailure { status, body })
    }

    #[tokio::test]
    async fn test_success_delivers_single_value_and_closes() {
        let fx = fixture(MockTransport::single(vec![Ok(Payload::Json(
            json!({"id": 1}),
        ))]));
        let mut stream =
            fx.dispatcher
                .execute(HttpMethod::Get, "/1", RequestOptions::default(), None);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Payload::Json(json!({"id": 1})));
        assert!(stream.next().await.is_none());

        let calls = fx.transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "GET");
        assert_eq!(calls[0].url, "http://api.test/users/1");
    }

    #[tokio::test]
    async fn test_keep_open_delivers_every_item_from_one_call() {
        let fx = fixture(MockTransport::single(vec![
            Ok(Payload::Json(json!(1))),
            Ok(Payload::Json(json!(2))),
        ]));
        let stream = fx.dispatcher.execute(
            HttpMethod::Get,
            "",
            RequestOptions::new().keep_open(),
            None,
        );

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(fx.transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_method_fails_without_transport_call() {
        let fx = fixture(MockTransport::single(vec![]));
        let mut stream =
            fx.dispatcher
                .execute_str("TRACE", "/1", RequestOptions::default(), None);

        let result = stream.next().await.unwrap();
        assert!(matches!(result, Err(ApiError::InvalidMethod(_))));
        assert!(fx.transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_routes_to_unauthorized_channel_only() {
        let fx = fixture(MockTransport::single(vec![failure(
            401,
            Some(json!({"message": "session expired"})),
        )]));
        let mut errors = fx.events.subscribe_errors();
        let mut unauthorized = fx.events.subscribe_unauthorized();

        let mut stream =
            fx.dispatcher
                .execute(HttpMethod::Get, "/me", RequestOptions::default(), None);
        let result = stream.next().await.unwrap();

        assert_eq!(
            result,
            Err(ApiError::Request {
                status: 401,
                message: "session expired".to_string()
            })
        );
        assert!(unauthorized.try_recv().is_ok());
        assert!(matches!(
            unauthorized.try_recv(),
            Err(TryRecvError::Empty)
        ));
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_unauthorized_ignores_ignore_error_flag() {
        let fx = fixture(MockTransport::single(vec![failure(401, None)]));
        let mut errors = fx.events.subscribe_errors();
        let mut unauthorized = fx.events.subscribe_unauthorized();

        let mut stream = fx.dispatcher.execute(
            HttpMethod::Get,
            "/me",
            RequestOptions::new().ignore_errors(),
            None,
        );
        assert!(stream.next().await.unwrap().is_err());

        assert!(unauthorized.try_recv().is_ok());
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_failure_publishes_classified_message_once() {
        let fx = fixture(MockTransport::single(vec![failure(
            422,
            Some(json!({"message": ["name is required", "email is invalid"]})),
        )]));
        let mut errors = fx.events.subscribe_errors();
        let mut unauthorized = fx.events.subscribe_unauthorized();

        let mut stream = fx.dispatcher.execute(
            HttpMethod::Post,
            "",
            RequestOptions::default(),
            Some(json!({})),
        );
        let result = stream.next().await.unwrap();

        let expected = "name is required\nemail is invalid".to_string();
        assert_eq!(
            result,
            Err(ApiError::Request {
                status: 422,
                message: expected.clone()
            })
        );
        assert_eq!(errors.try_recv().unwrap(), expected);
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Empty)));
        assert!(matches!(
            unauthorized.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_ignore_error_suppresses_broadcast_but_not_caller() {
        let fx = fixture(MockTransport::single(vec![failure(
            500,
            Some(json!("backend exploded")),
        )]));
        let mut errors = fx.events.subscribe_errors();
        let mut unauthorized = fx.events.subscribe_unauthorized();

        let mut stream = fx.dispatcher.execute(
            HttpMethod::Get,
            "",
            RequestOptions::new().ignore_errors(),
            None,
        );
        let result = stream.next().await.unwrap();

        assert_eq!(
            result,
            Err(ApiError::Request {
                status: 500,
                message: "backend exploded".to_string()
            })
        );
        assert!(matches!(errors.try_recv(), Err(TryRecvError::Empty)));
        assert!(matches!(
            unauthorized.try_recv(),
            Err(TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_classification_rules() {
        let message = |status, body| classify_failure(&TransportFailure { status, body });

        assert_eq!(message(500, None), "HTTP error! Status: 500");
        assert_eq!(message(500, Some(Value::Null)), "HTTP error! Status: 500");
        assert_eq!(message(400, Some(json!("plain string"))), "plain string");
        assert_eq!(message(400, Some(json!({}))), "An unknown error occurred");
        assert_eq!(message(400, Some(json!({"message": "nope"}))), "nope");
        assert_eq!(message(400, Some(json!({"message": ["a", "b"]}))), "a\nb");
        assert_eq!(message(400, Some(json!(["x", "y"]))), "x\ny");
        assert_eq!(
            message(400, Some(json!({"message": 42}))),
            "An unknown error occurred"
        );
    }

    #[tokio::test]
    async fn test_body_forwarded_only_for_body_methods() {
        let fx = fixture(MockTransport::scripted(vec![
            vec![Ok(Payload::Json(json!(null)))],
            vec![Ok(Payload::Json(json!(null)))],
        ]));

        let body = json!({"name": "Ada"});
        let _ = fx
            .dispatcher
            .execute(
                HttpMethod::Post,
                "",
                RequestOptions::default(),
                Some(body.clone()),
            )
            .next()
            .await;
        let _ = fx
            .dispatcher
            .execute(HttpMethod::Get, "", RequestOptions::default(), Some(body.clone()))
            .next()
            .await;

        let calls = fx.transport.calls();
        assert_eq!(calls[0].body, Some(body));
        assert_eq!(calls[1].body, None);
    }

    #[tokio::test]
    async fn test_call_options_forwarded() {
        let fx = fixture(MockTransport::single(vec![Ok(Payload::Json(json!([])))]));
        let options = RequestOptions::new()
            .anonymous()
            .with_param("role", "admin");

        let _ = fx
            .dispatcher
            .execute(HttpMethod::Get, "", options, None)
            .next()
            .await;

        let calls = fx.transport.calls();
        assert_eq!(
            calls[0].options,
            CallOptions {
                with_credentials: false,
                params: vec![("role".to_string(), "admin".to_string())],
                response_format: ResponseFormat::Json,
            }
        );
    }

    #[tokio::test]
    async fn test_download_blob_saves_exactly_once() {
        let fx = fixture(MockTransport::single(vec![Ok(Payload::Blob(
            Bytes::from_static(b"binary"),
        ))]));

        let mut stream = fx
            .dispatcher
            .download_blob("/export", json!({"ids": [1]}), "report.xlsx");
        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.is_none());

        let saved = fx.saver.saved.lock().unwrap().clone();
        assert_eq!(
            saved,
            vec![(6, "report.xlsx".to_string(), SPREADSHEET_MIME.to_string())]
        );
        let calls = fx.transport.calls();
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].options.response_format, ResponseFormat::Blob);
    }

    #[tokio::test]
    async fn test_download_blob_failure_never_touches_saver() {
        let fx = fixture(MockTransport::single(vec![failure(500, None)]));

        let mut stream = fx
            .dispatcher
            .download_blob("/export", json!({}), "report.xlsx");
        let result = stream.next().await.unwrap();

        assert!(matches!(result, Err(ApiError::Request { status: 500, .. })));
        assert!(fx.saver.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_blob_surfaces_saver_failure() {
        let saver = MockSaver {
            fail: true,
            ..MockSaver::default()
        };
        let fx = fixture_with_saver(
            MockTransport::single(vec![Ok(Payload::Blob(Bytes::from_static(b"x")))]),
            saver,
        );

        let mut stream = fx.dispatcher.download_blob("/export", json!({}), "r.xlsx");
        let result = stream.next().await.unwrap();
        assert!(matches!(result, Err(ApiError::FileSave(_))));
    }

    #[tokio::test]
    async fn test_typed_request_decodes_payload() {
        let fx = fixture(MockTransport::single(vec![Ok(Payload::Json(
            json!({"message": "gone"}),
        ))]));

        let stream = fx
            .dispatcher
            .delete::<relay_domain::MessageResponse>("/9", RequestOptions::default());
        let value = first_value(stream).await.unwrap();
        assert_eq!(value.message, "gone");
    }

    #[tokio::test]
    async fn test_typed_request_rejects_blob_payload() {
        let fx = fixture(MockTransport::single(vec![Ok(Payload::Blob(
            Bytes::from_static(b"x"),
        ))]));

        let stream = fx.dispatcher.get::<Value>("", RequestOptions::default());
        let result = first_value(stream).await;
        assert!(matches!(
            result,
            Err(ApiError::UnexpectedPayload {
                expected: "json",
                got: "blob"
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_transport_stream_is_no_response() {
        let fx = fixture(MockTransport::single(vec![]));
        let stream = fx.dispatcher.get::<Value>("", RequestOptions::default());
        assert!(matches!(first_value(stream).await, Err(ApiError::NoResponse)));
    }
}
