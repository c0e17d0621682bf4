//! Request dispatch
//!
//! Finalizes a `Request`, sends it through a `Transport` and turns the result
//! into a `Response` or a classified `HttpError`.
//!
//! Two independent clocks guard a dispatch. The response clock covers the wait
//! for response headers. The deadline clock covers everything, but only starts
//! being enforced once headers have arrived: whatever the first stage used is
//! subtracted from it, and the remainder races body draining plus the response
//! interceptor. Each clock is a `tokio::time::timeout` scoped to its stage, so
//! its timer is dropped as soon as that stage settles on any path.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use hyper::ext::ReasonPhrase;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::multipart;
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::merge::{is_multipart, merge_in_query_or_form};
use crate::request::{Body, MultipartValue, Redirect, Request};
use crate::response::{serialize_res, RawResponse, Response};

/// Rewrites a request just before it is sent.
pub type RequestInterceptor = Arc<dyn Fn(Request) -> Request + Send + Sync>;

/// Rewrites a response after its body has been read.
pub type ResponseInterceptor = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Sends a finalized request.
///
/// The returned future resolves once response headers are available; the
/// body is drained later through `RawResponse::body`. Implementations must
/// not follow redirects when `request.redirect` is `Redirect::Error`.
pub trait Transport: Send + Sync {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<RawResponse, HttpError>>;
}

/// `Transport` backed by a `reqwest::Client` that refuses redirects.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, HttpError> {
        Self::from_builder(reqwest::Client::builder())
    }

    /// Build from a caller-configured client builder (proxies, TLS, pool
    /// settings). The redirect policy is always replaced.
    pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, HttpError> {
        let client = builder
            .redirect(Policy::custom(|attempt| {
                attempt.error("redirects are treated as errors")
            }))
            .build()
            .map_err(HttpError::RequestFailed)?;
        Ok(Self { client })
    }

    fn build(&self, request: Request) -> Result<reqwest::RequestBuilder, HttpError> {
        let method: Method =
            request
                .method
                .to_uppercase()
                .parse()
                .map_err(|_| HttpError::UnsupportedMethod {
                    method: request.method.clone(),
                })?;

        let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);
        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| HttpError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| HttpError::InvalidHeader { name: name.clone() })?;
            headers.append(header_name, header_value);
        }
        if !request.cookies.is_empty() {
            let cookie = request
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            let value = HeaderValue::from_str(&cookie).map_err(|_| HttpError::InvalidHeader {
                name: COOKIE.to_string(),
            })?;
            headers.append(COOKIE, value);
        }

        let builder = self.client.request(method, &request.url).headers(headers);
        let builder = match request.body {
            None => builder,
            Some(Body::Text(text)) => builder.body(text),
            Some(Body::Bytes(bytes)) => builder.body(bytes),
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::Multipart(parts)) => builder.multipart(multipart_form(parts)?),
        };
        Ok(builder)
    }
}

fn multipart_form(parts: Vec<(String, MultipartValue)>) -> Result<multipart::Form, HttpError> {
    let mut form = multipart::Form::new();
    for (name, value) in parts {
        form = match value {
            MultipartValue::Text(text) => form.text(name, text),
            MultipartValue::File(file) => {
                let mut part = multipart::Part::bytes(file.bytes);
                if let Some(file_name) = file.file_name {
                    part = part.file_name(file_name);
                }
                if let Some(content_type) = file.content_type {
                    part = part
                        .mime_str(&content_type)
                        .map_err(|source| HttpError::InvalidMultipart {
                            name: name.clone(),
                            source,
                        })?;
                }
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

/// Reason phrase as sent by the server, else the canonical one, else the
/// numeric code. Never empty.
fn status_text(status: StatusCode, reason: Option<&ReasonPhrase>) -> String {
    reason
        .and_then(|r| std::str::from_utf8(r.as_bytes()).ok())
        .filter(|r| !r.is_empty())
        .or_else(|| status.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}

impl Transport for ReqwestTransport {
    fn fetch(&self, request: Request) -> BoxFuture<'_, Result<RawResponse, HttpError>> {
        async move {
            let resp = self
                .build(request)?
                .send()
                .await
                .map_err(HttpError::RequestFailed)?;

            let status = resp.status();
            let status_text = status_text(status, resp.extensions().get::<ReasonPhrase>());
            let url = resp.url().to_string();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();
            let body = async move {
                resp.bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(HttpError::ResponseRead)
            }
            .boxed();

            Ok::<_, HttpError>(RawResponse {
                status: status.as_u16(),
                status_text,
                url,
                headers,
                body,
            })
        }
        .boxed()
    }
}

/// Dispatches requests with a fixed configuration and transport.
#[derive(Clone)]
pub struct Http {
    config: HttpConfig,
    transport: Arc<dyn Transport>,
    request_interceptor: Option<RequestInterceptor>,
    response_interceptor: Option<ResponseInterceptor>,
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("config", &self.config)
            .field("request_interceptor", &self.request_interceptor.is_some())
            .field("response_interceptor", &self.response_interceptor.is_some())
            .finish_non_exhaustive()
    }
}

impl Http {
    /// Dispatcher using the default reqwest transport.
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }

    /// Dispatcher using a caller-supplied transport.
    pub fn with_transport(config: HttpConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            request_interceptor: None,
            response_interceptor: None,
        }
    }

    pub fn request_interceptor(
        mut self,
        interceptor: impl Fn(Request) -> Request + Send + Sync + 'static,
    ) -> Self {
        self.request_interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn response_interceptor(
        mut self,
        interceptor: impl Fn(Response) -> Response + Send + Sync + 'static,
    ) -> Self {
        self.response_interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Send `request` to `url`.
    pub async fn fetch(
        &self,
        url: impl Into<String>,
        mut request: Request,
    ) -> Result<Response, HttpError> {
        request.url = url.into();
        self.execute(request).await
    }

    /// Send a request whose URL is already set.
    pub async fn execute(&self, request: Request) -> Result<Response, HttpError> {
        let url = request.url.clone();
        let mut request = merge_in_query_or_form(request);

        if let Some(interceptor) = &self.request_interceptor {
            request = interceptor(request);
        }

        // The transport sets its own boundary-qualified multipart header.
        if is_multipart(request.content_type()) {
            request.remove_header("content-type");
        }
        request.redirect = Redirect::Error;
        let load_spec = request.load_spec;

        debug!(method = %request.method, url = %request.url, "dispatching request");
        let started = Instant::now();

        let fetch = self.transport.fetch(request);
        let raw = match self.config.timeout.response_duration() {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result?,
                Err(_) => {
                    let ms = self.config.timeout.response.unwrap_or_default();
                    warn!(url = %url, timeout_ms = ms, "no response before response timeout");
                    return Err(HttpError::ResponseTimeout { ms });
                }
            },
            None => fetch.await?,
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(status = raw.status, elapsed_ms, "response headers received");

        let ok = raw.ok();
        let status = raw.status;
        let status_text = raw.status_text.clone();

        let serialize = async {
            let res = serialize_res(raw, &url, load_spec).await?;
            Ok::<_, HttpError>(match &self.response_interceptor {
                Some(interceptor) => interceptor(res),
                None => res,
            })
        };

        let serialized = match self.config.timeout.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_sub(elapsed_ms);
                let result = if remaining == 0 {
                    Err(HttpError::DeadlineTimeout { ms: deadline })
                } else {
                    tokio::time::timeout(Duration::from_millis(remaining), serialize)
                        .await
                        .unwrap_or(Err(HttpError::DeadlineTimeout { ms: deadline }))
                };
                if let Err(HttpError::DeadlineTimeout { .. }) = &result {
                    warn!(url = %url, timeout_ms = deadline, "response not complete before deadline");
                }
                result
            }
            None => serialize.await,
        };

        if !ok {
            warn!(url = %url, status, "request failed with status");
            let (response, response_error) = match serialized {
                Ok(res) => (Some(Box::new(res)), None),
                Err(e) => (None, Some(Box::new(e))),
            };
            return Err(HttpError::Status {
                status,
                status_text,
                response,
                response_error,
            });
        }

        debug!(
            status,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request complete"
        );
        serialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, Securities};
    use crate::execute::{build_request, BuildContext, RequestBody};
    use crate::request::{FilePart, Parameter};
    use crate::response::ResponseData;
    use crate::spec::{Dialect, Operation, Spec};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    /// Never produces response headers.
    struct Stalled;

    impl Transport for Stalled {
        fn fetch(&self, _request: Request) -> BoxFuture<'_, Result<RawResponse, HttpError>> {
            futures::future::pending().boxed()
        }
    }

    /// Delays headers and body independently.
    struct Slow {
        status: u16,
        first_byte: Duration,
        drain: Duration,
    }

    impl Transport for Slow {
        fn fetch(&self, _request: Request) -> BoxFuture<'_, Result<RawResponse, HttpError>> {
            let (status, first_byte, drain) = (self.status, self.first_byte, self.drain);
            let status_text = match status {
                200 => "OK",
                _ => "Internal Server Error",
            };
            async move {
                tokio::time::sleep(first_byte).await;
                Ok(RawResponse {
                    status,
                    status_text: status_text.to_string(),
                    url: String::new(),
                    headers: vec![("content-type".into(), "application/json".into())],
                    body: async move {
                        tokio::time::sleep(drain).await;
                        Ok(br#"{"done":true}"#.to_vec())
                    }
                    .boxed(),
                })
            }
            .boxed()
        }
    }

    /// Records the request it was handed and answers 200 with an empty body.
    #[derive(Clone, Default)]
    struct Recording {
        seen: Arc<Mutex<Option<Request>>>,
    }

    impl Transport for Recording {
        fn fetch(&self, request: Request) -> BoxFuture<'_, Result<RawResponse, HttpError>> {
            *self.seen.lock().unwrap() = Some(request);
            async {
                Ok(RawResponse {
                    status: 200,
                    status_text: "OK".into(),
                    url: String::new(),
                    headers: Vec::new(),
                    body: async { Ok(Vec::new()) }.boxed(),
                })
            }
            .boxed()
        }
    }

    fn slow(status: u16, first_byte_ms: u64, drain_ms: u64) -> Slow {
        Slow {
            status,
            first_byte: Duration::from_millis(first_byte_ms),
            drain: Duration::from_millis(drain_ms),
        }
    }

    // -- timeouts --

    #[tokio::test]
    async fn response_timeout_fires_on_stalled_transport() {
        let http = Http::with_transport(HttpConfig::new().response_timeout(5), Stalled);
        let started = Instant::now();
        let err = http.execute(Request::from("http://x/")).await.unwrap_err();

        assert!(matches!(err, HttpError::ResponseTimeout { ms: 5 }));
        assert!(err.to_string().contains('5'));
        assert_eq!(err.errno(), Some("ETIMEDOUT"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn deadline_reports_configured_not_remaining_budget() {
        let http = Http::with_transport(HttpConfig::new().deadline_timeout(100), slow(200, 50, 500));
        let err = http.execute(Request::from("http://x/")).await.unwrap_err();

        assert!(matches!(err, HttpError::DeadlineTimeout { ms: 100 }));
        assert_eq!(err.to_string(), "Timeout of 100ms exceeded");
        assert_eq!(err.errno(), Some("ETIME"));
    }

    #[tokio::test]
    async fn deadline_already_spent_fires_immediately() {
        let http = Http::with_transport(HttpConfig::new().deadline_timeout(10), slow(200, 30, 0));
        let err = http.execute(Request::from("http://x/")).await.unwrap_err();
        assert!(matches!(err, HttpError::DeadlineTimeout { ms: 10 }));
    }

    #[tokio::test]
    async fn response_timeout_does_not_cover_body_draining() {
        let config = HttpConfig::new().response_timeout(100);
        let http = Http::with_transport(config, slow(200, 5, 200));
        let res = http.execute(Request::from("http://x/")).await.unwrap();
        assert_eq!(res.obj(), Some(&json!({"done": true})));
    }

    #[tokio::test]
    async fn both_clocks_satisfied_returns_response() {
        let config = HttpConfig::new().response_timeout(1_000).deadline_timeout(2_000);
        let http = Http::with_transport(config, slow(200, 5, 5));
        let res = http.execute(Request::from("http://x/")).await.unwrap();
        assert!(res.ok);
        assert_eq!(res.url, "http://x/");
    }

    #[tokio::test]
    async fn status_error_carries_deadline_error() {
        let http = Http::with_transport(HttpConfig::new().deadline_timeout(50), slow(500, 0, 500));
        let err = http.execute(Request::from("http://x/")).await.unwrap_err();

        let HttpError::Status {
            status,
            response,
            response_error,
            ..
        } = err
        else {
            panic!("expected status error");
        };
        assert_eq!(status, 500);
        assert!(response.is_none());
        assert!(matches!(
            response_error.as_deref(),
            Some(HttpError::DeadlineTimeout { ms: 50 })
        ));
    }

    // -- request finalization --

    #[tokio::test]
    async fn request_is_finalized_before_transport() {
        let transport = Recording::default();
        let http = Http::with_transport(HttpConfig::new(), transport.clone());
        let req = Request::new("POST", "http://x/y?a=0")
            .query_param("a", "1")
            .header("Content-Type", "multipart/form-data")
            .form_field("f", FilePart::new(b"x".to_vec()));

        http.execute(req).await.unwrap();

        let seen = transport.seen.lock().unwrap().take().unwrap();
        assert_eq!(seen.url, "http://x/y?a=1");
        assert!(seen.query.is_none());
        assert!(seen.form.is_none());
        assert!(matches!(seen.body, Some(Body::Multipart(_))));
        assert!(seen.content_type().is_none());
        assert_eq!(seen.redirect, Redirect::Error);
    }

    #[tokio::test]
    async fn interceptors_rewrite_request_and_response() {
        let transport = Recording::default();
        let http = Http::with_transport(HttpConfig::new(), transport.clone())
            .request_interceptor(|req| req.header("X-Trace", "1"))
            .response_interceptor(|mut res| {
                res.status_text = "intercepted".into();
                res
            });

        let res = http.fetch("http://x/z", Request::default()).await.unwrap();

        assert_eq!(res.status_text, "intercepted");
        let seen = transport.seen.lock().unwrap().take().unwrap();
        assert_eq!(seen.url, "http://x/z");
        assert_eq!(seen.headers["X-Trace"], "1");
    }

    // -- reqwest transport --

    #[tokio::test]
    async fn sends_query_headers_and_parses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pods/123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("verbose".into(), "true".into()),
                Matcher::UrlEncoded("tag".into(), "a".into()),
            ]))
            .match_header("x-request-id", "abc123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("set-cookie", "one")
            .with_header("set-cookie", "two")
            .with_body(r#"{"id":"123"}"#)
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let req = Request::from(format!("{}/pods/123", server.url()))
            .header("X-Request-Id", "abc123")
            .query_param("verbose", true)
            .query_param("tag", "a");
        let res = http.execute(req).await.unwrap();

        assert!(res.ok);
        assert_eq!(res.status, 200);
        assert_eq!(res.status_text, "OK");
        assert_eq!(res.obj(), Some(&json!({"id": "123"})));
        assert_eq!(
            res.header("set-cookie"),
            Some(&crate::response::HeaderValue::Multiple(vec![
                "one".into(),
                "two".into()
            ]))
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pods")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"name": "pod1"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"new"}"#)
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let req = Request::new("POST", "").body(Body::Json(json!({"name": "pod1"})));
        let res = http
            .fetch(format!("{}/pods", server.url()), req)
            .await
            .unwrap();

        assert_eq!(res.status, 201);
        assert_eq!(res.obj().unwrap()["id"], "new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_multipart_with_transport_boundary() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/upload")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data; boundary=".into()),
            )
            .match_body(Matcher::Regex("hello-file".into()))
            .with_status(204)
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let req = Request::new("POST", format!("{}/upload", server.url()))
            .header("Content-Type", "multipart/form-data")
            .form_field("note", "n")
            .form_field(
                "file",
                FilePart::new(b"hello-file".to_vec())
                    .file_name("a.txt")
                    .content_type("text/plain"),
            );
        let res = http.execute(req).await.unwrap();

        assert_eq!(res.status, 204);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_cookies_as_single_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/me")
            .match_header("cookie", "session=c; theme=dark")
            .with_status(200)
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let mut req = Request::from(format!("{}/me", server.url()));
        req.cookies.insert("session".into(), "c".into());
        req.cookies.insert("theme".into(), "dark".into());
        http.execute(req).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_attaches_serialized_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"nope"}"#)
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let err = http
            .execute(Request::from(format!("{}/missing", server.url())))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status_code(), Some(404));
        let res = err.response().unwrap();
        assert!(!res.ok);
        assert_eq!(res.obj().unwrap()["message"], "nope");
    }

    #[tokio::test]
    async fn unparsable_body_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/bad")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{oops")
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let res = http
            .execute(Request::from(format!("{}/bad", server.url())))
            .await
            .unwrap();

        assert!(res.body.is_none());
        assert!(res.parse_error.is_some());
        assert_eq!(res.data, ResponseData::Text("{oops".into()));
    }

    /// Serve one connection with a raw, hand-written status line.
    async fn raw_status_server(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let mut read = Vec::new();
            while !read.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                read.extend_from_slice(&buf[..n]);
            }
            let reply = format!(
                "{status_line}\r\ncontent-type: text/plain\r\ncontent-length: 4\r\nconnection: close\r\n\r\ngone"
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn status_error_keeps_server_reason_phrase() {
        let http = Http::new(HttpConfig::new()).unwrap();

        let url = raw_status_server("HTTP/1.1 499 Client Closed Request").await;
        let err = http.execute(Request::from(url)).await.unwrap_err();
        assert_eq!(err.to_string(), "Client Closed Request");
        assert_eq!(err.status_code(), Some(499));
        assert_eq!(err.response().unwrap().text(), Some("gone"));

        let url = raw_status_server("HTTP/1.1 404 Pet Gone").await;
        let err = http.execute(Request::from(url)).await.unwrap_err();
        assert_eq!(err.to_string(), "Pet Gone");
        assert_eq!(err.status_code(), Some(404));
    }

    #[test]
    fn status_text_falls_back_to_canonical_then_code() {
        let phrase = ReasonPhrase::from_static(b"Pet Gone");
        assert_eq!(status_text(StatusCode::NOT_FOUND, Some(&phrase)), "Pet Gone");
        assert_eq!(status_text(StatusCode::NOT_FOUND, None), "Not Found");
        let unregistered = StatusCode::from_u16(599).unwrap();
        assert_eq!(status_text(unregistered, None), "599");
    }

    #[tokio::test]
    async fn redirects_are_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/old")
            .with_status(302)
            .with_header("location", "/new")
            .create_async()
            .await;

        let http = Http::new(HttpConfig::new()).unwrap();
        let err = http
            .execute(Request::from(format!("{}/old", server.url())))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() {
        let http = Http::new(HttpConfig::new()).unwrap();
        let err = http
            .execute(Request::new("NOT A METHOD", "http://127.0.0.1:9/"))
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::UnsupportedMethod { .. }));
    }

    // -- full pipeline --

    #[tokio::test]
    async fn oas3_operation_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pets")
            .match_query(Matcher::UrlEncoded("key".into(), "abc".into()))
            .match_header("authorization", "Bearer jwt")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body("name=rex&tags=a%2Cb")
            .with_status(200)
            .with_header("content-type", "application/yaml")
            .with_body("id: 7\n")
            .create_async()
            .await;

        let spec = Spec::from_value(
            Dialect::OpenApi3,
            &json!({
                "components": {"securitySchemes": {
                    "bearer": {"type": "http", "scheme": "bearer"},
                    "key": {"type": "apiKey", "name": "key", "in": "query"}
                }}
            }),
        );
        let op = Operation::from_value(&json!({
            "security": [{"bearer": []}, {"key": []}],
            "requestBody": {"content": {"application/x-www-form-urlencoded": {"schema": {}}}}
        }));
        let securities = Securities::new()
            .authorize("bearer", Credential::text("jwt"))
            .authorize("key", Credential::text("abc"));
        let body = RequestBody::from(json!({"name": "rex", "tags": ["a", "b"]}));
        let ctx = BuildContext::new(Dialect::OpenApi3, &spec, &op, &securities).request_body(&body);

        let req = build_request(Request::new("POST", format!("{}/pets", server.url())), &ctx);
        let res = Http::new(HttpConfig::new()).unwrap().execute(req).await.unwrap();

        assert_eq!(res.obj(), Some(&json!({"id": 7})));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn swagger2_operation_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pets")
            .match_query(Matcher::UrlEncoded("status".into(), "sold|pending".into()))
            .match_header("authorization", "Basic dTpw")
            .match_header("api_key", "secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let spec = Spec::from_value(
            Dialect::Swagger2,
            &json!({
                "securityDefinitions": {
                    "basic": {"type": "basic"},
                    "api_key": {"type": "apiKey", "name": "api_key", "in": "header"}
                }
            }),
        );
        let op = Operation::default();
        let securities = Securities::new()
            .authorize("basic", Credential::basic("u", "p"))
            .authorize("api_key", Credential::text("secret"))
            .spec_security(vec![[
                ("basic".to_string(), vec![]),
                ("api_key".to_string(), vec![]),
            ]
            .into()]);
        let ctx = BuildContext::new(Dialect::Swagger2, &spec, &op, &securities);

        let req = Request::from(format!("{}/pets", server.url())).query_param(
            "status",
            Parameter::from(json!(["sold", "pending"]))
                .collection_format(crate::request::CollectionFormat::Pipes),
        );
        let req = build_request(req, &ctx);
        let res = Http::new(HttpConfig::new()).unwrap().execute(req).await.unwrap();

        assert_eq!(res.obj(), Some(&json!([])));
        mock.assert_async().await;
    }
}
