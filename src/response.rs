//! Response envelope
//!
//! Normalizes a transport response into a uniform `Response`: headers folded
//! into a map, body kept raw and, for textual content, parsed as JSON or YAML.

use futures::future::BoxFuture;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::HttpError;

static TEXTUAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(json|xml|yaml|text)\b").expect("textual regex is valid"));

/// A header value; repeated headers collapse into `Multiple` in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    /// The first value received.
    pub fn first(&self) -> &str {
        match self {
            Self::Single(v) => v,
            Self::Multiple(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                *self = Self::Multiple(vec![std::mem::take(existing), value]);
            }
            Self::Multiple(vs) => vs.push(value),
        }
    }
}

/// Raw response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseData {
    Text(String),
    Binary(Vec<u8>),
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub ok: bool,
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: IndexMap<String, HeaderValue>,
    pub data: ResponseData,
    /// Parsed body; present only when parsing succeeded.
    pub body: Option<Value>,
    /// Why parsing failed, when it did.
    pub parse_error: Option<String>,
}

impl Response {
    /// Body as text, when it was downloaded as text.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            ResponseData::Text(s) => Some(s),
            ResponseData::Binary(_) => None,
        }
    }

    /// Alias of `body`.
    pub fn obj(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

/// What a `Transport` hands back once response headers have arrived.
///
/// `body` resolves when the body has been fully drained.
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    /// Final URL; empty when the transport does not know it.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: BoxFuture<'static, Result<Vec<u8>, HttpError>>,
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fold headers into a map; repeated names become `Multiple`.
pub fn serialize_headers<I, K, V>(headers: I) -> IndexMap<String, HeaderValue>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut map: IndexMap<String, HeaderValue> = IndexMap::new();
    for (name, value) in headers {
        let value = value.into();
        match map.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut e) => e.get_mut().push(value),
            indexmap::map::Entry::Vacant(e) => {
                e.insert(HeaderValue::Single(value));
            }
        }
    }
    map
}

/// Whether a content type should be downloaded as text.
pub fn should_download_as_text(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| TEXTUAL.is_match(ct))
}

/// Parse a textual body: JSON for exactly `application/json`, YAML otherwise.
///
/// An empty body parses to nothing.
pub fn parse_body(text: &str, content_type: Option<&str>) -> Result<Option<Value>, String> {
    if content_type == Some("application/json") {
        return serde_json::from_str(text).map(Some).map_err(|e| e.to_string());
    }
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str::<Value>(text)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Drain a transport response into a `Response`.
///
/// `url` is used when the transport does not report the final URL.
pub async fn serialize_res(
    raw: RawResponse,
    url: &str,
    load_spec: bool,
) -> Result<Response, HttpError> {
    let ok = raw.ok();
    let headers = serialize_headers(raw.headers);
    let content_type = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.first().to_string());
    let use_text = load_spec || should_download_as_text(content_type.as_deref());

    let bytes = raw.body.await?;

    let mut res = Response {
        ok,
        url: if raw.url.is_empty() {
            url.to_string()
        } else {
            raw.url
        },
        status: raw.status,
        status_text: raw.status_text,
        headers,
        data: ResponseData::Binary(Vec::new()),
        body: None,
        parse_error: None,
    };

    if use_text {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        match parse_body(&text, content_type.as_deref()) {
            Ok(body) => res.body = body,
            Err(e) => {
                tracing::debug!(url = %res.url, error = %e, "response body did not parse");
                res.parse_error = Some(e);
            }
        }
        res.data = ResponseData::Text(text);
    } else {
        res.data = ResponseData::Binary(bytes);
    }

    Ok(res)
}
