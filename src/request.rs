//! In-flight request model
//!
//! A `Request` is built by the caller, passed by value through the dialect
//! applicators and the query/form merger, then handed to the dispatcher.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Encoding rule for an array-valued parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
    Csv,
    Ssv,
    Tsv,
    Pipes,
    /// One `key=value` pair per element.
    Multi,
}

impl CollectionFormat {
    /// Separator placed between encoded elements. `Multi` has none.
    pub fn separator(&self) -> Option<&'static str> {
        match self {
            Self::Csv => Some(","),
            Self::Ssv => Some("%20"),
            Self::Tsv => Some("%09"),
            Self::Pipes => Some("|"),
            Self::Multi => None,
        }
    }
}

impl FromStr for CollectionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "ssv" => Ok(Self::Ssv),
            "tsv" => Ok(Self::Tsv),
            "pipes" => Ok(Self::Pipes),
            "multi" => Ok(Self::Multi),
            other => Err(format!("unknown collection format: {other}")),
        }
    }
}

/// A file to upload as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Raw value of a query or form parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// No value supplied by the caller.
    Undefined,
    Json(Value),
    File(FilePart),
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Json(Value::String(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Json(Value::Bool(value))
    }
}

impl From<FilePart> for ParamValue {
    fn from(value: FilePart) -> Self {
        Self::File(value)
    }
}

/// A query or form entry together with its serialization options.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub value: ParamValue,
    pub collection_format: Option<CollectionFormat>,
    pub allow_empty_value: bool,
    pub skip_encoding: bool,
}

impl Parameter {
    pub fn new(value: impl Into<ParamValue>) -> Self {
        Self {
            value: value.into(),
            collection_format: None,
            allow_empty_value: false,
            skip_encoding: false,
        }
    }

    pub fn collection_format(mut self, format: CollectionFormat) -> Self {
        self.collection_format = Some(format);
        self
    }

    pub fn allow_empty_value(mut self, allow: bool) -> Self {
        self.allow_empty_value = allow;
        self
    }

    pub fn skip_encoding(mut self, skip: bool) -> Self {
        self.skip_encoding = skip;
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.value, ParamValue::File(_))
    }
}

macro_rules! parameter_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

parameter_from!(Value, &str, String, bool, FilePart, ParamValue);

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartValue {
    Text(String),
    File(FilePart),
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
    Bytes(Vec<u8>),
    Multipart(Vec<(String, MultipartValue)>),
}

/// Redirect handling requested from the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Redirect {
    #[default]
    Follow,
    /// Any redirect response fails the request.
    Error,
}

/// An HTTP request under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: String,
    /// Header names keep their casing; lookups are case-insensitive.
    pub headers: IndexMap<String, String>,
    /// Structured query, removed once merged into `url`.
    pub query: Option<IndexMap<String, Parameter>>,
    /// Structured form, removed once merged into `body`.
    pub form: Option<IndexMap<String, Parameter>>,
    pub body: Option<Body>,
    pub cookies: IndexMap<String, String>,
    pub redirect: Redirect,
    /// Download and parse the response as a spec document whatever its content type.
    pub load_spec: bool,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            headers: IndexMap::new(),
            query: None,
            form: None,
            body: None,
            cookies: IndexMap::new(),
            redirect: Redirect::default(),
            load_spec: false,
        }
    }
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, param: impl Into<Parameter>) -> Self {
        self.query
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), param.into());
        self
    }

    pub fn form_field(mut self, name: impl Into<String>, param: impl Into<Parameter>) -> Self {
        self.form
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), param.into());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header_value("content-type")
    }

    /// Replace any casing of `Content-Type` with a single `Content-Type` entry.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.remove_header("content-type");
        self.headers
            .insert("Content-Type".to_string(), content_type.into());
    }

    /// Remove every casing of a header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    }
}

impl From<&str> for Request {
    fn from(url: &str) -> Self {
        Self::new("GET", url)
    }
}

impl From<String> for Request {
    fn from(url: String) -> Self {
        Self::new("GET", url)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
