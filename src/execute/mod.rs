//! Operation → request building
//!
//! Applies authorized credentials and attaches the request body for a single
//! operation. Swagger 2 and OpenAPI 3 disagree on where security schemes live,
//! which header casing basic auth uses and how Content-Type is chosen, so each
//! dialect gets its own `SpecDialect` implementation selected by `Dialect`.

use indexmap::IndexMap;
use serde_json::Value;

use crate::credential::Securities;
use crate::request::{Body, Parameter, Request};
use crate::spec::{Dialect, Operation, SecurityRequirement, Spec};

pub mod oas3;
pub mod swagger2;

pub use oas3::OpenApi3Builder;
pub use swagger2::Swagger2Builder;

/// Caller-supplied request body for an OAS3 operation.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Value(Value),
    /// A form map already in the shape the query/form merger expects.
    Form(IndexMap<String, Parameter>),
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl RequestBody {
    fn is_present(&self) -> bool {
        !matches!(self, Self::Value(Value::Null))
    }
}

/// Everything request building reads besides the request itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub dialect: Dialect,
    pub spec: &'a Spec,
    pub operation: &'a Operation,
    pub securities: &'a Securities,
    pub request_body: Option<&'a RequestBody>,
    pub request_content_type: Option<&'a str>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        dialect: Dialect,
        spec: &'a Spec,
        operation: &'a Operation,
        securities: &'a Securities,
    ) -> Self {
        Self {
            dialect,
            spec,
            operation,
            securities,
            request_body: None,
            request_content_type: None,
        }
    }

    pub fn request_body(mut self, body: &'a RequestBody) -> Self {
        self.request_body = Some(body);
        self
    }

    pub fn request_content_type(mut self, content_type: &'a str) -> Self {
        self.request_content_type = Some(content_type);
        self
    }

    /// The explicit content type, ignoring empty strings.
    fn explicit_content_type(&self) -> Option<&'a str> {
        self.request_content_type.filter(|ct| !ct.is_empty())
    }
}

/// Dialect-specific request building steps.
pub trait SpecDialect {
    /// Return a copy of `request` with every applicable credential injected.
    fn apply_securities(&self, request: &Request, ctx: &BuildContext<'_>) -> Request;

    /// Resolve Content-Type and attach the body.
    fn assemble_body(&self, request: Request, ctx: &BuildContext<'_>) -> Request;
}

impl Dialect {
    pub fn builder(&self) -> &'static dyn SpecDialect {
        match self {
            Self::Swagger2 => &Swagger2Builder,
            Self::OpenApi3 => &OpenApi3Builder,
        }
    }
}

/// Apply securities, then assemble the body, using the context's dialect.
pub fn build_request(request: Request, ctx: &BuildContext<'_>) -> Request {
    let builder = ctx.dialect.builder();
    let request = builder.apply_securities(&request, ctx);
    builder.assemble_body(request, ctx)
}

/// Effective requirements, or `None` when nothing should be injected.
///
/// An operation that declares an empty `security` list opts out entirely,
/// overriding any spec-level default.
fn effective_security<'a>(
    operation: &'a Operation,
    spec_default: Option<&'a Vec<SecurityRequirement>>,
    securities: &Securities,
) -> Option<&'a [SecurityRequirement]> {
    if !securities.is_authorized() {
        return None;
    }
    if operation.security.as_ref().is_some_and(Vec::is_empty) {
        return None;
    }
    operation
        .security
        .as_ref()
        .or(spec_default)
        .map(Vec::as_slice)
}

/// Copy of the request with `query` materialized.
fn materialize(request: &Request) -> Request {
    let mut result = request.clone();
    result.query.get_or_insert_with(IndexMap::new);
    result
}

/// OAuth2 token type: `Bearer` when absent or any casing of "bearer",
/// otherwise the declared type verbatim.
fn token_type(declared: Option<&str>) -> &str {
    match declared {
        Some(t) if !t.is_empty() && !t.eq_ignore_ascii_case("bearer") => t,
        _ => "Bearer",
    }
}

fn value_to_body(value: &Value) -> Body {
    match value {
        Value::String(s) => Body::Text(s.clone()),
        other => Body::Json(other.clone()),
    }
}
