//! Execute OpenAPI / Swagger operations over HTTP.
//!
//! Applies the caller's authorized credentials to a request, resolves its
//! Content-Type and body from the operation (Swagger 2.0 and OpenAPI 3.x
//! rules differ), folds structured query/form parameters into the URL and
//! body, and dispatches it with separate first-byte and total timeouts.
//!
//! # Usage
//!
//! ```no_run
//! use openapi_exec::{
//!     build_request, BuildContext, Credential, Dialect, Http, HttpConfig, Operation, Request,
//!     Securities, Spec,
//! };
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), openapi_exec::HttpError> {
//! let doc = json!({
//!     "openapi": "3.0.0",
//!     "components": {"securitySchemes": {"key": {"type": "apiKey", "name": "key", "in": "query"}}}
//! });
//! let spec = Spec::from_value(Dialect::OpenApi3, &doc);
//! let op = Operation::from_value(&json!({"security": [{"key": []}]}));
//! let securities = Securities::new().authorize("key", Credential::text("abc"));
//!
//! let ctx = BuildContext::new(Dialect::OpenApi3, &spec, &op, &securities);
//! let request = build_request(Request::from("https://api.example.com/pets"), &ctx);
//!
//! let http = Http::new(HttpConfig::new().response_timeout(5_000).deadline_timeout(30_000))?;
//! let response = http.execute(request).await?;
//! println!("{} {:?}", response.status, response.obj());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod execute;
pub mod format;
pub mod http;
pub mod merge;
pub mod request;
pub mod response;
pub mod spec;

pub use config::{HttpConfig, Timeouts};
pub use credential::{Credential, Securities};
pub use error::HttpError;
pub use execute::{build_request, BuildContext, RequestBody, SpecDialect};
pub use format::{encode_form_or_query, format_value};
pub use http::{Http, ReqwestTransport, Transport};
pub use merge::merge_in_query_or_form;
pub use request::{Body, CollectionFormat, FilePart, ParamValue, Parameter, Request};
pub use response::{serialize_headers, should_download_as_text, Response};
pub use spec::{Dialect, Operation, Spec};

// Re-export dependencies for downstream crates
pub use reqwest;
