//! Error types for the openapi-exec crate.

use thiserror::Error;

use crate::response::Response;

/// Errors that can occur while dispatching a request.
///
/// Body parse failures are not errors; they are recorded on the
/// `Response` as `parse_error`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HttpError {
    /// No response headers arrived within the configured window.
    #[error("Response timeout of {ms}ms exceeded")]
    ResponseTimeout { ms: u64 },

    /// The total budget ran out while the body was being read or processed.
    /// `ms` is the configured deadline, not the time left after first byte.
    #[error("Timeout of {ms}ms exceeded")]
    DeadlineTimeout { ms: u64 },

    /// Non-success status. Carries the serialized response when reading the
    /// body succeeded, or the error that prevented it.
    #[error("{status_text}")]
    Status {
        status: u16,
        status_text: String,
        response: Option<Box<Response>>,
        response_error: Option<Box<HttpError>>,
    },

    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("invalid header: {name}")]
    InvalidHeader { name: String },

    #[error("invalid multipart part: {name}")]
    InvalidMultipart {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed")]
    RequestFailed(#[source] reqwest::Error),

    #[error("failed to read response body")]
    ResponseRead(#[source] reqwest::Error),
}

impl HttpError {
    /// Connection-level code, shared by both timeout kinds.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ResponseTimeout { .. } | Self::DeadlineTimeout { .. } => Some("ECONNABORTED"),
            _ => None,
        }
    }

    /// Distinguishes a first-byte timeout (`ETIMEDOUT`) from a deadline
    /// timeout (`ETIME`).
    pub fn errno(&self) -> Option<&'static str> {
        match self {
            Self::ResponseTimeout { .. } => Some("ETIMEDOUT"),
            Self::DeadlineTimeout { .. } => Some("ETIME"),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code().is_some()
    }

    /// HTTP status for `Status` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Serialized response attached to a `Status` error.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Status { response, .. } => response.as_deref(),
            _ => None,
        }
    }
}
