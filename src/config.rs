//! Dispatch configuration.

use std::time::Duration;

use serde::Deserialize;

/// The two timeout clocks, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Time allowed until response headers arrive.
    pub response: Option<u64>,
    /// Total time allowed from dispatch until the body is read and processed.
    pub deadline: Option<u64>,
}

impl Timeouts {
    pub fn response_duration(&self) -> Option<Duration> {
        self.response.map(Duration::from_millis)
    }
}

/// Configuration threaded through every dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct HttpConfig {
    pub timeout: Timeouts,
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first-byte timeout.
    pub fn response_timeout(mut self, ms: u64) -> Self {
        self.timeout.response = Some(ms);
        self
    }

    /// Set the total deadline.
    pub fn deadline_timeout(mut self, ms: u64) -> Self {
        self.timeout.deadline = Some(ms);
        self
    }
}
