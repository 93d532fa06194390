//! HTTP response envelope.
//!
//! This module provides the [`HttpResponse`] type, the uniform result of any
//! single HTTP call independent of the resource it concerns.

use std::collections::HashMap;
use std::time::Duration;

use crate::clients::http_request::RequestInfo;

/// A completed HTTP response.
///
/// The body is kept as raw text so callers can surface server diagnostics
/// even when it is not valid JSON. Use [`json`](Self::json) to decode it.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers with lowercase names (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The raw response body.
    pub raw_body: String,
    /// The request that produced this response.
    pub request: RequestInfo,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub fn new(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        raw_body: String,
        request: RequestInfo,
    ) -> Self {
        Self {
            code,
            headers,
            raw_body,
            request,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }

    /// Returns the `Retry-After` header as a duration, if present, numeric
    /// and representable.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Decodes the body as JSON. An empty body decodes to an empty object.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.raw_body.trim().is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str(&self.raw_body)
    }

    /// Returns the response with its status code replaced.
    ///
    /// Used to report a read that completed a creation as `201 Created`.
    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    #[cfg(test)]
    pub(crate) fn for_status(code: u16) -> Self {
        Self::new(
            code,
            HashMap::new(),
            String::new(),
            RequestInfo::new(crate::clients::HttpMethod::Get, "http://localhost/test"),
        )
    }

    #[cfg(test)]
    pub(crate) fn with_body(mut self, raw_body: String) -> Self {
        self.raw_body = raw_body;
        self
    }
}
