//! HTTP-specific error types.
//!
//! This module contains error types for transport operations.
//!
//! # Error Handling
//!
//! - [`HttpResponseError`]: a completed non-2xx response, with its raw body
//! - [`InvalidHttpRequestError`]: a request that failed validation before sending
//! - [`HttpError`]: unified error type encompassing all transport errors
//!
//! The transport never decides whether a 4xx is fatal. Callers match on
//! [`HttpError::status`] to drive control flow (403 fallback, 404 not found,
//! 409 conflict).
//!
//! # Example
//!
//! ```rust,ignore
//! use platform_api::clients::HttpError;
//!
//! match client.request(request).await {
//!     Ok(response) => println!("Success: {}", response.raw_body),
//!     Err(HttpError::Response(e)) if e.code == 404 => println!("gone"),
//!     Err(HttpError::Response(e)) => println!("API error {}: {}", e.code, e.body),
//!     Err(e) => println!("Transport failure: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::auth::TokenError;
use crate::clients::http_request::RequestInfo;
use crate::clients::http_response::HttpResponse;

/// Error returned when a request completes with a non-successful status.
///
/// The raw body is preserved so callers can surface server-provided
/// diagnostics; `message` holds the extracted error message when the body
/// follows the `{"error": {"message": ...}}` convention.
#[derive(Clone, Debug, Error)]
#[error("{request} failed with status {code}: {message}")]
pub struct HttpResponseError {
    /// The HTTP status code of the response.
    pub code: u16,
    /// Human-readable diagnostic extracted from the body.
    pub message: String,
    /// The raw response body.
    pub body: String,
    /// The request that failed.
    pub request: RequestInfo,
    /// Reference ID for error reporting (from the X-Request-Id header).
    pub error_reference: Option<String>,
}

impl HttpResponseError {
    /// Builds the error from a completed response.
    #[must_use]
    pub fn from_response(response: &HttpResponse) -> Self {
        Self {
            code: response.code,
            message: extract_message(response),
            body: response.raw_body.clone(),
            request: response.request.clone(),
            error_reference: response.request_id().map(String::from),
        }
    }
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The request path is empty.
    #[error("Cannot send a request without a path.")]
    EmptyPath,

    /// A POST or PUT request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Unified error type for all transport errors.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A completed response outside the 2xx range.
    #[error(transparent)]
    Response(#[from] HttpResponseError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Network or connection failure before any response.
    #[error("Network error for {request}: {source}")]
    Network {
        /// The request that could not be completed.
        request: RequestInfo,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The credential collaborator could not produce a token.
    #[error(transparent)]
    Credentials(#[from] TokenError),
}

impl HttpError {
    /// Returns the HTTP status code if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response(e) => Some(e.code),
            _ => None,
        }
    }

    /// Returns the response error if the server answered.
    #[must_use]
    pub const fn response(&self) -> Option<&HttpResponseError> {
        match self {
            Self::Response(e) => Some(e),
            _ => None,
        }
    }
}

fn extract_message(response: &HttpResponse) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(&response.raw_body).ok();
    let message = parsed.as_ref().and_then(|body| {
        body.pointer("/error/message")
            .or_else(|| body.get("message"))
            .or_else(|| body.get("error"))
            .and_then(serde_json::Value::as_str)
            .map(String::from)
    });

    message.unwrap_or_else(|| {
        let trimmed = response.raw_body.trim();
        if trimmed.is_empty() {
            "no response body".to_string()
        } else {
            trimmed.chars().take(512).collect()
        }
    })
}
