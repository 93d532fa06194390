//! HTTP transport layer for the management API.
//!
//! This module provides the transport shared by all resource clients. It
//! handles header injection, bounded concurrency, rate-limit pacing,
//! response-driven retries and request/response recording.
//!
//! # Overview
//!
//! - [`HttpClient`]: the async transport
//! - [`HttpRequest`] / [`HttpRequestBuilder`]: a request to be sent
//! - [`HttpResponse`]: the response envelope (status, headers, raw body, request info)
//! - [`RetryOptions`] and the [`RetryStrategy`] implementations
//!   [`RetryIfNotSuccess`], [`RetryIfTooManyRequests`], [`NeverRetry`]
//! - [`ConcurrencyLimiter`]: bound on in-flight requests
//! - [`RateLimiter`] / [`HeaderRateLimiter`]: advisory pacing
//! - [`RequestResponseRecorder`]: non-blocking observability hook
//!
//! # Retry Behavior
//!
//! Retry decisions are made per request from the completed response only.
//! By default 429 responses are retried 3 times with a fixed 1 second
//! delay; override per client via
//! [`ClientConfigBuilder::retry_options`](crate::ClientConfigBuilder::retry_options)
//! or per request via [`HttpRequestBuilder::retry`]. Network errors are
//! never retried.

mod concurrency;
mod errors;
mod http_client;
mod http_request;
mod http_response;
mod rate_limit;
mod recorder;
mod retry;

pub use concurrency::ConcurrencyLimiter;
pub use errors::{HttpError, HttpResponseError, InvalidHttpRequestError};
pub use http_client::{HttpClient, SDK_VERSION};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder, RequestInfo};
pub use http_response::HttpResponse;
pub use rate_limit::{HeaderRateLimiter, RateLimitState, RateLimiter};
pub use recorder::{Record, RequestResponseRecorder};
pub use retry::{
    NeverRetry, RetryIfNotSuccess, RetryIfTooManyRequests, RetryOptions, RetryStrategy,
    DEFAULT_RETRY_DELAY,
};
