//! Response-driven retry policies for the transport.
//!
//! A [`RetryStrategy`] looks at a completed response and decides whether the
//! request should be sent again. Strategies never see network errors; those
//! are always returned to the caller.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::http_response::HttpResponse;

/// Default pause between two transport attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Decides whether a completed response warrants another attempt.
pub trait RetryStrategy: fmt::Debug + Send + Sync {
    /// Returns `true` if the request should be re-issued.
    fn should_retry(&self, response: &HttpResponse) -> bool;
}

/// Retries every response outside the 2xx range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryIfNotSuccess;

impl RetryStrategy for RetryIfNotSuccess {
    fn should_retry(&self, response: &HttpResponse) -> bool {
        !response.is_ok()
    }
}

/// Retries only `429 Too Many Requests`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryIfTooManyRequests;

impl RetryStrategy for RetryIfTooManyRequests {
    fn should_retry(&self, response: &HttpResponse) -> bool {
        response.code == 429
    }
}

/// Never retries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverRetry;

impl RetryStrategy for NeverRetry {
    fn should_retry(&self, _response: &HttpResponse) -> bool {
        false
    }
}

/// Retry policy attached to a single request.
///
/// `max_retries` counts re-issues, so a request is attempted at most
/// `max_retries + 1` times.
///
/// # Example
///
/// ```rust
/// use platform_api::clients::{RetryIfNotSuccess, RetryOptions};
/// use std::time::Duration;
///
/// let options = RetryOptions::new(RetryIfNotSuccess)
///     .max_retries(2)
///     .delay(Duration::from_millis(250));
/// assert_eq!(options.max_retries, 2);
/// ```
#[derive(Clone, Debug)]
pub struct RetryOptions {
    /// Maximum number of re-issues after the first attempt.
    pub max_retries: u32,
    /// Fixed pause before each re-issue.
    pub delay: Duration,
    /// The predicate consulted after each completed response.
    pub strategy: Arc<dyn RetryStrategy>,
}

impl RetryOptions {
    /// Creates options for the given strategy with 3 retries and a 1 second delay.
    #[must_use]
    pub fn new(strategy: impl RetryStrategy + 'static) -> Self {
        Self {
            max_retries: 3,
            delay: DEFAULT_RETRY_DELAY,
            strategy: Arc::new(strategy),
        }
    }

    /// Options that never retry.
    #[must_use]
    pub fn none() -> Self {
        Self::new(NeverRetry).max_retries(0)
    }

    /// Sets the maximum number of re-issues.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub const fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns `true` if `response` should be retried after `attempt` attempts.
    #[must_use]
    pub fn should_retry(&self, response: &HttpResponse, attempt: u32) -> bool {
        attempt <= self.max_retries && self.strategy.should_retry(response)
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new(RetryIfTooManyRequests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(code: u16) -> HttpResponse {
        HttpResponse::for_status(code)
    }

    #[test]
    fn test_retry_if_not_success() {
        assert!(!RetryIfNotSuccess.should_retry(&response(200)));
        assert!(!RetryIfNotSuccess.should_retry(&response(204)));
        assert!(RetryIfNotSuccess.should_retry(&response(400)));
        assert!(RetryIfNotSuccess.should_retry(&response(429)));
        assert!(RetryIfNotSuccess.should_retry(&response(503)));
    }

    #[test]
    fn test_retry_if_too_many_requests() {
        assert!(RetryIfTooManyRequests.should_retry(&response(429)));
        assert!(!RetryIfTooManyRequests.should_retry(&response(500)));
        assert!(!RetryIfTooManyRequests.should_retry(&response(200)));
    }

    #[test]
    fn test_never_retry() {
        assert!(!NeverRetry.should_retry(&response(429)));
        assert!(!NeverRetry.should_retry(&response(503)));
    }

    #[test]
    fn test_options_respect_retry_budget() {
        let options = RetryOptions::new(RetryIfNotSuccess).max_retries(2);
        let failed = response(503);
        assert!(options.should_retry(&failed, 1));
        assert!(options.should_retry(&failed, 2));
        assert!(!options.should_retry(&failed, 3));
    }

    #[test]
    fn test_none_never_retries() {
        let options = RetryOptions::none();
        assert_eq!(options.max_retries, 0);
        assert!(!options.should_retry(&response(429), 1));
    }

    #[test]
    fn test_default_retries_only_throttling() {
        let options = RetryOptions::default();
        assert_eq!(options.max_retries, 3);
        assert_eq!(options.delay, DEFAULT_RETRY_DELAY);
        assert!(options.should_retry(&response(429), 1));
        assert!(!options.should_retry(&response(500), 1));
    }
}
