//! Configuration types for the management API client.
//!
//! This module provides the configuration consumed by
//! [`HttpClient`](crate::clients::HttpClient) and the resource clients built
//! on top of it.
//!
//! # Overview
//!
//! - [`ClientConfig`]: immutable configuration holding all client settings
//! - [`ClientConfigBuilder`]: a builder for constructing [`ClientConfig`] instances
//! - [`BaseUrl`]: a validated API base URL
//! - [`ApiToken`]: a validated access token with masked debug output
//! - [`RetrySettings`]: bounds for polling and update-retry loops
//!
//! Collaborators that carry shared state (the concurrency limiter, the rate
//! limiter and the request recorder) are passed in explicitly, so several
//! clients can share one limiter and tests can substitute fakes.
//!
//! # Example
//!
//! ```rust
//! use platform_api::{ApiToken, BaseUrl, ClientConfig, Credentials};
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://abc123.apps.example.com").unwrap())
//!     .credentials(Credentials::PlatformToken(ApiToken::new("dt0s16.abc").unwrap()))
//!     .concurrent_request_limit(10)
//!     .rate_limiting(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.concurrency().limit(), Some(10));
//! ```

mod newtypes;
mod retry_settings;

pub use newtypes::{ApiToken, BaseUrl};
pub use retry_settings::RetrySettings;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::Credentials;
use crate::clients::{
    ConcurrencyLimiter, HeaderRateLimiter, RateLimiter, RequestResponseRecorder, RetryOptions,
};
use crate::error::ConfigError;

/// Default bound on concurrent in-flight requests.
pub const DEFAULT_CONCURRENT_REQUESTS: i64 = 5;

/// Configuration for the management API client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`. Clones share the same
/// concurrency limiter, rate limiter and recorder.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    base_url: BaseUrl,
    credentials: Option<Credentials>,
    http_client: Option<reqwest::Client>,
    concurrency: ConcurrencyLimiter,
    retry_options: RetryOptions,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    recorder: Option<RequestResponseRecorder>,
    retry_settings: RetrySettings,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the credentials, if configured.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the injected pre-authenticated HTTP client, if any.
    #[must_use]
    pub const fn http_client(&self) -> Option<&reqwest::Client> {
        self.http_client.as_ref()
    }

    /// Returns the concurrency limiter.
    #[must_use]
    pub const fn concurrency(&self) -> &ConcurrencyLimiter {
        &self.concurrency
    }

    /// Returns the default transport retry policy.
    #[must_use]
    pub const fn retry_options(&self) -> &RetryOptions {
        &self.retry_options
    }

    /// Returns the rate limiter, if enabled.
    #[must_use]
    pub fn rate_limiter(&self) -> Option<&Arc<dyn RateLimiter>> {
        self.rate_limiter.as_ref()
    }

    /// Returns the request recorder, if configured.
    #[must_use]
    pub const fn recorder(&self) -> Option<&RequestResponseRecorder> {
        self.recorder.as_ref()
    }

    /// Returns the polling and update-retry bounds.
    #[must_use]
    pub const fn retry_settings(&self) -> &RetrySettings {
        &self.retry_settings
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the per-request timeout, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `base_url` is required. All other fields have defaults.
///
/// # Defaults
///
/// - `credentials`: `None` (use with an injected pre-authenticated client)
/// - `concurrent_request_limit`: [`DEFAULT_CONCURRENT_REQUESTS`]
/// - `retry_options`: retry 429 responses 3 times, 1 second apart
/// - `rate_limiting`: disabled
/// - `recorder`: `None`
/// - `retry_settings`: [`RetrySettings::default`]
/// - `timeout`: `None`
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<BaseUrl>,
    credentials: Option<Credentials>,
    http_client: Option<reqwest::Client>,
    concurrency: Option<ConcurrencyLimiter>,
    retry_options: Option<RetryOptions>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    recorder: Option<RequestResponseRecorder>,
    retry_settings: Option<RetrySettings>,
    user_agent_prefix: Option<String>,
    timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (required).
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the credentials attached to every request.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Uses a pre-configured (for example already authenticated) HTTP client.
    #[must_use]
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Bounds concurrent requests. Zero or below means unlimited.
    #[must_use]
    pub fn concurrent_request_limit(mut self, limit: i64) -> Self {
        self.concurrency = Some(ConcurrencyLimiter::new(limit));
        self
    }

    /// Shares an existing concurrency limiter.
    #[must_use]
    pub fn concurrency_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.concurrency = Some(limiter);
        self
    }

    /// Sets the default transport retry policy.
    #[must_use]
    pub fn retry_options(mut self, options: RetryOptions) -> Self {
        self.retry_options = Some(options);
        self
    }

    /// Enables or disables header-driven rate limiting.
    #[must_use]
    pub fn rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limiter = if enabled {
            Some(Arc::new(HeaderRateLimiter::new()))
        } else {
            None
        };
        self
    }

    /// Uses a custom rate limiter.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Forwards every request and response to `recorder`.
    #[must_use]
    pub fn recorder(mut self, recorder: RequestResponseRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Sets the polling and update-retry bounds.
    #[must_use]
    pub const fn retry_settings(mut self, settings: RetrySettings) -> Self {
        self.retry_settings = Some(settings);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the [`ClientConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set,
    /// or [`ConfigError::InvalidRetrySettings`] if the retry settings cannot
    /// make progress.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        let retry_settings = self.retry_settings.unwrap_or_default();
        retry_settings.validate()?;

        Ok(ClientConfig {
            base_url,
            credentials: self.credentials,
            http_client: self.http_client,
            concurrency: self
                .concurrency
                .unwrap_or_else(|| ConcurrencyLimiter::new(DEFAULT_CONCURRENT_REQUESTS)),
            retry_options: self.retry_options.unwrap_or_default(),
            rate_limiter: self.rate_limiter,
            recorder: self.recorder,
            retry_settings,
            user_agent_prefix: self.user_agent_prefix,
            timeout: self.timeout,
        })
    }
}
