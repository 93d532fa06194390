//! HTTP transport for the management API.
//!
//! This module provides the [`HttpClient`] type, which dispatches requests
//! with injected headers, bounded concurrency, optional rate limiting,
//! response-driven retries and optional request/response recording.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::auth::Credentials;
use crate::clients::concurrency::ConcurrencyLimiter;
use crate::clients::errors::{HttpError, HttpResponseError};
use crate::clients::http_request::{HttpMethod, HttpRequest, RequestInfo};
use crate::clients::http_response::HttpResponse;
use crate::clients::rate_limit::RateLimiter;
use crate::clients::recorder::{Record, RequestResponseRecorder};
use crate::clients::retry::RetryOptions;
use crate::config::{BaseUrl, ClientConfig};

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP client for the management API.
///
/// The client handles:
/// - URL construction from the configured base URL
/// - Default headers including User-Agent and the credential header
/// - A shared concurrency bound (one permit per attempt)
/// - Advisory pacing from rate-limit headers
/// - Retries decided by the request's [`RetryOptions`]
/// - Forwarding every request and response to the recorder
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`; share it between resource clients with an
/// `Arc`.
///
/// # Example
///
/// ```rust,ignore
/// use platform_api::{BaseUrl, ClientConfig};
/// use platform_api::clients::{HttpClient, HttpMethod, HttpRequest};
///
/// let config = ClientConfig::builder()
///     .base_url(BaseUrl::new("https://abc123.apps.example.com").unwrap())
///     .build()
///     .unwrap();
/// let client = HttpClient::new(&config)?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "platform/storage/management/v1/bucket-definitions")
///     .build()
///     .unwrap();
/// let response = client.request(request).await?;
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: BaseUrl,
    default_headers: HashMap<String, String>,
    credentials: Option<Credentials>,
    concurrency: ConcurrencyLimiter,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    recorder: Option<RequestResponseRecorder>,
    retry_options: RetryOptions,
    next_request_id: AtomicU64,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a new HTTP client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Network`] if no client was injected and the
    /// underlying reqwest client cannot be created (e.g. TLS initialization
    /// failure).
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}platform-api-rust v{SDK_VERSION}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        let client = match config.http_client() {
            Some(client) => client.clone(),
            None => {
                let mut builder = reqwest::Client::builder().use_rustls_tls();
                if let Some(timeout) = config.timeout() {
                    builder = builder.timeout(timeout);
                }
                builder.build().map_err(|source| HttpError::Network {
                    request: RequestInfo::new(HttpMethod::Get, config.base_url().as_ref()),
                    source,
                })?
            }
        };

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            default_headers,
            credentials: config.credentials().cloned(),
            concurrency: config.concurrency().clone(),
            rate_limiter: config.rate_limiter().cloned(),
            recorder: config.recorder().cloned(),
            retry_options: config.retry_options().clone(),
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Returns the base URL for this client.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Returns the concurrency limiter shared by this client.
    #[must_use]
    pub const fn concurrency(&self) -> &ConcurrencyLimiter {
        &self.concurrency
    }

    /// Sends an HTTP request.
    ///
    /// Each attempt acquires a concurrency permit (held until the response
    /// body is read), waits out an exhausted rate limit, dispatches, and
    /// feeds the response back into the rate limiter. The request's retry
    /// policy then decides whether to sleep and re-issue.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - The credential source fails (`Credentials`)
    /// - A network error occurs (`Network`); these are never retried
    /// - The final response is outside the 2xx range (`Response`)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let url = self.base_url.join(&request.path);
        let retry = request.retry.as_ref().unwrap_or(&self.retry_options);

        let mut headers = self.default_headers.clone();
        if request.body.is_some() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(extra) = &request.extra_headers {
            for (key, value) in extra {
                headers.insert(key.clone(), value.clone());
            }
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let response = self.attempt(id, attempt, &request, &url, &headers).await?;

            if retry.should_retry(&response, attempt) {
                tracing::debug!(
                    "Retrying {} after status {} (attempt {}/{})",
                    response.request,
                    response.code,
                    attempt,
                    retry.max_retries + 1
                );
                tokio::time::sleep(retry.delay).await;
                continue;
            }

            if response.is_ok() {
                return Ok(response);
            }
            return Err(HttpError::Response(HttpResponseError::from_response(
                &response,
            )));
        }
    }

    async fn attempt(
        &self,
        id: u64,
        attempt: u32,
        request: &HttpRequest,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        let _permit = self.concurrency.acquire().await;

        if let Some(delay) = self.rate_limiter.as_ref().and_then(|l| l.delay()) {
            tracing::debug!("Rate limit reached, waiting {:?} before dispatch", delay);
            tokio::time::sleep(delay).await;
        }

        let mut req_builder = match request.http_method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };
        for (key, value) in headers {
            req_builder = req_builder.header(key, value);
        }
        if let Some(credentials) = &self.credentials {
            req_builder = req_builder.header("Authorization", credentials.authorization_header()?);
        }
        if !request.query.is_empty() {
            req_builder = req_builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.to_string());
        }

        let reqwest_request = req_builder.build().map_err(|source| HttpError::Network {
            request: RequestInfo::new(request.http_method, url),
            source,
        })?;
        let info = RequestInfo::new(request.http_method, reqwest_request.url().as_str());

        self.record(|| Record::Request {
            id,
            attempt,
            request: info.clone(),
            body: request.body.clone(),
            at: Utc::now(),
        });

        let result = async {
            let res = self.client.execute(reqwest_request).await?;
            let code = res.status().as_u16();
            let res_headers = Self::parse_response_headers(res.headers());
            let raw_body = res.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse::new(code, res_headers, raw_body, info.clone()))
        }
        .await;

        match result {
            Ok(response) => {
                self.record(|| Record::Response {
                    id,
                    attempt,
                    request: info.clone(),
                    code: response.code,
                    body: response.raw_body.clone(),
                    at: Utc::now(),
                });
                if let Some(limiter) = &self.rate_limiter {
                    limiter.update(&response);
                }
                Ok(response)
            }
            Err(source) => {
                self.record(|| Record::Error {
                    id,
                    attempt,
                    request: info.clone(),
                    message: source.to_string(),
                    at: Utc::now(),
                });
                Err(HttpError::Network {
                    request: info,
                    source,
                })
            }
        }
    }

    fn record(&self, record: impl FnOnce() -> Record) {
        if let Some(recorder) = &self.recorder {
            recorder.record(record());
        }
    }

    /// Parses response headers into a `HashMap` keyed by lowercase name.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}
