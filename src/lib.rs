//! # Platform API Rust Client
//!
//! A resilient client for platform management REST APIs. It reconciles a
//! caller's desired state for configuration resources (buckets, workflows,
//! documents, ...) against a server that is eventually consistent,
//! privilege-gated and rate-limited.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the base URL and access tokens
//! - An async HTTP transport with bounded concurrency, response-driven
//!   retries, rate-limit pacing and request/response recording
//! - A generic [`ResourceClient`](rest::ResourceClient) with pagination,
//!   optimistic-concurrency updates, upsert, convergence polling and
//!   privilege fallback
//! - Resource family descriptions in [`resources`]
//!
//! ## Quick Start
//!
//! ```rust
//! use platform_api::{ApiToken, BaseUrl, ClientConfig, Credentials, RetrySettings};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .base_url(BaseUrl::new("https://abc123.apps.example.com").unwrap())
//!     .credentials(Credentials::PlatformToken(ApiToken::new("dt0s16.token").unwrap()))
//!     .concurrent_request_limit(5)
//!     .rate_limiting(true)
//!     .retry_settings(RetrySettings::default().with_max_wait(Duration::from_secs(60)))
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Working With Resources
//!
//! ```rust,ignore
//! use platform_api::resources::Bucket;
//! use platform_api::rest::{ResourceClient, TargetState};
//! use serde_json::json;
//!
//! let buckets = ResourceClient::<Bucket>::from_config(&config)?;
//!
//! // Returns once the bucket is active, whether it was created or updated
//! buckets
//!     .upsert("custom_logs", &json!({"table": "logs", "retentionDays": 35}))
//!     .await?;
//!
//! // Returns the 202 response once the bucket is gone
//! buckets.delete("custom_logs").await?;
//! ```
//!
//! ## Observing Traffic
//!
//! ```rust,ignore
//! use platform_api::clients::RequestResponseRecorder;
//!
//! let (recorder, mut records) = RequestResponseRecorder::channel();
//! let config = ClientConfig::builder()
//!     .base_url(base_url)
//!     .recorder(recorder)
//!     .build()?;
//! tokio::spawn(async move {
//!     while let Some(record) = records.recv().await {
//!         tracing::info!(?record, "api traffic");
//!     }
//! });
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: limiter, rate limiter and recorder are owned by the
//!   configuration and injected into the transport
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all clients are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime; operations
//!   spawn no background tasks and are cancelled by dropping their future

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod resources;
pub mod rest;

// Re-export public types at crate root for convenience
pub use auth::{Credentials, TokenError, TokenSource};
pub use config::{ApiToken, BaseUrl, ClientConfig, ClientConfigBuilder, RetrySettings};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
    HttpResponseError, InvalidHttpRequestError,
};

// Re-export resource protocol types
pub use rest::{ListResponse, ResourceClient, ResourceError, ResourceKind, TargetState};
