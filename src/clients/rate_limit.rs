//! Advisory request pacing driven by rate-limit response headers.
//!
//! The management API reports its quota through `X-RateLimit-Remaining` and
//! `X-RateLimit-Reset` (a Unix timestamp in microseconds), and answers
//! `429 Too Many Requests` with a `Retry-After` header when throttling. The
//! [`HeaderRateLimiter`] records that state and makes the transport wait for
//! the reset before dispatching again.
//!
//! This is pacing, not a token bucket: if headers are missing the limiter
//! never blocks and the transport's retry strategy still handles 429s.

use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::clients::http_response::HttpResponse;

/// Consulted by the transport before and after every attempt.
///
/// Implementations must be safe to share between concurrent requests.
/// Tests can substitute deterministic fakes.
pub trait RateLimiter: fmt::Debug + Send + Sync {
    /// Returns how long to wait before the next dispatch, if at all.
    fn delay(&self) -> Option<Duration>;

    /// Records the quota information carried by a completed response.
    fn update(&self, response: &HttpResponse);
}

/// Quota state parsed from response headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Requests left in the current window, if reported.
    pub remaining: Option<u64>,
    /// When the window resets, if reported.
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Parses the state from a response, returning `None` if it carries no
    /// rate-limit information.
    #[must_use]
    pub fn from_response(response: &HttpResponse, now: DateTime<Utc>) -> Option<Self> {
        let remaining = response
            .header("x-ratelimit-remaining")
            .and_then(|v| v.trim().parse::<u64>().ok());
        let mut reset_at = response
            .header("x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|micros| Utc.timestamp_micros(micros).single());

        // A throttled response is authoritative even without quota headers.
        if response.code == 429 {
            let retry_at = response
                .retry_after()
                .and_then(|retry_after| chrono::Duration::from_std(retry_after).ok())
                .and_then(|retry_after| now.checked_add_signed(retry_after));
            if let Some(retry_at) = retry_at {
                reset_at = Some(reset_at.map_or(retry_at, |r| r.max(retry_at)));
            }
            if reset_at.is_some() {
                return Some(Self {
                    remaining: Some(0),
                    reset_at,
                });
            }
        }

        if remaining.is_none() && reset_at.is_none() {
            return None;
        }
        Some(Self {
            remaining,
            reset_at,
        })
    }

    /// Returns the wait required at `now`, if the quota is exhausted.
    #[must_use]
    pub fn delay_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.remaining != Some(0) {
            return None;
        }
        let reset_at = self.reset_at?;
        (reset_at - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// Rate limiter that follows the API's quota headers.
#[derive(Debug, Default)]
pub struct HeaderRateLimiter {
    state: Mutex<RateLimitState>,
}

impl HeaderRateLimiter {
    /// Creates a limiter with no recorded quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded state.
    #[must_use]
    pub fn state(&self) -> RateLimitState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RateLimiter for HeaderRateLimiter {
    fn delay(&self) -> Option<Duration> {
        self.state().delay_at(Utc::now())
    }

    fn update(&self, response: &HttpResponse) {
        let Some(parsed) = RateLimitState::from_response(response, Utc::now()) else {
            return;
        };
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if parsed.remaining == Some(0) {
            tracing::debug!(
                "Rate limit exhausted, pausing requests until {:?}",
                parsed.reset_at
            );
        }
        *state = parsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{HttpMethod, RequestInfo};
    use std::collections::HashMap;

    fn response(code: u16, headers: &[(&str, String)]) -> HttpResponse {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            map.entry((*name).to_string()).or_default().push(value.clone());
        }
        HttpResponse::new(
            code,
            map,
            String::new(),
            RequestInfo::new(HttpMethod::Get, "http://localhost/x"),
        )
    }

    #[test]
    fn test_no_headers_means_no_state() {
        let now = Utc::now();
        assert!(RateLimitState::from_response(&response(200, &[]), now).is_none());
        assert!(RateLimitState::from_response(&response(429, &[]), now).is_none());
    }

    #[test]
    fn test_parses_remaining_and_reset_micros() {
        let now = Utc::now();
        let reset = now + chrono::Duration::seconds(2);
        let state = RateLimitState::from_response(
            &response(
                200,
                &[
                    ("x-ratelimit-remaining", "0".to_string()),
                    ("x-ratelimit-reset", reset.timestamp_micros().to_string()),
                ],
            ),
            now,
        )
        .unwrap();

        assert_eq!(state.remaining, Some(0));
        let delay = state.delay_at(now).unwrap();
        assert!(delay > Duration::from_millis(1900) && delay <= Duration::from_secs(2));
    }

    #[test]
    fn test_remaining_quota_never_delays() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: Some(10),
            reset_at: Some(now + chrono::Duration::seconds(30)),
        };
        assert!(state.delay_at(now).is_none());
    }

    #[test]
    fn test_elapsed_reset_never_delays() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: Some(0),
            reset_at: Some(now - chrono::Duration::seconds(1)),
        };
        assert!(state.delay_at(now).is_none());
    }

    #[test]
    fn test_throttled_response_uses_retry_after() {
        let now = Utc::now();
        let state = RateLimitState::from_response(
            &response(429, &[("retry-after", "3".to_string())]),
            now,
        )
        .unwrap();
        assert_eq!(state.remaining, Some(0));
        assert_eq!(state.delay_at(now), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_out_of_range_retry_after_is_ignored() {
        let now = Utc::now();
        for value in ["1e300", "1000000000000000"] {
            let throttled = response(429, &[("retry-after", value.to_string())]);
            let state = RateLimitState::from_response(&throttled, now);
            assert!(state.is_none(), "retry-after {value}");
        }

        let reset = now + chrono::Duration::seconds(2);
        let state = RateLimitState::from_response(
            &response(
                429,
                &[
                    ("retry-after", "1000000000000000".to_string()),
                    ("x-ratelimit-reset", reset.timestamp_micros().to_string()),
                ],
            ),
            now,
        )
        .unwrap();
        assert_eq!(state.reset_at, Utc.timestamp_micros(reset.timestamp_micros()).single());
    }

    #[test]
    fn test_limiter_records_latest_state() {
        let limiter = HeaderRateLimiter::new();
        assert!(limiter.delay().is_none());

        let reset = Utc::now() + chrono::Duration::seconds(5);
        limiter.update(&response(
            200,
            &[
                ("x-ratelimit-remaining", "0".to_string()),
                ("x-ratelimit-reset", reset.timestamp_micros().to_string()),
            ],
        ));
        assert!(limiter.delay().is_some());

        limiter.update(&response(
            200,
            &[("x-ratelimit-remaining", "99".to_string())],
        ));
        assert!(limiter.delay().is_none());
        assert_eq!(limiter.state().remaining, Some(99));
    }
}
