//! Bounds for polling and update-retry loops.

use std::time::Duration;

use crate::error::ConfigError;

/// Governs the convergence engine and the update-conflict retry loop.
///
/// `max_wait_duration` is authoritative: no loop runs past it. `max_polls`
/// is an optional additional cap on the number of state polls, and
/// `max_retries` is the total number of update attempts made while the
/// server keeps answering 409 Conflict.
///
/// Polling uses a fixed interval. This keeps the call contract simple and
/// predictable; exponential backoff with jitter would be the natural next
/// step if the API starts pushing back on poll traffic.
///
/// # Example
///
/// ```rust
/// use platform_api::RetrySettings;
/// use std::time::Duration;
///
/// let settings = RetrySettings::default()
///     .with_max_retries(5)
///     .with_interval(Duration::from_millis(500));
/// assert_eq!(settings.max_retries, 5);
/// assert_eq!(settings.max_wait_duration, Duration::from_secs(120));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total update attempts under sustained conflicts.
    pub max_retries: u32,
    /// Sleep between two polls or two conflicting updates.
    pub interval_between_tries: Duration,
    /// Upper bound for any polling or retry loop.
    pub max_wait_duration: Duration,
    /// Optional cap on the number of polls in one convergence wait.
    pub max_polls: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            interval_between_tries: Duration::from_secs(1),
            max_wait_duration: Duration::from_secs(120),
            max_polls: None,
        }
    }
}

impl RetrySettings {
    /// Sets the total number of update attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed sleep between attempts.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_between_tries = interval;
        self
    }

    /// Sets the overall wait bound.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_duration = max_wait;
        self
    }

    /// Caps the number of polls per convergence wait.
    #[must_use]
    pub const fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    /// Checks that the settings can make progress.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetrySettings`] when `max_retries` is zero
    /// or the wait bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetrySettings {
                reason: "max_retries must allow at least one attempt".to_string(),
            });
        }
        if self.max_wait_duration.is_zero() {
            return Err(ConfigError::InvalidRetrySettings {
                reason: "max_wait_duration must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RetrySettings::default();
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.interval_between_tries, Duration::from_secs(1));
        assert_eq!(settings.max_wait_duration, Duration::from_secs(120));
        assert!(settings.max_polls.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let settings = RetrySettings::default().with_max_retries(0);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidRetrySettings { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_wait() {
        let settings = RetrySettings::default().with_max_wait(Duration::ZERO);
        assert!(settings.validate().is_err());
    }
}
