//! Process-wide bound on in-flight requests.
//!
//! Provides a semaphore-based limiter shared by every client that holds a
//! clone of it. Permits are RAII guards: they are returned when dropped, so a
//! request that errors or panics still releases its slot.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting semaphore bounding concurrent HTTP requests.
///
/// Cloning is cheap and clones share the same permits, which is how one
/// limit is applied across several clients.
///
/// # Example
///
/// ```rust
/// use platform_api::clients::ConcurrencyLimiter;
///
/// let limiter = ConcurrencyLimiter::new(5);
/// assert_eq!(limiter.limit(), Some(5));
///
/// let unlimited = ConcurrencyLimiter::new(0);
/// assert_eq!(unlimited.limit(), None);
/// ```
#[derive(Clone, Debug)]
pub struct ConcurrencyLimiter {
    semaphore: Option<Arc<Semaphore>>,
    limit: usize,
}

impl ConcurrencyLimiter {
    /// Creates a limiter allowing `limit` concurrent requests.
    ///
    /// A limit of zero or below disables limiting.
    #[must_use]
    pub fn new(limit: i64) -> Self {
        match usize::try_from(limit) {
            Ok(limit) if limit > 0 => Self {
                semaphore: Some(Arc::new(Semaphore::new(limit))),
                limit,
            },
            _ => Self::unlimited(),
        }
    }

    /// Creates a limiter that never blocks.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            semaphore: None,
            limit: 0,
        }
    }

    /// Returns the configured limit, or `None` when unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|_| self.limit)
    }

    /// Returns the number of requests that could start immediately.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore
            .as_ref()
            .map_or(usize::MAX, |semaphore| semaphore.available_permits())
    }

    /// Waits for a free slot.
    ///
    /// Returns `None` when limiting is disabled. The returned permit releases
    /// the slot when dropped.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        let semaphore = self.semaphore.as_ref()?;
        if semaphore.available_permits() == 0 {
            tracing::debug!(
                "Concurrency limiter: waiting for permit ({} in flight)",
                self.limit
            );
        }
        // Never closed, so this only yields `None` if that invariant breaks.
        Arc::clone(semaphore).acquire_owned().await.ok()
    }
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
