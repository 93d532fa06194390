//! One-shot downgrade of elevated requests.
//!
//! Families that accept `adminAccess=true` may reject it with 403 when the
//! credentials lack the admin scope. For families marked
//! [`AdminAccess::WithFallback`] the operation is then repeated once without
//! the flag. Any other outcome of the elevated attempt is final, and a
//! downgraded attempt is never re-escalated.

use std::future::Future;

use crate::rest::errors::ResourceError;
use crate::rest::kind::AdminAccess;

/// Runs `op`, first elevated if requested and supported.
///
/// `op` receives whether to send the elevated flag. On success, returns the
/// result together with the flag value that succeeded, so that follow-up
/// requests of the same operation (such as later list pages) can reuse it.
///
/// # Errors
///
/// Returns the error of the last attempt made.
pub async fn with_fallback<T, F, Fut>(
    resource: &'static str,
    access: AdminAccess,
    requested: bool,
    mut op: F,
) -> Result<(T, bool), ResourceError>
where
    F: FnMut(bool) -> Fut,
    Fut: Future<Output = Result<T, ResourceError>>,
{
    if !requested || access == AdminAccess::Unsupported {
        return op(false).await.map(|value| (value, false));
    }

    match op(true).await {
        Ok(value) => Ok((value, true)),
        Err(e) if e.is_forbidden() && access == AdminAccess::WithFallback => {
            tracing::debug!(
                "Elevated access to {} was forbidden, retrying without it: {}",
                resource,
                e
            );
            op(false).await.map(|value| (value, false))
        }
        Err(e) => Err(e),
    }
}
