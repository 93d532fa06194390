//! Polling until a resource reaches a lifecycle state.
//!
//! Server-side provisioning and teardown complete asynchronously.
//! [`await_state`] turns them into a bounded wait: it fetches the resource
//! every [`RetrySettings::interval_between_tries`] until the target state is
//! observed or the deadline passes.
//!
//! The interval is fixed. Exponential backoff with jitter would spread load
//! better under many concurrent waits and can replace the sleep here without
//! changing the call contract.

use std::fmt;
use std::future::Future;

use tokio::time::Instant;

use crate::clients::HttpResponse;
use crate::config::RetrySettings;
use crate::rest::errors::ResourceError;
use crate::rest::kind::Lifecycle;

/// State a convergence wait is looking for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// The resource reports its active status.
    Active,
    /// The resource is gone (the server answers 404).
    Removed,
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// What a single poll observed.
#[derive(Debug)]
enum Observation {
    Reached(Option<HttpResponse>),
    Pending(String),
}

/// Polls `fetch` until `target` is reached.
///
/// `fetch` performs one GET of the resource and must report a 404 as an
/// error for which [`ResourceError::is_not_found`] holds. Returns the last
/// fetched envelope for [`TargetState::Active`] and `None` for
/// [`TargetState::Removed`].
///
/// Without a `lifecycle` any successful fetch counts as active.
///
/// # Errors
///
/// - [`ResourceError::Deadline`] if `deadline` passes, or the optional
///   `max_polls` cap is reached, before the target is observed
/// - [`ResourceError::Deleting`] if the resource is being deleted while
///   waiting for [`TargetState::Active`]
/// - any error from `fetch` without an HTTP status (network, credentials,
///   decoding) is returned unchanged; an error response keeps the wait going
pub async fn await_state<F, Fut>(
    resource: &'static str,
    id: &str,
    target: TargetState,
    lifecycle: Option<Lifecycle>,
    settings: &RetrySettings,
    deadline: Instant,
    mut fetch: F,
) -> Result<Option<HttpResponse>, ResourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HttpResponse, ResourceError>>,
{
    let started = Instant::now();
    let mut polls: u32 = 0;

    loop {
        let now = Instant::now();
        let capped = settings.max_polls.is_some_and(|max| polls >= max);
        if now >= deadline || capped {
            return Err(ResourceError::Deadline {
                resource,
                id: id.to_string(),
                target,
                waited: now.duration_since(started),
            });
        }
        polls += 1;

        let observation = match (fetch().await, target) {
            (Err(e), TargetState::Removed) if e.is_not_found() => Observation::Reached(None),
            (Err(e), TargetState::Active) if e.is_not_found() => {
                Observation::Pending("absent".to_string())
            }
            (Err(e), _) => match e.status() {
                Some(code) => Observation::Pending(format!("HTTP {code}")),
                None => return Err(e),
            },
            (Ok(_), TargetState::Removed) => Observation::Pending("present".to_string()),
            (Ok(response), TargetState::Active) => {
                observe_active(resource, id, lifecycle, response)?
            }
        };

        let status = match observation {
            Observation::Reached(response) => {
                tracing::debug!("{} '{}' is {} after {} poll(s)", resource, id, target, polls);
                return Ok(response);
            }
            Observation::Pending(status) => status,
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        let pause = settings.interval_between_tries.min(remaining);
        tracing::debug!(
            "Waiting for {} '{}' to become {} (currently {}, poll {}), next check in {:?}",
            resource,
            id,
            target,
            status,
            polls,
            pause
        );
        tokio::time::sleep(pause).await;
    }
}

fn observe_active(
    resource: &'static str,
    id: &str,
    lifecycle: Option<Lifecycle>,
    response: HttpResponse,
) -> Result<Observation, ResourceError> {
    let Some(lifecycle) = lifecycle else {
        return Ok(Observation::Reached(Some(response)));
    };
    let status = lifecycle_status(resource, id, &lifecycle, &response)?;

    if status == lifecycle.active {
        Ok(Observation::Reached(Some(response)))
    } else if status == lifecycle.deleting {
        Err(ResourceError::Deleting {
            resource,
            id: id.to_string(),
        })
    } else {
        Ok(Observation::Pending(status))
    }
}

/// Reads the lifecycle status field of a fetched resource.
pub(crate) fn lifecycle_status(
    resource: &'static str,
    id: &str,
    lifecycle: &Lifecycle,
    response: &HttpResponse,
) -> Result<String, ResourceError> {
    let body = response.json().map_err(|source| ResourceError::Decode {
        resource,
        context: format!("get '{id}'"),
        source,
    })?;
    body.get(lifecycle.status_field)
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ResourceError::MissingField {
            resource,
            id: id.to_string(),
            field: lifecycle.status_field,
        })
}
