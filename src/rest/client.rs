//! Generic resource client.
//!
//! [`ResourceClient`] implements get, list, create, update, delete, upsert
//! and state waits once for every family described by a [`ResourceKind`].
//! Each operation returns only after the server-side effect is observable:
//! families with an asynchronous lifecycle are polled until the resource is
//! active (create, update) or gone (delete).

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::time::Instant;

use crate::clients::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpRequestBuilder, HttpResponse,
};
use crate::config::{ClientConfig, RetrySettings};
use crate::rest::convergence::{self, lifecycle_status, TargetState};
use crate::rest::errors::ResourceError;
use crate::rest::kind::{ResourceKind, ADMIN_ACCESS_PARAM};
use crate::rest::pagination::{Continuation, ListResponse, Paginator};
use crate::rest::privilege::with_fallback;

/// Client for one resource family.
///
/// Cheap to clone; all clones share the same [`HttpClient`] and therefore
/// the same concurrency bound and rate-limit state.
///
/// # Deadlines and cancellation
///
/// Every operation is bounded by the earlier of the deadline set with
/// [`with_deadline`](Self::with_deadline) and `now + max_wait_duration` of
/// the client's [`RetrySettings`]. Dropping an operation's future cancels it.
///
/// # Example
///
/// ```rust,ignore
/// use platform_api::resources::Bucket;
/// use platform_api::rest::ResourceClient;
/// use serde_json::json;
///
/// let buckets = ResourceClient::<Bucket>::from_config(&config)?;
/// let response = buckets
///     .upsert("logs", &json!({"table": "logs", "retentionDays": 35}))
///     .await?;
/// assert_eq!(response.code, 201);
/// ```
pub struct ResourceClient<K: ResourceKind> {
    http: Arc<HttpClient>,
    settings: RetrySettings,
    deadline: Option<Instant>,
    admin_access: bool,
    kind: PhantomData<fn() -> K>,
}

// Verify ResourceClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceClient<crate::resources::Bucket>>();
};

impl<K: ResourceKind> Clone for ResourceClient<K> {
    fn clone(&self) -> Self {
        Self {
            http: Arc::clone(&self.http),
            settings: self.settings,
            deadline: self.deadline,
            admin_access: self.admin_access,
            kind: PhantomData,
        }
    }
}

impl<K: ResourceKind> fmt::Debug for ResourceClient<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("resource", &K::NAME)
            .field("base_url", self.http.base_url())
            .field("settings", &self.settings)
            .field("deadline", &self.deadline)
            .field("admin_access", &self.admin_access)
            .finish()
    }
}

impl<K: ResourceKind> ResourceClient<K> {
    /// Creates a client on a shared transport.
    #[must_use]
    pub fn new(http: Arc<HttpClient>, settings: RetrySettings) -> Self {
        Self {
            http,
            settings,
            deadline: None,
            admin_access: false,
            kind: PhantomData,
        }
    }

    /// Creates a client with its own transport.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the transport cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self, HttpError> {
        Ok(Self::new(
            Arc::new(HttpClient::new(config)?),
            *config.retry_settings(),
        ))
    }

    /// Bounds every operation by `deadline` in addition to the configured
    /// maximum wait.
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<Instant>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Requests elevated access on every call, for families that accept it.
    #[must_use]
    pub const fn with_admin_access(mut self, enabled: bool) -> Self {
        self.admin_access = enabled;
        self
    }

    /// Returns the retry and polling settings.
    #[must_use]
    pub const fn settings(&self) -> &RetrySettings {
        &self.settings
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    /// Fetches one resource.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::EmptyId`] if `id` is empty; no request is sent
    /// - [`ResourceError::NotFound`] if the server answers 404
    /// - [`ResourceError::Http`] for any other failure
    pub async fn get(&self, id: &str) -> Result<HttpResponse, ResourceError> {
        require_id::<K>(id, "get")?;
        self.fetch(id).await
    }

    /// Lists every resource of the family, draining all pages.
    ///
    /// With admin access requested, the first page decides whether the flag
    /// is kept: if it is forbidden and the family supports fallback, the
    /// first page is re-requested without it and so are all later pages.
    ///
    /// # Errors
    ///
    /// A failure on the first page is returned as is. A later failure is
    /// returned as [`ResourceError::PartialList`] carrying the pages read so
    /// far.
    pub async fn list(&self) -> Result<ListResponse, ResourceError> {
        let mut pager = Paginator::new(K::NAME, K::PAGING);
        let mut admin = false;

        while let Some(continuation) = pager.next_request() {
            let result = if pager.is_first_page() {
                with_fallback(K::NAME, K::ADMIN_ACCESS, self.admin_access, move |elevated| {
                    self.list_page(None, elevated)
                })
                .await
                .map(|(page, elevated)| {
                    admin = elevated;
                    page
                })
            } else {
                self.list_page(continuation, admin).await
            };

            let page = match result {
                Ok(page) => page,
                Err(e) => return Err(pager.fail(e)),
            };
            if let Err(e) = pager.absorb(page) {
                return Err(pager.fail(e));
            }
        }

        Ok(pager.finish())
    }

    /// Creates a resource.
    ///
    /// Identity, version and status fields of `payload` are dropped; `id`,
    /// if given, becomes the identity of the new resource. Families with an
    /// asynchronous lifecycle are polled until the resource is active and
    /// the final read is returned with status 201.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::EmptyId`] if `id` is `Some("")`
    /// - [`ResourceError::InvalidPayload`] if `payload` is not an object
    /// - [`ResourceError::Http`] for a failed POST (409 if the id is taken)
    /// - [`ResourceError::Deadline`] if the resource does not become active
    ///   in time
    pub async fn create(
        &self,
        id: Option<&str>,
        payload: &Value,
    ) -> Result<HttpResponse, ResourceError> {
        if let Some(id) = id {
            require_id::<K>(id, "create")?;
        }
        self.create_within(id, payload, self.deadline()).await
    }

    /// Updates a resource.
    ///
    /// The current state is fetched first, waiting for an active state if
    /// the resource is transitioning. The observed version is attached as
    /// the family's optimistic-concurrency contract requires. A 409 is
    /// retried with a fresh read until `max_retries` attempts were made.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::EmptyId`] if `id` is empty; no request is sent
    /// - [`ResourceError::NotFound`] if the resource does not exist
    /// - [`ResourceError::Deleting`] if the resource is being deleted
    /// - [`ResourceError::Http`] with status 409 once attempts are exhausted
    /// - [`ResourceError::Deadline`] if the resource does not become active
    ///   in time
    /// - [`ResourceError::TimedOut`] if the deadline passes while retrying
    ///   conflicts
    pub async fn update(&self, id: &str, payload: &Value) -> Result<HttpResponse, ResourceError> {
        require_id::<K>(id, "update")?;
        self.update_within(id, payload, self.deadline()).await
    }

    /// Deletes a resource.
    ///
    /// Families with an asynchronous lifecycle are polled until the resource
    /// is gone; the original DELETE response is returned.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::EmptyId`] if `id` is empty; no request is sent
    /// - [`ResourceError::NotFound`] if the resource does not exist
    /// - [`ResourceError::Deadline`] if removal is not observed in time
    pub async fn delete(&self, id: &str) -> Result<HttpResponse, ResourceError> {
        require_id::<K>(id, "delete")?;
        let deadline = self.deadline();

        let (response, _) = with_fallback(
            K::NAME,
            K::ADMIN_ACCESS,
            self.admin_access,
            move |elevated| self.delete_once(id, elevated),
        )
        .await?;

        if K::LIFECYCLE.is_some() {
            self.await_within(id, TargetState::Removed, deadline).await?;
        }
        Ok(response)
    }

    /// Creates the resource, or updates it if it already exists.
    ///
    /// A resource that is being deleted, or that disappears between the
    /// conflicting create and the update, is awaited until removed and then
    /// created again.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::EmptyId`] if `id` is empty; no request is sent
    /// - any create failure other than 409, unchanged
    /// - any update failure other than a vanished or deleting resource
    /// - [`ResourceError::Deadline`] if a wait for activation or removal
    ///   runs out of time
    /// - [`ResourceError::TimedOut`] if the deadline passes between attempts
    pub async fn upsert(&self, id: &str, payload: &Value) -> Result<HttpResponse, ResourceError> {
        require_id::<K>(id, "upsert")?;
        let started = Instant::now();
        let deadline = self.deadline();

        loop {
            if Instant::now() >= deadline {
                return Err(timed_out::<K>(id, "upsert", started));
            }

            match self.create_within(Some(id), payload, deadline).await {
                Err(e) if e.is_conflict() => {
                    tracing::debug!("{} '{}' already exists, updating it", K::NAME, id);
                }
                other => return other,
            }

            match self.update_within(id, payload, deadline).await {
                Err(e) if e.is_not_found() || matches!(e, ResourceError::Deleting { .. }) => {
                    tracing::debug!(
                        "{} '{}' is being removed, waiting before re-creating it",
                        K::NAME,
                        id
                    );
                    self.await_within(id, TargetState::Removed, deadline).await?;
                }
                other => return other,
            }
        }
    }

    /// Waits until the resource reaches `target`.
    ///
    /// Returns the final read for [`TargetState::Active`] and `None` for
    /// [`TargetState::Removed`].
    ///
    /// # Errors
    ///
    /// See [`await_state`](crate::rest::await_state).
    pub async fn await_state(
        &self,
        id: &str,
        target: TargetState,
    ) -> Result<Option<HttpResponse>, ResourceError> {
        require_id::<K>(id, "await")?;
        self.await_within(id, target, self.deadline()).await
    }

    fn deadline(&self) -> Instant {
        let bound = Instant::now() + self.settings.max_wait_duration;
        self.deadline.map_or(bound, |deadline| deadline.min(bound))
    }

    async fn create_within(
        &self,
        id: Option<&str>,
        payload: &Value,
        deadline: Instant,
    ) -> Result<HttpResponse, ResourceError> {
        let body = prepare_body::<K>(payload, id)?;
        let body = &body;

        let (response, _) = with_fallback(
            K::NAME,
            K::ADMIN_ACCESS,
            self.admin_access,
            move |elevated| self.post_once(body, elevated),
        )
        .await?;

        if K::LIFECYCLE.is_none() || reports_active::<K>(&response) {
            return Ok(response);
        }

        let created_id = match id {
            Some(id) => id.to_string(),
            None => created_id::<K>(&response)?,
        };
        let awaited = self
            .await_within(&created_id, TargetState::Active, deadline)
            .await?;
        Ok(awaited.map_or(response, |read| read.with_code(201)))
    }

    async fn update_within(
        &self,
        id: &str,
        payload: &Value,
        deadline: Instant,
    ) -> Result<HttpResponse, ResourceError> {
        let started = Instant::now();
        let body = prepare_body::<K>(payload, Some(id))?;
        let max_attempts = self.settings.max_retries.max(1);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let current = self.current_for_update(id, deadline).await?;
            let version = observed_version::<K>(id, &current)?;
            let attempt_body = with_version::<K>(body.clone(), version.as_ref());
            let attempt_body = &attempt_body;
            let version_param = version.as_ref().map(version_string);
            let version_param = version_param.as_deref();

            let result = with_fallback(
                K::NAME,
                K::ADMIN_ACCESS,
                self.admin_access,
                move |elevated| self.put_once(id, attempt_body, version_param, elevated),
            )
            .await;

            match result {
                Ok((response, _)) => return self.after_update(id, response, deadline).await,
                Err(e) if e.is_conflict() && attempt < max_attempts => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(timed_out::<K>(id, "update", started));
                    }
                    let pause = self.settings.interval_between_tries.min(remaining);
                    tracing::debug!(
                        "Conflict updating {} '{}' (attempt {}/{}), retrying in {:?}",
                        K::NAME,
                        id,
                        attempt,
                        max_attempts,
                        pause
                    );
                    tokio::time::sleep(pause).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn current_for_update(
        &self,
        id: &str,
        deadline: Instant,
    ) -> Result<HttpResponse, ResourceError> {
        let current = self.fetch(id).await?;
        let Some(lifecycle) = K::LIFECYCLE else {
            return Ok(current);
        };

        let status = lifecycle_status(K::NAME, id, &lifecycle, &current)?;
        if status == lifecycle.active {
            return Ok(current);
        }
        if status == lifecycle.deleting {
            return Err(ResourceError::Deleting {
                resource: K::NAME,
                id: id.to_string(),
            });
        }

        tracing::debug!(
            "{} '{}' is {}, waiting for it to become active before updating",
            K::NAME,
            id,
            status
        );
        let awaited = self
            .await_within(id, TargetState::Active, deadline)
            .await?;
        Ok(awaited.unwrap_or(current))
    }

    async fn after_update(
        &self,
        id: &str,
        response: HttpResponse,
        deadline: Instant,
    ) -> Result<HttpResponse, ResourceError> {
        if K::LIFECYCLE.is_none() || reports_active::<K>(&response) {
            return Ok(response);
        }
        let code = response.code;
        let awaited = self
            .await_within(id, TargetState::Active, deadline)
            .await?;
        Ok(awaited.map_or(response, |read| read.with_code(code)))
    }

    async fn await_within(
        &self,
        id: &str,
        target: TargetState,
        deadline: Instant,
    ) -> Result<Option<HttpResponse>, ResourceError> {
        convergence::await_state(
            K::NAME,
            id,
            target,
            K::LIFECYCLE,
            &self.settings,
            deadline,
            move || self.fetch(id),
        )
        .await
    }

    async fn fetch(&self, id: &str) -> Result<HttpResponse, ResourceError> {
        with_fallback(
            K::NAME,
            K::ADMIN_ACCESS,
            self.admin_access,
            move |elevated| self.get_once(id, elevated),
        )
        .await
        .map(|(response, _)| response)
    }

    async fn get_once(&self, id: &str, elevated: bool) -> Result<HttpResponse, ResourceError> {
        let builder = HttpRequest::builder(HttpMethod::Get, item_path::<K>(id));
        self.dispatch(Some(id), with_admin_flag(builder, elevated))
            .await
    }

    async fn list_page(
        &self,
        continuation: Option<Continuation>,
        elevated: bool,
    ) -> Result<HttpResponse, ResourceError> {
        let mut builder = HttpRequest::builder(HttpMethod::Get, K::PATH);
        if let Some((name, value)) = continuation {
            builder = builder.query_param(name, value);
        }
        self.dispatch(None, with_admin_flag(builder, elevated)).await
    }

    async fn post_once(&self, body: &Value, elevated: bool) -> Result<HttpResponse, ResourceError> {
        let builder = HttpRequest::builder(HttpMethod::Post, K::PATH).body(body.clone());
        self.dispatch(None, with_admin_flag(builder, elevated)).await
    }

    async fn put_once(
        &self,
        id: &str,
        body: &Value,
        version: Option<&str>,
        elevated: bool,
    ) -> Result<HttpResponse, ResourceError> {
        let mut builder =
            HttpRequest::builder(HttpMethod::Put, item_path::<K>(id)).body(body.clone());
        if let (Some(version), Some(param)) =
            (version, K::VERSIONING.and_then(|v| v.query_param))
        {
            builder = builder.query_param(param, version);
        }
        self.dispatch(Some(id), with_admin_flag(builder, elevated))
            .await
    }

    async fn delete_once(&self, id: &str, elevated: bool) -> Result<HttpResponse, ResourceError> {
        let builder = HttpRequest::builder(HttpMethod::Delete, item_path::<K>(id));
        self.dispatch(Some(id), with_admin_flag(builder, elevated))
            .await
    }

    async fn dispatch(
        &self,
        id: Option<&str>,
        builder: HttpRequestBuilder,
    ) -> Result<HttpResponse, ResourceError> {
        let request = builder.build().map_err(HttpError::from)?;
        self.http.request(request).await.map_err(|e| match id {
            Some(id) => ResourceError::classify(K::NAME, id, e),
            None => ResourceError::Http(e),
        })
    }
}

fn require_id<K: ResourceKind>(id: &str, operation: &'static str) -> Result<(), ResourceError> {
    if id.trim().is_empty() {
        return Err(ResourceError::EmptyId {
            resource: K::NAME,
            operation,
        });
    }
    Ok(())
}

fn item_path<K: ResourceKind>(id: &str) -> String {
    format!("{}/{}", K::PATH, urlencoding::encode(id))
}

fn with_admin_flag(builder: HttpRequestBuilder, elevated: bool) -> HttpRequestBuilder {
    if elevated {
        builder.query_param(ADMIN_ACCESS_PARAM, "true")
    } else {
        builder
    }
}

/// Drops server-managed fields from `payload` and sets the identity to `id`.
fn prepare_body<K: ResourceKind>(
    payload: &Value,
    id: Option<&str>,
) -> Result<Value, ResourceError> {
    let Value::Object(object) = payload else {
        return Err(ResourceError::InvalidPayload {
            resource: K::NAME,
            reason: "expected a JSON object".to_string(),
        });
    };

    let mut object: Map<String, Value> = object.clone();
    object.remove(K::ID_FIELD);
    if let Some(versioning) = K::VERSIONING {
        object.remove(versioning.field);
    }
    if let Some(lifecycle) = K::LIFECYCLE {
        object.remove(lifecycle.status_field);
    }
    if let Some(id) = id {
        object.insert(K::ID_FIELD.to_string(), Value::String(id.to_string()));
    }
    Ok(Value::Object(object))
}

fn observed_version<K: ResourceKind>(
    id: &str,
    current: &HttpResponse,
) -> Result<Option<Value>, ResourceError> {
    let Some(versioning) = K::VERSIONING else {
        return Ok(None);
    };
    let body = current.json().map_err(|source| ResourceError::Decode {
        resource: K::NAME,
        context: format!("get '{id}'"),
        source,
    })?;
    match body.get(versioning.field) {
        Some(version) if !version.is_null() => Ok(Some(version.clone())),
        _ => Err(ResourceError::MissingField {
            resource: K::NAME,
            id: id.to_string(),
            field: versioning.field,
        }),
    }
}

fn with_version<K: ResourceKind>(mut body: Value, version: Option<&Value>) -> Value {
    if let (Some(versioning), Some(version), Value::Object(object)) =
        (K::VERSIONING, version, &mut body)
    {
        if versioning.in_body {
            object.insert(versioning.field.to_string(), version.clone());
        }
    }
    body
}

fn version_string(version: &Value) -> String {
    version
        .as_str()
        .map_or_else(|| version.to_string(), ToString::to_string)
}

fn reports_active<K: ResourceKind>(response: &HttpResponse) -> bool {
    K::LIFECYCLE.is_some_and(|lifecycle| {
        response.json().ok().is_some_and(|body| {
            body.get(lifecycle.status_field).and_then(Value::as_str) == Some(lifecycle.active)
        })
    })
}

fn created_id<K: ResourceKind>(response: &HttpResponse) -> Result<String, ResourceError> {
    response
        .json()
        .ok()
        .and_then(|body| {
            body.get(K::ID_FIELD)
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .ok_or_else(|| ResourceError::MissingField {
            resource: K::NAME,
            id: String::new(),
            field: K::ID_FIELD,
        })
}

fn timed_out<K: ResourceKind>(
    id: &str,
    operation: &'static str,
    started: Instant,
) -> ResourceError {
    ResourceError::TimedOut {
        resource: K::NAME,
        id: id.to_string(),
        operation,
        waited: started.elapsed(),
    }
}
