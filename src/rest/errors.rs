//! Error types for resource operations.
//!
//! [`ResourceError`] classifies every failure of the resource layer so that
//! callers can branch on it:
//!
//! - **Domain errors**: [`ResourceError::EmptyId`],
//!   [`ResourceError::InvalidPayload`] and [`ResourceError::Deleting`] are
//!   returned before any request is sent where possible
//! - **Not found**: [`ResourceError::NotFound`] wraps a 404 response
//! - **Decode errors**: [`ResourceError::Decode`] and
//!   [`ResourceError::MissingField`] for unexpected response bodies
//! - **Deadline**: [`ResourceError::Deadline`] when a wait runs out of time,
//!   [`ResourceError::TimedOut`] when a retry loop does
//! - **Partial list**: [`ResourceError::PartialList`] carries the pages read
//!   before a list failed
//! - **Everything else**: [`ResourceError::Http`] wraps the transport error,
//!   keeping status code and body
//!
//! # Example
//!
//! ```rust,ignore
//! use platform_api::rest::ResourceError;
//!
//! match buckets.get("logs").await {
//!     Ok(response) => println!("{}", response.raw_body),
//!     Err(e) if e.is_not_found() => println!("no such bucket"),
//!     Err(ResourceError::Http(e)) => println!("server said: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::clients::{HttpError, HttpResponseError};
use crate::rest::convergence::TargetState;
use crate::rest::pagination::ListResponse;

/// Error type for resource operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// An operation was called with an empty identifier.
    #[error("Cannot {operation} {resource}: id must not be empty")]
    EmptyId {
        /// Resource family name.
        resource: &'static str,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// The payload is not a JSON object.
    #[error("Invalid {resource} payload: {reason}")]
    InvalidPayload {
        /// Resource family name.
        resource: &'static str,
        /// What is wrong with the payload.
        reason: String,
    },

    /// The resource does not exist (HTTP 404).
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Resource family name.
        resource: &'static str,
        /// Requested id.
        id: String,
        /// The 404 response.
        #[source]
        source: HttpResponseError,
    },

    /// The resource is being deleted and cannot be modified or become active.
    #[error("{resource} '{id}' is being deleted")]
    Deleting {
        /// Resource family name.
        resource: &'static str,
        /// Resource id.
        id: String,
    },

    /// A response body could not be parsed.
    #[error("Failed to decode {resource} response ({context})")]
    Decode {
        /// Resource family name.
        resource: &'static str,
        /// Operation and id the response belongs to.
        context: String,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A response body lacks a field the protocol depends on.
    #[error("{resource} '{id}' response has no usable '{field}' field")]
    MissingField {
        /// Resource family name.
        resource: &'static str,
        /// Resource id.
        id: String,
        /// The missing field.
        field: &'static str,
    },

    /// A wait did not observe the target state before its deadline.
    #[error("{resource} '{id}' did not become {target} within {waited:?}")]
    Deadline {
        /// Resource family name.
        resource: &'static str,
        /// Resource id.
        id: String,
        /// State that was awaited.
        target: TargetState,
        /// Time spent waiting.
        waited: Duration,
    },

    /// A retrying operation ran out of time before it could complete.
    #[error("{operation} of {resource} '{id}' did not complete within {waited:?}")]
    TimedOut {
        /// Resource family name.
        resource: &'static str,
        /// Resource id.
        id: String,
        /// The operation that was retrying (`update`, `upsert`).
        operation: &'static str,
        /// Time spent retrying.
        waited: Duration,
    },

    /// A list failed after at least one page was read.
    #[error("Listing {resource} failed after {} page(s)", partial.pages().len())]
    PartialList {
        /// Resource family name.
        resource: &'static str,
        /// Pages accumulated before the failure.
        partial: Box<ListResponse>,
        /// The failure that ended the list.
        #[source]
        source: Box<ResourceError>,
    },

    /// A transport or HTTP error.
    #[error(transparent)]
    Http(#[from] HttpError),
}

impl ResourceError {
    /// Returns the HTTP status code behind this error, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { source, .. } => Some(source.code),
            Self::Http(e) => e.status(),
            Self::PartialList { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns the server's error response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&HttpResponseError> {
        match self {
            Self::NotFound { source, .. } => Some(source),
            Self::Http(e) => e.response(),
            Self::PartialList { source, .. } => source.response(),
            _ => None,
        }
    }

    /// Returns `true` for a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` for a 409.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns `true` for a 403.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Returns `true` for [`ResourceError::Deadline`] and
    /// [`ResourceError::TimedOut`].
    #[must_use]
    pub const fn is_deadline(&self) -> bool {
        matches!(self, Self::Deadline { .. } | Self::TimedOut { .. })
    }

    /// Returns the accumulated pages of a [`ResourceError::PartialList`].
    #[must_use]
    pub fn partial_list(&self) -> Option<&ListResponse> {
        match self {
            Self::PartialList { partial, .. } => Some(partial),
            _ => None,
        }
    }

    /// Turns a 404 transport error into [`ResourceError::NotFound`].
    pub(crate) fn classify(resource: &'static str, id: &str, error: HttpError) -> Self {
        match error {
            HttpError::Response(source) if source.code == 404 => Self::NotFound {
                resource,
                id: id.to_string(),
                source,
            },
            other => Self::Http(other),
        }
    }
}
