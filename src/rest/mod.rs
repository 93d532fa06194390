//! Generic resource protocol for the management API.
//!
//! This module turns asynchronous, versioned and privilege-gated server
//! operations into awaitable calls with idempotent semantics:
//!
//! - **[`ResourceKind`]**: static description of one resource family
//!   (path, identity field, paging, lifecycle, versioning, admin access)
//! - **[`ResourceClient<K>`]**: get, list, create, update, delete, upsert and
//!   state waits for any family
//! - **[`Paginator`] / [`ListResponse`]**: offset and cursor pagination
//! - **[`await_state`]**: polling until a resource is active or removed
//! - **[`with_fallback`]**: one-shot downgrade of a forbidden elevated request
//! - **[`ResourceError`]**: error kinds callers can branch on
//!
//! # Example
//!
//! ```rust,ignore
//! use platform_api::resources::Workflow;
//! use platform_api::rest::ResourceClient;
//!
//! let workflows = ResourceClient::<Workflow>::from_config(&config)?.with_admin_access(true);
//!
//! // Drains every page; falls back to plain access if admin access is forbidden
//! let list = workflows.list().await?;
//! for workflow in list.all() {
//!     println!("{}", workflow["title"]);
//! }
//!
//! // Creates or updates, whichever applies
//! workflows.upsert("nightly-cleanup", &payload).await?;
//! ```

mod client;
mod convergence;
mod errors;
mod kind;
mod pagination;
mod privilege;

pub use client::ResourceClient;
pub use convergence::{await_state, TargetState};
pub use errors::ResourceError;
pub use kind::{
    AdminAccess, Lifecycle, Paging, ResourceKind, Versioning, ADMIN_ACCESS_PARAM,
    OPTIMISTIC_LOCKING_PARAM,
};
pub use pagination::{Continuation, ListResponse, Paginator, OFFSET_PARAM, PAGE_KEY_PARAM};
pub use privilege::with_fallback;
