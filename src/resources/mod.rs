//! Resource families of the management API.
//!
//! Each family is a [`ResourceKind`](crate::rest::ResourceKind) marker type
//! used with [`ResourceClient`](crate::rest::ResourceClient).
//!
//! # Available Resources
//!
//! ## Storage
//!
//! - [`Bucket`] - Grail bucket definitions. Creation and deletion complete
//!   asynchronously; updates carry the bucket `version`.
//! - [`BucketDefinition`] / [`BucketStatus`] - typed view of a bucket body
//!
//! ## Automation
//!
//! - [`Workflow`], [`BusinessCalendar`], [`SchedulingRule`] - offset-paged
//!   families that accept `adminAccess=true` and fall back to plain access
//!   when it is forbidden
//!
//! ## Documents
//!
//! - [`Document`] - cursor-paged documents whose updates carry
//!   `optimistic-locking-version`
//! - [`DocumentMetadata`] - typed view of a document body

mod automation;
mod bucket;
mod document;

pub use automation::{BusinessCalendar, SchedulingRule, Workflow};
pub use bucket::{Bucket, BucketDefinition, BucketStatus};
pub use document::{Document, DocumentMetadata};
