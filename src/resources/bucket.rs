//! Bucket definitions.
//!
//! Buckets are provisioned and torn down asynchronously: a create answers
//! with `status: "creating"`, a delete with `202 Accepted` and
//! `status: "deleting"`. [`ResourceClient<Bucket>`](crate::rest::ResourceClient)
//! waits for `active` and for removal respectively, and attaches the
//! observed `version` to every update.
//!
//! # Example
//!
//! ```rust,ignore
//! use platform_api::resources::{Bucket, BucketDefinition, BucketStatus};
//! use platform_api::rest::ResourceClient;
//!
//! let buckets = ResourceClient::<Bucket>::from_config(&config)?;
//!
//! let definition = BucketDefinition {
//!     bucket_name: "custom_logs".to_string(),
//!     table: "logs".to_string(),
//!     display_name: Some("Custom logs".to_string()),
//!     retention_days: 35,
//!     ..Default::default()
//! };
//! let response = buckets.upsert("custom_logs", &definition.to_payload()?).await?;
//! let created = BucketDefinition::from_response(&response)?;
//! assert_eq!(created.status, Some(BucketStatus::Active));
//! ```

use serde::{Deserialize, Serialize};

use crate::clients::HttpResponse;
use crate::rest::{Lifecycle, Paging, ResourceError, ResourceKind, Versioning};

/// Bucket definitions under `platform/storage/management/v1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Bucket;

impl ResourceKind for Bucket {
    const NAME: &'static str = "bucket";
    const PATH: &'static str = "platform/storage/management/v1/bucket-definitions";
    const ID_FIELD: &'static str = "bucketName";
    const PAGING: Paging = Paging::Unpaged { items: "buckets" };
    const LIFECYCLE: Option<Lifecycle> = Some(Lifecycle::STANDARD);
    const VERSIONING: Option<Versioning> = Some(Versioning::BODY_AND_QUERY);
}

/// Lifecycle state of a bucket.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BucketStatus {
    /// Provisioning is in progress.
    Creating,
    /// The bucket is usable.
    Active,
    /// A change is being applied.
    Updating,
    /// The bucket is being removed.
    Deleting,
}

/// Typed view of a bucket definition.
///
/// `status` and `version` are managed by the server and are never
/// serialized into a payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BucketDefinition {
    /// Unique bucket name.
    pub bucket_name: String,
    /// Table the bucket stores records for (e.g. `logs`, `events`).
    pub table: String,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Retention period in days.
    pub retention_days: u32,
    /// Lifecycle state.
    #[serde(default, skip_serializing)]
    pub status: Option<BucketStatus>,
    /// Optimistic-concurrency version.
    #[serde(default, skip_serializing)]
    pub version: Option<u64>,
}

impl BucketDefinition {
    /// Decodes a bucket response body.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] if the body is not a bucket.
    pub fn from_response(response: &HttpResponse) -> Result<Self, ResourceError> {
        serde_json::from_str(&response.raw_body).map_err(|source| ResourceError::Decode {
            resource: Bucket::NAME,
            context: format!("{}", response.request),
            source,
        })
    }

    /// Serializes the writable fields into a payload.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidPayload`] if serialization fails.
    pub fn to_payload(&self) -> Result<serde_json::Value, ResourceError> {
        serde_json::to_value(self).map_err(|e| ResourceError::InvalidPayload {
            resource: Bucket::NAME,
            reason: e.to_string(),
        })
    }
}
