//! Per-family protocol description.
//!
//! Every resource family the management API exposes differs in a handful of
//! protocol details: where it lives, which field carries its identity, how
//! its list endpoint pages, whether it provisions asynchronously, how it
//! guards updates and whether it accepts the `adminAccess` flag. A
//! [`ResourceKind`] states those details as associated constants, and
//! [`ResourceClient`](crate::rest::ResourceClient) implements the protocol
//! once for all of them.
//!
//! # Example
//!
//! ```rust
//! use platform_api::rest::{AdminAccess, Lifecycle, Paging, ResourceKind, Versioning};
//!
//! pub struct Dashboard;
//!
//! impl ResourceKind for Dashboard {
//!     const NAME: &'static str = "dashboard";
//!     const PATH: &'static str = "platform/dashboards/v1/dashboards";
//!     const ID_FIELD: &'static str = "id";
//!     const PAGING: Paging = Paging::Cursor { items: "dashboards", next_key: "nextPageKey" };
//!     const VERSIONING: Option<Versioning> = Some(Versioning::QUERY);
//! }
//! ```

/// How a family's list endpoint pages its results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Paging {
    /// A single response holds every object under `items`.
    Unpaged {
        /// Body field holding the object array.
        items: &'static str,
    },
    /// `offset` query parameter; the body reports the total under `total`.
    Offset {
        /// Body field holding the object array.
        items: &'static str,
        /// Body field holding the total object count.
        total: &'static str,
    },
    /// `page-key` query parameter taken from the previous body's `next_key`.
    Cursor {
        /// Body field holding the object array.
        items: &'static str,
        /// Body field holding the next page key.
        next_key: &'static str,
    },
}

impl Paging {
    /// Returns the body field holding the object array.
    #[must_use]
    pub const fn items_field(&self) -> &'static str {
        match self {
            Self::Unpaged { items } | Self::Offset { items, .. } | Self::Cursor { items, .. } => {
                items
            }
        }
    }
}

/// Status markers of a family whose create and delete complete asynchronously.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    /// Body field holding the lifecycle state.
    pub status_field: &'static str,
    /// State in which the resource is usable.
    pub active: &'static str,
    /// State in which the resource is being torn down.
    pub deleting: &'static str,
}

impl Lifecycle {
    /// The `status` / `active` / `deleting` convention used by the API.
    pub const STANDARD: Self = Self {
        status_field: "status",
        active: "active",
        deleting: "deleting",
    };
}

/// Optimistic-concurrency contract of a family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Versioning {
    /// Body field in which the server reports the current version.
    pub field: &'static str,
    /// Whether the version is echoed back in the PUT body.
    pub in_body: bool,
    /// Query parameter carrying the version on PUT, if any.
    pub query_param: Option<&'static str>,
}

impl Versioning {
    /// Version echoed in the body and in `optimistic-locking-version`.
    pub const BODY_AND_QUERY: Self = Self {
        field: "version",
        in_body: true,
        query_param: Some(OPTIMISTIC_LOCKING_PARAM),
    };

    /// Version sent only as `optimistic-locking-version`.
    pub const QUERY: Self = Self {
        field: "version",
        in_body: false,
        query_param: Some(OPTIMISTIC_LOCKING_PARAM),
    };
}

/// Query parameter carrying the expected version on updates.
pub const OPTIMISTIC_LOCKING_PARAM: &str = "optimistic-locking-version";

/// Query flag requesting elevated access.
pub const ADMIN_ACCESS_PARAM: &str = "adminAccess";

/// Whether a family accepts the `adminAccess` flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAccess {
    /// The flag is never sent.
    Unsupported,
    /// The flag is sent; a 403 is final.
    NoFallback,
    /// The flag is sent; a 403 triggers one retry without it.
    WithFallback,
}

/// Static description of one resource family.
pub trait ResourceKind: Send + Sync + 'static {
    /// Singular name used in errors and logs (e.g. "bucket").
    const NAME: &'static str;

    /// Collection path relative to the base URL.
    const PATH: &'static str;

    /// Body field carrying the resource identity.
    const ID_FIELD: &'static str;

    /// List pagination scheme.
    const PAGING: Paging;

    /// Asynchronous lifecycle markers, if create/delete complete asynchronously.
    const LIFECYCLE: Option<Lifecycle> = None;

    /// Optimistic-concurrency contract, if updates must carry a version.
    const VERSIONING: Option<Versioning> = None;

    /// Support for the elevated-access flag.
    const ADMIN_ACCESS: AdminAccess = AdminAccess::Unsupported;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_field() {
        assert_eq!(Paging::Unpaged { items: "buckets" }.items_field(), "buckets");
        assert_eq!(
            Paging::Offset {
                items: "results",
                total: "count"
            }
            .items_field(),
            "results"
        );
        assert_eq!(
            Paging::Cursor {
                items: "documents",
                next_key: "nextPageKey"
            }
            .items_field(),
            "documents"
        );
    }

    #[test]
    fn test_versioning_presets() {
        assert!(Versioning::BODY_AND_QUERY.in_body);
        assert_eq!(
            Versioning::BODY_AND_QUERY.query_param,
            Some("optimistic-locking-version")
        );
        assert!(!Versioning::QUERY.in_body);
    }
}
