//! Documents (dashboards, notebooks, launchpads).
//!
//! Documents list with cursor pagination: each page carries `nextPageKey`,
//! which is sent back as `page-key`. Updates must name the version they were
//! based on in the `optimistic-locking-version` query parameter.

use serde::{Deserialize, Serialize};

use crate::clients::HttpResponse;
use crate::rest::{Paging, ResourceError, ResourceKind, Versioning};

/// Documents under `platform/document/v1/documents`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Document;

impl ResourceKind for Document {
    const NAME: &'static str = "document";
    const PATH: &'static str = "platform/document/v1/documents";
    const ID_FIELD: &'static str = "id";
    const PAGING: Paging = Paging::Cursor {
        items: "documents",
        next_key: "nextPageKey",
    };
    const VERSIONING: Option<Versioning> = Some(Versioning::QUERY);
}

/// Metadata of a document as returned by get and list.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Document id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Document type (e.g. `dashboard`, `notebook`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Owner id.
    #[serde(default)]
    pub owner: Option<String>,
    /// Whether the document is private to its owner.
    #[serde(default)]
    pub is_private: bool,
    /// Optimistic-concurrency version.
    #[serde(default)]
    pub version: Option<u64>,
}

impl DocumentMetadata {
    /// Decodes a document response body.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] if the body is not a document.
    pub fn from_response(response: &HttpResponse) -> Result<Self, ResourceError> {
        serde_json::from_str(&response.raw_body).map_err(|source| ResourceError::Decode {
            resource: Document::NAME,
            context: format!("{}", response.request),
            source,
        })
    }

    /// Decodes every object of a list result.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] for the first object that is not a
    /// document.
    pub fn from_list(list: &crate::rest::ListResponse) -> Result<Vec<Self>, ResourceError> {
        list.all()
            .iter()
            .map(|object| {
                Self::deserialize(object).map_err(|source| ResourceError::Decode {
                    resource: Document::NAME,
                    context: "list".to_string(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_metadata() {
        let response = HttpResponse::for_status(200).with_body(
            json!({
                "id": "b0e7c1",
                "name": "Team overview",
                "type": "dashboard",
                "owner": "u-1",
                "isPrivate": true,
                "version": 4
            })
            .to_string(),
        );

        let document = DocumentMetadata::from_response(&response).unwrap();
        assert_eq!(document.kind, "dashboard");
        assert!(document.is_private);
        assert_eq!(document.version, Some(4));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let response = HttpResponse::for_status(200)
            .with_body(r#"{"id":"d","name":"n","type":"notebook"}"#.to_string());
        let document = DocumentMetadata::from_response(&response).unwrap();
        assert_eq!(document.owner, None);
        assert!(!document.is_private);
    }
}
