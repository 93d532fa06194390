//! List pagination.
//!
//! A [`Paginator`] drives one list operation: it tells the caller which
//! continuation parameter to send next, absorbs each page, and produces a
//! [`ListResponse`] holding every page envelope and the flattened objects.
//!
//! Offset pagination sends `offset=<objects retrieved so far>` and stops once
//! the most recent page's reported total is reached or a page comes back
//! empty. Cursor pagination sends the previous page's key as `page-key` and
//! stops when a page carries no key.

use serde_json::Value;

use crate::clients::HttpResponse;
use crate::rest::errors::ResourceError;
use crate::rest::kind::Paging;

/// Query parameter carrying the offset of the next page.
pub const OFFSET_PARAM: &str = "offset";

/// Query parameter carrying the cursor of the next page.
pub const PAGE_KEY_PARAM: &str = "page-key";

/// Result of a list operation.
///
/// Keeps the per-page envelopes in request order plus a flattened view of
/// all objects they contained.
#[derive(Clone, Debug, Default)]
pub struct ListResponse {
    pages: Vec<HttpResponse>,
    objects: Vec<Value>,
}

impl ListResponse {
    /// Returns the page envelopes in request order.
    #[must_use]
    pub fn pages(&self) -> &[HttpResponse] {
        &self.pages
    }

    /// Returns every object of every page.
    #[must_use]
    pub fn all(&self) -> &[Value] {
        &self.objects
    }

    /// Consumes the response, returning the objects.
    #[must_use]
    pub fn into_objects(self) -> Vec<Value> {
        self.objects
    }

    /// Returns the number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no object was listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// A continuation query parameter.
pub type Continuation = (&'static str, String);

#[derive(Clone, Debug, PartialEq, Eq)]
enum State {
    Start,
    Next(Continuation),
    Done,
}

/// Stateful page accumulator for one list operation.
///
/// ```rust
/// use platform_api::rest::{Paginator, Paging};
///
/// let mut pager = Paginator::new("workflow", Paging::Offset { items: "results", total: "count" });
/// assert_eq!(pager.next_request(), Some(None));
/// ```
#[derive(Debug)]
pub struct Paginator {
    resource: &'static str,
    paging: Paging,
    state: State,
    list: ListResponse,
}

impl Paginator {
    /// Starts a list of the given family.
    #[must_use]
    pub fn new(resource: &'static str, paging: Paging) -> Self {
        Self {
            resource,
            paging,
            state: State::Start,
            list: ListResponse::default(),
        }
    }

    /// Returns `true` until the first page has been absorbed.
    #[must_use]
    pub fn is_first_page(&self) -> bool {
        self.state == State::Start
    }

    /// Returns what to request next.
    ///
    /// `None` means the list is complete; `Some(None)` requests the first
    /// page and `Some(Some(param))` requests a continuation page.
    #[must_use]
    pub fn next_request(&self) -> Option<Option<Continuation>> {
        match &self.state {
            State::Start => Some(None),
            State::Next(continuation) => Some(Some(continuation.clone())),
            State::Done => None,
        }
    }

    /// Adds a page to the accumulated result and decides the continuation.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Decode`] or [`ResourceError::MissingField`]
    /// if the body is not a page of this family; the page is not added.
    pub fn absorb(&mut self, page: HttpResponse) -> Result<(), ResourceError> {
        let context = format!("list page {}", self.list.pages.len() + 1);
        let body = page.json().map_err(|source| ResourceError::Decode {
            resource: self.resource,
            context: context.clone(),
            source,
        })?;

        let items_field = self.paging.items_field();
        let items = match body.get(items_field) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(ResourceError::MissingField {
                    resource: self.resource,
                    id: context,
                    field: items_field,
                })
            }
        };
        let page_len = items.len();

        self.list.pages.push(page);
        self.list.objects.extend(items);

        self.state = match self.paging {
            Paging::Unpaged { .. } => State::Done,
            Paging::Offset { total, .. } => {
                let retrieved = self.list.objects.len();
                let reported = body.get(total).and_then(Value::as_u64);
                match reported {
                    Some(total) if page_len > 0 && (retrieved as u64) < total => {
                        State::Next((OFFSET_PARAM, retrieved.to_string()))
                    }
                    _ => State::Done,
                }
            }
            Paging::Cursor { next_key, .. } => match body.get(next_key).and_then(Value::as_str) {
                Some(key) if !key.is_empty() => State::Next((PAGE_KEY_PARAM, key.to_string())),
                _ => State::Done,
            },
        };
        Ok(())
    }

    /// Ends the list with an error.
    ///
    /// A failure on the first page is returned unchanged; later failures are
    /// wrapped in [`ResourceError::PartialList`] with the pages read so far.
    #[must_use]
    pub fn fail(self, error: ResourceError) -> ResourceError {
        if self.list.pages.is_empty() {
            return error;
        }
        tracing::debug!(
            "Listing {} failed after {} page(s): {}",
            self.resource,
            self.list.pages.len(),
            error
        );
        ResourceError::PartialList {
            resource: self.resource,
            partial: Box::new(self.list),
            source: Box::new(error),
        }
    }

    /// Returns the accumulated result.
    #[must_use]
    pub fn finish(self) -> ListResponse {
        self.list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HttpError;
    use serde_json::json;

    const OFFSET: Paging = Paging::Offset {
        items: "results",
        total: "count",
    };
    const CURSOR: Paging = Paging::Cursor {
        items: "documents",
        next_key: "nextPageKey",
    };

    fn page(body: &Value) -> HttpResponse {
        HttpResponse::for_status(200).with_body(body.to_string())
    }

    #[test]
    fn test_offset_pages_until_total() {
        let mut pager = Paginator::new("workflow", OFFSET);
        assert!(pager.is_first_page());
        assert_eq!(pager.next_request(), Some(None));

        pager
            .absorb(page(&json!({"count": 3, "results": [{"id": "a"}, {"id": "b"}]})))
            .unwrap();
        assert_eq!(
            pager.next_request(),
            Some(Some(("offset", "2".to_string())))
        );

        pager
            .absorb(page(&json!({"count": 3, "results": [{"id": "c"}]})))
            .unwrap();
        assert_eq!(pager.next_request(), None);

        let list = pager.finish();
        assert_eq!(list.pages().len(), 2);
        assert_eq!(list.len(), 3);
        assert_eq!(list.all()[2]["id"], "c");
    }

    #[test]
    fn test_offset_stops_on_empty_page() {
        let mut pager = Paginator::new("workflow", OFFSET);
        pager
            .absorb(page(&json!({"count": 10, "results": [{"id": "a"}]})))
            .unwrap();
        pager.absorb(page(&json!({"count": 10, "results": []}))).unwrap();
        assert_eq!(pager.next_request(), None);
    }

    #[test]
    fn test_offset_without_total_is_single_page() {
        let mut pager = Paginator::new("workflow", OFFSET);
        pager.absorb(page(&json!({"results": [{"id": "a"}]}))).unwrap();
        assert_eq!(pager.next_request(), None);
    }

    #[test]
    fn test_cursor_follows_next_page_key() {
        let mut pager = Paginator::new("document", CURSOR);
        pager
            .absorb(page(&json!({"documents": [{"id": "a"}], "nextPageKey": "k2"})))
            .unwrap();
        assert_eq!(
            pager.next_request(),
            Some(Some(("page-key", "k2".to_string())))
        );

        pager
            .absorb(page(&json!({"documents": [{"id": "b"}], "nextPageKey": ""})))
            .unwrap();
        assert_eq!(pager.next_request(), None);
        assert_eq!(pager.finish().len(), 2);
    }

    #[test]
    fn test_unpaged_is_single_request() {
        let mut pager = Paginator::new("bucket", Paging::Unpaged { items: "buckets" });
        pager
            .absorb(page(&json!({"buckets": [{"bucketName": "logs"}], "nextPageKey": "x"})))
            .unwrap();
        assert_eq!(pager.next_request(), None);
    }

    #[test]
    fn test_non_array_items_is_rejected() {
        let mut pager = Paginator::new("document", CURSOR);
        let error = pager
            .absorb(page(&json!({"documents": "nope"})))
            .unwrap_err();
        assert!(matches!(
            error,
            ResourceError::MissingField {
                field: "documents",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_page_is_decode_error() {
        let mut pager = Paginator::new("document", CURSOR);
        let error = pager
            .absorb(HttpResponse::for_status(200).with_body("{not json".to_string()))
            .unwrap_err();
        assert!(matches!(error, ResourceError::Decode { .. }));
    }

    #[test]
    fn test_first_page_failure_is_unwrapped() {
        let pager = Paginator::new("document", CURSOR);
        let error = pager.fail(ResourceError::EmptyId {
            resource: "document",
            operation: "list",
        });
        assert!(matches!(error, ResourceError::EmptyId { .. }));
    }

    #[test]
    fn test_later_failure_keeps_partial_result() {
        let mut pager = Paginator::new("document", CURSOR);
        pager
            .absorb(page(&json!({"documents": [{"id": "a"}], "nextPageKey": "k2"})))
            .unwrap();

        let source = HttpError::Response(crate::clients::HttpResponseError::from_response(
            &HttpResponse::for_status(500),
        ));
        let error = pager.fail(ResourceError::Http(source));

        let partial = error.partial_list().unwrap();
        assert_eq!(partial.pages().len(), 1);
        assert_eq!(partial.all()[0]["id"], "a");
        assert_eq!(error.status(), Some(500));
    }
}
