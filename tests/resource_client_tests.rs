//! Integration tests for the resource protocol.
//!
//! These tests drive `ResourceClient` against a wiremock server that plays
//! the management API: asynchronous bucket lifecycles, offset and cursor
//! pagination, optimistic-concurrency conflicts and forbidden admin access.

use std::time::Duration;

use platform_api::clients::RetryOptions;
use platform_api::resources::{Bucket, BucketDefinition, BucketStatus, Document, Workflow};
use platform_api::rest::{ResourceClient, ResourceError, ResourceKind, TargetState};
use platform_api::{BaseUrl, ClientConfig, RetrySettings};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const BUCKETS: &str = "/platform/storage/management/v1/bucket-definitions";
const WORKFLOWS: &str = "/platform/automation/v1/workflows";
const DOCUMENTS: &str = "/platform/document/v1/documents";

fn settings() -> RetrySettings {
    RetrySettings::default()
        .with_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_secs(5))
}

fn client_with<K: ResourceKind>(server: &MockServer, settings: RetrySettings) -> ResourceClient<K> {
    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(server.uri()).unwrap())
        .retry_options(RetryOptions::none())
        .retry_settings(settings)
        .build()
        .unwrap();
    ResourceClient::from_config(&config).unwrap()
}

fn client<K: ResourceKind>(server: &MockServer) -> ResourceClient<K> {
    client_with(server, settings())
}

fn without_query(param: &'static str) -> impl Fn(&Request) -> bool + Send + Sync {
    move |request: &Request| !request.url.query_pairs().any(|(key, _)| key == param)
}

fn bucket(status: &str, version: u64) -> Value {
    json!({
        "bucketName": "custom_logs",
        "table": "logs",
        "retentionDays": 35,
        "status": status,
        "version": version
    })
}

async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap()
}

fn methods(requests: &[Request]) -> Vec<String> {
    requests.iter().map(|r| r.method.to_string()).collect()
}

fn has_query(request: &Request, param: &str) -> bool {
    request.url.query_pairs().any(|(key, _)| key == param)
}

// ============================================================================
// Preconditions and single fetches
// ============================================================================

#[tokio::test]
async fn test_empty_id_never_reaches_the_network() {
    let server = MockServer::start().await;
    let buckets = client::<Bucket>(&server);
    let payload = json!({"table": "logs"});

    let results = vec![
        buckets.get("").await,
        buckets.update("", &payload).await,
        buckets.delete(" ").await,
        buckets.upsert("", &payload).await,
        buckets.create(Some(""), &payload).await,
    ];

    for result in results {
        assert!(matches!(
            result,
            Err(ResourceError::EmptyId {
                resource: "bucket",
                ..
            })
        ));
    }
    assert!(requests(&server).await.is_empty());
}

#[tokio::test]
async fn test_get_distinguishes_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/missing")))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"code": 404, "message": "Bucket not found"}})),
        )
        .mount(&server)
        .await;

    let error = client::<Bucket>(&server).get("missing").await.unwrap_err();

    assert!(error.is_not_found());
    assert!(matches!(error, ResourceError::NotFound { ref id, .. } if id == "missing"));
    assert_eq!(error.response().unwrap().message, "Bucket not found");
}

#[tokio::test]
async fn test_get_returns_server_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("active", 2)))
        .mount(&server)
        .await;

    let response = client::<Bucket>(&server).get("custom_logs").await.unwrap();
    let definition = BucketDefinition::from_response(&response).unwrap();

    assert_eq!(definition.status, Some(BucketStatus::Active));
    assert_eq!(definition.version, Some(2));
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_offset_pagination_reaches_reported_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(query_param("offset", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 3, "results": [{"id": "wf-3"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(without_query("offset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"count": 3, "results": [{"id": "wf-1"}, {"id": "wf-2"}]}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let list = client::<Workflow>(&server).list().await.unwrap();

    assert_eq!(list.pages().len(), 2);
    assert_eq!(list.len(), 3);
    let ids: Vec<_> = list.all().iter().map(|w| w["id"].clone()).collect();
    assert_eq!(ids, vec![json!("wf-1"), json!("wf-2"), json!("wf-3")]);
}

#[tokio::test]
async fn test_cursor_pagination_stops_without_next_page_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(query_param("page-key", "page-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"documents": [{"id": "doc-2"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(without_query("page-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"documents": [{"id": "doc-1"}], "nextPageKey": "page-2", "totalCount": 99}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let list = client::<Document>(&server).list().await.unwrap();

    assert_eq!(list.pages().len(), 2);
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn test_failed_page_returns_partial_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(query_param("page-key", "page-2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .and(without_query("page-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"documents": [{"id": "doc-1"}], "nextPageKey": "page-2"}),
        ))
        .mount(&server)
        .await;

    let error = client::<Document>(&server).list().await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    let partial = error.partial_list().unwrap();
    assert_eq!(partial.pages().len(), 1);
    assert_eq!(partial.all()[0]["id"], "doc-1");
}

#[tokio::test]
async fn test_failed_first_page_is_returned_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DOCUMENTS))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let error = client::<Document>(&server).list().await.unwrap_err();

    assert!(matches!(error, ResourceError::Http(_)));
    assert_eq!(error.status(), Some(401));
}

// ============================================================================
// Privilege fallback
// ============================================================================

#[tokio::test]
async fn test_forbidden_admin_list_falls_back_for_all_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(query_param("adminAccess", "true"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(query_param("offset", "2"))
        .and(without_query("adminAccess"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"count": 3, "results": [{"id": "wf-3"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(without_query("offset"))
        .and(without_query("adminAccess"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"count": 3, "results": [{"id": "wf-1"}, {"id": "wf-2"}]}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let workflows = client::<Workflow>(&server).with_admin_access(true);
    let list = workflows.list().await.unwrap();

    assert_eq!(list.len(), 3);
    let received = requests(&server).await;
    assert_eq!(received.len(), 3);
    assert!(has_query(&received[0], "adminAccess"));
    assert!(!has_query(&received[1], "adminAccess"));
    assert!(!has_query(&received[2], "adminAccess"));
}

#[tokio::test]
async fn test_admin_flag_is_kept_when_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WORKFLOWS))
        .and(query_param("adminAccess", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let list = client::<Workflow>(&server)
        .with_admin_access(true)
        .list()
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_privilege_fallback_is_one_shot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{WORKFLOWS}/wf-1")))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let error = client::<Workflow>(&server)
        .with_admin_access(true)
        .get("wf-1")
        .await
        .unwrap_err();

    assert!(error.is_forbidden());
    let received = requests(&server).await;
    assert_eq!(received.len(), 2);
    assert!(has_query(&received[0], "adminAccess"));
    assert!(!has_query(&received[1], "adminAccess"));
}

#[tokio::test]
async fn test_admin_flag_is_not_sent_to_unsupported_families() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .and(without_query("adminAccess"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1"})))
        .expect(1)
        .mount(&server)
        .await;

    client::<Document>(&server)
        .with_admin_access(true)
        .get("doc-1")
        .await
        .unwrap();
}

// ============================================================================
// Create, update, delete
// ============================================================================

#[tokio::test]
async fn test_create_waits_until_active() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUCKETS))
        .and(body_json(json!({"bucketName": "custom_logs", "table": "logs", "retentionDays": 35})))
        .respond_with(ResponseTemplate::new(201).set_body_json(bucket("creating", 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("creating", 1)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("active", 1)))
        .mount(&server)
        .await;

    let payload = json!({
        "bucketName": "ignored",
        "table": "logs",
        "retentionDays": 35,
        "status": "active",
        "version": 7
    });
    let response = client::<Bucket>(&server)
        .create(Some("custom_logs"), &payload)
        .await
        .unwrap();

    assert_eq!(response.code, 201);
    assert_eq!(response.json().unwrap()["status"], "active");
    assert_eq!(methods(&requests(&server).await), ["POST", "GET", "GET", "GET"]);
}

#[tokio::test]
async fn test_create_gives_up_at_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUCKETS))
        .respond_with(ResponseTemplate::new(201).set_body_json(bucket("creating", 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("creating", 1)))
        .mount(&server)
        .await;

    let buckets = client_with::<Bucket>(
        &server,
        settings().with_max_wait(Duration::from_millis(100)),
    );
    let error = buckets
        .create(Some("custom_logs"), &json!({"table": "logs"}))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResourceError::Deadline {
            resource: "bucket",
            target: TargetState::Active,
            ..
        }
    ));
}

#[tokio::test]
async fn test_caller_deadline_shortens_the_wait() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("creating", 1)))
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let error = client::<Bucket>(&server)
        .with_deadline(std::time::Instant::now() + Duration::from_millis(80))
        .await_state("custom_logs", TargetState::Active)
        .await
        .unwrap_err();

    assert!(error.is_deadline());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_update_waits_for_active_before_put() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("updating", 3)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("active", 4)))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .and(query_param("optimistic-locking-version", "4"))
        .and(body_json(json!({
            "bucketName": "custom_logs",
            "table": "logs",
            "retentionDays": 60,
            "version": 4
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("active", 5)))
        .expect(1)
        .mount(&server)
        .await;

    let response = client::<Bucket>(&server)
        .update("custom_logs", &json!({"table": "logs", "retentionDays": 60}))
        .await
        .unwrap();

    assert_eq!(response.code, 200);
    assert_eq!(methods(&requests(&server).await), ["GET", "GET", "GET", "PUT"]);
}

#[tokio::test]
async fn test_update_refuses_deleting_resource() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("deleting", 3)))
        .mount(&server)
        .await;

    let error = client::<Bucket>(&server)
        .update("custom_logs", &json!({"table": "logs"}))
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::Deleting { .. }));
    assert_eq!(methods(&requests(&server).await), ["GET"]);
}

#[tokio::test]
async fn test_update_conflicts_stop_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "version": 1})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(409).set_body_json(
            json!({"error": {"code": 409, "message": "version mismatch"}}),
        ))
        .expect(3)
        .mount(&server)
        .await;

    let documents = client_with::<Document>(&server, settings().with_max_retries(3));
    let error = documents
        .update("doc-1", &json!({"name": "overview"}))
        .await
        .unwrap_err();

    assert!(error.is_conflict());
    assert_eq!(error.response().unwrap().message, "version mismatch");
}

#[tokio::test]
async fn test_update_conflicts_stop_at_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "version": 1})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let documents = client_with::<Document>(
        &server,
        settings()
            .with_max_retries(1000)
            .with_interval(Duration::from_millis(30))
            .with_max_wait(Duration::from_millis(100)),
    );
    let error = documents
        .update("doc-1", &json!({"name": "overview"}))
        .await
        .unwrap_err();

    assert!(error.is_deadline());
    assert!(matches!(
        error,
        ResourceError::TimedOut {
            resource: "document",
            operation: "update",
            ..
        }
    ));
    assert!(error.to_string().starts_with("update of document 'doc-1'"));
}

#[tokio::test]
async fn test_update_retries_conflict_with_fresh_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "version": 1})))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DOCUMENTS}/doc-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "version": 2})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(query_param("optimistic-locking-version", "1"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(query_param("optimistic-locking-version", "2"))
        .and(body_json(json!({"id": "doc-1", "name": "overview"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1", "version": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client::<Document>(&server)
        .update("doc-1", &json!({"name": "overview", "version": 99}))
        .await
        .unwrap();

    assert_eq!(response.code, 200);
}

#[tokio::test]
async fn test_delete_returns_accepted_after_removal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(202).set_body_json(bucket("deleting", 3)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("deleting", 3)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = client::<Bucket>(&server).delete("custom_logs").await.unwrap();

    assert_eq!(response.code, 202);
    assert_eq!(response.json().unwrap()["status"], "deleting");
    assert_eq!(methods(&requests(&server).await), ["DELETE", "GET", "GET"]);
}

#[tokio::test]
async fn test_delete_keeps_polling_through_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(202).set_body_json(bucket("deleting", 3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": {"code": 500, "message": "storage unavailable"}})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = client::<Bucket>(&server).delete("custom_logs").await.unwrap();

    assert_eq!(response.code, 202);
    assert_eq!(methods(&requests(&server).await), ["DELETE", "GET", "GET"]);
}

#[tokio::test]
async fn test_delete_of_missing_resource_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let error = client::<Workflow>(&server).delete("wf-1").await.unwrap_err();
    assert!(error.is_not_found());
}

// ============================================================================
// Upsert
// ============================================================================

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WORKFLOWS))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "nightly", "title": "Nightly"})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WORKFLOWS))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{WORKFLOWS}/nightly")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "nightly", "title": "Nightly"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{WORKFLOWS}/nightly")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "nightly", "title": "Nightly"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workflows = client::<Workflow>(&server);
    let payload = json!({"title": "Nightly"});

    let first = workflows.upsert("nightly", &payload).await.unwrap();
    let second = workflows.upsert("nightly", &payload).await.unwrap();

    assert_eq!(first.code, 201);
    assert_eq!(second.code, 200);
    assert_eq!(first.json().unwrap(), second.json().unwrap());

    let received = requests(&server).await;
    let post_body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let put_body: Value = serde_json::from_slice(&received[3].body).unwrap();
    assert_eq!(methods(&received), ["POST", "POST", "GET", "PUT"]);
    assert_eq!(post_body, put_body);
}

#[tokio::test]
async fn test_upsert_recreates_resource_that_is_being_deleted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUCKETS))
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BUCKETS))
        .respond_with(ResponseTemplate::new(201).set_body_json(bucket("active", 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket("deleting", 6)))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{BUCKETS}/custom_logs")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = client::<Bucket>(&server)
        .upsert("custom_logs", &json!({"table": "logs", "retentionDays": 35}))
        .await
        .unwrap();

    assert_eq!(response.code, 201);
    assert_eq!(
        methods(&requests(&server).await),
        ["POST", "GET", "GET", "GET", "POST"]
    );
}

#[tokio::test]
async fn test_upsert_recovers_from_vanished_resource() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WORKFLOWS))
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WORKFLOWS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "nightly"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{WORKFLOWS}/nightly")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = client::<Workflow>(&server)
        .upsert("nightly", &json!({"title": "Nightly"}))
        .await
        .unwrap();

    assert_eq!(response.code, 201);
    assert_eq!(
        methods(&requests(&server).await),
        ["POST", "GET", "GET", "POST"]
    );
}

#[tokio::test]
async fn test_upsert_returns_other_create_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WORKFLOWS))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"error": {"code": 400, "message": "title must not be empty"}}),
        ))
        .mount(&server)
        .await;

    let error = client::<Workflow>(&server)
        .upsert("nightly", &json!({"title": ""}))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(methods(&requests(&server).await), ["POST"]);
}

#[tokio::test]
async fn test_invalid_payload_is_rejected_before_sending() {
    let server = MockServer::start().await;

    let error = client::<Workflow>(&server)
        .create(None, &json!("not an object"))
        .await
        .unwrap_err();

    assert!(matches!(error, ResourceError::InvalidPayload { .. }));
    assert!(requests(&server).await.is_empty());
}
