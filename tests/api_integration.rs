//! HTTP API tests driven through the router without a socket

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vance::api::{create_router, AppState};
use vance::metrics::SearchMetrics;
use vance::repository::DirectoryRepository;
use vance::{IndexSettings, SearchIndex, SearchService};

struct TestApp {
    _index_dir: TempDir,
    repo_dir: TempDir,
    service: Arc<SearchService>,
}

impl TestApp {
    fn new() -> Self {
        let index_dir = TempDir::new().unwrap();
        let repo_dir = TempDir::new().unwrap();
        let mut settings = IndexSettings::default();
        settings.writer_timeout_ms = 50;

        let index = SearchIndex::open(index_dir.path(), settings).unwrap();
        let repository = Arc::new(DirectoryRepository::new(repo_dir.path()));
        let metrics = Arc::new(SearchMetrics::new().unwrap());
        let service = Arc::new(SearchService::new(index, repository, metrics));

        Self {
            _index_dir: index_dir,
            repo_dir,
            service,
        }
    }

    fn write_page(&self, path: &str, content: &str) {
        let full = self.repo_dir.path().join(path);
        if let Some(parent) = Path::new(&full).parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    fn router(&self) -> Router {
        create_router(AppState {
            service: Arc::clone(&self.service),
        })
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn test_add_then_search() {
    let app = TestApp::new();
    app.write_page(
        "guides/deploy.md",
        "---\nlanguage: en\n---\nDeploy the service with the release script.\n",
    );

    let (status, body) = app
        .post("/api/add", json!({"name": "guides/deploy.md"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = app.post("/api/search", json!({"query": "release"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body.get("result").is_none());
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "guides/deploy.md");
    assert_eq!(results[0]["lang"], "en");
    assert!(results[0]["highlight"]
        .as_str()
        .unwrap()
        .contains("<b>release</b>"));
}

#[tokio::test]
async fn test_search_suggestion() {
    let app = TestApp::new();
    app.write_page("a.md", "hello from the wiki");
    app.service.add("a.md", Some("en")).unwrap();

    let (status, body) = app.post("/api/search", json!({"query": "helo"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["suggestion"], "hello");
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = TestApp::new();

    let (status, body) = app.post("/api/search", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = app.post("/api/search", json!({"query": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_find_by_name() {
    let app = TestApp::new();
    app.write_page("docs/design-notes.md", "notes");
    app.write_page("docs/other.md", "design");
    app.service.add("docs/design-notes.md", None).unwrap();
    app.service.add("docs/other.md", None).unwrap();

    let (status, body) = app.post("/api/find", json!({"name": "design"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "results": ["docs/design-notes.md"]})
    );

    let (status, body) = app.post("/api/find", json!({"name": ""})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_get_document() {
    let app = TestApp::new();
    app.write_page("it/pagina.md", "---\nlanguage: it\n---\nciao a tutti");
    app.service.add("it/pagina.md", None).unwrap();

    let (status, body) = app.post("/api/get", json!({"path": "it/pagina.md"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"status": "ok", "document": {"id": "it/pagina.md", "lang": "it"}})
    );

    let (status, body) = app.post("/api/get", json!({"path": "missing.md"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "document_not_found");

    let (status, _) = app.post("/api/get", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_errors() {
    let app = TestApp::new();

    let (status, _) = app.post("/api/add", json!({"lang": "en"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/api/add", json!({"name": "nope.md"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "document_not_found");

    let (status, body) = app.post("/api/add", json!({"name": "../outside.md"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    app.write_page("broken.md", "---\nlanguage: [unclosed\n---\nbody");
    let (status, body) = app.post("/api/add", json!({"name": "broken.md"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "front_matter_error");
}

#[tokio::test]
async fn test_add_while_writer_busy() {
    let app = TestApp::new();
    app.write_page("a.md", "content");

    let session = app.service.index().begin_writer().unwrap();
    let (status, body) = app.post("/api/add", json!({"name": "a.md"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "writer_busy");
    drop(session);

    let (status, _) = app.post("/api/add", json!({"name": "a.md"})).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = TestApp::new();
    app.write_page("a.md", "content");
    app.service.add("a.md", None).unwrap();
    app.post("/api/search", json!({"query": "content"})).await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["documents"], 1);

    let (status, body) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("vance_documents_indexed_total 1"));
    assert!(text.contains("vance_total_documents 1"));
    assert!(text.contains("vance_searches_total"));
}
