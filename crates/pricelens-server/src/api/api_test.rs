use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use pricelens_core::{CandidateKind, Lexicon, RawListing};
use pricelens_retail::{RetailerAdapter, RetrievalOutcome};
use pricelens_search::PipelineSettings;
use tower::ServiceExt;

use super::*;

struct StubAdapter {
    calls: AtomicUsize,
    explode: bool,
}

impl StubAdapter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            explode: false,
        })
    }

    fn exploding() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            explode: true,
        })
    }
}

#[async_trait]
impl RetailerAdapter for StubAdapter {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(&self, keyword: &str) -> RetrievalOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!self.explode, "stub exploded");
        Ok(vec![RawListing {
            title: format!("{keyword} at stub"),
            amount: 12_000.0,
            currency: "KRW".to_string(),
            link: format!("https://stub.example.com/{}", keyword.replace(' ', "-")),
            thumbnail: None,
            source: "stub".to_string(),
            kind: CandidateKind::Listing,
        }])
    }
}

fn app_with(adapter: Arc<StubAdapter>, rate_limit: usize) -> Router {
    let lexicon = Arc::new(Lexicon::builtin().expect("builtin lexicon"));
    let settings = PipelineSettings {
        provider_timeout: Duration::from_secs(2),
        ..PipelineSettings::default()
    };
    let adapters: Vec<Arc<dyn RetailerAdapter>> = vec![adapter];
    let pipeline = SearchPipeline::new(vec![], adapters, lexicon, settings).expect("pipeline");
    build_app(
        AppState {
            pipeline: Arc::new(pipeline),
        },
        RateLimitState::per_minute(rate_limit),
    )
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

#[test]
fn api_error_codes_map_to_status() {
    let cases = [
        ("bad_request", StatusCode::BAD_REQUEST),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "message").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[tokio::test]
async fn health_lists_wired_adapters() {
    let app = app_with(StubAdapter::new(), 10);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["adapters"], serde_json::json!(["stub"]));
    assert_eq!(json["data"]["providers"], serde_json::json!([]));
}

#[tokio::test]
async fn missing_image_url_is_bad_request() {
    let app = app_with(StubAdapter::new(), 10);
    let mut request = post_json("/api/search", "{}");
    let client_id = "req-from-client".parse().expect("header");
    request.headers_mut().insert(REQUEST_ID_HEADER, client_id);

    let response = app.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[REQUEST_ID_HEADER].to_str().ok(),
        Some("req-from-client")
    );
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "bad_request");
    assert_eq!(json["meta"]["request_id"], "req-from-client");
    assert!(json.get("processingTime").is_none());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = app_with(StubAdapter::new(), 10);
    let response = app
        .oneshot(post_json("/api/search", "{not json"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_http_image_url_is_bad_request() {
    let app = app_with(StubAdapter::new(), 10);
    let response = app
        .oneshot(post_json(
            "/api/search",
            r#"{"imageUrl":"file:///tmp/upload.jpg"}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]["message"]
        .as_str()
        .is_some_and(|m| m.contains("imageUrl")));
}

#[tokio::test]
async fn unrecognized_image_is_a_normal_response() {
    let adapter = StubAdapter::new();
    let app = app_with(Arc::clone(&adapter), 10);

    let response = app
        .oneshot(post_json(
            "/api/search",
            r#"{"imageUrl":"https://img.example.com/a.jpg"}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["count"], 0);
    assert_eq!(json["results"], serde_json::json!([]));
    assert_eq!(json["searchImage"], "https://img.example.com/a.jpg");
    assert!(json["processingTime"]
        .as_str()
        .is_some_and(|t| t.ends_with("ms")));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn keyword_search_returns_ranked_results() {
    let app = app_with(StubAdapter::new(), 10);
    let response = app
        .oneshot(post_json(
            "/api/search/keyword",
            r#"{"keyword":"Nike sneakers"}"#,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["searchKeyword"], "Nike sneakers");
    assert_eq!(json["count"], 1);
    assert_eq!(json["results"][0]["price"], 12_000);
    assert_eq!(json["lowestPrice"]["source"], "stub");
}

#[tokio::test]
async fn blank_keyword_is_bad_request() {
    let app = app_with(StubAdapter::new(), 10);
    let response = app
        .oneshot(post_json("/api/search/keyword", r#"{"keyword":"   "}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn pipeline_panic_becomes_internal_error() {
    let app = app_with(StubAdapter::exploding(), 10);
    let response = app
        .oneshot(post_json("/api/search/keyword", r#"{"keyword":"Nike"}"#))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "internal_error");
    assert!(json["processingTime"].is_string());
}

#[tokio::test]
async fn search_routes_are_rate_limited_but_health_is_not() {
    let app = app_with(StubAdapter::new(), 1);

    let first = app
        .clone()
        .oneshot(post_json("/api/search/keyword", r#"{"keyword":"Nike"}"#))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(post_json("/api/search/keyword", r#"{"keyword":"Nike"}"#))
        .await
        .expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert_eq!(json["error"]["code"], "rate_limited");

    let health = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(health.status(), StatusCode::OK);
}
