//! Integration tests for `ShoppingAdapter` using wiremock HTTP mocks.

use pricelens_core::CandidateKind;
use pricelens_retail::{build_http_client, RetailError, RetailerAdapter, ShoppingAdapter};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter(base_url: &str) -> ShoppingAdapter {
    let client = build_http_client(5, "pricelens-test").expect("client");
    ShoppingAdapter::with_base_url(client, "serp-key", base_url)
}

#[tokio::test]
async fn search_maps_shopping_results() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "shopping_results": [
            {
                "position": 1,
                "title": "Nike Air Force 1 '07",
                "link": "https://www.musinsa.com/app/goods/1",
                "source": "MUSINSA",
                "price": "₩139,000",
                "extracted_price": 139000.0,
                "thumbnail": "https://encrypted-tbn0.gstatic.com/a.jpg"
            },
            {
                "position": 2,
                "title": "Nike AF1 (import)",
                "product_link": "https://www.google.com/shopping/product/99",
                "source": "eBay",
                "price": "US$98.50",
                "extracted_price": 98.5
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_shopping"))
        .and(query_param("q", "nike air force 1"))
        .and(query_param("api_key", "serp-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let rows = adapter(&server.uri())
        .search("nike air force 1")
        .await
        .expect("search should succeed");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].currency, "₩");
    assert_eq!(rows[0].source, "MUSINSA");
    assert_eq!(rows[1].currency, "US$");
    assert!((rows[1].amount - 98.5).abs() < f64::EPSILON);
    assert_eq!(rows[1].link, "https://www.google.com/shopping/product/99");
    assert!(rows.iter().all(|r| r.kind == CandidateKind::Listing));
}

#[tokio::test]
async fn no_results_error_is_an_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": "Google hasn't returned any results for this query."
        })))
        .mount(&server)
        .await;

    let rows = adapter(&server.uri())
        .search("zzzz qqqq")
        .await
        .expect("no results is not a failure");

    assert!(rows.is_empty());
}

#[tokio::test]
async fn api_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Invalid API key." })),
        )
        .mount(&server)
        .await;

    let err = adapter(&server.uri())
        .search("nike")
        .await
        .expect_err("api error should fail");

    assert!(matches!(err, RetailError::Api { .. }), "got {err:?}");
}
