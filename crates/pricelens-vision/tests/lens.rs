//! Integration tests for `SerpApiLensClient` using wiremock HTTP mocks.

use pricelens_core::CandidateKind;
use pricelens_vision::{SerpApiLensClient, VisionError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> SerpApiLensClient {
    SerpApiLensClient::with_base_url("serp-key", 5, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn lens_search_parses_brand_titles_and_listings() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "search_metadata": { "status": "Success" },
        "knowledge_graph": [
            { "title": "Adidas", "subtitle": "Company" },
            { "title": "Samba OG", "subtitle": "Shoe" }
        ],
        "visual_matches": [
            {
                "position": 1,
                "title": "adidas Samba OG Cloud White",
                "link": "https://shop.example.com/samba",
                "source": "Example Shop",
                "price": { "value": "₩139,000", "extracted_value": 139000.0, "currency": "₩" }
            },
            {
                "position": 2,
                "title": "Samba lookalike",
                "link": "https://other.example.com/lookalike"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_lens"))
        .and(query_param("url", "https://img.example.com/samba.jpg"))
        .and(query_param("api_key", "serp-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let result = test_client(&server.uri())
        .lens_search("https://img.example.com/samba.jpg")
        .await
        .expect("should parse lens response");

    assert_eq!(result.brand.as_deref(), Some("Adidas"));
    assert_eq!(result.product_name.as_deref(), Some("Samba OG"));
    assert_eq!(result.titles.len(), 2);
    assert_eq!(result.listings.len(), 2);
    assert_eq!(result.listings[0].currency, "₩");
    assert!(result
        .listings
        .iter()
        .all(|l| l.kind == CandidateKind::VisualMatch));
}

#[tokio::test]
async fn lens_search_surfaces_api_error_field() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Invalid API key." })),
        )
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .lens_search("https://img.example.com/x.jpg")
        .await
        .expect_err("error field should fail");

    match err {
        VisionError::Api { provider, message } => {
            assert_eq!(provider, "serpapi_lens");
            assert_eq!(message, "Invalid API key.");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn lens_search_reports_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .lens_search("https://img.example.com/x.jpg")
        .await
        .expect_err("503 should fail");

    let VisionError::UnexpectedStatus { status, .. } = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(status, 503);
}
