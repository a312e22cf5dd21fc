use std::sync::Mutex;

use async_trait::async_trait;
use pricelens_core::{CandidateKind, RawListing};
use pricelens_retail::RetrievalOutcome;
use pricelens_vision::{LensResult, ProviderOutput, VisionError};

use super::*;

// -----------------------------------------------------------------------
// fakes
// -----------------------------------------------------------------------

struct FixedProvider {
    name: &'static str,
    output: Option<ProviderOutput>,
}

#[async_trait]
impl SignalProvider for FixedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn analyze(&self, _image_url: &str) -> Result<ProviderOutput, VisionError> {
        self.output.clone().ok_or_else(|| VisionError::Api {
            provider: self.name.to_string(),
            message: "no signal".to_string(),
        })
    }
}

enum Behavior {
    Priced(f64),
    Panic,
}

struct RecordingAdapter {
    name: &'static str,
    accepts_translated: bool,
    behavior: Behavior,
    seen: Mutex<Vec<String>>,
}

impl RecordingAdapter {
    fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            accepts_translated: false,
            behavior,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn translating(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            accepts_translated: true,
            behavior,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("lock").clone()
    }
}

#[async_trait]
impl RetailerAdapter for RecordingAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn accepts_translated(&self) -> bool {
        self.accepts_translated
    }

    async fn search(&self, keyword: &str) -> RetrievalOutcome {
        self.seen.lock().expect("lock").push(keyword.to_string());
        match self.behavior {
            Behavior::Priced(amount) => Ok(vec![RawListing {
                title: format!("{keyword} from {}", self.name),
                amount,
                currency: "KRW".to_string(),
                link: format!(
                    "https://{}.example.com/item/{}",
                    self.name,
                    keyword.replace(' ', "-")
                ),
                thumbnail: None,
                source: self.name.to_string(),
                kind: CandidateKind::Listing,
            }]),
            Behavior::Panic => panic!("adapter exploded"),
        }
    }
}

fn provider(name: &'static str, output: Option<ProviderOutput>) -> Arc<dyn SignalProvider> {
    Arc::new(FixedProvider { name, output })
}

fn pipeline(
    providers: Vec<Arc<dyn SignalProvider>>,
    adapters: Vec<Arc<dyn RetailerAdapter>>,
) -> SearchPipeline {
    let lexicon = Arc::new(Lexicon::builtin().expect("builtin lexicon"));
    let settings = PipelineSettings {
        provider_timeout: Duration::from_secs(2),
        fanout: FanoutLimits {
            call_timeout: Duration::from_secs(2),
            ..FanoutLimits::default()
        },
        ..PipelineSettings::default()
    };
    SearchPipeline::new(providers, adapters, lexicon, settings).expect("pipeline")
}

fn look_alike() -> RawListing {
    RawListing {
        title: "Similar white sneaker".to_string(),
        amount: 0.0,
        currency: String::new(),
        link: "https://lookalike.example.com/p/9".to_string(),
        thumbnail: Some("https://lookalike.example.com/p/9.jpg".to_string()),
        source: "lookalike.example.com".to_string(),
        kind: CandidateKind::VisualMatch,
    }
}

const IMAGE: &str = "https://img.example.com/upload/a.jpg";

// -----------------------------------------------------------------------
// image search
// -----------------------------------------------------------------------

#[tokio::test]
async fn recognized_image_flows_through_every_stage() {
    let cheap = RecordingAdapter::new("cheap", Behavior::Priced(1_000.0));
    let pricey = RecordingAdapter::new("pricey", Behavior::Priced(5_000.0));
    let labels = ProviderOutput::Labels(vec!["sneakers".into(), "white".into()]);
    let pipeline = pipeline(
        vec![
            provider("logos", Some(ProviderOutput::Logos(vec!["Nike".into()]))),
            provider("labels", Some(labels)),
            provider(
                "lens",
                Some(ProviderOutput::Lens(LensResult {
                    listings: vec![look_alike()],
                    ..LensResult::default()
                })),
            ),
            provider("text", None),
        ],
        vec![pricey.clone(), cheap.clone()],
    );

    let response = pipeline.search_image(IMAGE).await.expect("search");

    assert!(response.success);
    assert_eq!(response.search_image, IMAGE);
    assert_eq!(response.detected_brand.as_deref(), Some("Nike"));
    assert_eq!(response.search_keyword, "Nike sneakers");
    assert!(response
        .search_keywords
        .iter()
        .any(|k| k == "Nike white sneakers"));
    assert_eq!(response.detected_labels, vec!["sneakers", "white"]);

    let first_calls = cheap.seen();
    assert_eq!(
        first_calls.first().map(String::as_str),
        Some("Nike sneakers")
    );
    assert!(first_calls.len() <= FanoutLimits::default().keywords);

    assert_eq!(response.count, response.results.len());
    assert!(response.results.iter().all(|c| c.currency == "KRW"));
    assert_eq!(response.results[0].source, "cheap");
    assert_eq!(response.results.last().map(|c| c.price), Some(5_000));
    assert_eq!(response.lowest_price.map(|c| c.price), Some(1_000));

    assert_eq!(response.visual_matches.len(), 1);
    assert_eq!(response.visual_matches[0].kind, CandidateKind::VisualMatch);
    assert!(response.processing_time.ends_with("ms"));
    assert_eq!(
        response.message,
        format!("Found {} listings for \"Nike sneakers\".", response.count)
    );
}

#[tokio::test]
async fn unrecognized_image_makes_no_retailer_calls() {
    let adapter = RecordingAdapter::new("retailer", Behavior::Priced(1_000.0));
    let pipeline = pipeline(
        vec![provider("labels", None), provider("web", None)],
        vec![adapter.clone()],
    );

    let response = pipeline.search_image(IMAGE).await.expect("search");

    assert!(!response.success);
    assert_eq!(response.count, 0);
    assert!(response.results.is_empty());
    assert!(response.search_keywords.is_empty());
    assert!(response.lowest_price.is_none());
    assert_eq!(
        response.message,
        "Could not recognize a product in the image."
    );
    assert!(adapter.seen().is_empty());
}

#[tokio::test]
async fn unrecognized_image_still_returns_look_alikes() {
    let pipeline = pipeline(
        vec![provider(
            "lens",
            Some(ProviderOutput::Lens(LensResult {
                listings: vec![look_alike()],
                ..LensResult::default()
            })),
        )],
        vec![],
    );

    let response = pipeline.search_image(IMAGE).await.expect("search");

    assert!(!response.success);
    assert_eq!(response.visual_matches.len(), 1);
    assert_eq!(response.count, 0);
}

#[tokio::test]
async fn no_sellers_is_still_success() {
    let pipeline = pipeline(
        vec![provider("logos", Some(ProviderOutput::Logos(vec!["Adidas".into()])))],
        vec![],
    );

    let response = pipeline.search_image(IMAGE).await.expect("search");

    assert!(response.success);
    assert_eq!(response.count, 0);
    assert_eq!(response.message, "No sellers found for this product.");
}

#[tokio::test]
async fn non_http_image_reference_is_rejected() {
    let adapter = RecordingAdapter::new("retailer", Behavior::Priced(1_000.0));
    let pipeline = pipeline(vec![], vec![adapter.clone()]);

    for bad in ["", "   ", "ftp://img.example.com/a.jpg", "/uploads/a.jpg"] {
        let err = pipeline.search_image(bad).await.unwrap_err();
        assert!(err.is_input_error(), "{bad:?} gave {err}");
    }
    assert!(adapter.seen().is_empty());
}

#[tokio::test]
async fn panicking_stage_becomes_structured_error() {
    let pipeline = pipeline(
        vec![provider("logos", Some(ProviderOutput::Logos(vec!["Nike".into()])))],
        vec![RecordingAdapter::new("broken", Behavior::Panic)],
    );

    let err = pipeline.search_image(IMAGE).await.unwrap_err();

    match err {
        PipelineError::Panicked(message) => assert_eq!(message, "adapter exploded"),
        other => panic!("expected PipelineError::Panicked, got: {other:?}"),
    }
}

#[tokio::test]
async fn searches_run_on_spawned_tasks() {
    let adapter = RecordingAdapter::new("retailer", Behavior::Priced(1_000.0));
    let pipeline = Arc::new(pipeline(
        vec![provider("logos", Some(ProviderOutput::Logos(vec!["Nike".into()])))],
        vec![adapter.clone()],
    ));

    let image = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.search_image(IMAGE).await }
    });
    let keyword = tokio::spawn({
        let pipeline = Arc::clone(&pipeline);
        async move { pipeline.search_keyword("Nike sneakers").await }
    });

    let image = image.await.expect("image task").expect("image search");
    let keyword = keyword
        .await
        .expect("keyword task")
        .expect("keyword search");
    assert!(image.success);
    assert!(keyword.success);
    assert!(!adapter.seen().is_empty());
}

#[tokio::test]
async fn look_alikes_do_not_crowd_out_listings() {
    let adapter = RecordingAdapter::new("retailer", Behavior::Priced(1_000.0));
    let look_alikes: Vec<RawListing> = (0..4)
        .map(|i| RawListing {
            title: format!("Look-alike number {i}"),
            link: format!("https://lookalike.example.com/p/{i}"),
            ..look_alike()
        })
        .collect();
    let mut pipeline = pipeline(
        vec![
            provider("logos", Some(ProviderOutput::Logos(vec!["Nike".into()]))),
            provider(
                "lens",
                Some(ProviderOutput::Lens(LensResult {
                    listings: look_alikes,
                    ..LensResult::default()
                })),
            ),
        ],
        vec![adapter],
    );
    pipeline.settings.max_results = 2;

    let response = pipeline.search_image(IMAGE).await.expect("search");

    assert!(response.count >= 1);
    assert!(response.results.iter().all(|c| c.source == "retailer"));
    assert_eq!(response.visual_matches.len(), 2);
}

#[test]
fn retailer_titles_lose_marketplace_noise() {
    let pipeline = pipeline(vec![], vec![]);
    let listing = RawListing {
        title: "MUSINSA Official Store - Nike Dunk Low".to_string(),
        amount: 99_000.0,
        currency: "KRW".to_string(),
        link: "https://store.example.com/dunk".to_string(),
        thumbnail: None,
        source: "store".to_string(),
        kind: CandidateKind::Listing,
    };
    let noisy_look_alike = RawListing {
        title: "Official Store look".to_string(),
        ..look_alike()
    };

    let tidied = pipeline.tidy_titles(vec![listing, noisy_look_alike]);

    assert_eq!(tidied[0].title, "Nike Dunk Low");
    assert_eq!(tidied[1].title, "Official Store look");
}

// -----------------------------------------------------------------------
// keyword search
// -----------------------------------------------------------------------

#[tokio::test]
async fn keyword_search_adds_translation_for_translating_adapters() {
    let local = RecordingAdapter::translating("local", Behavior::Priced(2_000.0));
    let global = RecordingAdapter::new("global", Behavior::Priced(3_000.0));
    let pipeline = pipeline(vec![], vec![local.clone(), global.clone()]);

    let response = pipeline
        .search_keyword("  Nike   sneakers ")
        .await
        .expect("search");

    assert!(response.success);
    assert_eq!(response.search_keyword, "Nike sneakers");
    assert_eq!(response.search_keywords, vec!["Nike sneakers", "나이키 스니커즈"]);
    assert_eq!(local.seen(), vec!["Nike sneakers", "나이키 스니커즈"]);
    assert_eq!(global.seen(), vec!["Nike sneakers"]);
    assert_eq!(response.count, 3);
    assert_eq!(response.lowest_price.map(|c| c.price), Some(2_000));
}

#[tokio::test]
async fn blank_keyword_is_rejected() {
    let pipeline = pipeline(vec![], vec![]);
    let err = pipeline.search_keyword(" \t ").await.unwrap_err();
    assert!(err.is_input_error());
}

// -----------------------------------------------------------------------
// settings
// -----------------------------------------------------------------------

#[test]
fn synthesize_keywords_needs_no_network() {
    let pipeline = pipeline(vec![], vec![]);
    let signals = ImageSignals {
        logos: vec!["Nike".into()],
        labels: vec!["sneakers".into()],
        ..ImageSignals::default()
    };
    let (detection, keywords) = pipeline.synthesize_keywords(&signals);
    assert_eq!(detection.brand.as_deref(), Some("Nike"));
    assert_eq!(keywords.primary(), Some("Nike sneakers"));
}
