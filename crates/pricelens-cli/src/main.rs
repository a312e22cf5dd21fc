use std::sync::Arc;

use clap::{Parser, Subcommand};
use pricelens_core::{AppConfig, Entity, ImageSignals, Lexicon};
use pricelens_search::{PipelineSettings, SearchPipeline};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "pricelens-cli")]
#[command(about = "Find the cheapest listings for a product photo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline for an image URL.
    Image {
        #[arg(long)]
        url: String,
    },
    /// Search retailers for a keyword and its translation.
    Keyword { text: String },
    /// Show the keywords synthesized from hand-written signals, without any
    /// network call.
    Keywords {
        #[arg(long)]
        best_guess: Option<String>,
        #[arg(long = "label")]
        labels: Vec<String>,
        #[arg(long = "logo")]
        logos: Vec<String>,
        /// `TEXT` or `TEXT:SCORE`; repeatable.
        #[arg(long = "entity", value_parser = parse_entity)]
        entities: Vec<Entity>,
        /// OCR text found on the product.
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KeywordReport {
    detected_brand: Option<String>,
    product_type: Option<String>,
    color: Option<String>,
    search_keywords: Vec<String>,
    translated_keywords: Vec<String>,
}

fn parse_entity(raw: &str) -> Result<Entity, String> {
    let (text, confidence) = match raw.rsplit_once(':') {
        Some((text, score)) => {
            let confidence: f32 = score
                .trim()
                .parse()
                .map_err(|_| format!("invalid entity score '{score}'"))?;
            (text, confidence)
        }
        None => (raw, 1.0),
    };
    if text.trim().is_empty() {
        return Err("entity text must not be empty".to_string());
    }
    Ok(Entity {
        text: text.trim().to_string(),
        confidence,
    })
}

fn signals_from_args(
    best_guess: Option<String>,
    labels: Vec<String>,
    logos: Vec<String>,
    entities: Vec<Entity>,
    text: Option<String>,
) -> ImageSignals {
    let text = text.unwrap_or_default();
    ImageSignals {
        best_guess_label: best_guess,
        entities,
        labels,
        logos,
        ocr_tokens: text.split_whitespace().map(str::to_string).collect(),
        ocr_full_text: text,
        ..ImageSignals::default()
    }
}

fn offline_pipeline(config: &AppConfig) -> anyhow::Result<SearchPipeline> {
    let lexicon = Lexicon::load_or_builtin(config.lexicon_path.as_deref())?;
    Ok(SearchPipeline::new(
        Vec::new(),
        Vec::new(),
        Arc::new(lexicon),
        PipelineSettings::from_app_config(config),
    )?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = pricelens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "running command");
    match cli.command {
        Commands::Image { url } => {
            let pipeline = SearchPipeline::from_config(&config)?;
            print_json(&pipeline.search_image(&url).await?)?;
        }
        Commands::Keyword { text } => {
            let pipeline = SearchPipeline::from_config(&config)?;
            print_json(&pipeline.search_keyword(&text).await?)?;
        }
        Commands::Keywords {
            best_guess,
            labels,
            logos,
            entities,
            text,
        } => {
            let signals = signals_from_args(best_guess, labels, logos, entities, text);
            let (detection, keywords) = offline_pipeline(&config)?.synthesize_keywords(&signals);
            print_json(&KeywordReport {
                detected_brand: detection.brand,
                product_type: detection.product_type,
                color: detection.color,
                search_keywords: keywords.keywords,
                translated_keywords: keywords.translated_keywords,
            })?;
        }
    }

    Ok(())
}
