//! # Startup Signal
//!
//! A funding-news enrichment pipeline: reads recent startup funding articles
//! from RSS feeds, extracts structured funding details through an LLM,
//! resolves each company's canonical website, scores its hiring activity,
//! then stores and publishes the enriched records.
//!
//! ## Usage
//!
//! ```sh
//! startup_signal --config signal.yaml --days-back 3 --max-items 25
//! ```
//!
//! ## Architecture
//!
//! 1. **Ingestion**: Poll feeds, keep recent funding headlines
//! 2. **Enrichment**: Per article, one at a time: fetch text, extract,
//!    resolve domain, detect hiring signal, upsert into the store
//! 3. **Publishing**: Append the batch to a Google Sheet
//! 4. **Preview**: Log the first few enriched companies

use clap::Parser;
use std::error::Error;
use std::fmt;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod extract;
mod feeds;
mod fetcher;
mod hiring;
mod http;
mod models;
mod pipeline;
mod publish;
mod resolve;
mod storage;
mod utils;

use api::{AskModel, ModelContext};
use cli::Cli;
use config::PipelineConfig;
use extract::Extractor;
use feeds::FeedIngestor;
use fetcher::ArticleFetcher;
use hiring::CareersPageDetector;
use http::{ReqwestWebClient, WebClient};
use models::{Article, EnrichedCompany};
use pipeline::Pipeline;
use publish::{GoogleSheetsPublisher, SheetPublisher};
use resolve::DomainResolver;
use storage::{CompanyStore, JsonCompanyStore};
use utils::truncate_for_log;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("startup_signal starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.days_back, ?args.max_items, "Parsed CLI arguments");

    // ---- Load and validate config ----
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let client = ReqwestWebClient::new(&config.http)?;

    // ---- Ingest feeds ----
    let mut articles = FeedIngestor::new(&client, config.feeds.clone())
        .fetch_recent_articles(config.batch.days_back)
        .await;
    articles.truncate(config.batch.max_items);
    info!(count = articles.len(), "Articles selected for enrichment");

    // ---- Enrich ----
    let context = ModelContext::load(&config.model).await;
    let enriched = enrich(context.as_ref().map(ModelContext::model), &client, &config, &articles).await?;

    // ---- Publish ----
    let sheets_client = reqwest::Client::builder()
        .user_agent(config.http.user_agent.as_str())
        .timeout(config.http.request_timeout())
        .build()?;
    GoogleSheetsPublisher::new(
        sheets_client,
        config.sheet.spreadsheet_id.clone(),
        config.sheet.tab.as_str(),
        config.sheet.access_token.clone(),
    )
    .save_to_sheet(&enriched)
    .await;

    // ---- Preview ----
    preview(&enriched, args.max_preview);

    info!(
        enriched = enriched.len(),
        elapsed_ms = start_time.elapsed().as_millis() as u128,
        "startup_signal finished"
    );
    Ok(())
}

/// Run the per-article pipeline, or skip the whole batch when the model
/// could not be set up.
async fn enrich<M, C, E>(
    model: Result<M, E>,
    client: &C,
    config: &PipelineConfig,
    articles: &[Article],
) -> Result<Vec<EnrichedCompany>, Box<dyn Error>>
where
    M: AskModel,
    C: WebClient,
    E: fmt::Display,
{
    let model = match model {
        Ok(model) => model,
        Err(e) => {
            warn!(error = %e, skipped = articles.len(), "Model unavailable; skipping enrichment");
            return Ok(Vec::new());
        }
    };

    let store = JsonCompanyStore::new(&config.storage.path);
    store.init_db().await?;

    let pipeline = Pipeline::new(
        ArticleFetcher::new(client, config.batch.body_max_chars),
        Extractor::new(model),
        DomainResolver::new(client, config.resolver.clone(), config.http.probe_timeout()),
        CareersPageDetector::new(client),
        store,
    );
    let (enriched, _report) = pipeline.run(articles, config.batch.max_items).await;
    Ok(enriched)
}

fn preview(records: &[EnrichedCompany], max_preview: usize) {
    if records.is_empty() {
        info!("No companies enriched this run");
        return;
    }
    for (rank, record) in records.iter().take(max_preview).enumerate() {
        info!(
            rank = rank + 1,
            company = %record.company_name,
            amount = ?record.amount_raised_usd,
            round = record.funding_round.as_deref().unwrap_or("-"),
            domain = record.domain.as_deref().unwrap_or("-"),
            confidence = record.confidence,
            source = record.source.as_str(),
            hiring = record.hiring_tier.as_deref().unwrap_or("-"),
            title = %truncate_for_log(&record.title, 80),
            "Preview"
        );
    }
}
