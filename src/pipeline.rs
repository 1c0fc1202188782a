//! Batch orchestration: articles in, enriched companies out.
//!
//! Each article moves through a fixed sequence of stages, strictly one item
//! at a time:
//!
//! ```text
//! Fetched -> Extracted -> Resolved -> Signaled -> Stored
//! ```
//!
//! An item is dropped after `Fetched` when the page yields no text and after
//! `Extracted` when the model produced no usable record or no company name.
//! Resolution and hiring detection never drop an item: a failed resolution
//! proceeds with no domain. A storage failure is logged and the item is still
//! returned. No single item can stop the batch.

use crate::api::AskModel;
use crate::extract::Extractor;
use crate::fetcher::ArticleFetcher;
use crate::hiring::HiringSignalDetector;
use crate::http::WebClient;
use crate::models::{Article, EnrichedCompany};
use crate::resolve::DomainResolver;
use crate::storage::CompanyStore;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Stages an item passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStage {
    Fetched,
    Extracted,
    Resolved,
    Signaled,
    Stored,
}

/// Why an item left the pipeline early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    EmptyBody,
    ExtractionFailed,
    MissingCompanyName,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DropReason::EmptyBody => "no article text",
            DropReason::ExtractionFailed => "no data extracted",
            DropReason::MissingCompanyName => "no company name",
        };
        f.write_str(reason)
    }
}

/// What happened to one article.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Completed(EnrichedCompany),
    Dropped { after: ItemStage, reason: DropReason },
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub completed: usize,
    pub empty_body: usize,
    pub extraction_failed: usize,
    pub missing_company: usize,
    pub storage_failures: usize,
}

impl BatchReport {
    fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::EmptyBody => self.empty_body += 1,
            DropReason::ExtractionFailed => self.extraction_failed += 1,
            DropReason::MissingCompanyName => self.missing_company += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.empty_body + self.extraction_failed + self.missing_company
    }
}

/// Sequences fetch, extraction, resolution, hiring detection and storage.
pub struct Pipeline<'a, M, C, H, S> {
    fetcher: ArticleFetcher<'a, C>,
    extractor: Extractor<M>,
    resolver: DomainResolver<'a, C>,
    hiring: H,
    store: S,
}

impl<'a, M, C, H, S> Pipeline<'a, M, C, H, S>
where
    M: AskModel,
    C: WebClient,
    H: HiringSignalDetector,
    S: CompanyStore,
{
    pub fn new(
        fetcher: ArticleFetcher<'a, C>,
        extractor: Extractor<M>,
        resolver: DomainResolver<'a, C>,
        hiring: H,
        store: S,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            resolver,
            hiring,
            store,
        }
    }

    /// Process at most `max_items` articles, returning every completed
    /// company and the run's counters.
    #[instrument(level = "info", skip_all, fields(candidates = articles.len(), max_items))]
    pub async fn run(&self, articles: &[Article], max_items: usize) -> (Vec<EnrichedCompany>, BatchReport) {
        let t0 = Instant::now();
        let mut enriched = Vec::new();
        let mut report = BatchReport::default();

        info!("Extracting structured funding details");
        for (index, article) in articles.iter().take(max_items).enumerate() {
            report.processed += 1;
            match self.process(article, &mut report).await {
                ItemOutcome::Completed(company) => {
                    info!(
                        index,
                        company = %company.company_name,
                        amount = ?company.amount_raised_usd,
                        round = ?company.funding_round,
                        domain = ?company.domain,
                        "Enriched article"
                    );
                    report.completed += 1;
                    enriched.push(company);
                }
                ItemOutcome::Dropped { after, reason } => {
                    warn!(index, title = %article.title, ?after, %reason, "Skipped article");
                    report.record_drop(reason);
                }
            }
        }

        info!(
            processed = report.processed,
            completed = report.completed,
            dropped = report.dropped(),
            storage_failures = report.storage_failures,
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Batch complete"
        );
        (enriched, report)
    }

    /// Drive one article through every stage.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn process(&self, article: &Article, report: &mut BatchReport) -> ItemOutcome {
        let body = self.fetcher.fetch_article_text(&article.url).await;
        if body.trim().is_empty() {
            return ItemOutcome::Dropped {
                after: ItemStage::Fetched,
                reason: DropReason::EmptyBody,
            };
        }

        let Some(record) = self.extractor.extract(&article.title, &body).await.into_record() else {
            return ItemOutcome::Dropped {
                after: ItemStage::Extracted,
                reason: DropReason::ExtractionFailed,
            };
        };
        let Some(company) = EnrichedCompany::from_extraction(article, record) else {
            return ItemOutcome::Dropped {
                after: ItemStage::Extracted,
                reason: DropReason::MissingCompanyName,
            };
        };

        let resolution = self
            .resolver
            .resolve(&company.company_name, company.website_url.as_deref())
            .await;
        let company = company.with_resolution(resolution);
        debug!(stage = ?ItemStage::Resolved, domain = ?company.domain, "Stage complete");

        let signal = self.hiring.detect_hiring_signal(company.domain.as_deref()).await;
        let company = company.with_hiring(signal);
        debug!(stage = ?ItemStage::Signaled, tier = ?company.hiring_tier, "Stage complete");

        if let Err(e) = self.store.upsert_company(&company).await {
            error!(company = %company.company_name, error = %e, "Failed to store company");
            report.storage_failures += 1;
        } else {
            debug!(stage = ?ItemStage::Stored, "Stage complete");
        }
        ItemOutcome::Completed(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::ScriptedModel;
    use crate::config::ResolverSettings;
    use crate::hiring::CareersPageDetector;
    use crate::http::fake::FakeWeb;
    use crate::models::ResolutionSource;
    use std::cell::RefCell;
    use std::error::Error;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct MemoryStore {
        records: RefCell<Vec<EnrichedCompany>>,
        fail: bool,
    }

    impl CompanyStore for MemoryStore {
        async fn init_db(&self) -> Result<(), Box<dyn Error>> {
            Ok(())
        }

        async fn upsert_company(&self, record: &EnrichedCompany) -> Result<(), Box<dyn Error>> {
            if self.fail {
                return Err("disk full".into());
            }
            self.records.borrow_mut().push(record.clone());
            Ok(())
        }
    }

    const ACME_PAGE: &str =
        "<html><body><p>Acme raised $5M in a seed round led by Foo Ventures.</p><p>Visit: https://acme.io for details.</p></body></html>";
    const ACME_JSON: &str = r#"{"company_name": "Acme", "website_url": "https://acme.io", "amount_raised_usd": 5000000, "funding_round": "Seed", "investors": ["Foo Ventures"], "lead_investor": "Foo Ventures", "headquarter_country": null}"#;

    fn article(title: &str, url: &str) -> Article {
        Article {
            title: title.to_string(),
            url: url.to_string(),
            published_at: None,
        }
    }

    fn pipeline<'a>(
        web: &'a FakeWeb,
        model: ScriptedModel,
        store: MemoryStore,
    ) -> Pipeline<'a, ScriptedModel, FakeWeb, CareersPageDetector<'a, FakeWeb>, MemoryStore> {
        let settings = ResolverSettings {
            search_delay_ms: 0,
            ..ResolverSettings::default()
        };
        Pipeline::new(
            ArticleFetcher::new(web, 3000),
            Extractor::new(model),
            DomainResolver::new(web, settings, Duration::from_secs(3)),
            CareersPageDetector::new(web),
            store,
        )
    }

    #[tokio::test]
    async fn test_explicit_url_end_to_end() {
        let web = FakeWeb::new()
            .page("https://news.example.com/acme", 200, ACME_PAGE)
            .probe("https://acme.io", 200)
            .page("https://acme.io/careers", 200, "Backend engineer, greenhouse.io");
        let pipeline = pipeline(&web, ScriptedModel::new().reply(ACME_JSON), MemoryStore::default());

        let (enriched, report) = pipeline
            .run(&[article("Acme raises $5M", "https://news.example.com/acme")], 10)
            .await;

        assert_eq!(enriched.len(), 1);
        let acme = &enriched[0];
        assert_eq!(acme.amount_raised_usd, Some(5_000_000));
        assert_eq!(acme.website_url.as_deref(), Some("https://acme.io"));
        assert_eq!(acme.domain.as_deref(), Some("https://acme.io"));
        assert_eq!(acme.source, ResolutionSource::LlmExplicit);
        assert_eq!(acme.confidence, 0.98);
        assert_eq!(acme.hiring_tier.as_deref(), Some("medium"));
        assert_eq!(acme.title, "Acme raises $5M");
        assert!(!web.called("duckduckgo"));
        assert_eq!(pipeline.store.records.borrow().len(), 1);
        assert_eq!(report.completed, 1);
    }

    #[tokio::test]
    async fn test_null_company_is_dropped() {
        let web = FakeWeb::new().page("https://news.example.com/x", 200, ACME_PAGE);
        let model = ScriptedModel::new().reply(r#"{"company_name": null, "investors": []}"#);
        let pipeline = pipeline(&web, model, MemoryStore::default());

        let (enriched, report) = pipeline.run(&[article("Markets wrap", "https://news.example.com/x")], 10).await;
        assert!(enriched.is_empty());
        assert_eq!(report.missing_company, 1);
        assert!(pipeline.store.records.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_does_not_stop_batch() {
        let web = FakeWeb::new()
            .page("https://news.example.com/a", 200, ACME_PAGE)
            .page("https://news.example.com/b", 200, ACME_PAGE)
            .probe("https://acme.io", 200);
        let model = ScriptedModel::new().fail("model unavailable").reply(ACME_JSON);
        let pipeline = pipeline(&web, model, MemoryStore::default());

        let articles = [
            article("First", "https://news.example.com/a"),
            article("Second", "https://news.example.com/b"),
        ];
        let (enriched, report) = pipeline.run(&articles, 10).await;

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].title, "Second");
        assert_eq!(report.extraction_failed, 1);
        assert_eq!(report.processed, 2);
    }

    #[tokio::test]
    async fn test_empty_body_skips_model_call() {
        let web = FakeWeb::new()
            .page("https://news.example.com/empty", 200, "<html><body><div>No paragraphs</div></body></html>")
            .page("https://news.example.com/acme", 200, ACME_PAGE);
        let pipeline = pipeline(&web, ScriptedModel::new().reply(ACME_JSON), MemoryStore::default());

        let mut report = BatchReport::default();
        let outcome = pipeline
            .process(&article("Acme raises $5M", "https://news.example.com/empty"), &mut report)
            .await;
        assert_eq!(
            outcome,
            ItemOutcome::Dropped {
                after: ItemStage::Fetched,
                reason: DropReason::EmptyBody
            }
        );

        // The single scripted reply is still there for the next article.
        let outcome = pipeline
            .process(&article("Acme raises $5M", "https://news.example.com/acme"), &mut report)
            .await;
        assert!(matches!(outcome, ItemOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn test_failed_resolution_still_completes() {
        let web = FakeWeb::new().page("https://news.example.com/acme", 200, ACME_PAGE);
        let model = ScriptedModel::new().reply(r#"{"company_name": "Acme", "investors": []}"#);
        let pipeline = pipeline(&web, model, MemoryStore::default());

        let (enriched, _) = pipeline.run(&[article("Acme raises $5M", "https://news.example.com/acme")], 10).await;
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].domain, None);
        assert_eq!(enriched[0].source, ResolutionSource::Failed);
        assert_eq!(enriched[0].hiring_tier.as_deref(), Some("unknown"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_counted_not_fatal() {
        let web = FakeWeb::new()
            .page("https://news.example.com/acme", 200, ACME_PAGE)
            .probe("https://acme.io", 200);
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let pipeline = pipeline(&web, ScriptedModel::new().reply(ACME_JSON), store);

        let (enriched, report) = pipeline.run(&[article("Acme raises $5M", "https://news.example.com/acme")], 10).await;
        assert_eq!(enriched.len(), 1);
        assert_eq!(report.storage_failures, 1);
    }

    #[tokio::test]
    async fn test_max_items_bounds_the_batch() {
        let web = FakeWeb::new();
        let pipeline = pipeline(&web, ScriptedModel::new(), MemoryStore::default());
        let articles = [
            article("One", "https://news.example.com/1"),
            article("Two", "https://news.example.com/2"),
            article("Three", "https://news.example.com/3"),
        ];

        let (_, report) = pipeline.run(&articles, 2).await;
        assert_eq!(report.processed, 2);
        assert_eq!(report.empty_body, 2);
        assert!(!web.called("news.example.com/3"));
    }
}
