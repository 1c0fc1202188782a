//! Domain resolution: company name in, canonical domain out.
//!
//! Resolution walks a fixed chain of strategies and stops at the first one
//! that produces a reachable domain:
//!
//! | Order | Strategy | Confidence | Cost |
//! |-------|----------|------------|------|
//! | 1 | [`Strategy::ExplicitHint`] | 0.98 | one probe, only when the article stated a URL |
//! | 2 | [`Strategy::Search`] | 0.85 | politeness delay + one search request |
//! | 3 | [`Strategy::Guess`] | 0.60 | up to one probe per TLD |
//!
//! Every network error or bad status inside a strategy means "found
//! nothing"; [`DomainResolver::resolve`] itself cannot fail.
//!
//! # Submodules
//!
//! - [`normalize`]: `https://<host>` canonical form
//! - [`search`]: Results-page parsing and redirect unwrapping
//! - [`guess`]: Slug and TLD candidates

pub mod guess;
pub mod normalize;
pub mod search;

use crate::config::ResolverSettings;
use crate::http::WebClient;
use crate::models::{DomainResolution, ResolutionSource};
use normalize::normalize_domain;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// One independent way of finding a company's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExplicitHint,
    Search,
    Guess,
}

/// The order strategies are tried in.
pub const STRATEGY_CHAIN: [Strategy; 3] = [Strategy::ExplicitHint, Strategy::Search, Strategy::Guess];

impl Strategy {
    pub fn source(self) -> ResolutionSource {
        match self {
            Strategy::ExplicitHint => ResolutionSource::LlmExplicit,
            Strategy::Search => ResolutionSource::Search,
            Strategy::Guess => ResolutionSource::Guess,
        }
    }
}

/// Resolves company names to domains over a [`WebClient`].
#[derive(Debug)]
pub struct DomainResolver<'a, C> {
    client: &'a C,
    settings: ResolverSettings,
    probe_timeout: Duration,
}

impl<'a, C: WebClient> DomainResolver<'a, C> {
    pub fn new(client: &'a C, settings: ResolverSettings, probe_timeout: Duration) -> Self {
        Self {
            client,
            settings,
            probe_timeout,
        }
    }

    /// Resolve `company_name`, trusting `hint_url` first when it is reachable.
    #[instrument(level = "info", skip(self), fields(company = %company_name))]
    pub async fn resolve(&self, company_name: &str, hint_url: Option<&str>) -> DomainResolution {
        for strategy in STRATEGY_CHAIN {
            if let Some(domain) = self.attempt(strategy, company_name, hint_url).await {
                let resolution = DomainResolution::found(domain, strategy.source());
                info!(
                    domain = resolution.domain.as_deref().unwrap_or_default(),
                    source = resolution.source.as_str(),
                    confidence = resolution.confidence,
                    "Resolved company domain"
                );
                return resolution;
            }
            debug!(?strategy, "Strategy found nothing; falling through");
        }

        warn!("All resolution strategies failed");
        DomainResolution::failed()
    }

    async fn attempt(&self, strategy: Strategy, company_name: &str, hint_url: Option<&str>) -> Option<String> {
        match strategy {
            Strategy::ExplicitHint => match hint_url {
                Some(hint) => self.via_hint(hint).await,
                None => None,
            },
            Strategy::Search => self.via_search(company_name).await,
            Strategy::Guess => self.via_guessing(company_name).await,
        }
    }

    /// Accept the article's own URL if the site answers.
    async fn via_hint(&self, hint_url: &str) -> Option<String> {
        let domain = normalize_domain(hint_url)?;
        if search::is_aggregator(&domain, &self.settings.aggregator_domains) {
            info!(%domain, "Explicit URL is an aggregator profile; ignoring");
            return None;
        }
        match self.client.head(&domain, self.probe_timeout).await {
            Ok(probe) if probe.is_reachable() => Some(domain),
            Ok(probe) => {
                warn!(%domain, status = probe.status, "Explicit URL is not reachable");
                None
            }
            Err(e) => {
                warn!(%domain, error = %e, "Explicit URL probe failed");
                None
            }
        }
    }

    /// First organic search result that is not an aggregator profile.
    async fn via_search(&self, company_name: &str) -> Option<String> {
        let delay = self.settings.search_delay();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        let url = search::search_url(&self.settings.search_endpoint, company_name);
        let page = match self.client.get(&url).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                warn!(status = page.status, "Search returned non-200");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Search request failed");
                return None;
            }
        };

        let target = search::first_organic_target(&page.body, &self.settings.search_endpoint)?;
        if search::is_aggregator(&target, &self.settings.aggregator_domains) {
            info!(%target, "Top search result is an aggregator profile; ignoring");
            return None;
        }
        normalize_domain(&target)
    }

    /// Probe `<slug><tld>` candidates in order.
    async fn via_guessing(&self, company_name: &str) -> Option<String> {
        for candidate in guess::candidates(company_name, &self.settings.guess_tlds) {
            match self.client.head(&candidate, self.probe_timeout).await {
                Ok(probe) if probe.is_reachable() => return normalize_domain(&probe.final_url),
                Ok(probe) => debug!(%candidate, status = probe.status, "Guess not reachable"),
                Err(e) => debug!(%candidate, error = %e, "Guess probe failed"),
            }
        }
        None
    }
}
