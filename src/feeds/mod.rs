//! Funding-news feed ingestion.
//!
//! Polls each configured RSS feed in turn, keeps recent items whose headline
//! looks funding-related, and de-duplicates them by URL. A feed that fails to
//! load or parse is logged and skipped; ingestion never fails as a whole.
//!
//! # Filtering
//!
//! 1. **Recency**: items published more than `days_back` days ago are dropped;
//!    undated items are kept
//! 2. **Relevance**: the title must contain one of the configured keywords
//! 3. **Uniqueness**: first occurrence of each URL wins
//!
//! The result is ordered newest first; the caller truncates it to the batch
//! size.

pub mod rss;

use crate::config::FeedSettings;
use crate::http::WebClient;
use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::cmp::Reverse;
use tracing::{debug, info, instrument, warn};

/// Reads candidate articles from RSS feeds.
#[derive(Debug)]
pub struct FeedIngestor<'a, C> {
    client: &'a C,
    settings: FeedSettings,
}

impl<'a, C: WebClient> FeedIngestor<'a, C> {
    pub fn new(client: &'a C, settings: FeedSettings) -> Self {
        Self { client, settings }
    }

    /// Funding-relevant articles from the last `days_back` days.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_recent_articles(&self, days_back: u32) -> Vec<Article> {
        let articles: Vec<Article> = stream::iter(self.settings.urls.iter())
            .then(|feed_url| async move { self.fetch_feed(feed_url).await })
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();
        let total = articles.len();

        let selected = select_articles(articles, &self.settings.keywords, Utc::now(), days_back);
        info!(total, selected = selected.len(), "Collected recent funding articles");
        selected
    }

    async fn fetch_feed(&self, feed_url: &str) -> Vec<Article> {
        let page = match self.client.get(feed_url).await {
            Ok(page) if page.is_ok() => page,
            Ok(page) => {
                warn!(%feed_url, status = page.status, "Feed returned non-200");
                return Vec::new();
            }
            Err(e) => {
                warn!(%feed_url, error = %e, "Feed fetch failed");
                return Vec::new();
            }
        };

        match rss::parse_feed(&page.body) {
            Ok(articles) => {
                debug!(%feed_url, count = articles.len(), "Parsed feed");
                articles
            }
            Err(e) => {
                warn!(%feed_url, error = %e, "Feed could not be parsed");
                Vec::new()
            }
        }
    }
}

/// True if `title` mentions any of `keywords`, ignoring case.
pub fn is_funding_related(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|k| title.contains(&k.to_lowercase()))
}

/// Apply the recency, relevance and uniqueness filters.
pub fn select_articles(
    articles: Vec<Article>,
    keywords: &[String],
    now: DateTime<Utc>,
    days_back: u32,
) -> Vec<Article> {
    let cutoff = now - Duration::days(i64::from(days_back));
    articles
        .into_iter()
        .filter(|a| a.published_at.is_none_or(|published| published >= cutoff))
        .filter(|a| is_funding_related(&a.title, keywords))
        .unique_by(|a| a.url.clone())
        .sorted_by_key(|a| Reverse(a.published_at))
        .collect()
}
