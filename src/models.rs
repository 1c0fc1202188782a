//! Data models for funding articles and their enriched representations.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Article`]: A candidate funding story discovered in a feed
//! - [`FundingRecord`]: Structured facts the model extracted from one article
//! - [`DomainResolution`]: The resolved company domain and how it was found
//! - [`HiringSignal`]: Hiring activity detected on the company's site
//! - [`EnrichedCompany`]: The merged record handed to storage and publishing
//!
//! Field names are snake_case on the wire because the extraction prompt asks
//! the model for exactly these keys.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw funding article as discovered in a syndication feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The headline of the story.
    pub title: String,
    /// The canonical URL of the story.
    pub url: String,
    /// When the story was published, if the feed said so.
    pub published_at: Option<DateTime<Utc>>,
}

/// Structured funding facts extracted from one article.
///
/// Every field is optional because the model is instructed to return `null`
/// for anything the text does not state. A record without a `company_name`
/// never leaves the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub company_name: Option<String>,
    pub website_url: Option<String>,
    pub amount_raised_usd: Option<u64>,
    pub funding_round: Option<String>,
    #[serde(default)]
    pub investors: Vec<String>,
    pub lead_investor: Option<String>,
    pub headquarter_country: Option<String>,
}

impl FundingRecord {
    /// Build a record from an untrusted JSON object.
    ///
    /// Coercion is lenient: amounts may arrive as floats or as numeric strings
    /// with separators, investors may arrive as one comma-separated string, and
    /// blank strings are treated as `null`.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        Self {
            company_name: text_field(object, "company_name"),
            website_url: text_field(object, "website_url"),
            amount_raised_usd: object.get("amount_raised_usd").and_then(coerce_amount),
            funding_round: text_field(object, "funding_round"),
            investors: object
                .get("investors")
                .map(coerce_investors)
                .unwrap_or_default(),
            lead_investor: text_field(object, "lead_investor"),
            headquarter_country: text_field(object, "headquarter_country"),
        }
    }

    /// The company name if present and not blank.
    pub fn company(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| !matches!(c, ',' | '_' | ' '))
                .collect();
            digits
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    digits
                        .parse::<f64>()
                        .ok()
                        .filter(|f| *f >= 0.0)
                        .map(|f| f.round() as u64)
                })
        }
        _ => None,
    }
}

fn coerce_investors(value: &Value) -> Vec<String> {
    let names: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .collect(),
        Value::String(s) => s.split(',').map(|s| s.trim().to_string()).collect(),
        _ => Vec::new(),
    };
    names
        .into_iter()
        .filter(|name| !name.is_empty())
        .unique()
        .collect()
}

/// Which resolution strategy produced a domain.
///
/// The confidence of a resolution is fixed by its source, not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// A reachable URL stated explicitly in the article.
    LlmExplicit,
    /// First organic search-engine result.
    Search,
    /// Slug + common TLD probe.
    Guess,
    /// Every strategy came up empty.
    Failed,
}

impl ResolutionSource {
    pub fn confidence(self) -> f64 {
        match self {
            ResolutionSource::LlmExplicit => 0.98,
            ResolutionSource::Search => 0.85,
            ResolutionSource::Guess => 0.60,
            ResolutionSource::Failed => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionSource::LlmExplicit => "llm_explicit",
            ResolutionSource::Search => "search",
            ResolutionSource::Guess => "guess",
            ResolutionSource::Failed => "failed",
        }
    }
}

/// A company's best-guess canonical domain.
///
/// `domain` is `None` exactly when `source` is [`ResolutionSource::Failed`]
/// and `confidence` is `0.0`; the constructors are the only way to keep that
/// true, so prefer them over struct literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResolution {
    pub domain: Option<String>,
    pub confidence: f64,
    pub source: ResolutionSource,
}

impl DomainResolution {
    pub fn found(domain: String, source: ResolutionSource) -> Self {
        debug_assert_ne!(source, ResolutionSource::Failed);
        Self {
            domain: Some(domain),
            confidence: source.confidence(),
            source,
        }
    }

    pub fn failed() -> Self {
        Self {
            domain: None,
            confidence: ResolutionSource::Failed.confidence(),
            source: ResolutionSource::Failed,
        }
    }
}

/// Hiring activity detected for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiringSignal {
    /// One of `high`, `medium`, `low`, `none` or `unknown`.
    pub hiring_tier: String,
    /// Human-readable explanation of the tier.
    pub details: String,
    pub tech_roles: Option<u32>,
    pub ats_provider: Option<String>,
    pub careers_url: Option<String>,
}

/// The merged record produced for one article.
///
/// Built from an [`Article`] and a [`FundingRecord`] that carries a company
/// name, then absorbs each later stage's output. Same-named facts from a later
/// stage override earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCompany {
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,

    pub company_name: String,
    pub website_url: Option<String>,
    pub amount_raised_usd: Option<u64>,
    pub funding_round: Option<String>,
    pub investors: Vec<String>,
    pub lead_investor: Option<String>,
    pub headquarter_country: Option<String>,

    pub domain: Option<String>,
    pub confidence: f64,
    pub source: ResolutionSource,

    pub hiring_tier: Option<String>,
    pub details: Option<String>,
    pub tech_roles: Option<u32>,
    pub ats_provider: Option<String>,
    pub careers_url: Option<String>,
}

impl EnrichedCompany {
    /// Merge an article with its extracted record.
    ///
    /// Returns `None` when the record has no usable company name.
    pub fn from_extraction(article: &Article, record: FundingRecord) -> Option<Self> {
        let company_name = record.company()?.to_string();
        Some(Self {
            title: article.title.clone(),
            url: article.url.clone(),
            published_at: article.published_at,
            company_name,
            website_url: record.website_url,
            amount_raised_usd: record.amount_raised_usd,
            funding_round: record.funding_round,
            investors: record.investors,
            lead_investor: record.lead_investor,
            headquarter_country: record.headquarter_country,
            domain: None,
            confidence: 0.0,
            source: ResolutionSource::Failed,
            hiring_tier: None,
            details: None,
            tech_roles: None,
            ats_provider: None,
            careers_url: None,
        })
    }

    pub fn with_resolution(mut self, resolution: DomainResolution) -> Self {
        self.domain = resolution.domain;
        self.confidence = resolution.confidence;
        self.source = resolution.source;
        self
    }

    pub fn with_hiring(mut self, signal: HiringSignal) -> Self {
        self.hiring_tier = Some(signal.hiring_tier);
        self.details = Some(signal.details);
        self.tech_roles = signal.tech_roles;
        self.ats_provider = signal.ats_provider;
        self.careers_url = signal.careers_url;
        self
    }

    /// Identity key used for idempotent storage.
    pub fn identity(&self) -> String {
        self.company_name
            .split_whitespace()
            .join(" ")
            .to_lowercase()
    }
}
