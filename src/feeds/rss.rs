//! RSS 2.0 parsing.

use crate::models::Article;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Parse an RSS document into articles, skipping items without a title or
/// link.
pub fn parse_feed(xml: &str) -> Result<Vec<Article>, quick_xml::DeError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let url = item.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
            Some(Article {
                title,
                url,
                published_at: item.pub_date.as_deref().and_then(parse_date),
            })
        })
        .collect())
}

/// RFC 2822 (the RSS norm), falling back to RFC 3339.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
