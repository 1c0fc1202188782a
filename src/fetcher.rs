//! Article body fetching.
//!
//! Reduces an article page to the text of its `<p>` elements, capped to a
//! fixed number of characters to keep prompts small. Any failure degrades to
//! an empty body; the orchestrator skips items with nothing to read.

use crate::http::WebClient;
use crate::utils::{collapse_whitespace, truncate_chars};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector is valid"));

/// Fetches and reduces article pages to plain text.
#[derive(Debug)]
pub struct ArticleFetcher<'a, C> {
    client: &'a C,
    max_chars: usize,
}

impl<'a, C: WebClient> ArticleFetcher<'a, C> {
    pub fn new(client: &'a C, max_chars: usize) -> Self {
        Self { client, max_chars }
    }

    /// Fetch `url` and return at most `max_chars` characters of body text.
    ///
    /// Returns an empty string on any network error or non-200 response.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_article_text(&self, url: &str) -> String {
        let page = match self.client.get(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Article fetch failed");
                return String::new();
            }
        };
        if !page.is_ok() {
            warn!(status = page.status, "Article fetch returned non-200");
            return String::new();
        }

        let text = paragraph_text(&page.body);
        let body = truncate_chars(&text, self.max_chars).to_string();
        debug!(chars = body.chars().count(), "Parsed article body");
        body
    }
}

/// Join the text of every non-empty `<p>` element with single spaces.
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&PARAGRAPH)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeWeb;

    const ARTICLE: &str = r#"
        <html><head><title>ignored</title></head>
        <body>
          <nav>Home | Startups</nav>
          <p>Acme <b>raised</b> $5M in seed funding.</p>
          <p>   </p>
          <p>Visit:   https://acme.io
             for details.</p>
        </body></html>"#;

    #[test]
    fn test_paragraph_text_skips_non_paragraphs_and_blanks() {
        assert_eq!(
            paragraph_text(ARTICLE),
            "Acme raised $5M in seed funding. Visit: https://acme.io for details."
        );
    }

    #[tokio::test]
    async fn test_fetch_caps_length() {
        let web = FakeWeb::new().page("https://news.example.com/acme", 200, ARTICLE);
        let fetcher = ArticleFetcher::new(&web, 12);
        let body = fetcher.fetch_article_text("https://news.example.com/acme").await;
        assert_eq!(body, "Acme raised ");
    }

    #[tokio::test]
    async fn test_fetch_degrades_to_empty() {
        let web = FakeWeb::new().page("https://news.example.com/gone", 404, ARTICLE);
        let fetcher = ArticleFetcher::new(&web, 3000);
        assert_eq!(fetcher.fetch_article_text("https://news.example.com/gone").await, "");
        assert_eq!(fetcher.fetch_article_text("https://news.example.com/down").await, "");
    }
}
