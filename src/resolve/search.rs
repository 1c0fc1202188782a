//! Search-engine result parsing.
//!
//! The search strategy scrapes the HTML results page of a DuckDuckGo-style
//! endpoint. Result links are wrapped in a redirect (`/l/?uddg=<target>`)
//! that has to be unwrapped to get at the real destination.

use super::normalize::{host_of, normalize_domain};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static RESULT_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("static selector is valid"));

/// Base used to resolve relative and protocol-relative result links.
const SEARCH_BASE: &str = "https://duckduckgo.com/";

/// Query parameters that tracking redirects use to carry the destination.
const REDIRECT_PARAMS: &[&str] = &["uddg", "u", "url", "q"];

/// Full search URL for `"<company> official site"`.
pub fn search_url(endpoint: &str, company_name: &str) -> String {
    let query = format!("{company_name} official site");
    format!("{}?q={}", endpoint, urlencoding::encode(&query))
}

/// Class DuckDuckGo puts on sponsored result containers.
const AD_CONTAINER_CLASS: &str = "result--ad";

/// Destination of the first organic result, if any.
///
/// Results are walked in page order. Links inside a sponsored container and
/// links that resolve back to the search engine's own host (ad click
/// trackers such as `/y.js?ad_domain=...`) are skipped.
pub fn first_organic_target(html: &str, endpoint: &str) -> Option<String> {
    let engine_hosts = engine_hosts(endpoint);
    let document = Html::parse_document(html);
    document
        .select(&RESULT_LINK)
        .filter(|a| !in_ad_container(*a))
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .filter_map(unwrap_redirect)
        .find(|target| !is_aggregator(target, &engine_hosts))
}

/// Hosts that identify the engine itself, never a result.
fn engine_hosts(endpoint: &str) -> Vec<String> {
    [SEARCH_BASE, endpoint]
        .iter()
        .filter_map(|url| normalize_domain(url))
        .map(|domain| host_of(&domain).to_string())
        .collect()
}

fn in_ad_container(link: ElementRef<'_>) -> bool {
    link.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().classes().any(|class| class == AD_CONTAINER_CLASS))
}

/// Recover the true destination from a tracking/redirect link.
///
/// Links that are not redirects are returned resolved but otherwise as-is.
pub fn unwrap_redirect(href: &str) -> Option<String> {
    let base = Url::parse(SEARCH_BASE).ok()?;
    let parsed = base.join(href).ok()?;

    let is_redirect = parsed
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"))
        && parsed.path().starts_with("/l/");
    if !is_redirect {
        return Some(parsed.to_string());
    }

    REDIRECT_PARAMS.iter().find_map(|param| {
        parsed
            .query_pairs()
            .find(|(key, value)| key == *param && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

/// True if `url`'s host is (a subdomain of) one of `aggregators`.
pub fn is_aggregator(url: &str, aggregators: &[String]) -> bool {
    let Some(normalized) = normalize_domain(url) else {
        return false;
    };
    let host = host_of(&normalized);
    aggregators.iter().any(|domain| {
        let domain = domain.trim().to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{domain}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://html.duckduckgo.com/html/";

    fn aggregators() -> Vec<String> {
        vec!["linkedin.com".to_string(), "crunchbase.com".to_string()]
    }

    #[test]
    fn test_search_url_encodes_query() {
        assert_eq!(
            search_url("https://duckduckgo.com/html/", "Acme & Co"),
            "https://duckduckgo.com/html/?q=Acme%20%26%20Co%20official%20site"
        );
    }

    #[test]
    fn test_first_organic_target() {
        let html = r#"
            <div class="results">
              <a class="result__snippet" href="https://ignored.example">snippet</a>
              <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Facme.io%2F&amp;rut=abc">Acme</a>
              <a class="result__a" href="https://second.example">Second</a>
            </div>"#;
        assert_eq!(
            first_organic_target(html, ENDPOINT).as_deref(),
            Some("https://acme.io/")
        );
        assert_eq!(first_organic_target("<html><body>No results.</body></html>", ENDPOINT), None);
    }

    #[test]
    fn test_sponsored_results_are_skipped() {
        let html = r#"
            <div class="results">
              <div class="result results_links result--ad">
                <a class="result__a" href="https://competitor.com/landing">Sponsored</a>
              </div>
              <div class="result results_links">
                <a class="result__a" href="https://duckduckgo.com/y.js?ad_domain=competitor.com&amp;ad_provider=bing">Ad</a>
              </div>
              <div class="result results_links">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Facme.io&amp;rut=abc">Acme</a>
              </div>
            </div>"#;
        assert_eq!(
            first_organic_target(html, ENDPOINT).as_deref(),
            Some("https://acme.io")
        );
    }

    #[test]
    fn test_only_ads_yields_nothing() {
        let html = r#"<a class="result__a" href="/y.js?ad_domain=competitor.com">Ad</a>"#;
        assert_eq!(first_organic_target(html, ENDPOINT), None);
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(
            unwrap_redirect("//duckduckgo.com/l/?uddg=https%3A%2F%2Facme.io%2Fabout&rut=abc").as_deref(),
            Some("https://acme.io/about")
        );
        assert_eq!(
            unwrap_redirect("/l/?uddg=https%3A%2F%2Fwww.acme.ai%2F").as_deref(),
            Some("https://www.acme.ai/")
        );
        assert_eq!(unwrap_redirect("https://acme.co/").as_deref(), Some("https://acme.co/"));
        assert_eq!(unwrap_redirect("//duckduckgo.com/l/?rut=abc"), None);
    }

    #[test]
    fn test_is_aggregator() {
        assert!(is_aggregator("https://www.linkedin.com/company/acme", &aggregators()));
        assert!(is_aggregator("https://crunchbase.com/organization/acme", &aggregators()));
        assert!(!is_aggregator("https://acme.io", &aggregators()));
        assert!(!is_aggregator("https://notlinkedin.com", &aggregators()));
        assert!(!is_aggregator("not a url", &aggregators()));
    }
}
