//! Canonical `https://<host>` form for domains.

use url::Url;

/// Reduce a URL (or bare host) to `https://` + lowercase host without `www.`.
///
/// Paths, queries, ports and fragments are dropped. Returns `None` for input
/// with no recoverable host.
///
/// ```ignore
/// assert_eq!(normalize_domain("WWW.Example.COM/path").as_deref(), Some("https://example.com"));
/// ```
pub fn normalize_domain(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches("//"))
    };

    let host = match Url::parse(&with_scheme) {
        Ok(parsed) => parsed.host_str()?.to_ascii_lowercase(),
        Err(_) => fallback_host(trimmed)?,
    };
    let host = host.strip_prefix("www.").unwrap_or(&host).trim_end_matches('.');
    if host.is_empty() {
        return None;
    }
    Some(format!("https://{host}"))
}

/// Host extraction for strings `url` refuses to parse.
fn fallback_host(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    if host.is_empty() || host.contains(char::is_whitespace) {
        None
    } else {
        Some(host.to_string())
    }
}

/// The bare host of a normalized domain, e.g. `example.com`.
pub fn host_of(domain: &str) -> &str {
    domain.trim_start_matches("https://")
}
