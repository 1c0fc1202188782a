//! Candidate domains guessed from a company name.

/// Lowercase ASCII alphanumerics of `company_name`; spaces and punctuation
/// are dropped.
pub fn slug(company_name: &str) -> String {
    company_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `https://<slug><tld>` for each TLD, in order. Empty when the name has no
/// usable characters.
pub fn candidates(company_name: &str, tlds: &[String]) -> Vec<String> {
    let slug = slug(company_name);
    if slug.is_empty() {
        return Vec::new();
    }
    tlds.iter().map(|tld| format!("https://{slug}{tld}")).collect()
}
