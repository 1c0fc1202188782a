//! Hiring-signal detection from a company's careers page.
//!
//! Given a resolved domain, looks for a careers page, recognises the
//! applicant-tracking system (ATS) behind it, and counts technical role
//! mentions. The result is summarised as a tier:
//!
//! | Tier | Meaning |
//! |------|---------|
//! | `high` | ATS detected and at least 5 technical role mentions |
//! | `medium` | ATS detected or at least one technical role mention |
//! | `low` | A careers page exists but shows neither |
//! | `none` | No careers page found |
//! | `unknown` | No domain to look at |

use crate::http::WebClient;
use crate::models::HiringSignal;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

/// Paths tried, in order, under the company domain.
const CAREERS_PATHS: &[&str] = &["/careers", "/jobs", "/join-us"];

/// Hostname fragments that identify an ATS, with its display name.
const ATS_PROVIDERS: &[(&str, &str)] = &[
    ("greenhouse.io", "Greenhouse"),
    ("lever.co", "Lever"),
    ("ashbyhq.com", "Ashby"),
    ("workable.com", "Workable"),
    ("bamboohr.com", "BambooHR"),
    ("smartrecruiters.com", "SmartRecruiters"),
    ("recruitee.com", "Recruitee"),
];

const HIGH_TIER_TECH_ROLES: u32 = 5;

static TECH_ROLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(software engineers?|engineers?|developers?|devops|sres?|data scientists?|machine learning|ml engineers?|frontend|backend|full[- ]stack|architects?)\b",
    )
    .expect("static regex is valid")
});

/// Black-box hiring classifier consumed by the orchestrator.
pub trait HiringSignalDetector {
    async fn detect_hiring_signal(&self, domain: Option<&str>) -> HiringSignal;
}

/// [`HiringSignalDetector`] that inspects the company's own careers page.
#[derive(Debug)]
pub struct CareersPageDetector<'a, C> {
    client: &'a C,
}

impl<'a, C: WebClient> CareersPageDetector<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    async fn find_careers_page(&self, domain: &str) -> Option<(String, String)> {
        for path in CAREERS_PATHS {
            let url = format!("{}{}", domain.trim_end_matches('/'), path);
            match self.client.get(&url).await {
                Ok(page) if page.is_ok() => return Some((page.final_url, page.body)),
                Ok(page) => debug!(%url, status = page.status, "No careers page here"),
                Err(e) => debug!(%url, error = %e, "Careers page fetch failed"),
            }
        }
        None
    }
}

impl<'a, C: WebClient> HiringSignalDetector for CareersPageDetector<'a, C> {
    #[instrument(level = "info", skip(self))]
    async fn detect_hiring_signal(&self, domain: Option<&str>) -> HiringSignal {
        let Some(domain) = domain else {
            return HiringSignal {
                hiring_tier: "unknown".to_string(),
                details: "No domain resolved".to_string(),
                tech_roles: None,
                ats_provider: None,
                careers_url: None,
            };
        };

        let signal = match self.find_careers_page(domain).await {
            Some((careers_url, body)) => classify(&careers_url, &body),
            None => HiringSignal {
                hiring_tier: "none".to_string(),
                details: "No careers page found".to_string(),
                tech_roles: None,
                ats_provider: None,
                careers_url: None,
            },
        };
        info!(tier = %signal.hiring_tier, ats = ?signal.ats_provider, "Detected hiring signal");
        signal
    }
}

/// Name of the first ATS whose hostname appears in `body`.
pub fn detect_ats(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    ATS_PROVIDERS
        .iter()
        .find(|(host, _)| lower.contains(host))
        .map(|(_, name)| *name)
}

/// Number of technical role mentions in `body`.
pub fn count_tech_roles(body: &str) -> u32 {
    TECH_ROLE.find_iter(body).count() as u32
}

/// Turn a careers page into a tiered signal.
pub fn classify(careers_url: &str, body: &str) -> HiringSignal {
    let ats = detect_ats(body).or_else(|| detect_ats(careers_url));
    let tech_roles = count_tech_roles(body);

    let hiring_tier = match (ats.is_some(), tech_roles) {
        (true, n) if n >= HIGH_TIER_TECH_ROLES => "high",
        (true, _) => "medium",
        (false, n) if n > 0 => "medium",
        (false, _) => "low",
    };
    let details = match ats {
        Some(name) => format!("{name} careers page with {tech_roles} technical role mentions"),
        None => format!("Careers page with {tech_roles} technical role mentions"),
    };

    HiringSignal {
        hiring_tier: hiring_tier.to_string(),
        details,
        tech_roles: Some(tech_roles),
        ats_provider: ats.map(str::to_string),
        careers_url: Some(careers_url.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeWeb;

    #[test]
    fn test_detect_ats() {
        assert_eq!(detect_ats(r#"<a href="https://boards.greenhouse.io/acme">Jobs</a>"#), Some("Greenhouse"));
        assert_eq!(detect_ats("https://jobs.LEVER.co/acme"), Some("Lever"));
        assert_eq!(detect_ats("<p>Email us your CV</p>"), None);
    }

    #[test]
    fn test_count_tech_roles() {
        let body = "Senior Software Engineer, Backend Developer, Office Manager, DevOps lead";
        assert_eq!(count_tech_roles(body), 4);
        assert_eq!(count_tech_roles("Engineering culture"), 0);
        assert_eq!(count_tech_roles("We're hiring engineers and developers"), 2);
        assert_eq!(count_tech_roles("Data Scientists, Architects"), 2);
    }

    #[test]
    fn test_classify_tiers() {
        let many = "engineer ".repeat(6);
        let greenhouse = format!("greenhouse.io {many}");
        assert_eq!(classify("https://acme.io/careers", &greenhouse).hiring_tier, "high");
        assert_eq!(classify("https://acme.io/careers", "greenhouse.io").hiring_tier, "medium");
        assert_eq!(classify("https://acme.io/careers", "We need a developer").hiring_tier, "medium");
        assert_eq!(classify("https://acme.io/careers", "No openings").hiring_tier, "low");

        let via_url = classify("https://jobs.ashbyhq.com/acme", "No openings");
        assert_eq!(via_url.ats_provider.as_deref(), Some("Ashby"));
        assert_eq!(via_url.tech_roles, Some(0));
    }

    #[tokio::test]
    async fn test_detector_walks_paths() {
        let web = FakeWeb::new()
            .page("https://acme.io/careers", 404, "")
            .page("https://acme.io/jobs", 200, "Backend engineer at Acme via lever.co");
        let signal = CareersPageDetector::new(&web).detect_hiring_signal(Some("https://acme.io")).await;

        assert_eq!(signal.hiring_tier, "medium");
        assert_eq!(signal.ats_provider.as_deref(), Some("Lever"));
        assert_eq!(signal.careers_url.as_deref(), Some("https://acme.io/jobs"));
        assert!(!web.called("join-us"));
    }

    #[tokio::test]
    async fn test_detector_without_domain_or_page() {
        let web = FakeWeb::new();
        let detector = CareersPageDetector::new(&web);
        assert_eq!(detector.detect_hiring_signal(None).await.hiring_tier, "unknown");
        assert_eq!(detector.detect_hiring_signal(Some("https://acme.io")).await.hiring_tier, "none");
        assert_eq!(web.calls.borrow().len(), 3);
    }
}
