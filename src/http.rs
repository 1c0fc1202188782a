//! Outbound HTTP for fetching, searching and probing.
//!
//! Every network-touching component talks to the web through the
//! [`WebClient`] trait so the resolution and fetching logic can be exercised
//! against in-memory fakes. [`ReqwestWebClient`] is the production
//! implementation: one shared `reqwest::Client` carrying the browser-like
//! `User-Agent`, a default request timeout and redirect following.

use crate::config::HttpSettings;
use reqwest::Client;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Maximum number of redirects followed by any request.
const MAX_REDIRECTS: usize = 10;

/// A fetched page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Result of a lightweight existence probe.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
}

impl Probe {
    /// Any non-error HTTP response counts as "the site exists".
    pub fn is_reachable(&self) -> bool {
        self.status < 400
    }
}

/// Minimal async HTTP surface used by the pipeline.
pub trait WebClient {
    /// `GET` a page and return its status, final URL and body text.
    async fn get(&self, url: &str) -> Result<Page, Box<dyn Error>>;

    /// `HEAD` a URL with its own short timeout, following redirects.
    async fn head(&self, url: &str, timeout: Duration) -> Result<Probe, Box<dyn Error>>;
}

/// [`WebClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestWebClient {
    client: Client,
}

impl ReqwestWebClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self { client })
    }
}

impl WebClient for ReqwestWebClient {
    #[instrument(level = "debug", skip(self))]
    async fn get(&self, url: &str) -> Result<Page, Box<dyn Error>> {
        let t0 = Instant::now();
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "GET complete"
        );
        Ok(Page {
            status,
            final_url,
            body,
        })
    }

    #[instrument(level = "debug", skip(self))]
    async fn head(&self, url: &str, timeout: Duration) -> Result<Probe, Box<dyn Error>> {
        let resp = self.client.head(url).timeout(timeout).send().await?;
        let probe = Probe {
            status: resp.status().as_u16(),
            final_url: resp.url().to_string(),
        };
        debug!(status = probe.status, final_url = %probe.final_url, "HEAD complete");
        Ok(probe)
    }
}

/// In-memory [`WebClient`] for tests.
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages and probes; anything unregistered is a network
    /// error. Every requested URL is recorded in order.
    #[derive(Debug, Default)]
    pub struct FakeWeb {
        pages: HashMap<String, Page>,
        probes: HashMap<String, Probe>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeWeb {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages.insert(
                url.to_string(),
                Page {
                    status,
                    final_url: url.to_string(),
                    body: body.to_string(),
                },
            );
            self
        }

        pub fn probe(self, url: &str, status: u16) -> Self {
            self.probe_redirect(url, status, url)
        }

        pub fn probe_redirect(mut self, url: &str, status: u16, final_url: &str) -> Self {
            self.probes.insert(
                url.to_string(),
                Probe {
                    status,
                    final_url: final_url.to_string(),
                },
            );
            self
        }

        pub fn called(&self, needle: &str) -> bool {
            self.calls.borrow().iter().any(|url| url.contains(needle))
        }
    }

    impl WebClient for FakeWeb {
        async fn get(&self, url: &str) -> Result<Page, Box<dyn Error>> {
            self.calls.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| format!("connection refused: {url}").into())
        }

        async fn head(&self, url: &str, _timeout: Duration) -> Result<Probe, Box<dyn Error>> {
            self.calls.borrow_mut().push(url.to_string());
            self.probes
                .get(url)
                .cloned()
                .ok_or_else(|| format!("dns error: {url}").into())
        }
    }
}
