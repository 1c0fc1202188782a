//! Pipeline configuration.
//!
//! All tunables live in one [`PipelineConfig`] that is constructed once in
//! `main`, validated, and passed down to each component. The file format is
//! YAML; every field has a default so a missing file simply means defaults.
//!
//! ```yaml
//! batch:
//!   days_back: 3
//!   max_items: 25
//! resolver:
//!   search_delay_ms: 1000
//!   guess_tlds: [".com", ".io", ".ai", ".co"]
//! storage:
//!   path: data/companies.json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Browser-like identification sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Errors raised while building the run's configuration or model context.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to load model configuration from {path}: {reason}")]
    ModelConfig { path: String, reason: String },

    #[error("failed to load chat template '{name}': {reason}")]
    Template { name: String, reason: String },

    #[error("model API key is missing from {path}")]
    MissingApiKey { path: String },
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub model: ModelSettings,
    pub feeds: FeedSettings,
    pub batch: BatchSettings,
    pub http: HttpSettings,
    pub resolver: ResolverSettings,
    pub storage: StorageSettings,
    pub sheet: SheetSettings,
}

/// Where the model client finds its credentials and chat template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path to the model client's `config.yaml`; `None` means the client's
    /// default config directory.
    pub config_path: Option<PathBuf>,
    /// Name of the chat template to load.
    pub template: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            config_path: None,
            template: "funding_parser".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// RSS 2.0 feeds polled for candidate articles.
    pub urls: Vec<String>,
    /// A headline must contain one of these (case-insensitive) to be kept.
    pub keywords: Vec<String>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://techcrunch.com/category/venture/feed/".to_string(),
                "https://www.finsmes.com/feed".to_string(),
                "https://venturebeat.com/category/business/feed/".to_string(),
            ],
            keywords: [
                "raises",
                "raised",
                "funding",
                "seed",
                "series a",
                "series b",
                "series c",
                "pre-seed",
                "investment",
                "backed",
                "secures",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

/// Cost/latency bounds for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub days_back: u32,
    pub max_items: usize,
    /// Article bodies are capped to this many characters before prompting.
    pub body_max_chars: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            days_back: 3,
            max_items: 25,
            body_max_chars: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Timeout for lightweight existence probes.
    pub probe_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
            probe_timeout_secs: 3,
        }
    }
}

impl HttpSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// HTML search endpoint; the query is appended as `?q=`.
    pub search_endpoint: String,
    /// Politeness delay applied before every search request.
    pub search_delay_ms: u64,
    /// Tried in order when guessing `<slug><tld>`.
    pub guess_tlds: Vec<String>,
    /// Hosts that are never a company's own site.
    pub aggregator_domains: Vec<String>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            search_endpoint: "https://duckduckgo.com/html/".to_string(),
            search_delay_ms: 1000,
            guess_tlds: [".com", ".io", ".ai", ".co"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            aggregator_domains: [
                "linkedin.com",
                "crunchbase.com",
                "pitchbook.com",
                "tracxn.com",
                "cbinsights.com",
                "wikipedia.org",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        }
    }
}

impl ResolverSettings {
    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/companies.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    pub spreadsheet_id: Option<String>,
    pub tab: String,
    /// Bearer token for the Sheets API. Usually supplied via the environment
    /// rather than written into the file.
    pub access_token: Option<String>,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            tab: "Sheet1".to_string(),
            access_token: None,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file, or defaults when `path` is `None`.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded pipeline configuration");
        Ok(config)
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.max_items == 0 {
            return Err(ConfigError::Invalid("batch.max_items must be at least 1".into()));
        }
        if self.batch.body_max_chars == 0 {
            return Err(ConfigError::Invalid("batch.body_max_chars must be at least 1".into()));
        }
        if self.http.request_timeout_secs == 0 || self.http.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http timeouts must be non-zero".into()));
        }
        if self.resolver.guess_tlds.is_empty() {
            return Err(ConfigError::Invalid("resolver.guess_tlds must not be empty".into()));
        }
        if let Some(tld) = self.resolver.guess_tlds.iter().find(|t| !t.starts_with('.')) {
            return Err(ConfigError::Invalid(format!(
                "resolver.guess_tlds entry '{tld}' must start with '.'"
            )));
        }
        Ok(())
    }
}
