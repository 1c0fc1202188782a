//! Persistence of enriched companies.
//!
//! Records are stored in a single JSON object keyed by company identity, so
//! re-running a batch over the same articles replaces rather than duplicates.
//!
//! # File Layout
//!
//! ```text
//! data/companies.json
//! {
//!   "acme": { "company_name": "Acme", "domain": "https://acme.io", ... },
//!   "foo robotics": { ... }
//! }
//! ```

use crate::models::EnrichedCompany;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Storage collaborator consumed by the orchestrator.
pub trait CompanyStore {
    /// Prepare the backing store; safe to call more than once.
    async fn init_db(&self) -> Result<(), Box<dyn Error>>;

    /// Insert or replace the record for this company.
    async fn upsert_company(&self, record: &EnrichedCompany) -> Result<(), Box<dyn Error>>;
}

/// [`CompanyStore`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonCompanyStore {
    path: PathBuf,
}

impl JsonCompanyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every stored record, keyed by identity.
    pub async fn load_all(&self) -> Result<BTreeMap<String, EnrichedCompany>, Box<dyn Error>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    async fn write_all(&self, records: &BTreeMap<String, EnrichedCompany>) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl CompanyStore for JsonCompanyStore {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    async fn init_db(&self) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        if fs::try_exists(&self.path).await? {
            let existing = self.load_all().await?;
            info!(records = existing.len(), "Opened company store");
        } else {
            self.write_all(&BTreeMap::new()).await?;
            info!("Created empty company store");
        }
        Ok(())
    }

    #[instrument(level = "info", skip_all, fields(company = %record.company_name))]
    async fn upsert_company(&self, record: &EnrichedCompany) -> Result<(), Box<dyn Error>> {
        let mut records = self.load_all().await?;
        let replaced = records.insert(record.identity(), record.clone()).is_some();
        self.write_all(&records).await?;
        info!(replaced, total = records.len(), "Upserted company");
        Ok(())
    }
}
