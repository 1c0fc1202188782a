//! Publishing finalized companies to a Google Sheet.
//!
//! Rows are appended through the Sheets v4 REST API. The first publish into an
//! empty sheet writes a fixed 14-column header. Publishing is best-effort:
//! an empty batch, missing credentials, or a failing remote service are all
//! logged, never raised.
//!
//! # Columns
//!
//! | Column | Source |
//! |--------|--------|
//! | Company | `company_name` |
//! | Domain | resolved `domain`, else the extracted `website_url` |
//! | Amount (USD) | `amount_raised_usd` |
//! | Round | `funding_round` |
//! | Investors | `investors` joined with `, ` |
//! | Lead Investor | `lead_investor` |
//! | Country | `headquarter_country` |
//! | Date Announced | date part of `published_at` |
//! | Hiring Tier | `hiring_tier` |
//! | Tech Roles | `tech_roles` |
//! | ATS Provider | `ats_provider` |
//! | Careers URL | `careers_url` |
//! | Source URL | article `url` |
//! | Last Updated | UTC time of publishing |

use crate::models::EnrichedCompany;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::error::Error;
use tracing::{error, info, instrument, warn};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

pub const SHEET_HEADERS: [&str; 14] = [
    "Company",
    "Domain",
    "Amount (USD)",
    "Round",
    "Investors",
    "Lead Investor",
    "Country",
    "Date Announced",
    "Hiring Tier",
    "Tech Roles",
    "ATS Provider",
    "Careers URL",
    "Source URL",
    "Last Updated",
];

/// Publishing collaborator consumed at the end of a run.
pub trait SheetPublisher {
    async fn save_to_sheet(&self, records: &[EnrichedCompany]);
}

fn text(value: Option<&str>) -> Value {
    Value::String(value.unwrap_or_default().to_string())
}

/// One sheet row for `record`, in [`SHEET_HEADERS`] order.
pub fn to_row(record: &EnrichedCompany, now: DateTime<Utc>) -> Vec<Value> {
    vec![
        Value::String(record.company_name.clone()),
        text(record.domain.as_deref().or(record.website_url.as_deref())),
        record.amount_raised_usd.map_or_else(|| text(None), Value::from),
        text(record.funding_round.as_deref()),
        Value::String(record.investors.join(", ")),
        text(record.lead_investor.as_deref()),
        text(record.headquarter_country.as_deref()),
        Value::String(
            record
                .published_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        ),
        text(record.hiring_tier.as_deref()),
        record.tech_roles.map_or_else(|| text(None), Value::from),
        text(record.ats_provider.as_deref()),
        text(record.careers_url.as_deref()),
        Value::String(record.url.clone()),
        Value::String(now.format("%Y-%m-%d %H:%M:%S").to_string()),
    ]
}

/// Body of a Sheets `values` read.
#[derive(Debug, Default, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// Authorized JSON calls against the Sheets v4 `values` endpoints.
pub trait SheetsClient {
    /// `GET` a range; non-2xx statuses are errors.
    async fn read_range(&self, url: &str, token: &str) -> Result<ValueRange, Box<dyn Error>>;

    /// `POST` rows to a range's `:append` URL; non-2xx statuses are errors.
    async fn append_rows(&self, url: &str, token: &str, rows: Vec<Vec<Value>>) -> Result<(), Box<dyn Error>>;
}

impl SheetsClient for Client {
    async fn read_range(&self, url: &str, token: &str) -> Result<ValueRange, Box<dyn Error>> {
        let range = self
            .get(url)
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(range)
    }

    async fn append_rows(&self, url: &str, token: &str, rows: Vec<Vec<Value>>) -> Result<(), Box<dyn Error>> {
        self.post(url)
            .query(&[("valueInputOption", "USER_ENTERED"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(token)
            .json(&json!({ "values": rows }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// [`SheetPublisher`] for the Google Sheets REST API.
#[derive(Debug, Clone)]
pub struct GoogleSheetsPublisher<T = Client> {
    client: T,
    spreadsheet_id: Option<String>,
    tab: String,
    access_token: Option<String>,
}

impl<T: SheetsClient> GoogleSheetsPublisher<T> {
    pub fn new(
        client: T,
        spreadsheet_id: Option<String>,
        tab: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            spreadsheet_id,
            tab: tab.into(),
            access_token,
        }
    }

    fn range_url(&self, spreadsheet_id: &str, range: &str) -> String {
        let range = format!("{}!{}", self.tab, range);
        format!(
            "{}/{}/values/{}",
            SHEETS_API,
            spreadsheet_id,
            urlencoding::encode(&range)
        )
    }

    /// Write the header row if the sheet's first row is empty.
    async fn ensure_header(&self, spreadsheet_id: &str, token: &str) -> Result<(), Box<dyn Error>> {
        let existing = self
            .client
            .read_range(&self.range_url(spreadsheet_id, "A1:N1"), token)
            .await?;
        if existing.values.iter().any(|row| !row.is_empty()) {
            return Ok(());
        }

        let header: Vec<Value> = SHEET_HEADERS.iter().map(|h| Value::from(*h)).collect();
        self.append(spreadsheet_id, token, vec![header]).await?;
        info!("Wrote sheet header row");
        Ok(())
    }

    async fn append(&self, spreadsheet_id: &str, token: &str, rows: Vec<Vec<Value>>) -> Result<(), Box<dyn Error>> {
        let url = format!("{}:append", self.range_url(spreadsheet_id, "A1"));
        self.client.append_rows(&url, token, rows).await
    }
}

impl<T: SheetsClient> SheetPublisher for GoogleSheetsPublisher<T> {
    #[instrument(level = "info", skip_all, fields(count = records.len()))]
    async fn save_to_sheet(&self, records: &[EnrichedCompany]) {
        if records.is_empty() {
            info!("Nothing to publish (empty dataset)");
            return;
        }
        let (Some(spreadsheet_id), Some(token)) = (self.spreadsheet_id.as_deref(), self.access_token.as_deref()) else {
            warn!("Sheet id or access token missing; skipping publish");
            return;
        };

        if let Err(e) = self.ensure_header(spreadsheet_id, token).await {
            error!(error = %e, "Failed to prepare sheet");
            return;
        }

        let now = Utc::now();
        let rows: Vec<Vec<Value>> = records.iter().map(|r| to_row(r, now)).collect();
        match self.append(spreadsheet_id, token, rows).await {
            Ok(()) => info!(rows = records.len(), "Published to sheet"),
            Err(e) => error!(error = %e, "Failed to publish to sheet"),
        }
    }
}
