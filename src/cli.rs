//! Command-line interface definitions for Startup Signal.
//!
//! Every flag is optional; values given here override the configuration file.
//! Sheet credentials can also come from the environment.

use crate::config::PipelineConfig;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Startup Signal pipeline.
///
/// # Examples
///
/// ```sh
/// # Defaults, no publishing
/// startup_signal
///
/// # Custom config, wider window, publish to a sheet
/// startup_signal -c signal.yaml --days-back 7 --sheet-id 1AbC... --sheets-token ya29...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to the pipeline config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Only consider feed items published within this many days
    #[arg(short, long)]
    pub days_back: Option<u32>,

    /// Maximum number of articles to enrich in one run
    #[arg(short, long)]
    pub max_items: Option<usize>,

    /// Number of enriched companies to print at the end
    #[arg(long, default_value_t = 10)]
    pub max_preview: usize,

    /// Google spreadsheet id to publish into
    #[arg(long, env = "SHEET_ID")]
    pub sheet_id: Option<String>,

    /// OAuth access token for the Google Sheets API
    #[arg(long, env = "GOOGLE_SHEETS_TOKEN", hide_env_values = true)]
    pub sheets_token: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(days_back) = self.days_back {
            config.batch.days_back = days_back;
        }
        if let Some(max_items) = self.max_items {
            config.batch.max_items = max_items;
        }
        if let Some(sheet_id) = &self.sheet_id {
            config.sheet.spreadsheet_id = Some(sheet_id.clone());
        }
        if let Some(token) = &self.sheets_token {
            config.sheet.access_token = Some(token.clone());
        }
    }
}
