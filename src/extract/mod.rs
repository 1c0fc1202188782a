//! Extraction engine: article text in, structured funding record out.
//!
//! One model call per article, followed by the deterministic repair passes in
//! [`repair`]. Model failures and unparseable output both become
//! [`ExtractionOutcome::Failed`]; neither is ever raised to the caller.
//!
//! # Submodules
//!
//! - [`prompt`]: The fixed instruction contract
//! - [`repair`]: Fence stripping, brace balancing and trailing-comma removal

pub mod prompt;
pub mod repair;

use crate::api::AskModel;
use crate::models::FundingRecord;
use prompt::build_prompt;
use repair::{Repair, repair_json};
use tracing::{info, instrument, warn};

/// Prompts shorter than this almost certainly carry an empty article body.
const SUSPICIOUS_PROMPT_LEN: usize = 200;

/// Result of extracting one article.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    /// The model's output parsed without help.
    Parsed(FundingRecord),
    /// The output needed one or more repair passes.
    Repaired(FundingRecord),
    /// The model call failed or its output was unrecoverable.
    Failed,
}

impl ExtractionOutcome {
    pub fn into_record(self) -> Option<FundingRecord> {
        match self {
            ExtractionOutcome::Parsed(record) | ExtractionOutcome::Repaired(record) => Some(record),
            ExtractionOutcome::Failed => None,
        }
    }
}

/// Turn raw model output into an outcome.
pub fn interpret_output(raw: &str) -> ExtractionOutcome {
    match repair_json(raw) {
        Repair::Clean(map) => ExtractionOutcome::Parsed(FundingRecord::from_json_object(&map)),
        Repair::Repaired(map) => ExtractionOutcome::Repaired(FundingRecord::from_json_object(&map)),
        Repair::Failed => ExtractionOutcome::Failed,
    }
}

/// Extracts funding records through a model.
#[derive(Debug)]
pub struct Extractor<M> {
    model: M,
}

impl<M: AskModel> Extractor<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Extract a funding record from an article's title and body.
    ///
    /// A parsed record may still lack a `company_name`; filtering those is
    /// the caller's job.
    #[instrument(level = "info", skip_all, fields(%title))]
    pub async fn extract(&self, title: &str, body: &str) -> ExtractionOutcome {
        let prompt = build_prompt(title, body);
        if body.trim().is_empty() || prompt.len() < SUSPICIOUS_PROMPT_LEN {
            warn!(prompt_len = prompt.len(), "Prompt looks too short; article body is likely empty");
        }

        let raw = match self.model.ask(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Model call failed; no record extracted");
                return ExtractionOutcome::Failed;
            }
        };

        let outcome = interpret_output(&raw);
        match &outcome {
            ExtractionOutcome::Parsed(_) => info!("Extracted record"),
            ExtractionOutcome::Repaired(_) => info!("Extracted record after repair"),
            ExtractionOutcome::Failed => warn!("Model output could not be repaired"),
        }
        outcome
    }
}
