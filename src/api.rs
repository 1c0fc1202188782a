//! Language-model API interaction.
//!
//! The model is treated as an untrusted text generator: this module only
//! sends a prompt and hands back whatever text comes out. Turning that text
//! into structured data is the extraction engine's job.
//!
//! # Architecture
//!
//! - [`AskModel`]: Core trait defining one-shot async model interaction
//! - [`AwfulModel`]: Wraps the `awful_aj` library's `ask` function
//! - [`ModelContext`]: Credentials and chat template, loaded and validated
//!   once per run before any article is processed
//!
//! There is no retry layer: a failed call drops the article.

use crate::config::{ConfigError, ModelSettings};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Trait for one-shot async model interaction.
///
/// Implementors send a fully-built prompt to a model and return its raw text
/// response.
pub trait AskModel {
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// Validated model credentials and chat template for one run.
pub struct ModelContext {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelContext").finish_non_exhaustive()
    }
}

impl ModelContext {
    /// Load the model configuration and template, failing fast when the API
    /// key is absent.
    #[instrument(level = "info", skip_all, fields(template = %settings.template))]
    pub async fn load(settings: &ModelSettings) -> Result<Self, ConfigError> {
        let config_path = match &settings.config_path {
            Some(path) => path.clone(),
            None => awful_aj::config_dir()
                .map_err(|e| ConfigError::ModelConfig {
                    path: "<config dir>".to_string(),
                    reason: e.to_string(),
                })?
                .join("config.yaml"),
        };
        let path = config_path.display().to_string();

        let config = awful_aj::config::load_config(&path).map_err(|e| ConfigError::ModelConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        require_api_key(&config.api_key, &path)?;

        let template = awful_aj::template::load_template(&settings.template)
            .await
            .map_err(|e| ConfigError::Template {
                name: settings.template.clone(),
                reason: e.to_string(),
            })?;

        info!(config_path = %path, "Loaded model configuration");
        Ok(Self { config, template })
    }

    pub fn model(&self) -> AwfulModel<'_> {
        AwfulModel {
            config: &self.config,
            template: &self.template,
        }
    }
}

/// Reject a blank API key before any article is processed.
pub fn require_api_key(api_key: &str, config_path: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey {
            path: config_path.to_string(),
        });
    }
    Ok(())
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskModel`].
pub struct AwfulModel<'a> {
    /// Reference to the model configuration (API key, endpoint, model name).
    pub config: &'a AwfulJadeConfig,
    /// Reference to the chat template defining the conversation structure.
    pub template: &'a ChatTemplate,
}

impl fmt::Debug for AwfulModel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwfulModel").finish_non_exhaustive()
    }
}

impl<'a> AskModel for AwfulModel<'a> {
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, prompt.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(text) => info!(
                elapsed_ms = dt.as_millis() as u128,
                bytes = text.len(),
                "Model call succeeded"
            ),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "Model call failed"),
        }
        res
    }
}
