// Job-application assistant: analysis of postings against the résumé and
// motivation-letter generation. Every entry point is total; vendor failures
// come back as fallback values with a status, never as errors.
// All LLM calls go through llm_client.

pub mod analysis;
pub mod letter;
pub mod prompts;

use serde::Deserialize;

use crate::llm_client::{ApiKey, ProviderChoice};

pub const DEFAULT_MODEL_NAME: &str = "gemini-1.5-pro";

/// Which vendor, credential and model a single request should use.
/// Flattened into HTTP request bodies; defaults match the web client.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSelection {
    #[serde(default)]
    pub provider: ProviderChoice,
    #[serde(default)]
    pub api_key: ApiKey,
    #[serde(default = "default_model_name")]
    pub model_name: String,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::default(),
            api_key: ApiKey::default(),
            model_name: default_model_name(),
        }
    }
}
