//! Motivation letter generation.
//!
//! The plain-text and single-language rules are enforced only through the prompt;
//! the model's text is returned verbatim.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assistant::prompts::{letter_prompt, LetterPromptInput};
use crate::assistant::ModelSelection;
use crate::llm_client::{LlmClient, ProviderRequest};

/// Returned in place of a letter whenever the provider call fails.
pub const GENERATION_FAILED: &str = "Generation failed.";

/// Target language of a letter. Only "EN" selects English; every other code,
/// including an empty or misspelled one, selects German.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LetterLanguage {
    English,
    German,
}

impl LetterLanguage {
    pub fn from_code(code: &str) -> Self {
        match code {
            "EN" => Self::English,
            _ => Self::German,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "EN",
            Self::German => "DE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::German => "German",
        }
    }
}

impl From<String> for LetterLanguage {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<LetterLanguage> for String {
    fn from(language: LetterLanguage) -> Self {
        language.code().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterResult {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LetterStatus {
    Generated,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterOutcome {
    pub result: LetterResult,
    pub status: LetterStatus,
}

impl LetterOutcome {
    pub fn is_generated(&self) -> bool {
        self.status == LetterStatus::Generated
    }
}

/// Parameters for one letter generation call.
#[derive(Debug)]
pub struct LetterRequest<'a> {
    pub job_description: &'a str,
    pub cv_text: &'a str,
    pub language: LetterLanguage,
    pub draft: &'a str,
    pub sample_letter: &'a str,
    pub selection: &'a ModelSelection,
}

/// Generates a motivation letter. Never returns an error.
pub async fn generate_letter(llm: &LlmClient, request: LetterRequest<'_>) -> LetterOutcome {
    let prompt = letter_prompt(&LetterPromptInput {
        job_description: request.job_description,
        cv_text: request.cv_text,
        language: request.language,
        draft: request.draft,
        sample_letter: request.sample_letter,
    });
    let selection = request.selection;

    match llm
        .call(&ProviderRequest {
            prompt: &prompt,
            provider: &selection.provider,
            api_key: &selection.api_key,
            model_name: &selection.model_name,
            wants_json: false,
        })
        .await
    {
        Ok(text) => {
            info!(
                "Letter generated in {} ({} chars)",
                request.language.display_name(),
                text.len()
            );
            LetterOutcome {
                result: LetterResult { text },
                status: LetterStatus::Generated,
            }
        }
        Err(e) => {
            warn!(
                "Letter generation via {} failed: {e}",
                llm.resolve(&selection.provider).name()
            );
            LetterOutcome {
                result: LetterResult {
                    text: GENERATION_FAILED.to_string(),
                },
                status: LetterStatus::Failed {
                    reason: e.to_string(),
                },
            }
        }
    }
}
