/// LLM Client: the single point of entry for all vendor LLM calls in the job tracker.
///
/// ARCHITECTURAL RULE: No other module may call a vendor API directly.
/// All LLM interactions MUST go through `LlmClient::call`.
///
/// Each vendor sits behind the `LlmBackend` trait. `LlmClient` is a registry keyed by
/// `ProviderKind`; anything it cannot resolve goes to the configured default backend.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// The closed set of vendors the service knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "OpenAI")]
    OpenAi,
    Claude,
    Gemini,
}

impl ProviderKind {
    /// Exact, case-sensitive match on the wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OpenAI" => Some(Self::OpenAi),
            "Claude" => Some(Self::Claude),
            "Gemini" => Some(Self::Gemini),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied provider selector. Deserializes from any string and never fails:
/// unknown names are kept as `Unrecognized` and routed to the default backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ProviderChoice {
    Known(ProviderKind),
    Unrecognized(String),
}

impl From<String> for ProviderChoice {
    fn from(name: String) -> Self {
        match ProviderKind::from_name(&name) {
            Some(kind) => Self::Known(kind),
            None => Self::Unrecognized(name),
        }
    }
}

impl From<&str> for ProviderChoice {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl Default for ProviderChoice {
    fn default() -> Self {
        Self::Known(ProviderKind::Gemini)
    }
}

/// Caller-supplied vendor credential. Passed through per call, never stored or logged.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// What a backend receives for a single round trip.
#[derive(Debug)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub api_key: &'a ApiKey,
    pub model: &'a str,
    /// Ask for machine-parseable JSON using the vendor's native mode, if it has one.
    pub wants_json: bool,
}

/// The normalized call issued through `LlmClient::call`.
#[derive(Debug)]
pub struct ProviderRequest<'a> {
    pub prompt: &'a str,
    pub provider: &'a ProviderChoice,
    pub api_key: &'a ApiKey,
    pub model_name: &'a str,
    pub wants_json: bool,
}

/// One vendor protocol. Returns the raw text of the single top response candidate.
/// Errors propagate; swallowing them is the orchestrators' job.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError>;
}

/// The single LLM client used by all services in the job tracker.
#[derive(Clone)]
pub struct LlmClient {
    backends: HashMap<ProviderKind, Arc<dyn LlmBackend>>,
    default: Arc<dyn LlmBackend>,
}

impl LlmClient {
    /// Creates a client whose every provider resolves to `default` until more
    /// backends are registered.
    pub fn new(default: Arc<dyn LlmBackend>) -> Self {
        Self {
            backends: HashMap::new(),
            default,
        }
    }

    pub fn with_backend(mut self, kind: ProviderKind, backend: Arc<dyn LlmBackend>) -> Self {
        self.backends.insert(kind, backend);
        self
    }

    /// Registers the three vendor backends against their configured base URLs and
    /// makes `config.default_provider` the fallback for unrecognized selectors.
    pub fn from_config(config: &Config) -> Result<Self> {
        // No request timeout: a call waits for the vendor unless the caller imposes a deadline.
        let http = Client::builder().build()?;

        let openai: Arc<dyn LlmBackend> =
            Arc::new(OpenAiBackend::new(http.clone(), &config.openai_base_url));
        let claude: Arc<dyn LlmBackend> =
            Arc::new(AnthropicBackend::new(http.clone(), &config.anthropic_base_url));
        let gemini: Arc<dyn LlmBackend> =
            Arc::new(GeminiBackend::new(http, &config.gemini_base_url));

        let default = match config.default_provider {
            ProviderKind::OpenAi => openai.clone(),
            ProviderKind::Claude => claude.clone(),
            ProviderKind::Gemini => gemini.clone(),
        };

        Ok(Self::new(default)
            .with_backend(ProviderKind::OpenAi, openai)
            .with_backend(ProviderKind::Claude, claude)
            .with_backend(ProviderKind::Gemini, gemini))
    }

    /// Maps a selector to its backend. Never fails: unknown selectors get the default.
    pub fn resolve(&self, choice: &ProviderChoice) -> &Arc<dyn LlmBackend> {
        match choice {
            ProviderChoice::Known(kind) => self.backends.get(kind).unwrap_or(&self.default),
            ProviderChoice::Unrecognized(_) => &self.default,
        }
    }

    /// One synchronous round trip to the selected vendor. No retry, no streaming.
    pub async fn call(&self, request: &ProviderRequest<'_>) -> Result<String, LlmError> {
        let backend = self.resolve(request.provider);
        debug!(
            "LLM call: backend={}, model={}, wants_json={}",
            backend.name(),
            request.model_name,
            request.wants_json
        );

        backend
            .complete(&CompletionRequest {
                prompt: request.prompt,
                api_key: request.api_key,
                model: request.model_name,
                wants_json: request.wants_json,
            })
            .await
    }
}

#[derive(Debug, Deserialize)]
struct VendorError {
    error: VendorErrorBody,
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    message: String,
}

/// Turns a non-2xx response into `LlmError::Api`, using the vendor's
/// `{"error": {"message": ...}}` body when it parses.
async fn api_error(response: Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<VendorError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    LlmError::Api { status, message }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubBackend;
    use super::*;

    fn registry() -> (LlmClient, Arc<StubBackend>, Arc<StubBackend>, Arc<StubBackend>) {
        let openai = StubBackend::replying("openai", "from openai");
        let claude = StubBackend::replying("claude", "from claude");
        let gemini = StubBackend::replying("gemini", "from gemini");
        let client = LlmClient::new(gemini.clone())
            .with_backend(ProviderKind::OpenAi, openai.clone())
            .with_backend(ProviderKind::Claude, claude.clone())
            .with_backend(ProviderKind::Gemini, gemini.clone());
        (client, openai, claude, gemini)
    }

    #[test]
    fn test_provider_choice_known_names() {
        assert_eq!(
            ProviderChoice::from("OpenAI"),
            ProviderChoice::Known(ProviderKind::OpenAi)
        );
        assert_eq!(
            ProviderChoice::from("Claude"),
            ProviderChoice::Known(ProviderKind::Claude)
        );
        assert_eq!(
            ProviderChoice::from("Gemini"),
            ProviderChoice::Known(ProviderKind::Gemini)
        );
    }

    #[test]
    fn test_provider_choice_is_case_sensitive() {
        assert_eq!(
            ProviderChoice::from("openai"),
            ProviderChoice::Unrecognized("openai".to_string())
        );
    }

    #[test]
    fn test_provider_choice_deserializes_any_string() {
        let choice: ProviderChoice = serde_json::from_str(r#""Mistral""#).unwrap();
        assert_eq!(choice, ProviderChoice::Unrecognized("Mistral".to_string()));
        let choice: ProviderChoice = serde_json::from_str(r#""OpenAI""#).unwrap();
        assert_eq!(choice, ProviderChoice::Known(ProviderKind::OpenAi));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret-123");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.expose(), "sk-secret-123");
    }

    #[test]
    fn test_resolve_routes_known_providers() {
        let (client, ..) = registry();
        assert_eq!(client.resolve(&"OpenAI".into()).name(), "openai");
        assert_eq!(client.resolve(&"Claude".into()).name(), "claude");
        assert_eq!(client.resolve(&"Gemini".into()).name(), "gemini");
    }

    #[test]
    fn test_resolve_unknown_goes_to_default() {
        let (client, ..) = registry();
        for name in ["", "Gemni", "claude", "Llama"] {
            assert_eq!(client.resolve(&name.into()).name(), "gemini", "{name:?}");
        }
    }

    #[test]
    fn test_resolve_unregistered_known_kind_goes_to_default() {
        let fallback = StubBackend::replying("fallback", "x");
        let client = LlmClient::new(fallback);
        assert_eq!(client.resolve(&"OpenAI".into()).name(), "fallback");
    }

    #[tokio::test]
    async fn test_call_forwards_request_to_selected_backend() {
        let (client, openai, claude, gemini) = registry();
        let key = ApiKey::new("key123");

        let text = client
            .call(&ProviderRequest {
                prompt: "hello",
                provider: &"OpenAI".into(),
                api_key: &key,
                model_name: "gpt-4o",
                wants_json: true,
            })
            .await
            .unwrap();

        assert_eq!(text, "from openai");
        assert_eq!(openai.calls(), 1);
        assert_eq!(claude.calls(), 0);
        assert_eq!(gemini.calls(), 0);
        let seen = openai.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            (
                "hello".to_string(),
                "key123".to_string(),
                "gpt-4o".to_string(),
                true
            )
        );
    }

    #[tokio::test]
    async fn test_call_propagates_backend_error() {
        let failing = StubBackend::failing("gemini", 401, "bad key");
        let client = LlmClient::new(failing);
        let err = client
            .call(&ProviderRequest {
                prompt: "p",
                provider: &ProviderChoice::default(),
                api_key: &ApiKey::default(),
                model_name: "m",
                wants_json: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }));
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }
}
