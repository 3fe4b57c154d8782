use anyhow::{anyhow, Context, Result};

use crate::llm_client::{anthropic, gemini, openai, ProviderKind};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
///
/// Vendor API keys are NOT configuration: callers send them with each request.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Backend used for provider names the service does not recognize.
    pub default_provider: ProviderKind,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            default_provider: parse_provider(&env_or("DEFAULT_LLM_PROVIDER", "Gemini"))?,
            openai_base_url: env_or("OPENAI_BASE_URL", openai::DEFAULT_BASE_URL),
            anthropic_base_url: env_or("ANTHROPIC_BASE_URL", anthropic::DEFAULT_BASE_URL),
            gemini_base_url: env_or("GEMINI_BASE_URL", gemini::DEFAULT_BASE_URL),
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// The default backend must be one the service actually has.
fn parse_provider(name: &str) -> Result<ProviderKind> {
    ProviderKind::from_name(name).ok_or_else(|| {
        anyhow!("DEFAULT_LLM_PROVIDER must be one of OpenAI, Claude, Gemini (got '{name}')")
    })
}
