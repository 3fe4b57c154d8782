use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentStore;
use crate::jobs::repository::JobRepository;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Built once in `main`; nothing in the service reaches for process-wide globals.
#[derive(Clone)]
pub struct AppState {
    /// Job records. Default: `PgJobRepository`.
    pub jobs: Arc<dyn JobRepository>,
    /// Uploaded CV and sample letter. Default: `S3DocumentStore`.
    pub documents: Arc<dyn DocumentStore>,
    pub llm: LlmClient,
    pub config: Config,
}
