pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::documents::handlers as documents;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

/// Paths match the ones the web client calls; the job collection answers with and
/// without the trailing slash.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/jobs/",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/jobs/:id", delete(jobs::handle_delete_job))
        .route("/jobs/:id/status", put(jobs::handle_update_status))
        .route("/jobs/:id/details", put(jobs::handle_update_details))
        // Documents API
        .route("/cv/upload", post(documents::handle_upload_cv))
        .route("/cv/status", get(documents::handle_cv_status))
        .route("/sample/upload", post(documents::handle_upload_sample))
        .route("/sample/status", get(documents::handle_sample_status))
        // Letters API
        .route("/generate/letter", post(jobs::handle_generate_letter))
        .route("/export/letter", post(jobs::handle_export_letter))
        .with_state(state)
}
