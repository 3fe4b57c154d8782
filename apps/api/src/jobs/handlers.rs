//! Axum route handlers for the Jobs and Letters API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assistant::analysis::{analyze, AnalysisRequest, AnalysisStatus};
use crate::assistant::letter::{generate_letter, LetterLanguage, LetterRequest, LetterStatus};
use crate::assistant::ModelSelection;
use crate::documents::export::export_letter;
use crate::documents::DocumentKind;
use crate::errors::AppError;
use crate::models::job::{JobRow, JobStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub link: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub selection: ModelSelection,
}

/// The stored job at the top level, as the web client reads it, plus how the
/// analysis went.
#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    #[serde(flatten)]
    pub job: JobRow,
    pub analysis: AnalysisStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDetailsRequest {
    pub title: String,
    pub company: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteJobResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateLetterRequest {
    pub job_id: i32,
    pub language: LetterLanguage,
    #[serde(default)]
    pub draft: String,
    #[serde(flatten)]
    pub selection: ModelSelection,
}

#[derive(Debug, Serialize)]
pub struct GenerateLetterResponse {
    pub letter: String,
    pub status: LetterStatus,
}

#[derive(Debug, Deserialize)]
pub struct ExportLetterRequest {
    pub letter_text: String,
    #[serde(default)]
    pub company_name: String,
    pub download_path: String,
}

#[derive(Debug, Serialize)]
pub struct ExportLetterResponse {
    pub saved_path: String,
}

fn job_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /jobs/
///
/// Reads the stored CV (empty if none was uploaded, so title and company are still
/// extracted), stores the posting with placeholder title/company, analyzes it and
/// persists the analysis. The CV is read before the insert so a storage error leaves
/// no placeholder row behind. A failed analysis still yields 200 with the fallback
/// record; `analysis` tells the caller which case it got.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<Json<CreateJobResponse>, AppError> {
    let cv_text = state.documents.get_or_empty(DocumentKind::Cv).await?;

    let job = state
        .jobs
        .insert_placeholder(request.description.as_deref(), request.link.as_deref())
        .await?;
    info!("Job {} created, analyzing...", job.id);

    let outcome = analyze(
        &state.llm,
        AnalysisRequest {
            job_description: request.description.as_deref().unwrap_or_default(),
            cv_text: &cv_text,
            link: request.link.as_deref().unwrap_or_default(),
            selection: &request.selection,
        },
    )
    .await;

    let job = state
        .jobs
        .apply_analysis(job.id, &outcome.result)
        .await?
        .ok_or_else(|| job_not_found(job.id))?;

    Ok(Json(CreateJobResponse {
        job,
        analysis: outcome.status,
    }))
}

/// GET /jobs/
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobRow>>, AppError> {
    Ok(Json(state.jobs.list_jobs().await?))
}

/// DELETE /jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteJobResponse>, AppError> {
    if !state.jobs.delete_job(id).await? {
        return Err(job_not_found(id));
    }
    Ok(Json(DeleteJobResponse {
        message: "Job deleted".to_string(),
    }))
}

/// PUT /jobs/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<JobRow>, AppError> {
    let job = state
        .jobs
        .update_status(id, request.status)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(job))
}

/// PUT /jobs/:id/details
///
/// Manual correction of the extracted title and company.
pub async fn handle_update_details(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDetailsRequest>,
) -> Result<Json<JobRow>, AppError> {
    let job = state
        .jobs
        .update_details(id, &request.title, &request.company)
        .await?
        .ok_or_else(|| job_not_found(id))?;
    Ok(Json(job))
}

/// POST /generate/letter
///
/// Requires an uploaded CV. Uses the sample letter, if one was uploaded, as the style
/// and contact-details source. A generated letter is also saved on the job.
pub async fn handle_generate_letter(
    State(state): State<AppState>,
    Json(request): Json<GenerateLetterRequest>,
) -> Result<Json<GenerateLetterResponse>, AppError> {
    let job = state
        .jobs
        .get_job(request.job_id)
        .await?
        .ok_or_else(|| job_not_found(request.job_id))?;

    let cv_text = state.documents.get_or_empty(DocumentKind::Cv).await?;
    if cv_text.trim().is_empty() {
        return Err(AppError::Validation("Please upload a CV first".to_string()));
    }
    let sample_letter = state
        .documents
        .get_or_empty(DocumentKind::SampleLetter)
        .await?;

    let outcome = generate_letter(
        &state.llm,
        LetterRequest {
            job_description: job.description.as_deref().unwrap_or_default(),
            cv_text: &cv_text,
            language: request.language,
            draft: &request.draft,
            sample_letter: &sample_letter,
            selection: &request.selection,
        },
    )
    .await;

    if outcome.is_generated() {
        state.jobs.save_letter(job.id, &outcome.result.text).await?;
    }

    Ok(Json(GenerateLetterResponse {
        letter: outcome.result.text,
        status: outcome.status,
    }))
}

/// POST /export/letter
pub async fn handle_export_letter(
    Json(request): Json<ExportLetterRequest>,
) -> Result<Json<ExportLetterResponse>, AppError> {
    let path = export_letter(
        &request.letter_text,
        &request.company_name,
        &request.download_path,
    )
    .await?;
    Ok(Json(ExportLetterResponse {
        saved_path: path.display().to_string(),
    }))
}
