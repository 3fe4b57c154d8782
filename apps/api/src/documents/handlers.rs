use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;

use crate::documents::{extract_text, DocumentKind};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub characters: usize,
}

#[derive(Debug, Serialize)]
pub struct CvStatusResponse {
    pub has_cv: bool,
}

#[derive(Debug, Serialize)]
pub struct SampleStatusResponse {
    pub has_sample: bool,
}

/// Reads the `file` field of a multipart upload, extracts its text and stores it.
async fn store_upload(
    state: &AppState,
    kind: DocumentKind,
    mut multipart: Multipart,
) -> Result<UploadResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;

        let text = extract_text(file_name.as_deref(), content_type.as_deref(), &data)?;
        state.documents.put(kind, &text).await?;

        return Ok(UploadResponse {
            message: format!("{} uploaded successfully", kind.label()),
            characters: text.chars().count(),
        });
    }

    Err(AppError::Validation(
        "multipart field 'file' is required".to_string(),
    ))
}

/// POST /cv/upload
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    Ok(Json(store_upload(&state, DocumentKind::Cv, multipart).await?))
}

/// GET /cv/status
pub async fn handle_cv_status(
    State(state): State<AppState>,
) -> Result<Json<CvStatusResponse>, AppError> {
    let has_cv = state.documents.exists(DocumentKind::Cv).await?;
    Ok(Json(CvStatusResponse { has_cv }))
}

/// POST /sample/upload
pub async fn handle_upload_sample(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    Ok(Json(
        store_upload(&state, DocumentKind::SampleLetter, multipart).await?,
    ))
}

/// GET /sample/status
pub async fn handle_sample_status(
    State(state): State<AppState>,
) -> Result<Json<SampleStatusResponse>, AppError> {
    let has_sample = state.documents.exists(DocumentKind::SampleLetter).await?;
    Ok(Json(SampleStatusResponse { has_sample }))
}
