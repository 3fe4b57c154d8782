//! Résumé and sample-letter storage.
//!
//! The service keeps exactly one résumé and one sample letter. Uploads are reduced to
//! plain text (PDFs via `pdf-extract`) and stored under fixed keys. Handlers use the
//! `DocumentStore` trait; `S3DocumentStore` keeps the texts in S3/MinIO.

pub mod export;
pub mod handlers;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("S3 error: {0}")]
    S3(String),

    #[error("uploaded file is empty")]
    Empty,

    #[error("uploaded file is not valid UTF-8 text")]
    NotUtf8,

    #[error("could not extract text from PDF: {0}")]
    Extraction(String),
}

/// The two stored documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Cv,
    SampleLetter,
}

impl DocumentKind {
    pub fn key(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "documents/cv.txt",
            DocumentKind::SampleLetter => "documents/sample.txt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "CV",
            DocumentKind::SampleLetter => "Sample letter",
        }
    }
}

/// Storage for the extracted document texts. Carried in `AppState` as
/// `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replaces the stored document with `text`.
    async fn put(&self, kind: DocumentKind, text: &str) -> Result<(), DocumentError>;

    /// Returns the stored text, or `None` if nothing was uploaded yet.
    async fn get(&self, kind: DocumentKind) -> Result<Option<String>, DocumentError>;

    async fn exists(&self, kind: DocumentKind) -> Result<bool, DocumentError>;

    /// Returns the stored text, or an empty string if nothing was uploaded yet.
    async fn get_or_empty(&self, kind: DocumentKind) -> Result<String, DocumentError> {
        Ok(self.get(kind).await?.unwrap_or_default())
    }
}

/// Thin wrapper over an S3 bucket holding the extracted document texts.
#[derive(Clone)]
pub struct S3DocumentStore {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(s3: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn put(&self, kind: DocumentKind, text: &str) -> Result<(), DocumentError> {
        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(kind.key())
            .content_type("text/plain; charset=utf-8")
            .body(ByteStream::from(text.as_bytes().to_vec()))
            .send()
            .await
            .map_err(|e| DocumentError::S3(DisplayErrorContext(&e).to_string()))?;

        info!("{} stored ({} chars)", kind.label(), text.chars().count());
        Ok(())
    }

    async fn get(&self, kind: DocumentKind) -> Result<Option<String>, DocumentError> {
        let output = match self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(kind.key())
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => {
                return Ok(None)
            }
            Err(e) => return Err(DocumentError::S3(DisplayErrorContext(&e).to_string())),
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| DocumentError::S3(e.to_string()))?
            .into_bytes();

        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|_| DocumentError::NotUtf8)
    }

    async fn exists(&self, kind: DocumentKind) -> Result<bool, DocumentError> {
        match self
            .s3
            .head_object()
            .bucket(&self.bucket)
            .key(kind.key())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(DocumentError::S3(DisplayErrorContext(&e).to_string())),
        }
    }
}

/// Whether an upload should go through PDF text extraction.
fn is_pdf(file_name: Option<&str>, content_type: Option<&str>, data: &[u8]) -> bool {
    content_type == Some("application/pdf")
        || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
        || data.starts_with(b"%PDF-")
}

/// Reduces an uploaded file to plain text.
pub fn extract_text(
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Result<String, DocumentError> {
    if data.is_empty() {
        return Err(DocumentError::Empty);
    }

    if is_pdf(file_name, content_type, data) {
        return pdf_extract::extract_text_from_mem(data)
            .map_err(|e| DocumentError::Extraction(e.to_string()));
    }

    let text = std::str::from_utf8(data).map_err(|_| DocumentError::NotUtf8)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}
