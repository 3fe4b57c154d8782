//! Writes a finished letter as a Word document into a directory on the server's
//! filesystem.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use docx_rs::{BreakType, Docx, Paragraph, Run};
use tracing::info;

use crate::assistant::prompts::UNKNOWN;
use crate::errors::AppError;

/// Keeps ASCII letters, digits, `_` and `-`; everything else becomes `_`.
pub fn sanitize_company(company: &str) -> String {
    let company = if company.is_empty() { UNKNOWN } else { company };
    company
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn letter_file_name(company: &str) -> String {
    format!("Motivation_Letter_{}.docx", sanitize_company(company))
}

/// Packs the letter into a `.docx` holding a single paragraph. Line breaks in the
/// text become `<w:br/>` inside the paragraph's run.
pub fn render_docx(letter_text: &str) -> Result<Vec<u8>, AppError> {
    let mut run = Run::new();
    for (i, line) in letter_text.split('\n').enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if !line.is_empty() {
            run = run.add_text(line);
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(run))
        .build()
        .pack(&mut buffer)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build document: {e}")))?;
    Ok(buffer.into_inner())
}

/// Saves `letter_text` as `Motivation_Letter_<company>.docx` in `download_path`,
/// which must be an existing directory. Overwrites an earlier export.
pub async fn export_letter(
    letter_text: &str,
    company_name: &str,
    download_path: &str,
) -> Result<PathBuf, AppError> {
    let dir = Path::new(download_path);
    let is_dir = !download_path.is_empty()
        && tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
    if !is_dir {
        return Err(AppError::Validation(
            "Invalid or missing download path. Please check settings.".to_string(),
        ));
    }

    let document = render_docx(letter_text)?;
    let full_path = dir.join(letter_file_name(company_name));
    tokio::fs::write(&full_path, document)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to save document: {e}")))?;

    info!("Letter exported to {}", full_path.display());
    Ok(full_path)
}
