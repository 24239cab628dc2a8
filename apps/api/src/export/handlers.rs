//! Axum route handler for PDF export.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;

const DEFAULT_FILENAME: &str = "document.pdf";
const MAX_FILENAME_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportPdfRequest {
    pub html: Option<String>,
    pub filename: Option<String>,
}

/// POST /api/v1/export/pdf
///
/// Renders the posted HTML and streams it back as an attachment.
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    payload: Result<Json<ExportPdfRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let html = request
        .html
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| AppError::Validation("html is required".to_string()))?;

    let pdf = state
        .pdf_renderer
        .render(&html)
        .await
        .map_err(|e| AppError::Render(e.to_string()))?;

    let filename = sanitize_filename(request.filename.as_deref());

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Bytes::from(pdf),
    )
        .into_response())
}

/// Reduces a caller-supplied name to a safe `*.pdf` filename for the header.
fn sanitize_filename(raw: Option<&str>) -> String {
    let stem: String = raw
        .unwrap_or_default()
        .trim()
        .trim_end_matches(".pdf")
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
            ' ' => '-',
            _ => '_',
        })
        .collect();
    let stem = stem.trim_start_matches('.');

    if stem.is_empty() || stem.chars().all(|c| c == '_') {
        return DEFAULT_FILENAME.to_string();
    }

    let stem: String = stem.chars().take(MAX_FILENAME_LEN).collect();
    format!("{stem}.pdf")
}
