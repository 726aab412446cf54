use std::fmt::Write;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::errors::AppError;
use crate::export::{Document, ExportError, ExportOutcome};
use crate::state::AppState;
use crate::view::handlers::mounted;

/// POST /api/v1/resumes/:id/export
///
/// 200 with the PDF, 204 when an export for this view is already running.
pub async fn handle_export(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let view = mounted(&state, &id)?;
    info!(resume_id = %id, "Export requested");

    let outcome = view
        .controller
        .export_as_pdf(view.surface.clone(), view.record.name.clone())
        .await;

    match outcome {
        ExportOutcome::Completed(document) => Ok(pdf_response(document)),
        ExportOutcome::Skipped => Ok(StatusCode::NO_CONTENT.into_response()),
        ExportOutcome::Failed(ExportError::SurfaceUnavailable) => Err(AppError::Export(
            "the resume has not been rendered yet".to_string(),
        )),
        ExportOutcome::Failed(e) => Err(AppError::Export(e.to_string())),
    }
}

fn pdf_response(document: Document) -> Response {
    let disposition = content_disposition(&document.file_name);
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response()
}

/// `attachment` with an ASCII `filename` and an RFC 5987 `filename*` for the exact name.
fn content_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && !matches!(c, '"' | '\\' | '/')) || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    let value = format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}");
    // Both parts are visible ASCII by construction.
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
