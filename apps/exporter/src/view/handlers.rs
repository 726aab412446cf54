use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::export::paginator::{A4_HEIGHT_MM, A4_WIDTH_MM};
use crate::export::{plan_pages, ExportState, CANONICAL_WIDTH, CAPTURE_SCALE};
use crate::layout::{layout_surface, FontFamily};
use crate::models::resume::ResumeRecord;
use crate::render::{SectionKind, Surface};
use crate::state::AppState;
use crate::view::{mount_view, ResumeView};

#[derive(Serialize)]
pub struct MountResponse {
    pub record: ResumeRecord,
    pub sections: Vec<SectionKind>,
    /// Pages the export would produce right now.
    pub estimated_pages: usize,
    pub disabled: bool,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub state: ExportState,
    pub disabled: bool,
}

/// GET /api/v1/resumes/:id
pub async fn handle_mount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MountResponse>, AppError> {
    validate_id(&id)?;
    let view = mount_view(&id, state.source.as_ref(), Arc::clone(&state.capture)).await;
    let (view, previous) = state.views.insert(view);
    if previous.is_some() {
        info!(resume_id = %id, "Superseded previously mounted view");
    }

    let (sections, estimated_pages) = {
        let slot = view.surface.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(surface) => (
                surface.section_kinds(),
                estimate_pages(surface, state.config.font),
            ),
            None => (Vec::new(), 0),
        }
    };

    Ok(Json(MountResponse {
        record: ResumeRecord::clone(&view.record),
        sections,
        estimated_pages,
        disabled: view.controller.is_disabled(),
    }))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_unmount(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .views
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("Resume view '{id}' is not mounted")))?;
    info!(resume_id = %id, "Resume view unmounted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/status
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let view = mounted(&state, &id)?;
    Ok(Json(StatusResponse {
        state: view.controller.state(),
        disabled: view.controller.is_disabled(),
    }))
}

pub(crate) fn mounted(state: &AppState, id: &str) -> Result<Arc<ResumeView>, AppError> {
    state
        .views
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Resume view '{id}' is not mounted")))
}

/// Ids are interpolated into the upstream URL path.
fn validate_id(id: &str) -> Result<(), AppError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!("Invalid resume id '{id}'")))
    }
}

/// Page count of an export at the canonical capture geometry, without painting.
fn estimate_pages(surface: &Surface, font: FontFamily) -> usize {
    let layout = layout_surface(surface, CANONICAL_WIDTH, font);
    let width_px = (layout.width * CAPTURE_SCALE).ceil() as u32;
    let height_px = (layout.height * CAPTURE_SCALE).ceil() as u32;
    plan_pages(width_px, height_px, A4_WIDTH_MM, A4_HEIGHT_MM).page_count()
}
