//! Export Controller: single-flight orchestration of capture → assembly.
//!
//! State machine: Idle → Capturing → Assembling → Idle. A trigger that arrives while
//! the controller is not Idle is dropped (`ExportOutcome::Skipped`), not queued.
//! Both stages are CPU-bound and run inside `tokio::task::spawn_blocking`.
//! No timeout and no cancellation: once started, an export runs to completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::export::paginator::assemble;
use crate::export::rasterizer::{rasterize, SurfaceCapture};
use crate::export::{Document, ExportError};
use crate::render::Surface;

/// Shared slot holding the live surface of a view. `None` until the view has rendered.
pub type SurfaceHandle = Arc<Mutex<Option<Surface>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Capturing,
    Assembling,
}

#[derive(Debug)]
pub enum ExportOutcome {
    Completed(Document),
    /// Another export was already in flight; this trigger was ignored.
    Skipped,
    /// The export failed. Already logged; no partial document exists.
    Failed(ExportError),
}

#[derive(Clone)]
pub struct ExportController {
    state: Arc<Mutex<ExportState>>,
    capture: Arc<dyn SurfaceCapture>,
}

impl ExportController {
    pub fn new(capture: Arc<dyn SurfaceCapture>) -> Self {
        ExportController {
            state: Arc::new(Mutex::new(ExportState::Idle)),
            capture,
        }
    }

    pub fn state(&self) -> ExportState {
        *lock(&self.state)
    }

    /// True while an export is in flight; the download trigger should be disabled.
    pub fn is_disabled(&self) -> bool {
        self.state() != ExportState::Idle
    }

    /// Atomically claims the controller. `None` if an export is already running.
    fn try_begin(&self) -> Option<BusyGuard> {
        let mut state = lock(&self.state);
        if *state != ExportState::Idle {
            return None;
        }
        *state = ExportState::Capturing;
        Some(BusyGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Captures the surface, paginates it, and returns the finished PDF.
    ///
    /// Every failure is logged here and reported as `Failed`; the controller is back in
    /// `Idle` and the surface width is restored by the time this returns.
    pub async fn export_as_pdf(
        &self,
        surface: SurfaceHandle,
        resume_name: Option<String>,
    ) -> ExportOutcome {
        let Some(busy) = self.try_begin() else {
            debug!("Export already in progress; trigger ignored");
            return ExportOutcome::Skipped;
        };

        let capture = Arc::clone(&self.capture);
        let result = tokio::task::spawn_blocking(move || {
            let raster = {
                let mut slot = lock(&surface);
                rasterize(slot.as_mut(), capture.as_ref())?
            };
            busy.advance(ExportState::Assembling);
            assemble(&raster, resume_name.as_deref())
            // `busy` drops here: back to Idle on every path out of this closure.
        })
        .await
        .unwrap_or_else(|e| Err(ExportError::Join(e.to_string())));

        match result {
            Ok(document) => {
                info!(
                    file_name = %document.file_name,
                    pages = document.page_count,
                    bytes = document.bytes.len(),
                    "Resume exported"
                );
                ExportOutcome::Completed(document)
            }
            Err(ExportError::SurfaceUnavailable) => {
                warn!("Resume surface is not available; export aborted");
                ExportOutcome::Failed(ExportError::SurfaceUnavailable)
            }
            Err(e) => {
                error!(error = %e, "Error generating PDF");
                ExportOutcome::Failed(e)
            }
        }
    }
}

/// Returns the controller to `Idle` when dropped.
struct BusyGuard {
    state: Arc<Mutex<ExportState>>,
}

impl BusyGuard {
    fn advance(&self, next: ExportState) {
        *lock(&self.state) = next;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        *lock(&self.state) = ExportState::Idle;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
