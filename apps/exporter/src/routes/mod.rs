pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::state::AppState;
use crate::view::handlers as view;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume views
        .route(
            "/api/v1/resumes/:id",
            get(view::handle_mount).delete(view::handle_unmount),
        )
        .route("/api/v1/resumes/:id/status", get(view::handle_status))
        // Export
        .route("/api/v1/resumes/:id/export", post(export::handle_export))
        .with_state(state)
}
