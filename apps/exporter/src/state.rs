use std::sync::Arc;

use crate::config::Config;
use crate::export::SurfaceCapture;
use crate::source::ResumeSource;
use crate::view::ViewRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pluggable data source. Default: HttpResumeSource.
    pub source: Arc<dyn ResumeSource>,
    /// Capture backend handed to every view's export controller.
    pub capture: Arc<dyn SurfaceCapture>,
    /// Currently mounted resume views, keyed by resume id.
    pub views: ViewRegistry,
}
