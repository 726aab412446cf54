//! Export pipeline: capture the rendered surface as a raster, slice it onto A4 pages,
//! and hand back a finished PDF.
//!
//! Stages run strictly in sequence per export:
//! `rasterizer::rasterize` → `paginator::assemble`, orchestrated by `controller`.

pub mod controller;
pub mod handlers;
pub mod paint;
pub mod paginator;
pub mod rasterizer;

use thiserror::Error;

pub use controller::{ExportController, ExportOutcome, ExportState};
pub use paginator::plan_pages;
pub use rasterizer::{SoftwareCapture, SurfaceCapture};

/// Canonical logical width forced on the surface during capture.
pub const CANONICAL_WIDTH: u32 = 800;
/// Oversampling factor applied during capture.
pub const CAPTURE_SCALE: f32 = 2.0;
/// File name stem used when the resume has no name.
pub const FALLBACK_FILE_STEM: &str = "resume";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture of {width}x{height}px exceeds the {max_height}px height limit")]
    TooLarge {
        width: u32,
        height: u32,
        max_height: u32,
    },

    #[error("capture failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("surface unavailable: the resume view has not been rendered")]
    SurfaceUnavailable,

    #[error("rasterization failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("PDF assembly failed: {0}")]
    Assembly(String),

    #[error("export task aborted: {0}")]
    Join(String),
}

/// A captured surface, losslessly PNG-encoded.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width_px: u32,
    pub height_px: u32,
    pub png: Vec<u8>,
}

/// A finished, downloadable PDF.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// `<name>.pdf`, or the fallback stem when the resume has no name.
pub fn document_file_name(name: Option<&str>) -> String {
    let stem = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_FILE_STEM);
    format!("{stem}.pdf")
}
