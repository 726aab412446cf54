//! Surface Rasterizer: captures a `Surface` as a fixed-scale raster image.
//!
//! Capture is decoupled from the viewer's screen: the surface width is forced to
//! `CANONICAL_WIDTH` for the duration of the capture and restored afterwards on every
//! exit path (success, capture error, panic) by `WidthGuard`.

use std::io::Cursor;
use std::ops::Deref;

use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::export::paint::{canvas_size, paint};
use crate::export::{CaptureError, ExportError, RasterImage, CANONICAL_WIDTH, CAPTURE_SCALE};
use crate::layout::{layout_surface, FontFamily};
use crate::render::Surface;

// ────────────────────────────────────────────────────────────────────────────
// Capture backend trait
// ────────────────────────────────────────────────────────────────────────────

/// Produces the pixels for the full content extent of a surface at `scale`.
///
/// Carried by the export controller as `Arc<dyn SurfaceCapture>`.
pub trait SurfaceCapture: Send + Sync {
    fn capture(&self, surface: &Surface, scale: f32) -> Result<RgbImage, CaptureError>;
}

/// Default backend: flow layout + software painter.
#[derive(Debug, Clone)]
pub struct SoftwareCapture {
    pub font: FontFamily,
    /// Width used when the surface has no explicit width setting.
    pub viewport_width: u32,
    pub max_height_px: u32,
}

impl SurfaceCapture for SoftwareCapture {
    fn capture(&self, surface: &Surface, scale: f32) -> Result<RgbImage, CaptureError> {
        let width = surface.effective_width(self.viewport_width);
        let layout = layout_surface(surface, width, self.font);
        let (w, h) = canvas_size(&layout, scale);
        if h > self.max_height_px {
            return Err(CaptureError::TooLarge {
                width: w,
                height: h,
                max_height: self.max_height_px,
            });
        }
        Ok(paint(&layout, surface.profile_image(), scale))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Width override guard
// ────────────────────────────────────────────────────────────────────────────

/// Holds a forced width on a surface; the original setting is put back on drop.
struct WidthGuard<'a> {
    surface: &'a mut Surface,
    original: Option<u32>,
}

impl<'a> WidthGuard<'a> {
    fn force(surface: &'a mut Surface, width: u32) -> Self {
        let original = surface.width_setting();
        surface.set_width(Some(width));
        WidthGuard { surface, original }
    }
}

impl Deref for WidthGuard<'_> {
    type Target = Surface;

    fn deref(&self) -> &Surface {
        self.surface
    }
}

impl Drop for WidthGuard<'_> {
    fn drop(&mut self) {
        self.surface.set_width(self.original);
        debug!(width = ?self.original, "Surface width restored after capture");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Captures `surface` at `CANONICAL_WIDTH` and `CAPTURE_SCALE`, then PNG-encodes it.
///
/// Fails fast with `SurfaceUnavailable` when there is no surface; nothing is captured
/// and no width is touched in that case.
pub fn rasterize(
    surface: Option<&mut Surface>,
    backend: &dyn SurfaceCapture,
) -> Result<RasterImage, ExportError> {
    let surface = surface.ok_or(ExportError::SurfaceUnavailable)?;
    let guard = WidthGuard::force(surface, CANONICAL_WIDTH);

    let pixels = backend.capture(&guard, CAPTURE_SCALE)?;
    drop(guard);
    let (width_px, height_px) = pixels.dimensions();
    let png = encode_png(&pixels)?;

    debug!(width_px, height_px, png_bytes = png.len(), "Surface captured");

    Ok(RasterImage {
        width_px,
        height_px,
        png,
    })
}

pub(crate) fn encode_png(pixels: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
