//! Paginator / PDF Assembler: windows one tall raster onto portrait A4 pages.
//!
//! The full image is drawn on every page, shifted up by one page height per page;
//! PDF viewers clip to the MediaBox, so page N shows the N-th vertical slice.
//! The image is embedded once and shared by all pages.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream};
use serde::Serialize;
use tracing::debug;

use crate::export::{document_file_name, Document, ExportError, RasterImage};

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
const PT_PER_MM: f64 = 72.0 / 25.4;
/// Overhang below this (in mm) is float noise, not content worth a page.
const PAGE_EPSILON_MM: f64 = 1e-3;
const IMAGE_NAME: &str = "Im0";
const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Page geometry for one export, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePlan {
    pub page_width: f64,
    pub page_height: f64,
    /// Height of the image when drawn at full page width.
    pub scaled_height: f64,
    /// Vertical offset of the image's top edge on each page (0, -h, -2h, ...).
    pub offsets: Vec<f64>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.offsets.len()
    }
}

/// Computes how many pages an image needs and where it sits on each.
pub fn plan_pages(width_px: u32, height_px: u32, page_width: f64, page_height: f64) -> PagePlan {
    let aspect_ratio = if width_px == 0 {
        0.0
    } else {
        height_px as f64 / width_px as f64
    };
    let scaled_height = page_width * aspect_ratio;

    let mut offsets = vec![0.0];
    let mut position = 0.0;
    let mut remaining = scaled_height - page_height;
    while remaining > PAGE_EPSILON_MM {
        position -= page_height;
        offsets.push(position);
        remaining -= page_height;
    }

    PagePlan {
        page_width,
        page_height,
        scaled_height,
        offsets,
    }
}

/// Builds the PDF for `image`, named after `resume_name`.
pub fn assemble(image: &RasterImage, resume_name: Option<&str>) -> Result<Document, ExportError> {
    let plan = plan_pages(image.width_px, image.height_px, A4_WIDTH_MM, A4_HEIGHT_MM);
    let bytes = write_pdf(image, &plan)?;
    let file_name = document_file_name(resume_name);

    debug!(
        pages = plan.page_count(),
        scaled_height_mm = plan.scaled_height,
        bytes = bytes.len(),
        file_name = %file_name,
        "PDF assembled"
    );

    Ok(Document {
        file_name,
        page_count: plan.page_count(),
        bytes,
    })
}

/// Bottom edge of the drawn image in PDF user space (origin bottom-left), in points.
fn image_origin_y_pt(plan: &PagePlan, offset: f64) -> f64 {
    (plan.page_height - offset - plan.scaled_height) * PT_PER_MM
}

fn write_pdf(image: &RasterImage, plan: &PagePlan) -> Result<Vec<u8>, ExportError> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(image_xobject(image)?);
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { IMAGE_NAME => image_id },
    });

    let page_w = (plan.page_width * PT_PER_MM) as f32;
    let page_h = (plan.page_height * PT_PER_MM) as f32;
    let draw_h = (plan.scaled_height * PT_PER_MM) as f32;

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(plan.page_count());
    for &offset in &plan.offsets {
        let y = image_origin_y_pt(plan, offset) as f32;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.0_f32.into(),
                        0.0_f32.into(),
                        draw_h.into(),
                        0.0_f32.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(assembly_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).map_err(assembly_error)?;
    Ok(bytes)
}

/// The PNG's zlib stream, embedded as-is: PDF's Flate filter with PNG predictors
/// (`/Predictor 15`) decodes the same per-row filtered samples.
fn image_xobject(image: &RasterImage) -> Result<Stream, ExportError> {
    let png = png_stream(&image.png)?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => png.width as i64,
            "Height" => png.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
            "DecodeParms" => dictionary! {
                "Predictor" => 15_i64,
                "Colors" => 3_i64,
                "BitsPerComponent" => 8_i64,
                "Columns" => png.width as i64,
            },
        },
        png.idat,
    ))
}

struct PngStream {
    width: u32,
    height: u32,
    /// Concatenated IDAT payloads: one zlib stream of filtered scanlines.
    idat: Vec<u8>,
}

/// Splits a PNG into its header fields and image data. Only 8-bit RGB,
/// non-interlaced images can be embedded without re-encoding.
fn png_stream(png: &[u8]) -> Result<PngStream, ExportError> {
    let mut rest = png
        .strip_prefix(PNG_SIGNATURE)
        .ok_or_else(|| assembly_error("raster is not PNG-encoded"))?;

    let mut header: Option<&[u8]> = None;
    let mut idat = Vec::new();
    while rest.len() >= 12 {
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let data = rest
            .get(8..8 + len)
            .ok_or_else(|| assembly_error("truncated PNG chunk"))?;
        match &rest[4..8] {
            b"IHDR" => header = Some(data),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }
        // Chunk CRC follows the data.
        rest = rest
            .get(12 + len..)
            .ok_or_else(|| assembly_error("truncated PNG chunk"))?;
    }

    let header = header
        .filter(|h| h.len() == 13)
        .ok_or_else(|| assembly_error("PNG has no valid IHDR chunk"))?;
    let (bit_depth, color_type, interlace) = (header[8], header[9], header[12]);
    if bit_depth != 8 || color_type != 2 || interlace != 0 {
        return Err(assembly_error(format!(
            "unsupported PNG layout (bit depth {bit_depth}, color type {color_type}, interlace {interlace})"
        )));
    }
    if idat.is_empty() {
        return Err(assembly_error("PNG has no image data"));
    }

    Ok(PngStream {
        width: u32::from_be_bytes([header[0], header[1], header[2], header[3]]),
        height: u32::from_be_bytes([header[4], header[5], header[6], header[7]]),
        idat,
    })
}

fn assembly_error(e: impl std::fmt::Display) -> ExportError {
    ExportError::Assembly(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::rasterizer::encode_png;
    use image::{Rgb, RgbImage};

    fn raster(width_px: u32, height_px: u32) -> RasterImage {
        let pixels = RgbImage::from_fn(width_px, height_px, |x, y| {
            Rgb([(x % 251) as u8, (y % 241) as u8, 0x80])
        });
        RasterImage {
            width_px,
            height_px,
            png: encode_png(&pixels).unwrap(),
        }
    }

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_short_image_is_one_page() {
        // 1600x1000 px → 131.25mm tall at full width.
        let plan = plan_pages(1600, 1000, A4_WIDTH_MM, A4_HEIGHT_MM);
        assert_eq!(plan.page_count(), 1);
        assert_eq!(plan.offsets, vec![0.0]);
        assert!((plan.scaled_height - 131.25).abs() < 1e-9);
    }

    #[test]
    fn test_exactly_one_page_tall_is_one_page() {
        let plan = plan_pages(210, 297, A4_WIDTH_MM, A4_HEIGHT_MM);
        assert_eq!(plan.page_count(), 1);
    }

    #[test]
    fn test_two_and_a_half_pages_yield_three_offsets() {
        // aspect 3.5357… → scaled height = 742.5mm = 2.5 pages.
        let plan = plan_pages(420, 1485, A4_WIDTH_MM, A4_HEIGHT_MM);
        assert!((plan.scaled_height - 2.5 * A4_HEIGHT_MM).abs() < 1e-9);
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.offsets, vec![0.0, -A4_HEIGHT_MM, -2.0 * A4_HEIGHT_MM]);
    }

    #[test]
    fn test_exactly_two_pages_tall_is_two_pages() {
        let plan = plan_pages(210, 594, A4_WIDTH_MM, A4_HEIGHT_MM);
        assert_eq!(plan.page_count(), 2);
    }

    #[test]
    fn test_zero_width_image_is_single_page() {
        assert_eq!(plan_pages(0, 100, A4_WIDTH_MM, A4_HEIGHT_MM).page_count(), 1);
    }

    #[test]
    fn test_image_top_edge_follows_offset() {
        let plan = plan_pages(420, 1485, A4_WIDTH_MM, A4_HEIGHT_MM);
        let page_h_pt = A4_HEIGHT_MM * PT_PER_MM;
        let draw_h_pt = plan.scaled_height * PT_PER_MM;
        for (i, &offset) in plan.offsets.iter().enumerate() {
            let top = image_origin_y_pt(&plan, offset) + draw_h_pt;
            let expected_top = page_h_pt + i as f64 * page_h_pt;
            assert!((top - expected_top).abs() < 1e-6, "page {i}: {top} vs {expected_top}");
        }
    }

    #[test]
    fn test_assemble_emits_pdf_with_shared_image() {
        let doc = assemble(&raster(420, 1485), Some("Ada Lovelace")).unwrap();
        assert_eq!(doc.page_count, 3);
        assert_eq!(doc.file_name, "Ada Lovelace.pdf");
        assert!(doc.bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(count(&doc.bytes, b"/DeviceRGB"), 1, "image embedded once");
        assert_eq!(count(&doc.bytes, b"/MediaBox"), 3);
    }

    #[test]
    fn test_assemble_single_page_with_fallback_name() {
        let doc = assemble(&raster(1600, 1000), None).unwrap();
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.file_name, "resume.pdf");
        assert_eq!(count(&doc.bytes, b"/MediaBox"), 1);
    }

    #[test]
    fn test_png_data_is_embedded_verbatim_once() {
        let image = raster(420, 1485);
        let png = png_stream(&image.png).unwrap();
        assert_eq!((png.width, png.height), (420, 1485));
        assert_eq!(png.idat[0], 0x78, "IDAT must be a zlib stream");

        let doc = assemble(&image, None).unwrap();
        assert_eq!(count(&doc.bytes, &png.idat[..32]), 1);
        assert_eq!(count(&doc.bytes, b"/Predictor"), 1);
    }

    #[test]
    fn test_non_png_raster_is_an_assembly_error() {
        let image = RasterImage {
            width_px: 4,
            height_px: 4,
            png: vec![0; 64],
        };
        assert!(matches!(assemble(&image, None), Err(ExportError::Assembly(_))));
    }

    #[test]
    fn test_interlaced_png_is_rejected() {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&4u32.to_be_bytes());
        ihdr.extend_from_slice(&4u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 1]);
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend(chunk(b"IHDR", &ihdr));
        png.extend(chunk(b"IDAT", &[0x78, 0x9c]));
        png.extend(chunk(b"IEND", &[]));

        let err = png_stream(&png).err().unwrap();
        assert!(err.to_string().contains("interlace 1"));
    }
}
