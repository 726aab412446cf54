//! Software painter for a laid-out surface.
//!
//! Glyphs come from the 8×8 `font8x8` bitmaps, stretched into each character's
//! advance from the metric table so that painted text lines up with the layout
//! that produced the line breaks.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::layout::flow::{LayoutItem, SurfaceLayout};
use crate::layout::font_metrics::{get_metrics, FontMetricTable};

const BACKGROUND: Rgb<u8> = Rgb([0xff, 0xff, 0xff]);
const PLACEHOLDER: Rgb<u8> = Rgb([0xdd, 0xdd, 0xdd]);
/// Fraction of the font size occupied by the glyph cell.
const GLYPH_HEIGHT_RATIO: f32 = 0.8;

/// Pixel dimensions a layout occupies at `scale`.
pub fn canvas_size(layout: &SurfaceLayout, scale: f32) -> (u32, u32) {
    let w = (layout.width * scale).ceil().max(1.0) as u32;
    let h = (layout.height * scale).ceil().max(1.0) as u32;
    (w, h)
}

/// Paints every layout item onto a fresh white canvas.
pub fn paint(layout: &SurfaceLayout, profile_image: Option<&RgbImage>, scale: f32) -> RgbImage {
    let (w, h) = canvas_size(layout, scale);
    let mut canvas = RgbImage::from_pixel(w, h, BACKGROUND);
    let metrics = get_metrics(layout.font);

    for item in &layout.items {
        match item {
            LayoutItem::Text {
                x,
                y,
                size,
                line_height,
                color,
                bold,
                text,
            } => {
                let cell_h = size * GLYPH_HEIGHT_RATIO;
                let top = y + (line_height - cell_h) / 2.0;
                let pen = TextPen {
                    metrics,
                    scale,
                    size: *size,
                    cell_h,
                    color: Rgb(*color),
                    bold: *bold,
                };
                pen.draw(&mut canvas, *x, top, text);
            }
            LayoutItem::Rule {
                x,
                y,
                width,
                thickness,
                color,
            } => fill_rect(
                &mut canvas,
                x * scale,
                y * scale,
                width * scale,
                (thickness * scale).max(1.0),
                Rgb(*color),
            ),
            LayoutItem::Image { x, y, size } => {
                let side = (size * scale).round().max(1.0) as u32;
                let (px, py) = ((x * scale).round() as i64, (y * scale).round() as i64);
                match profile_image {
                    Some(img) => {
                        let resized = imageops::resize(img, side, side, FilterType::Triangle);
                        imageops::overlay(&mut canvas, &resized, px, py);
                    }
                    None => stroke_rect(&mut canvas, px, py, side, scale.max(1.0) as u32),
                }
            }
        }
    }

    canvas
}

struct TextPen {
    metrics: &'static FontMetricTable,
    scale: f32,
    size: f32,
    cell_h: f32,
    color: Rgb<u8>,
    bold: bool,
}

impl TextPen {
    fn draw(&self, canvas: &mut RgbImage, x: f32, top: f32, text: &str) {
        let mut pen_x = x;
        let cell_h_px = (self.cell_h * self.scale).round().max(1.0) as u32;
        let top_px = (top * self.scale).round() as i64;

        for c in text.chars() {
            let advance = self.metrics.char_width(c) * self.size;
            let cell_w_px = (advance * self.scale).round().max(1.0) as u32;
            let left_px = (pen_x * self.scale).round() as i64;

            if !c.is_whitespace() {
                match glyph(c) {
                    Some(rows) => self.blit(canvas, &rows, left_px, top_px, cell_w_px, cell_h_px),
                    None => {
                        // No bitmap: draw a centered block so the character still occupies ink.
                        let side = (cell_w_px.min(cell_h_px) / 3).max(1);
                        fill_rect(
                            canvas,
                            (left_px + ((cell_w_px - side) / 2) as i64) as f32,
                            (top_px + ((cell_h_px - side) / 2) as i64) as f32,
                            side as f32,
                            side as f32,
                            self.color,
                        );
                    }
                }
            }
            pen_x += advance;
        }
    }

    fn blit(&self, canvas: &mut RgbImage, rows: &[u8; 8], left: i64, top: i64, w: u32, h: u32) {
        let weight = if self.bold { self.scale.max(1.0) as i64 } else { 0 };
        for py in 0..h {
            let row = rows[(py * 8 / h) as usize];
            for px in 0..w {
                let col = px * 8 / w;
                if row & (1 << col) == 0 {
                    continue;
                }
                for dx in 0..=weight {
                    put(canvas, left + px as i64 + dx, top + py as i64, self.color);
                }
            }
        }
    }
}

fn glyph(c: char) -> Option<[u8; 8]> {
    BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c))
}

fn put(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color);
}

fn fill_rect(canvas: &mut RgbImage, x: f32, y: f32, w: f32, h: f32, color: Rgb<u8>) {
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    let (x1, y1) = ((x + w).round() as i64, (y + h).round() as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            put(canvas, px, py, color);
        }
    }
}

/// Empty frame shown in place of a profile image that could not be loaded.
fn stroke_rect(canvas: &mut RgbImage, x: i64, y: i64, side: u32, thickness: u32) {
    let side = side as i64;
    let t = thickness as i64;
    for py in y..y + side {
        for px in x..x + side {
            let edge = px < x + t || px >= x + side - t || py < y + t || py >= y + side - t;
            if edge {
                put(canvas, px, py, PLACEHOLDER);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::FontFamily;

    fn layout_with(items: Vec<LayoutItem>) -> SurfaceLayout {
        SurfaceLayout {
            width: 100.0,
            height: 50.0,
            font: FontFamily::Inter,
            items,
        }
    }

    fn ink_pixels(img: &RgbImage) -> usize {
        img.pixels().filter(|p| **p != BACKGROUND).count()
    }

    #[test]
    fn test_canvas_is_scaled() {
        let img = paint(&layout_with(vec![]), None, 2.0);
        assert_eq!(img.dimensions(), (200, 100));
        assert_eq!(ink_pixels(&img), 0);
    }

    #[test]
    fn test_text_leaves_ink() {
        let img = paint(
            &layout_with(vec![LayoutItem::Text {
                x: 10.0,
                y: 10.0,
                size: 14.0,
                line_height: 19.6,
                color: [0, 0, 0],
                bold: false,
                text: "Hello".to_string(),
            }]),
            None,
            2.0,
        );
        assert!(ink_pixels(&img) > 0);
    }

    #[test]
    fn test_rule_fills_its_rectangle() {
        let img = paint(
            &layout_with(vec![LayoutItem::Rule {
                x: 10.0,
                y: 20.0,
                width: 50.0,
                thickness: 1.0,
                color: [0, 0, 0],
            }]),
            None,
            2.0,
        );
        assert_eq!(img.get_pixel(30, 40), &Rgb([0, 0, 0]));
        assert_eq!(ink_pixels(&img), 100 * 2);
    }

    #[test]
    fn test_missing_profile_image_paints_placeholder_frame() {
        let img = paint(
            &layout_with(vec![LayoutItem::Image {
                x: 10.0,
                y: 10.0,
                size: 20.0,
            }]),
            None,
            1.0,
        );
        assert_eq!(img.get_pixel(10, 10), &PLACEHOLDER);
        assert_eq!(img.get_pixel(20, 20), &BACKGROUND);
    }

    #[test]
    fn test_profile_image_is_composited() {
        let red = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let img = paint(
            &layout_with(vec![LayoutItem::Image {
                x: 10.0,
                y: 10.0,
                size: 20.0,
            }]),
            Some(&red),
            1.0,
        );
        assert_eq!(img.get_pixel(20, 20), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_out_of_bounds_drawing_is_clipped() {
        let img = paint(
            &layout_with(vec![LayoutItem::Rule {
                x: -10.0,
                y: 45.0,
                width: 500.0,
                thickness: 20.0,
                color: [0, 0, 0],
            }]),
            None,
            1.0,
        );
        assert_eq!(img.dimensions(), (100, 50));
    }
}
