//! Flow layout: positions every block of a `Surface` at a given logical width.
//!
//! Blocks stack vertically in section order; text is word-wrapped with the static
//! metric tables. The resulting height is what the paginator ultimately slices,
//! so the layout must be deterministic for a given (surface, width, font).

use serde::Serialize;

use crate::layout::font_metrics::{get_metrics, FontFamily, FontMetricTable};
use crate::render::{Block, HeadingLevel, SectionKind, Surface};

pub const CONTENT_PADDING: f32 = 40.0;
pub const PROFILE_IMAGE_SIZE: f32 = 120.0;
const SECTION_GAP: f32 = 24.0;
const CONTACT_SEPARATOR: &str = "  |  ";
const BULLET: &str = "\u{2022}";

pub type Rgb = [u8; 3];

const INK: Rgb = [0x22, 0x22, 0x22];
const MUTED: Rgb = [0x55, 0x55, 0x55];
const ACCENT: Rgb = [0x1f, 0x3a, 0x5f];
const RULE: Rgb = [0xcc, 0xcc, 0xcc];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    line_height: f32,
    color: Rgb,
    bold: bool,
    space_before: f32,
    space_after: f32,
}

impl TextStyle {
    fn new(size: f32, color: Rgb, bold: bool, space_before: f32, space_after: f32) -> Self {
        TextStyle {
            size,
            line_height: size * 1.4,
            color,
            bold,
            space_before,
            space_after,
        }
    }
}

/// A positioned primitive in logical px. `y` is the top edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutItem {
    Text {
        x: f32,
        y: f32,
        size: f32,
        line_height: f32,
        color: Rgb,
        bold: bool,
        text: String,
    },
    Rule {
        x: f32,
        y: f32,
        width: f32,
        thickness: f32,
        color: Rgb,
    },
    Image {
        x: f32,
        y: f32,
        size: f32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SurfaceLayout {
    pub width: f32,
    pub height: f32,
    pub font: FontFamily,
    pub items: Vec<LayoutItem>,
}

/// Lays out `surface` at `width` logical px.
pub fn layout_surface(surface: &Surface, width: u32, font: FontFamily) -> SurfaceLayout {
    let mut flow = Flow {
        metrics: get_metrics(font),
        width: width as f32,
        content_width: (width as f32 - 2.0 * CONTENT_PADDING).max(1.0),
        y: CONTENT_PADDING,
        items: Vec::new(),
    };

    for (i, section) in surface.sections().iter().enumerate() {
        if i > 0 {
            flow.y += SECTION_GAP;
        }
        let align = match section.kind {
            SectionKind::ProfileImage | SectionKind::Header => Align::Center,
            _ => Align::Left,
        };
        for block in &section.blocks {
            flow.place_block(block, align);
        }
        if section.kind == SectionKind::Header {
            flow.rule(2.0, RULE);
        }
    }

    SurfaceLayout {
        width: flow.width,
        height: (flow.y + CONTENT_PADDING).ceil(),
        font,
        items: flow.items,
    }
}

struct Flow {
    metrics: &'static FontMetricTable,
    width: f32,
    content_width: f32,
    y: f32,
    items: Vec<LayoutItem>,
}

impl Flow {
    fn place_block(&mut self, block: &Block, align: Align) {
        match block {
            Block::ProfileImage { .. } => {
                let x = match align {
                    Align::Center => (self.width - PROFILE_IMAGE_SIZE) / 2.0,
                    Align::Left => CONTENT_PADDING,
                };
                self.items.push(LayoutItem::Image {
                    x,
                    y: self.y,
                    size: PROFILE_IMAGE_SIZE,
                });
                self.y += PROFILE_IMAGE_SIZE;
            }
            Block::Heading { level, text } => {
                let style = heading_style(*level);
                self.text(text, style, align);
                if *level == HeadingLevel::Section {
                    self.rule(1.0, ACCENT);
                    self.y += 6.0;
                }
            }
            Block::ContactList(entries) => {
                self.text(
                    &entries.join(CONTACT_SEPARATOR),
                    TextStyle::new(13.0, MUTED, false, 6.0, 8.0),
                    align,
                );
            }
            Block::Meta(text) => {
                self.text(text, TextStyle::new(13.0, MUTED, false, 0.0, 4.0), align);
            }
            Block::Paragraph(text) => {
                self.text(text, TextStyle::new(14.0, INK, false, 0.0, 10.0), align);
            }
            Block::Bullet { label, text } => {
                self.text(
                    &format!("{BULLET} {label} {text}"),
                    TextStyle::new(14.0, INK, false, 0.0, 6.0),
                    align,
                );
            }
            Block::InlineList(skills) => {
                self.text(
                    &skills.join(", "),
                    TextStyle::new(14.0, INK, false, 0.0, 8.0),
                    align,
                );
            }
        }
    }

    fn text(&mut self, text: &str, style: TextStyle, align: Align) {
        self.y += style.space_before;
        let max_em = self.content_width / style.size;
        for line in self.metrics.wrap_lines(text, max_em) {
            let line_width = self.metrics.measure_str(&line) * style.size;
            let x = match align {
                Align::Left => CONTENT_PADDING,
                Align::Center => CONTENT_PADDING + ((self.content_width - line_width) / 2.0).max(0.0),
            };
            self.items.push(LayoutItem::Text {
                x,
                y: self.y,
                size: style.size,
                line_height: style.line_height,
                color: style.color,
                bold: style.bold,
                text: line,
            });
            self.y += style.line_height;
        }
        self.y += style.space_after;
    }

    fn rule(&mut self, thickness: f32, color: Rgb) {
        self.y += 4.0;
        self.items.push(LayoutItem::Rule {
            x: CONTENT_PADDING,
            y: self.y,
            width: self.content_width,
            thickness,
            color,
        });
        self.y += thickness;
    }
}

fn heading_style(level: HeadingLevel) -> TextStyle {
    match level {
        HeadingLevel::Name => TextStyle::new(32.0, INK, true, 8.0, 2.0),
        HeadingLevel::Profession => TextStyle::new(20.0, MUTED, false, 0.0, 2.0),
        HeadingLevel::Section => TextStyle::new(18.0, ACCENT, true, 0.0, 0.0),
        HeadingLevel::Entry => TextStyle::new(16.0, INK, true, 4.0, 2.0),
        HeadingLevel::Group => TextStyle::new(15.0, INK, true, 2.0, 2.0),
    }
}
