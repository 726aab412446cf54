//! Document Renderer: builds the visual tree (the `Surface`) for a normalized resume.
//!
//! `render` is a pure function of the record. The only mutable part of a `Surface`
//! is its width setting, which the rasterizer temporarily overrides during capture.

pub mod sections;

use std::sync::Arc;

use image::RgbImage;
use serde::Serialize;

use crate::models::resume::ResumeRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ProfileImage,
    Header,
    Summary,
    Experience,
    Skills,
    Projects,
    Education,
    Achievements,
}

/// Typographic role of a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// The person's name.
    Name,
    /// Profession line under the name.
    Profession,
    /// Section title ("Summary", "Projects", ...).
    Section,
    /// Entry title inside a section.
    Entry,
    /// Skill group title.
    Group,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    ProfileImage { uri: String },
    Heading { level: HeadingLevel, text: String },
    /// Inline contact entries, separated visually.
    ContactList(Vec<String>),
    /// Secondary line: company and dates, institution and year, link labels.
    Meta(String),
    Paragraph(String),
    /// List item with an emphasized lead-in.
    Bullet { label: String, text: String },
    /// Comma-separated inline list (skills).
    InlineList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

/// The rendered resume: fixed section order, content-driven height.
#[derive(Debug, Clone)]
pub struct Surface {
    sections: Vec<SectionNode>,
    /// Explicit width setting in logical px; `None` means "fill the viewport".
    width: Option<u32>,
    profile_image: Option<Arc<RgbImage>>,
}

impl Surface {
    pub fn sections(&self) -> &[SectionNode] {
        &self.sections
    }

    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }

    pub fn width_setting(&self) -> Option<u32> {
        self.width
    }

    pub fn set_width(&mut self, width: Option<u32>) {
        self.width = width;
    }

    /// Width the surface lays out at: the explicit setting, else the viewport width.
    pub fn effective_width(&self, viewport_width: u32) -> u32 {
        self.width.unwrap_or(viewport_width)
    }

    pub fn profile_image(&self) -> Option<&RgbImage> {
        self.profile_image.as_deref()
    }

    pub fn with_profile_image(mut self, image: Option<Arc<RgbImage>>) -> Self {
        self.profile_image = image;
        self
    }
}

/// Renders a record into a surface. Sections whose data is absent are omitted entirely.
pub fn render(record: &ResumeRecord) -> Surface {
    Surface {
        sections: sections::build_sections(record),
        width: None,
        profile_image: None,
    }
}
