//! Section table: the single place that decides which sections appear and in what order.
//!
//! Each rule pairs a visibility predicate with a builder. Rules are evaluated top to
//! bottom; a section whose predicate fails is not emitted at all, which keeps the
//! surface height (and therefore the page count) honest.

use crate::models::resume::ResumeRecord;
use crate::normalize::{format_date, parse_skills};
use crate::render::{Block, HeadingLevel, SectionKind, SectionNode};

const PRESENT: &str = "Present";

struct SectionRule {
    kind: SectionKind,
    visible: fn(&ResumeRecord) -> bool,
    build: fn(&ResumeRecord) -> Vec<Block>,
}

static SECTION_RULES: [SectionRule; 8] = [
    SectionRule {
        kind: SectionKind::ProfileImage,
        visible: |r| r.profile_img.is_some(),
        build: build_profile_image,
    },
    SectionRule {
        kind: SectionKind::Header,
        visible: |_| true,
        build: build_header,
    },
    SectionRule {
        kind: SectionKind::Summary,
        visible: |r| r.description.is_some(),
        build: build_summary,
    },
    SectionRule {
        kind: SectionKind::Experience,
        visible: |r| !r.experience.is_empty(),
        build: build_experience,
    },
    SectionRule {
        kind: SectionKind::Skills,
        visible: |r| r.skills_text().is_some(),
        build: build_skills,
    },
    SectionRule {
        kind: SectionKind::Projects,
        visible: |r| !r.projects.is_empty(),
        build: build_projects,
    },
    SectionRule {
        kind: SectionKind::Education,
        visible: |r| !r.education.is_empty(),
        build: build_education,
    },
    SectionRule {
        kind: SectionKind::Achievements,
        visible: |r| !r.achievements.is_empty(),
        build: build_achievements,
    },
];

pub(crate) fn build_sections(record: &ResumeRecord) -> Vec<SectionNode> {
    SECTION_RULES
        .iter()
        .filter(|rule| (rule.visible)(record))
        .map(|rule| SectionNode {
            kind: rule.kind,
            blocks: (rule.build)(record),
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Builders
// ────────────────────────────────────────────────────────────────────────────

fn build_profile_image(r: &ResumeRecord) -> Vec<Block> {
    r.profile_img
        .iter()
        .map(|uri| Block::ProfileImage { uri: uri.clone() })
        .collect()
}

fn build_header(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = Vec::new();
    if let Some(name) = &r.name {
        blocks.push(heading(HeadingLevel::Name, name));
    }
    if let Some(profession) = &r.profession {
        blocks.push(heading(HeadingLevel::Profession, profession));
    }

    let mut contacts: Vec<String> = Vec::new();
    contacts.extend(r.email.iter().cloned());
    contacts.extend(r.phone_number.iter().cloned());
    let location: Vec<&str> = [r.city.as_deref(), r.country.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !location.is_empty() {
        contacts.push(location.join(", "));
    }
    for link in &r.social_media_links {
        let platform = link.platform.as_deref().unwrap_or("Social");
        contacts.push(format!("{platform} Profile"));
    }
    blocks.push(Block::ContactList(contacts));
    blocks
}

fn build_summary(r: &ResumeRecord) -> Vec<Block> {
    vec![
        heading(HeadingLevel::Section, "Summary"),
        Block::Paragraph(r.description.clone().unwrap_or_default()),
    ]
}

fn build_experience(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![heading(HeadingLevel::Section, "Professional Experience")];
    for exp in &r.experience {
        blocks.push(heading(HeadingLevel::Entry, text(&exp.title)));
        blocks.push(Block::Meta(format!(
            "{} | {} - {}",
            text(&exp.company),
            format_date(exp.start_date.as_deref()),
            end_date_label(exp.end_date.as_deref()),
        )));
        blocks.push(Block::Paragraph(text(&exp.description).to_string()));
    }
    blocks
}

fn build_skills(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![heading(HeadingLevel::Section, "Skills")];
    for group in parse_skills(r.skills_text()) {
        blocks.push(heading(HeadingLevel::Group, &group.title));
        blocks.push(Block::InlineList(group.skills));
    }
    blocks
}

fn build_projects(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![heading(HeadingLevel::Section, "Projects")];
    for project in &r.projects {
        blocks.push(heading(HeadingLevel::Entry, text(&project.title)));
        if project.url.as_deref().is_some_and(|u| !u.is_empty()) {
            blocks.push(Block::Meta("Project Link".to_string()));
        }
        blocks.push(Block::Paragraph(text(&project.description).to_string()));
    }
    blocks
}

fn build_education(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![heading(HeadingLevel::Section, "Education")];
    for edu in &r.education {
        blocks.push(heading(HeadingLevel::Entry, text(&edu.degree)));
        blocks.push(Block::Meta(format!(
            "{} | {}",
            text(&edu.institution),
            text(&edu.year)
        )));
        if let Some(description) = edu.description.as_deref().filter(|d| !d.is_empty()) {
            blocks.push(Block::Paragraph(description.to_string()));
        }
    }
    blocks
}

fn build_achievements(r: &ResumeRecord) -> Vec<Block> {
    let mut blocks = vec![heading(HeadingLevel::Section, "Awards and Achievements")];
    for ach in &r.achievements {
        blocks.push(Block::Bullet {
            label: format!("{}:", text(&ach.title)),
            text: text(&ach.description).to_string(),
        });
    }
    blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn heading(level: HeadingLevel, text: &str) -> Block {
    Block::Heading {
        level,
        text: text.to_string(),
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// An absent end date means the position is ongoing.
fn end_date_label(end_date: Option<&str>) -> String {
    match end_date.filter(|d| !d.is_empty()) {
        Some(date) => format_date(Some(date)),
        None => PRESENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        AchievementEntry, EducationEntry, ExperienceEntry, ProjectEntry, SocialLink,
    };
    use crate::render::render;

    fn full_record() -> ResumeRecord {
        let mut record = ResumeRecord {
            profile_img: Some("https://cdn.example.com/me.png".to_string()),
            name: Some("Ada Lovelace".to_string()),
            profession: Some("Analyst".to_string()),
            email: Some("ada@example.com".to_string()),
            description: Some("Wrote the first program.".to_string()),
            experience: vec![ExperienceEntry {
                title: Some("Analyst".to_string()),
                company: Some("Analytical Engine Co".to_string()),
                start_date: Some("2021-06-01".to_string()),
                end_date: None,
                description: Some("Notes on the engine.".to_string()),
            }],
            projects: vec![ProjectEntry {
                title: Some("Note G".to_string()),
                url: Some("https://example.com/g".to_string()),
                description: Some("Bernoulli numbers.".to_string()),
            }],
            education: vec![EducationEntry {
                degree: Some("Mathematics".to_string()),
                institution: Some("Home".to_string()),
                year: Some("1835".to_string()),
                description: None,
            }],
            achievements: vec![AchievementEntry {
                title: Some("First Programmer".to_string()),
                description: Some("Widely credited.".to_string()),
            }],
            ..Default::default()
        };
        record
            .custom_fields
            .insert("skills".to_string(), "Math: Calculus, Algebra".to_string());
        record
    }

    fn blocks_of(record: &ResumeRecord, kind: SectionKind) -> Vec<Block> {
        render(record)
            .sections()
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.blocks.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_full_record_renders_every_section_in_order() {
        assert_eq!(
            render(&full_record()).section_kinds(),
            vec![
                SectionKind::ProfileImage,
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Skills,
                SectionKind::Projects,
                SectionKind::Education,
                SectionKind::Achievements,
            ]
        );
    }

    #[test]
    fn test_empty_record_renders_header_only() {
        assert_eq!(
            render(&ResumeRecord::default()).section_kinds(),
            vec![SectionKind::Header]
        );
    }

    #[test]
    fn test_each_optional_section_omitted_independently() {
        fn strip(record: &mut ResumeRecord, kind: SectionKind) {
            match kind {
                SectionKind::ProfileImage => record.profile_img = None,
                SectionKind::Summary => record.description = None,
                SectionKind::Experience => record.experience.clear(),
                SectionKind::Skills => record.custom_fields.clear(),
                SectionKind::Projects => record.projects.clear(),
                SectionKind::Education => record.education.clear(),
                SectionKind::Achievements => record.achievements.clear(),
                SectionKind::Header => unreachable!("header is always rendered"),
            }
        }

        for kind in [
            SectionKind::ProfileImage,
            SectionKind::Summary,
            SectionKind::Experience,
            SectionKind::Skills,
            SectionKind::Projects,
            SectionKind::Education,
            SectionKind::Achievements,
        ] {
            let mut record = full_record();
            strip(&mut record, kind);
            let kinds = render(&record).section_kinds();
            assert!(!kinds.contains(&kind), "{kind:?} should be omitted");
            assert_eq!(kinds.len(), 7, "only {kind:?} should disappear");
        }
    }

    #[test]
    fn test_empty_skills_text_omits_skills_section() {
        let mut record = full_record();
        record.custom_fields.insert("skills".to_string(), String::new());
        assert!(!render(&record).section_kinds().contains(&SectionKind::Skills));
    }

    #[test]
    fn test_experience_without_end_date_renders_present() {
        let blocks = blocks_of(&full_record(), SectionKind::Experience);
        assert!(blocks.contains(&Block::Meta(
            "Analytical Engine Co | June 2021 - Present".to_string()
        )));
    }

    #[test]
    fn test_experience_with_end_date_renders_formatted_date() {
        let mut record = full_record();
        record.experience[0].end_date = Some("2023-02-01".to_string());
        let blocks = blocks_of(&record, SectionKind::Experience);
        assert!(blocks.contains(&Block::Meta(
            "Analytical Engine Co | June 2021 - February 2023".to_string()
        )));
    }

    #[test]
    fn test_header_contact_list() {
        let mut record = full_record();
        record.phone_number = Some("+44 20 0000".to_string());
        record.country = Some("UK".to_string());
        record.social_media_links = vec![SocialLink {
            platform: Some("GitHub".to_string()),
            url: Some("https://github.com/ada".to_string()),
        }];
        let blocks = blocks_of(&record, SectionKind::Header);
        assert_eq!(
            blocks.last(),
            Some(&Block::ContactList(vec![
                "ada@example.com".to_string(),
                "+44 20 0000".to_string(),
                "UK".to_string(),
                "GitHub Profile".to_string(),
            ]))
        );
    }

    #[test]
    fn test_skills_section_uses_parsed_groups() {
        let blocks = blocks_of(&full_record(), SectionKind::Skills);
        assert_eq!(
            blocks[1..],
            [
                heading(HeadingLevel::Group, "Math"),
                Block::InlineList(vec!["Calculus".to_string(), "Algebra".to_string()]),
            ]
        );
    }

    #[test]
    fn test_project_link_only_when_url_present() {
        let mut record = full_record();
        assert!(blocks_of(&record, SectionKind::Projects)
            .contains(&Block::Meta("Project Link".to_string())));
        record.projects[0].url = None;
        assert!(!blocks_of(&record, SectionKind::Projects)
            .contains(&Block::Meta("Project Link".to_string())));
    }

    #[test]
    fn test_render_is_deterministic() {
        let record = full_record();
        assert_eq!(render(&record).sections(), render(&record).sections());
    }
}
