use serde::Serialize;

const SECTION_DELIMITER: &str = "\n\n";
const TITLE_DELIMITER: &str = ": ";
const SKILL_DELIMITER: &str = ", ";

/// A titled list of skills derived from the free-text skills block. Not stored;
/// recomputed on every render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillGroup {
    pub title: String,
    pub skills: Vec<String>,
}

/// Parses `"Title: a, b\n\nOther: c"` into ordered skill groups.
///
/// A section without `": "` becomes a group with no skills.
pub fn parse_skills(text: Option<&str>) -> Vec<SkillGroup> {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return Vec::new();
    };

    text.split(SECTION_DELIMITER)
        .map(|section| match section.split_once(TITLE_DELIMITER) {
            Some((title, rest)) => SkillGroup {
                title: title.to_string(),
                skills: rest.split(SKILL_DELIMITER).map(str::to_string).collect(),
            },
            None => SkillGroup {
                title: section.to_string(),
                skills: Vec::new(),
            },
        })
        .collect()
}
