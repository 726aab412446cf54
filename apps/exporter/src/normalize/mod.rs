//! Data Normalizer: turns partial, heterogeneous resume payloads into a `ResumeRecord`
//! that the renderer can consume without presence checks on collections.
//!
//! Every function here is total: malformed input degrades to empty values, never an error.

pub mod dates;
pub mod skills;

use serde_json::Value;
use tracing::warn;

use crate::models::resume::{RawResume, ResumeRecord};

pub use dates::format_date;
pub use skills::parse_skills;

/// Fills absent collections with empty defaults. Blank scalar fields collapse to `None`
/// so that a section renders only when it has something to show.
pub fn normalize(raw: RawResume) -> ResumeRecord {
    if raw.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        warn!("Resume record has no name; rendering with fallback file name");
    }

    ResumeRecord {
        profile_img: non_blank(raw.profile_img),
        name: non_blank(raw.name),
        profession: non_blank(raw.profession),
        email: non_blank(raw.email),
        phone_number: non_blank(raw.phone_number),
        city: non_blank(raw.city),
        country: non_blank(raw.country),
        social_media_links: raw.social_media_links.unwrap_or_default(),
        description: non_blank(raw.description),
        experience: raw.experience.unwrap_or_default(),
        projects: raw.projects.unwrap_or_default(),
        education: raw.education.unwrap_or_default(),
        achievements: raw.achievements.unwrap_or_default(),
        custom_fields: raw.custom_fields.unwrap_or_default(),
    }
}

/// Normalizes an untyped payload. Mistyped fields are dropped one by one; a payload
/// that is not an object at all is treated as an empty object.
pub fn normalize_payload(payload: Value) -> ResumeRecord {
    let raw = match serde_json::from_value::<RawResume>(payload) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Resume payload is malformed; falling back to an empty record");
            RawResume::default()
        }
    };
    normalize(raw)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_collections_default_to_empty() {
        let record = normalize(RawResume {
            name: Some("Ada Lovelace".to_string()),
            ..Default::default()
        });
        assert!(record.social_media_links.is_empty());
        assert!(record.experience.is_empty());
        assert!(record.projects.is_empty());
        assert!(record.education.is_empty());
        assert!(record.achievements.is_empty());
        assert!(record.custom_fields.is_empty());
        assert_eq!(record.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_empty_object_payload_normalizes() {
        let record = normalize_payload(json!({}));
        assert_eq!(record, ResumeRecord::default());
    }

    #[test]
    fn test_malformed_payload_degrades_to_empty_record() {
        let record = normalize_payload(json!({ "experience": "not a list" }));
        assert_eq!(record, ResumeRecord::default());

        let record = normalize_payload(json!("a bare string"));
        assert_eq!(record, ResumeRecord::default());

        let record = normalize_payload(json!([1, 2, 3]));
        assert_eq!(record, ResumeRecord::default());
    }

    #[test]
    fn test_wrong_typed_scalar_loses_only_that_field() {
        let record = normalize_payload(json!({
            "name": "Ada Lovelace",
            "phoneNumber": 9876543210u64,
            "email": { "work": "ada@example.com" },
            "experience": [{ "title": "Analyst", "company": "Engine Co", "startDate": "1843-01-01" }]
        }));
        assert_eq!(record.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(record.phone_number.as_deref(), Some("9876543210"));
        assert!(record.email.is_none());
        assert_eq!(record.experience.len(), 1);
        assert_eq!(record.experience[0].title.as_deref(), Some("Analyst"));
    }

    #[test]
    fn test_non_string_custom_fields_are_skipped() {
        let record = normalize_payload(json!({
            "name": "Ada Lovelace",
            "customFields": { "skills": "Languages: Rust", "yearsOfExperience": 7, "remote": true }
        }));
        assert_eq!(record.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(record.skills_text(), Some("Languages: Rust"));
        assert_eq!(record.custom_fields.len(), 1);
    }

    #[test]
    fn test_malformed_list_entries_are_dropped_individually() {
        let record = normalize_payload(json!({
            "projects": ["just a string", { "title": "Engine", "url": 42 }, null],
            "education": [{ "degree": "BSc", "year": 1835 }]
        }));
        assert_eq!(record.projects.len(), 1);
        assert_eq!(record.projects[0].title.as_deref(), Some("Engine"));
        assert_eq!(record.projects[0].url.as_deref(), Some("42"));
        assert_eq!(record.education[0].year.as_deref(), Some("1835"));
    }

    #[test]
    fn test_camel_case_payload_is_read() {
        let record = normalize_payload(json!({
            "name": "Grace Hopper",
            "phoneNumber": "+1 555 0100",
            "socialMediaLinks": [{ "type": "GitHub", "url": "https://github.com/grace" }],
            "experience": [{ "title": "Rear Admiral", "company": "US Navy", "startDate": "1943-12-01" }],
            "customFields": { "skills": "Languages: COBOL" }
        }));
        assert_eq!(record.phone_number.as_deref(), Some("+1 555 0100"));
        assert_eq!(record.social_media_links[0].platform.as_deref(), Some("GitHub"));
        assert_eq!(record.experience[0].start_date.as_deref(), Some("1943-12-01"));
        assert!(record.experience[0].end_date.is_none());
        assert_eq!(record.skills_text(), Some("Languages: COBOL"));
    }

    #[test]
    fn test_blank_scalars_become_absent() {
        let record = normalize_payload(json!({ "name": "  ", "description": "" }));
        assert!(record.name.is_none());
        assert!(record.description.is_none());
    }

    #[test]
    fn test_stored_dates_are_not_reformatted() {
        let record = normalize_payload(json!({
            "experience": [{ "startDate": "2021-06-01", "endDate": "2022-01-15" }]
        }));
        assert_eq!(record.experience[0].start_date.as_deref(), Some("2021-06-01"));
        assert_eq!(record.experience[0].end_date.as_deref(), Some("2022-01-15"));
    }
}
