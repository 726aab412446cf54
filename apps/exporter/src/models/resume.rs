use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use self::lenient::{list, string, string_map};

/// Key in `customFields` that carries the free-text skills block.
pub const SKILLS_FIELD: &str = "skills";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    #[serde(rename = "type", default, deserialize_with = "string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub start_date: Option<String>,
    /// Absent means the position is ongoing.
    #[serde(default, deserialize_with = "string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default, deserialize_with = "string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AchievementEntry {
    #[serde(default, deserialize_with = "string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
}

/// Resume payload as the data source delivered it. Every field may be missing, and a
/// field of the wrong JSON type reads as missing without affecting its neighbours.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResume {
    #[serde(default, deserialize_with = "string")]
    pub profile_img: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub profession: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub social_media_links: Option<Vec<SocialLink>>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "list")]
    pub experience: Option<Vec<ExperienceEntry>>,
    #[serde(default, deserialize_with = "list")]
    pub projects: Option<Vec<ProjectEntry>>,
    #[serde(default, deserialize_with = "list")]
    pub education: Option<Vec<EducationEntry>>,
    #[serde(default, deserialize_with = "list")]
    pub achievements: Option<Vec<AchievementEntry>>,
    #[serde(default, deserialize_with = "string_map")]
    pub custom_fields: Option<BTreeMap<String, String>>,
}

/// Normalized resume. Collections are always present; scalar fields stay optional
/// and drive conditional rendering. Never mutated after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    #[serde(default, deserialize_with = "string")]
    pub profile_img: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub profession: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "string")]
    pub country: Option<String>,
    pub social_media_links: Vec<SocialLink>,
    #[serde(default, deserialize_with = "string")]
    pub description: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub projects: Vec<ProjectEntry>,
    pub education: Vec<EducationEntry>,
    pub achievements: Vec<AchievementEntry>,
    pub custom_fields: BTreeMap<String, String>,
}

impl ResumeRecord {
    pub fn skills_text(&self) -> Option<&str> {
        self.custom_fields
            .get(SKILLS_FIELD)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Field-level deserializers that never fail on a type mismatch.
mod lenient {
    use std::collections::BTreeMap;

    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    /// Strings pass through, numbers are stringified, anything else is absent.
    pub fn string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(de)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Arrays keep the entries that read as `T`; a non-array is absent.
    pub fn list<'de, D, T>(de: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(de)? else {
            return Ok(None);
        };
        let total = items.len();
        let kept: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if kept.len() < total {
            warn!(dropped = total - kept.len(), "Skipped malformed resume list entries");
        }
        Ok(Some(kept))
    }

    /// Objects keep their string-valued members; a non-object is absent.
    pub fn string_map<'de, D: Deserializer<'de>>(
        de: D,
    ) -> Result<Option<BTreeMap<String, String>>, D::Error> {
        let Value::Object(members) = Value::deserialize(de)? else {
            return Ok(None);
        };
        Ok(Some(
            members
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::String(s) => Some((key, s)),
                    _ => None,
                })
                .collect(),
        ))
    }
}
