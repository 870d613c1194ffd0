use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Ranked, generate_id};

/// A free-standing note (characters, places, research).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) order: u32,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub(crate) tags: BTreeSet<String>,
}

impl Note {
    pub(crate) fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        order: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id("note"),
            title: title.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            order,
            tags: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Normalized (trimmed, lower-case) tags in sorted order.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalize_tag(tag))
    }
}

impl Ranked for Note {
    fn rank(&self) -> u32 {
        self.order
    }

    fn set_rank(&mut self, rank: u32) {
        self.order = rank;
    }
}

/// Canonical form of a tag.
pub(crate) fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Tags as stored on disk, normalized so that lookups by any spelling agree.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|tag| normalize_tag(tag))
        .filter(|tag| !tag.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_normalized_on_load() {
        let note: Note = serde_json::from_str(
            r#"{
                "id": "n1", "title": "Mira",
                "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z",
                "order": 0, "tags": [" Mira ", "mira", "Harbor", "  "]
            }"#,
        )
        .unwrap();

        assert!(note.has_tag("Mira"));
        assert!(note.has_tag("harbor"));
        let tags: Vec<&str> = note.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["harbor", "mira"]);
    }

    #[test]
    fn test_missing_tags_default_to_empty() {
        let note: Note = serde_json::from_str(
            r#"{
                "id": "n1", "title": "Mira",
                "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z",
                "order": 0
            }"#,
        )
        .unwrap();
        assert!(note.tags().is_empty());
    }
}
