use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Ranked, generate_id, in_rank_order};
use crate::html::{TextMetrics, measure};

/// A chapter: an ordered group of scenes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    id: String,
    pub(crate) title: String,
    created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) scenes: Vec<Scene>,
    pub(crate) order: u32,
}

impl Chapter {
    pub(crate) fn new(title: impl Into<String>, order: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("chapter"),
            title: title.into(),
            created_at: now,
            updated_at: now,
            scenes: Vec::new(),
            order,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
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

    /// Scenes in ascending `order`.
    pub fn scenes(&self) -> Vec<&Scene> {
        in_rank_order(&self.scenes)
    }

    /// Look up a scene by id.
    pub fn scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    pub(crate) fn scene_mut(&mut self, scene_id: &str) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| s.id == scene_id)
    }

    /// Sum of scene word counts.
    pub fn word_count(&self) -> usize {
        self.scenes.iter().map(Scene::word_count).sum()
    }
}

impl Ranked for Chapter {
    fn rank(&self) -> u32 {
        self.order
    }

    fn set_rank(&mut self, rank: u32) {
        self.order = rank;
    }
}

/// A scene: the unit of written content.
///
/// Content is HTML produced by the editor. Word and character counts are
/// derived from it and recomputed on every write; there is no way to set them
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SceneRecord", into = "SceneRecord")]
pub struct Scene {
    id: String,
    pub(crate) title: String,
    content: String,
    created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    metrics: TextMetrics,
    pub(crate) order: u32,
}

impl Scene {
    pub(crate) fn new(title: impl Into<String>, order: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("scene"),
            title: title.into(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            metrics: TextMetrics::default(),
            order,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// HTML content as produced by the editor.
    pub fn content(&self) -> &str {
        &self.content
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

    pub fn word_count(&self) -> usize {
        self.metrics.words
    }

    pub fn character_count(&self) -> usize {
        self.metrics.characters
    }

    /// True when the content holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Replace the content and recount. Returns the previous word count.
    pub(crate) fn set_content(&mut self, content: String, now: DateTime<Utc>) -> usize {
        let previous = self.metrics.words;
        self.metrics = measure(&content);
        self.content = content;
        self.updated_at = now;
        previous
    }
}

impl Ranked for Scene {
    fn rank(&self) -> u32 {
        self.order
    }

    fn set_rank(&mut self, rank: u32) {
        self.order = rank;
    }
}

/// On-disk shape of a scene. Stored counts are written for readers of the
/// file format but ignored on load.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneRecord {
    id: String,
    title: String,
    #[serde(default)]
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    word_count: usize,
    #[serde(default)]
    character_count: usize,
    order: u32,
}

impl From<SceneRecord> for Scene {
    fn from(record: SceneRecord) -> Self {
        Self {
            metrics: measure(&record.content),
            id: record.id,
            title: record.title,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
            order: record.order,
        }
    }
}

impl From<Scene> for SceneRecord {
    fn from(scene: Scene) -> Self {
        Self {
            word_count: scene.metrics.words,
            character_count: scene.metrics.characters,
            id: scene.id,
            title: scene.title,
            content: scene.content,
            created_at: scene.created_at,
            updated_at: scene.updated_at,
            order: scene.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_content_recounts() {
        let now = Utc::now();
        let mut scene = Scene::new("Opening", 0, now);
        assert_eq!(scene.word_count(), 0);

        let previous = scene.set_content("<p>It was a dark night.</p>".into(), now);
        assert_eq!(previous, 0);
        assert_eq!(scene.word_count(), 5);
        assert_eq!(scene.character_count(), "It was a dark night.".len());

        let previous = scene.set_content("<p>Dark.</p>".into(), now);
        assert_eq!(previous, 5);
        assert_eq!(scene.word_count(), 1);
    }

    #[test]
    fn test_stale_counts_are_ignored_on_load() {
        let json = r#"{
            "id": "scene-1",
            "title": "Stale",
            "content": "<p>three little words</p>",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "wordCount": 999,
            "characterCount": 4,
            "order": 0
        }"#;
        let scene: Scene = serde_json::from_str(json).unwrap();
        assert_eq!(scene.word_count(), 3);
        assert_eq!(scene.character_count(), "three little words".len());
    }

    #[test]
    fn test_counts_written_on_save() {
        let mut scene = Scene::new("S", 0, Utc::now());
        scene.set_content("one two".into(), Utc::now());
        let value = serde_json::to_value(&scene).unwrap();
        assert_eq!(value["wordCount"], 2);
        assert_eq!(value["characterCount"], 7);
    }

    #[test]
    fn test_chapter_scenes_sorted_by_order() {
        let now = Utc::now();
        let mut chapter = Chapter::new("One", 0, now);
        chapter.scenes.push(Scene::new("second", 1, now));
        chapter.scenes.push(Scene::new("first", 0, now));
        let titles: Vec<_> = chapter.scenes().iter().map(|s| s.title()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
