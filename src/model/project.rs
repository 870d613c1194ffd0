use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::change::{ChangeHooks, ProjectChange};
use super::note::normalize_tag;
use super::{Chapter, Note, Ranked, Scene, generate_id, in_rank_order, move_ranked, rerank};
use crate::error::{Error, Result};
use crate::export::EpubMetadataOptions;
use crate::html::{contains_word, plain_text};

/// A writing project: the root of the document tree.
///
/// Projects are mutated in place through the methods below. Exporters only
/// ever borrow a project immutably.
///
/// # Example
///
/// ```
/// use folio::Project;
///
/// let mut project = Project::new("The Long Night", "");
/// let chapter = project.add_chapter("Arrival");
/// let scene = project.add_scene(&chapter, "Station").unwrap();
/// project
///     .set_scene_content(&chapter, &scene, "<p>The train was late.</p>")
///     .unwrap();
/// assert_eq!(project.total_words(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    chapters: Vec<Chapter>,
    #[serde(default)]
    notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_opened_scene_id: Option<String>,
    /// Publication details saved with the project, used as EPUB defaults.
    #[serde(
        rename = "epub_metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    epub_metadata: Option<EpubMetadataOptions>,
    #[serde(skip)]
    hooks: ChangeHooks,
}

/// Aggregate counts over a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub total_words: usize,
    pub total_characters: usize,
    pub total_scenes: usize,
    pub total_chapters: usize,
}

/// A scene together with the chapter that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SceneRef<'a> {
    pub chapter: &'a Chapter,
    pub scene: &'a Scene,
}

impl Project {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id("project"),
            title: title.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            chapters: Vec::new(),
            notes: Vec::new(),
            last_opened_scene_id: None,
            epub_metadata: None,
            hooks: ChangeHooks::default(),
        }
    }

    /// Load a project from its JSON file representation.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the project to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
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

    pub fn epub_metadata(&self) -> Option<&EpubMetadataOptions> {
        self.epub_metadata.as_ref()
    }

    /// Register a hook called after every mutation.
    pub fn on_change<F>(&mut self, hook: F)
    where
        F: Fn(&ProjectChange) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    fn touch(&mut self, now: DateTime<Utc>, change: ProjectChange) {
        self.updated_at = now;
        debug!("project {}: {:?}", self.id, change);
        self.hooks.notify(&change);
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch(Utc::now(), ProjectChange::ProjectUpdated);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch(Utc::now(), ProjectChange::ProjectUpdated);
    }

    pub fn set_epub_metadata(&mut self, metadata: Option<EpubMetadataOptions>) {
        self.epub_metadata = metadata;
        self.touch(Utc::now(), ProjectChange::ProjectUpdated);
    }

    // ---- chapters -------------------------------------------------------

    /// Chapters in ascending `order`.
    pub fn chapters(&self) -> Vec<&Chapter> {
        in_rank_order(&self.chapters)
    }

    pub fn chapter(&self, chapter_id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id() == chapter_id)
    }

    fn chapter_mut(&mut self, chapter_id: &str) -> Result<&mut Chapter> {
        self.chapters
            .iter_mut()
            .find(|c| c.id() == chapter_id)
            .ok_or_else(|| Error::ChapterNotFound(chapter_id.to_string()))
    }

    /// Append a chapter and return its id.
    pub fn add_chapter(&mut self, title: impl Into<String>) -> String {
        let now = Utc::now();
        rerank(&mut self.chapters);
        let chapter = Chapter::new(title, self.chapters.len() as u32, now);
        let chapter_id = chapter.id().to_string();
        self.chapters.push(chapter);
        self.touch(now, ProjectChange::ChapterAdded {
            chapter_id: chapter_id.clone(),
        });
        chapter_id
    }

    pub fn rename_chapter(&mut self, chapter_id: &str, title: impl Into<String>) -> Result<()> {
        let now = Utc::now();
        let chapter = self.chapter_mut(chapter_id)?;
        chapter.title = title.into();
        chapter.updated_at = now;
        self.touch(now, ProjectChange::ChapterUpdated {
            chapter_id: chapter_id.to_string(),
        });
        Ok(())
    }

    /// Remove a chapter and all of its scenes.
    pub fn remove_chapter(&mut self, chapter_id: &str) -> Result<Chapter> {
        let index = self
            .chapters
            .iter()
            .position(|c| c.id() == chapter_id)
            .ok_or_else(|| Error::ChapterNotFound(chapter_id.to_string()))?;
        let removed = self.chapters.remove(index);
        rerank(&mut self.chapters);

        if let Some(last) = self.last_opened_scene_id.as_deref()
            && removed.scene(last).is_some()
        {
            self.last_opened_scene_id = None;
        }

        self.touch(Utc::now(), ProjectChange::ChapterRemoved {
            chapter_id: chapter_id.to_string(),
        });
        Ok(removed)
    }

    /// Move a chapter to `new_index` in display order.
    pub fn move_chapter(&mut self, chapter_id: &str, new_index: usize) -> Result<()> {
        rerank(&mut self.chapters);
        let from = self
            .chapters
            .iter()
            .position(|c| c.id() == chapter_id)
            .ok_or_else(|| Error::ChapterNotFound(chapter_id.to_string()))?;
        move_ranked(&mut self.chapters, from, new_index);
        self.touch(Utc::now(), ProjectChange::ChaptersReordered);
        Ok(())
    }

    // ---- scenes ---------------------------------------------------------

    /// Append a scene to a chapter and return its id.
    pub fn add_scene(&mut self, chapter_id: &str, title: impl Into<String>) -> Result<String> {
        let now = Utc::now();
        let chapter = self.chapter_mut(chapter_id)?;
        rerank(&mut chapter.scenes);
        let scene = Scene::new(title, chapter.scenes.len() as u32, now);
        let scene_id = scene.id().to_string();
        chapter.scenes.push(scene);
        chapter.updated_at = now;
        self.touch(now, ProjectChange::SceneAdded {
            chapter_id: chapter_id.to_string(),
            scene_id: scene_id.clone(),
        });
        Ok(scene_id)
    }

    fn scene_mut(&mut self, chapter_id: &str, scene_id: &str) -> Result<&mut Scene> {
        self.chapter_mut(chapter_id)?
            .scene_mut(scene_id)
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))
    }

    pub fn rename_scene(
        &mut self,
        chapter_id: &str,
        scene_id: &str,
        title: impl Into<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let scene = self.scene_mut(chapter_id, scene_id)?;
        scene.title = title.into();
        scene.updated_at = now;
        self.chapter_mut(chapter_id)?.updated_at = now;
        self.touch(now, ProjectChange::SceneUpdated {
            chapter_id: chapter_id.to_string(),
            scene_id: scene_id.to_string(),
        });
        Ok(())
    }

    /// Replace a scene's content. Counts are recomputed as part of the write,
    /// and the scene becomes the last opened one.
    pub fn set_scene_content(
        &mut self,
        chapter_id: &str,
        scene_id: &str,
        content: impl Into<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let scene = self.scene_mut(chapter_id, scene_id)?;
        let previous_words = scene.set_content(content.into(), now);
        let words = scene.word_count();
        self.chapter_mut(chapter_id)?.updated_at = now;
        self.last_opened_scene_id = Some(scene_id.to_string());
        self.touch(now, ProjectChange::SceneContentChanged {
            chapter_id: chapter_id.to_string(),
            scene_id: scene_id.to_string(),
            previous_words,
            words,
        });
        Ok(())
    }

    pub fn remove_scene(&mut self, chapter_id: &str, scene_id: &str) -> Result<Scene> {
        let now = Utc::now();
        let chapter = self.chapter_mut(chapter_id)?;
        let index = chapter
            .scenes
            .iter()
            .position(|s| s.id() == scene_id)
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?;
        let removed = chapter.scenes.remove(index);
        rerank(&mut chapter.scenes);
        chapter.updated_at = now;

        if self.last_opened_scene_id.as_deref() == Some(scene_id) {
            self.last_opened_scene_id = None;
        }

        self.touch(now, ProjectChange::SceneRemoved {
            chapter_id: chapter_id.to_string(),
            scene_id: scene_id.to_string(),
        });
        Ok(removed)
    }

    /// Move a scene to `new_index` within its chapter.
    pub fn move_scene(&mut self, chapter_id: &str, scene_id: &str, new_index: usize) -> Result<()> {
        let now = Utc::now();
        let chapter = self.chapter_mut(chapter_id)?;
        rerank(&mut chapter.scenes);
        let from = chapter
            .scenes
            .iter()
            .position(|s| s.id() == scene_id)
            .ok_or_else(|| Error::SceneNotFound(scene_id.to_string()))?;
        move_ranked(&mut chapter.scenes, from, new_index);
        chapter.updated_at = now;
        self.touch(now, ProjectChange::ScenesReordered {
            chapter_id: chapter_id.to_string(),
        });
        Ok(())
    }

    /// Find a scene anywhere in the tree.
    pub fn find_scene(&self, scene_id: &str) -> Option<SceneRef<'_>> {
        self.chapters.iter().find_map(|chapter| {
            chapter
                .scene(scene_id)
                .map(|scene| SceneRef { chapter, scene })
        })
    }

    /// All scenes in reading order.
    pub fn scenes(&self) -> Vec<SceneRef<'_>> {
        self.chapters()
            .into_iter()
            .flat_map(|chapter| {
                chapter
                    .scenes()
                    .into_iter()
                    .map(move |scene| SceneRef { chapter, scene })
            })
            .collect()
    }

    /// Most recently edited scenes first.
    pub fn recent_scenes(&self, limit: usize) -> Vec<SceneRef<'_>> {
        let mut scenes = self.scenes();
        scenes.sort_by(|a, b| b.scene.updated_at().cmp(&a.scene.updated_at()));
        scenes.truncate(limit);
        scenes
    }

    // ---- last opened ----------------------------------------------------

    /// Record the scene the user was last looking at. Not validated here;
    /// see [`Project::last_opened_scene`].
    pub fn set_last_opened_scene(&mut self, scene_id: impl Into<String>) {
        let scene_id = scene_id.into();
        self.last_opened_scene_id = Some(scene_id.clone());
        self.touch(Utc::now(), ProjectChange::LastOpenedSceneChanged { scene_id });
    }

    pub fn last_opened_scene_id(&self) -> Option<&str> {
        self.last_opened_scene_id.as_deref()
    }

    /// Resolve the last opened scene. A reference to a scene that no longer
    /// exists resolves to `None`.
    pub fn last_opened_scene(&self) -> Option<SceneRef<'_>> {
        let scene_id = self.last_opened_scene_id.as_deref()?;
        let found = self.find_scene(scene_id);
        if found.is_none() {
            warn!("last opened scene {scene_id} no longer exists");
        }
        found
    }

    /// The scene to reopen: the last opened one, or the first scene of the
    /// first chapter.
    pub fn resume_scene(&self) -> Option<SceneRef<'_>> {
        self.last_opened_scene()
            .or_else(|| self.scenes().into_iter().next())
    }

    // ---- notes ----------------------------------------------------------

    /// Notes in ascending `order`.
    pub fn notes(&self) -> Vec<&Note> {
        in_rank_order(&self.notes)
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == note_id)
    }

    fn note_mut(&mut self, note_id: &str) -> Result<&mut Note> {
        self.notes
            .iter_mut()
            .find(|n| n.id() == note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))
    }

    pub fn add_note(&mut self, title: impl Into<String>, description: impl Into<String>) -> String {
        let now = Utc::now();
        rerank(&mut self.notes);
        let note = Note::new(title, description, self.notes.len() as u32, now);
        let note_id = note.id().to_string();
        self.notes.push(note);
        self.touch(now, ProjectChange::NoteAdded {
            note_id: note_id.clone(),
        });
        note_id
    }

    pub fn update_note(
        &mut self,
        note_id: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let note = self.note_mut(note_id)?;
        note.title = title.into();
        note.description = description.into();
        note.updated_at = now;
        self.touch(now, ProjectChange::NoteUpdated {
            note_id: note_id.to_string(),
        });
        Ok(())
    }

    pub fn remove_note(&mut self, note_id: &str) -> Result<Note> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id() == note_id)
            .ok_or_else(|| Error::NoteNotFound(note_id.to_string()))?;
        let removed = self.notes.remove(index);
        rerank(&mut self.notes);
        self.touch(Utc::now(), ProjectChange::NoteRemoved {
            note_id: note_id.to_string(),
        });
        Ok(removed)
    }

    /// Add a tag to a note. Returns `false` when the tag is blank or already
    /// present.
    pub fn add_note_tag(&mut self, note_id: &str, tag: &str) -> Result<bool> {
        let now = Utc::now();
        let tag = normalize_tag(tag);
        let note = self.note_mut(note_id)?;
        if tag.is_empty() || !note.tags.insert(tag) {
            return Ok(false);
        }
        note.updated_at = now;
        self.touch(now, ProjectChange::NoteUpdated {
            note_id: note_id.to_string(),
        });
        Ok(true)
    }

    /// Remove a tag from a note. Returns `false` when it was not present.
    pub fn remove_note_tag(&mut self, note_id: &str, tag: &str) -> Result<bool> {
        let now = Utc::now();
        let note = self.note_mut(note_id)?;
        if !note.tags.remove(&normalize_tag(tag)) {
            return Ok(false);
        }
        note.updated_at = now;
        self.touch(now, ProjectChange::NoteUpdated {
            note_id: note_id.to_string(),
        });
        Ok(true)
    }

    /// Every tag used by any note, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        self.notes
            .iter()
            .flat_map(|n| n.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn notes_by_tag(&self, tag: &str) -> Vec<&Note> {
        self.notes().into_iter().filter(|n| n.has_tag(tag)).collect()
    }

    /// Notes whose tags appear as whole words in the given scene content.
    pub fn notes_matching_content(&self, html: &str) -> Vec<&Note> {
        let text = plain_text(html);
        self.notes()
            .into_iter()
            .filter(|note| note.tags.iter().any(|tag| contains_word(&text, tag)))
            .collect()
    }

    /// Most recently edited notes first.
    pub fn recent_notes(&self, limit: usize) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        notes.truncate(limit);
        notes
    }

    // ---- aggregates -----------------------------------------------------

    pub fn total_words(&self) -> usize {
        self.chapters.iter().map(Chapter::word_count).sum()
    }

    pub fn stats(&self) -> ProjectStats {
        let mut stats = ProjectStats {
            total_chapters: self.chapters.len(),
            ..Default::default()
        };
        for scene in self.chapters.iter().flat_map(|c| c.scenes.iter()) {
            stats.total_words += scene.word_count();
            stats.total_characters += scene.character_count();
            stats.total_scenes += 1;
        }
        stats
    }

    /// Check structural invariants of a loaded project: non-empty ids,
    /// no id used twice anywhere in the tree, and `order` ranks within each
    /// parent running contiguously from zero.
    ///
    /// Loading does not rerank; a file with gaps or repeats is reported
    /// here rather than silently renumbered.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidProject("project has no id".into()));
        }

        let mut ids: HashSet<&str> = HashSet::new();
        ids.insert(&self.id);

        let all_ids = self
            .chapters
            .iter()
            .flat_map(|c| {
                std::iter::once(("chapter", c.id()))
                    .chain(c.scenes.iter().map(|s| ("scene", s.id())))
            })
            .chain(self.notes.iter().map(|n| ("note", n.id())));
        for (kind, id) in all_ids {
            if id.trim().is_empty() {
                return Err(Error::InvalidProject(format!("{kind} has no id")));
            }
            if !ids.insert(id) {
                return Err(Error::InvalidProject(format!("duplicate id {id}")));
            }
        }

        check_ranks(&self.chapters, "chapter", &self.id)?;
        check_ranks(&self.notes, "note", &self.id)?;
        for chapter in &self.chapters {
            check_ranks(&chapter.scenes, "scene", chapter.id())?;
        }

        Ok(())
    }
}

/// Ranks within a parent must be exactly `0..len`.
fn check_ranks<T: Ranked>(items: &[T], kind: &str, parent: &str) -> Result<()> {
    let mut ranks: Vec<u32> = items.iter().map(|item| item.rank()).collect();
    ranks.sort_unstable();
    for (expected, &rank) in (0u32..).zip(&ranks) {
        if rank < expected {
            return Err(Error::InvalidProject(format!(
                "{kind} order {rank} used twice in {parent}"
            )));
        }
        if rank > expected {
            return Err(Error::InvalidProject(format!(
                "{kind} order {expected} missing in {parent}"
            )));
        }
    }
    Ok(())
}
