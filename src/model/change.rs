//! Change notification for project edits.
//!
//! Observers (such as the progress coordinator) register a hook on the
//! project instead of the project holding a reference to them.

use std::fmt;
use std::sync::Arc;

/// A mutation applied to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectChange {
    /// Title, description or saved metadata changed.
    ProjectUpdated,
    ChapterAdded { chapter_id: String },
    ChapterUpdated { chapter_id: String },
    ChapterRemoved { chapter_id: String },
    ChaptersReordered,
    SceneAdded { chapter_id: String, scene_id: String },
    SceneUpdated { chapter_id: String, scene_id: String },
    /// Scene content was rewritten; carries the word counts before and after.
    SceneContentChanged {
        chapter_id: String,
        scene_id: String,
        previous_words: usize,
        words: usize,
    },
    SceneRemoved { chapter_id: String, scene_id: String },
    ScenesReordered { chapter_id: String },
    NoteAdded { note_id: String },
    NoteUpdated { note_id: String },
    NoteRemoved { note_id: String },
    LastOpenedSceneChanged { scene_id: String },
}

impl ProjectChange {
    /// True when the change can alter the project's total word count.
    pub fn affects_word_count(&self) -> bool {
        matches!(
            self,
            ProjectChange::SceneContentChanged { .. }
                | ProjectChange::SceneRemoved { .. }
                | ProjectChange::ChapterRemoved { .. }
        )
    }
}

/// Callback invoked after every project mutation.
pub type ChangeHook = Arc<dyn Fn(&ProjectChange) + Send + Sync>;

/// Registered hooks. Not serialized, and not carried into clones: a cloned
/// project is a snapshot, not a second live document.
#[derive(Default)]
pub(crate) struct ChangeHooks(Vec<ChangeHook>);

impl ChangeHooks {
    pub(crate) fn push(&mut self, hook: ChangeHook) {
        self.0.push(hook);
    }

    pub(crate) fn notify(&self, change: &ProjectChange) {
        for hook in &self.0 {
            hook(change);
        }
    }
}

impl Clone for ChangeHooks {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PartialEq for ChangeHooks {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Debug for ChangeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeHooks({})", self.0.len())
    }
}
