use std::sync::Arc;

use completion_provider::{CompletionResponse, ProviderFailure, RequestId};
use story_store::{HistoryLog, KeyValueStore, SaveOutcome, Story, StoryStore};
use tracing::{debug, info};

use crate::controller::{CompletionHost, GenerationController, GenerationState};
use crate::editor::EditorSurface;
use crate::error::TransitionError;

/// Single owner of the editing surface, the generation controller, the
/// history log and the story collection.
pub struct Workbench {
    editor: Box<dyn EditorSurface>,
    controller: GenerationController,
    history: HistoryLog,
    stories: StoryStore,
    current_story: Option<String>,
}

impl Workbench {
    /// Loads history and stories from `store` and wraps `editor`.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        editor: Box<dyn EditorSurface>,
        system_instructions: Option<String>,
    ) -> Self {
        let history = HistoryLog::load(Arc::clone(&store));
        let stories = StoryStore::load(store);
        info!(
            history = history.len(),
            stories = stories.len(),
            "workbench opened"
        );

        Self {
            editor,
            controller: GenerationController::with_system_instructions(system_instructions),
            history,
            stories,
            current_story: None,
        }
    }

    pub fn state(&self) -> &GenerationState {
        self.controller.state()
    }

    pub fn controller(&self) -> &GenerationController {
        &self.controller
    }

    pub fn editor(&self) -> &dyn EditorSurface {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> &mut dyn EditorSurface {
        self.editor.as_mut()
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn stories(&self) -> &StoryStore {
        &self.stories
    }

    /// Id of the story the editor content belongs to, if it was saved or loaded.
    pub fn current_story_id(&self) -> Option<&str> {
        self.current_story.as_deref()
    }

    pub fn generate(&mut self, host: &mut dyn CompletionHost) -> Result<(), TransitionError> {
        self.controller
            .on_generate(self.editor.as_ref(), &mut self.history, host)
    }

    pub fn retry(&mut self, host: &mut dyn CompletionHost) -> Result<(), TransitionError> {
        self.controller
            .on_retry(self.editor.as_ref(), &mut self.history, host)
    }

    pub fn continue_writing(&mut self) -> Result<(), TransitionError> {
        self.controller.on_continue()
    }

    pub fn cancel(&mut self) -> Result<(), TransitionError> {
        self.controller.on_cancel()
    }

    /// Routes a provider resolution to the controller. Returns `false` for
    /// stale resolutions.
    pub fn apply_resolution(
        &mut self,
        request_id: RequestId,
        outcome: Result<CompletionResponse, ProviderFailure>,
    ) -> bool {
        self.controller.on_completion_resolved(
            request_id,
            outcome,
            self.editor.as_mut(),
            &mut self.history,
        )
    }

    /// Saves the editor content as the current story, creating one when
    /// there is no current story or it no longer exists.
    pub fn save_story(&mut self) -> SaveOutcome {
        let content = self.editor.get_text();
        let outcome = self.stories.save(self.current_story.as_deref(), &content);
        if let Some(id) = outcome.story_id() {
            self.current_story = Some(id.to_string());
        }
        debug!(?outcome, "story saved");
        outcome
    }

    /// Replaces the editor content with a saved story and makes it current.
    ///
    /// Returns `false` and leaves everything untouched for an unknown id.
    pub fn load_story(&mut self, id: &str) -> bool {
        let Some(story) = self.stories.get(id) else {
            debug!(id, "story not found");
            return false;
        };

        self.editor.set_text(&story.content);
        self.current_story = Some(story.id.clone());
        true
    }

    /// Clears the current identity and the editor. Saved stories are untouched.
    pub fn new_story(&mut self) {
        self.current_story = None;
        self.editor.clear();
    }

    /// Deletes a story; deleting the current one behaves like [`Self::new_story`].
    pub fn delete_story(&mut self, id: &str) -> Option<Story> {
        let removed = self.stories.delete(id)?;
        if self.current_story.as_deref() == Some(id) {
            self.new_story();
        }
        Some(removed)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use story_store::MemoryKeyValueStore;

    use super::*;
    use crate::editor::TextBuffer;

    fn workbench(text: &str) -> Workbench {
        Workbench::open(
            Arc::new(MemoryKeyValueStore::new()),
            Box::new(TextBuffer::with_text(text)),
            None,
        )
    }

    #[test]
    fn save_then_resave_updates_in_place() {
        let mut workbench = workbench("Chapter One\nIt was dark.");

        let created = workbench.save_story();
        let id = match &created {
            SaveOutcome::Created(id) => id.clone(),
            other => panic!("expected a new story, got {other:?}"),
        };
        assert_eq!(workbench.current_story_id(), Some(id.as_str()));

        workbench.editor_mut().insert_text_at_end("It was stormy.");
        assert_eq!(workbench.save_story(), SaveOutcome::Updated(id.clone()));
        assert_eq!(workbench.stories().len(), 1);
        assert_eq!(
            workbench.stories().get(&id).map(|story| story.content.as_str()),
            Some("Chapter One\nIt was dark.\nIt was stormy.")
        );
    }

    #[test]
    fn blank_editor_is_not_saved() {
        let mut workbench = workbench("  \n ");

        assert_eq!(workbench.save_story(), SaveOutcome::Skipped);
        assert!(workbench.stories().is_empty());
        assert_eq!(workbench.current_story_id(), None);
    }

    #[test]
    fn load_sets_editor_and_identity() {
        let mut workbench = workbench("first story");
        let id = workbench
            .save_story()
            .story_id()
            .map(ToOwned::to_owned)
            .expect("story created");
        workbench.new_story();
        assert_eq!(workbench.editor().get_text(), "");

        assert!(workbench.load_story(&id));
        assert_eq!(workbench.editor().get_text(), "first story");
        assert_eq!(workbench.current_story_id(), Some(id.as_str()));

        assert!(!workbench.load_story("missing"));
        assert_eq!(workbench.current_story_id(), Some(id.as_str()));
    }

    #[test]
    fn deleting_current_story_clears_editor_and_identity() {
        let mut workbench = workbench("doomed");
        let id = workbench
            .save_story()
            .story_id()
            .map(ToOwned::to_owned)
            .expect("story created");

        let removed = workbench.delete_story(&id).expect("story removed");
        assert_eq!(removed.content, "doomed");
        assert_eq!(workbench.current_story_id(), None);
        assert_eq!(workbench.editor().get_text(), "");
        assert!(workbench.delete_story(&id).is_none());
    }

    #[test]
    fn deleting_other_story_keeps_editor() {
        let mut workbench = workbench("keeper");
        let other = workbench
            .save_story()
            .story_id()
            .map(ToOwned::to_owned)
            .expect("story created");
        workbench.new_story();
        workbench.editor_mut().set_text("current draft");
        let current = workbench
            .save_story()
            .story_id()
            .map(ToOwned::to_owned)
            .expect("story created");

        workbench.delete_story(&other).expect("story removed");
        assert_eq!(workbench.current_story_id(), Some(current.as_str()));
        assert_eq!(workbench.editor().get_text(), "current draft");
    }
}
