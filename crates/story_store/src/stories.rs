use std::collections::HashSet;
use std::sync::Arc;

use crate::gateway::{load_json, save_json, KeyValueStore};
use crate::schema::{fresh_id, now_millis, Story};
use crate::text::title_from_content;

pub const STORIES_KEY: &str = "stories";
pub const MAX_TITLE_CHARS: usize = 50;
pub const UNTITLED_STORY_TITLE: &str = "Untitled Story";

/// Result of [`StoryStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new story was prepended; its id is the new current identity.
    Created(String),
    /// The existing story with this id was updated in place.
    Updated(String),
    /// Nothing was written because the content was blank.
    Skipped,
}

impl SaveOutcome {
    /// Story id bound to the editor after the save, if any was written.
    #[must_use]
    pub fn story_id(&self) -> Option<&str> {
        match self {
            Self::Created(id) | Self::Updated(id) => Some(id),
            Self::Skipped => None,
        }
    }
}

/// Keyed collection of saved stories, newest first.
pub struct StoryStore {
    store: Arc<dyn KeyValueStore>,
    stories: Vec<Story>,
}

impl StoryStore {
    /// Loads persisted stories, starting empty when absent or unparseable.
    ///
    /// Later duplicates of an id are dropped so ids stay unique.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let loaded = load_json::<Vec<Story>>(store.as_ref(), STORIES_KEY).unwrap_or_default();
        let mut seen = HashSet::new();
        let stories: Vec<Story> = loaded
            .into_iter()
            .filter(|story| {
                let unique = seen.insert(story.id.clone());
                if !unique {
                    tracing::warn!(id = %story.id, "dropping duplicate persisted story id");
                }
                unique
            })
            .collect();

        Self { store, stories }
    }

    /// Upserts `content` against `current_id`.
    ///
    /// An id naming an existing story updates it in place; a missing or
    /// unknown id creates a new story at the front. Blank content is skipped.
    pub fn save(&mut self, current_id: Option<&str>, content: &str) -> SaveOutcome {
        if content.trim().is_empty() {
            return SaveOutcome::Skipped;
        }

        let title = title_from_content(content);
        let timestamp = now_millis();

        if let Some(story) = current_id.and_then(|id| self.find_mut(id)) {
            story.content = content.to_string();
            story.title = title;
            story.timestamp = timestamp;
            let id = story.id.clone();
            self.persist();
            return SaveOutcome::Updated(id);
        }

        let id = fresh_id();
        self.stories.insert(
            0,
            Story {
                id: id.clone(),
                title,
                content: content.to_string(),
                timestamp,
            },
        );
        self.persist();
        SaveOutcome::Created(id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|story| story.id == id)
    }

    /// Removes the story with `id`, returning it when present.
    pub fn delete(&mut self, id: &str) -> Option<Story> {
        let index = self.stories.iter().position(|story| story.id == id)?;
        let removed = self.stories.remove(index);
        self.persist();
        Some(removed)
    }

    /// Stories newest first.
    #[must_use]
    pub fn list(&self) -> &[Story] {
        &self.stories
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Story> {
        self.stories.iter_mut().find(|story| story.id == id)
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), STORIES_KEY, &self.stories);
    }
}

#[cfg(test)]
mod tests {
    use crate::gateway::MemoryKeyValueStore;

    use super::*;

    fn empty_store() -> (Arc<MemoryKeyValueStore>, StoryStore) {
        let backing = Arc::new(MemoryKeyValueStore::new());
        let stories = StoryStore::load(backing.clone());
        (backing, stories)
    }

    #[test]
    fn save_without_current_id_creates_story_with_first_line_title() {
        let (_backing, mut stories) = empty_store();

        let outcome = stories.save(None, "Chapter One\nIt was raining.");

        let SaveOutcome::Created(id) = outcome else {
            panic!("expected a new story, got {outcome:?}");
        };
        assert_eq!(stories.len(), 1);
        let story = stories.get(&id).expect("story exists");
        assert_eq!(story.title, "Chapter One");
        assert_eq!(story.content, "Chapter One\nIt was raining.");
    }

    #[test]
    fn save_with_existing_id_updates_in_place() {
        let (_backing, mut stories) = empty_store();
        let first = stories.save(None, "Chapter One\nIt was raining.");
        let id = first.story_id().expect("created").to_string();
        stories.save(None, "Another story");
        assert_eq!(stories.len(), 2);

        let outcome = stories.save(Some(&id), "Chapter 1\nIt was pouring.");

        assert_eq!(outcome, SaveOutcome::Updated(id.clone()));
        assert_eq!(stories.len(), 2);
        let story = stories.get(&id).expect("story exists");
        assert_eq!(story.title, "Chapter 1");
        assert_eq!(story.content, "Chapter 1\nIt was pouring.");
        assert_eq!(stories.list()[1].id, id, "update keeps collection position");
    }

    #[test]
    fn save_with_unknown_id_creates_new_story_at_front() {
        let (_backing, mut stories) = empty_store();
        stories.save(None, "older");

        let outcome = stories.save(Some("does-not-exist"), "newer");

        let id = outcome.story_id().expect("created");
        assert!(matches!(outcome, SaveOutcome::Created(_)));
        assert_ne!(id, "does-not-exist");
        assert_eq!(stories.list()[0].content, "newer");
        assert_eq!(stories.len(), 2);
    }

    #[test]
    fn blank_content_is_a_no_op() {
        let (backing, mut stories) = empty_store();

        assert_eq!(stories.save(None, "  \n\t"), SaveOutcome::Skipped);
        assert!(stories.is_empty());
        assert_eq!(backing.get(STORIES_KEY), None);
    }

    #[test]
    fn blank_first_line_gets_untitled_title() {
        let (_backing, mut stories) = empty_store();
        let outcome = stories.save(None, "\nbody only");

        let story = stories
            .get(outcome.story_id().expect("created"))
            .expect("story exists");
        assert_eq!(story.title, UNTITLED_STORY_TITLE);
    }

    #[test]
    fn delete_removes_and_persists() {
        let (backing, mut stories) = empty_store();
        let id = stories
            .save(None, "to delete")
            .story_id()
            .expect("created")
            .to_string();

        let removed = stories.delete(&id).expect("story removed");

        assert_eq!(removed.content, "to delete");
        assert!(stories.is_empty());
        assert!(stories.delete(&id).is_none());
        assert!(StoryStore::load(backing).is_empty());
    }

    #[test]
    fn load_drops_duplicate_ids() {
        let backing = Arc::new(MemoryKeyValueStore::new());
        let duplicate = Story {
            id: "s-1".to_string(),
            title: "A".to_string(),
            content: "A".to_string(),
            timestamp: 1,
        };
        save_json(
            backing.as_ref(),
            STORIES_KEY,
            &vec![duplicate.clone(), duplicate],
        );

        let stories = StoryStore::load(backing);

        assert_eq!(stories.len(), 1);
    }
}
