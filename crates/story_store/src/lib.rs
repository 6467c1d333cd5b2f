mod error;
mod gateway;
mod history;
mod paths;
mod schema;
mod stories;
mod text;

pub use error::StoreError;
pub use gateway::{load_json, save_json, FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use history::{HistoryLog, HISTORY_KEY, MAX_HISTORY_CONTENT_CHARS, MAX_HISTORY_ENTRIES};
pub use paths::{data_root, key_file_name, DATA_DIR};
pub use schema::{HistoryEntry, HistoryKind, Story};
pub use stories::{SaveOutcome, StoryStore, MAX_TITLE_CHARS, STORIES_KEY, UNTITLED_STORY_TITLE};
pub use text::{title_from_content, truncate_chars};
