use std::fs;
use std::sync::Arc;

use story_store::{
    data_root, FileKeyValueStore, HistoryKind, HistoryLog, KeyValueStore, SaveOutcome, StoryStore,
    HISTORY_KEY, MAX_HISTORY_ENTRIES, STORIES_KEY,
};
use tempfile::TempDir;

fn file_store() -> (TempDir, Arc<FileKeyValueStore>) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let store = Arc::new(FileKeyValueStore::new(data_root(dir.path())));
    (dir, store)
}

#[test]
fn missing_data_directory_reads_as_empty() {
    let (_dir, store) = file_store();

    assert_eq!(store.get(HISTORY_KEY), None);
    assert!(HistoryLog::load(store.clone()).is_empty());
    assert!(StoryStore::load(store).is_empty());
}

#[test]
fn history_and_stories_persist_under_separate_files() {
    let (dir, store) = file_store();

    let mut history = HistoryLog::load(store.clone());
    history.append(HistoryKind::User, "Once upon a time");
    history.append(HistoryKind::Ai, "the hero arrived.");

    let mut stories = StoryStore::load(store.clone());
    let outcome = stories.save(None, "Chapter One\nIt was raining.");
    assert!(matches!(outcome, SaveOutcome::Created(_)));

    let root = data_root(dir.path());
    assert!(root.join("history.json").is_file());
    assert!(root.join("stories.json").is_file());

    let history = HistoryLog::load(store.clone());
    let kinds: Vec<HistoryKind> = history.entries().map(|entry| entry.kind).collect();
    assert_eq!(kinds, vec![HistoryKind::Ai, HistoryKind::User]);

    let stories = StoryStore::load(store);
    assert_eq!(stories.list()[0].title, "Chapter One");
}

#[test]
fn corrupt_files_degrade_to_empty_collections() {
    let (dir, store) = file_store();
    let root = data_root(dir.path());
    fs::create_dir_all(&root).expect("data dir should be created");
    fs::write(root.join("history.json"), "{{{{").expect("history written");
    fs::write(root.join("stories.json"), "[{\"id\":1}]").expect("stories written");

    let mut history = HistoryLog::load(store.clone());
    assert!(history.is_empty());
    assert!(StoryStore::load(store.clone()).is_empty());

    history.append(HistoryKind::Ai, "fresh start");
    assert_eq!(HistoryLog::load(store).len(), 1);
}

#[test]
fn history_file_never_exceeds_capacity() {
    let (_dir, store) = file_store();
    let mut history = HistoryLog::load(store.clone());

    for n in 0..(MAX_HISTORY_ENTRIES + 5) {
        history.append(HistoryKind::Ai, &format!("reply {n}"));
    }

    let raw = store.get(HISTORY_KEY).expect("history persisted");
    let persisted: Vec<serde_json::Value> = serde_json::from_str(&raw).expect("valid JSON");
    assert_eq!(persisted.len(), MAX_HISTORY_ENTRIES);
    assert_eq!(persisted[0]["content"], "reply 54");
}

#[test]
fn clearing_history_removes_file_but_keeps_stories() {
    let (dir, store) = file_store();
    let mut history = HistoryLog::load(store.clone());
    history.append(HistoryKind::User, "draft");
    let mut stories = StoryStore::load(store.clone());
    stories.save(None, "kept story");

    history.clear();

    let root = data_root(dir.path());
    assert!(!root.join("history.json").exists());
    assert!(store.get(STORIES_KEY).is_some());
}

#[test]
fn unwritable_root_is_non_fatal() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").expect("blocker written");
    let store = Arc::new(FileKeyValueStore::new(blocker.join("data")));

    let mut history = HistoryLog::load(store.clone());
    history.append(HistoryKind::Ai, "kept in memory");

    assert_eq!(history.len(), 1);
    assert!(store.try_set(HISTORY_KEY, "[]").is_err());
    assert_eq!(store.get(HISTORY_KEY), None);
}
