use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = ".storyloom";

#[must_use]
pub fn data_root(cwd: &Path) -> PathBuf {
    cwd.join(DATA_DIR)
}

/// Maps a store key to its file name, or `None` when the key has no safe form.
#[must_use]
pub fn key_file_name(key: &str) -> Option<String> {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '-') {
        None
    } else {
        Some(format!("{sanitized}.json"))
    }
}
