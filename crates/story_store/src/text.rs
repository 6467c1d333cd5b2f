use crate::stories::{MAX_TITLE_CHARS, UNTITLED_STORY_TITLE};

/// Returns the first `max_chars` characters of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Derives a story title from the first line of its content, kept verbatim.
///
/// A blank first line yields the untitled default.
#[must_use]
pub fn title_from_content(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("");
    if first_line.trim().is_empty() {
        UNTITLED_STORY_TITLE.to_string()
    } else {
        truncate_chars(first_line, MAX_TITLE_CHARS)
    }
}
