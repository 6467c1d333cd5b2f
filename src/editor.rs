//! Editing-surface contract the controller reads from and writes replies into.

/// Text-entry surface owned by the host application.
///
/// Only whole-text access is required; `insert_text_at_end` and `clear` have
/// default implementations in terms of `get_text`/`set_text`.
pub trait EditorSurface: Send {
    fn get_text(&self) -> String;

    fn set_text(&mut self, text: &str);

    /// Appends `text`, separated by a newline when the current content is
    /// non-empty and does not already end in one.
    fn insert_text_at_end(&mut self, text: &str) {
        let joined = join_continuation(&self.get_text(), text);
        self.set_text(&joined);
    }

    fn clear(&mut self) {
        self.set_text("");
    }
}

/// Joins `existing` and `addition` with at most one inserted `\n`.
#[must_use]
pub fn join_continuation(existing: &str, addition: &str) -> String {
    let mut joined = String::with_capacity(existing.len() + addition.len() + 1);
    joined.push_str(existing);
    if !existing.is_empty() && !existing.ends_with('\n') {
        joined.push('\n');
    }
    joined.push_str(addition);
    joined
}

/// In-memory editing surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl EditorSurface for TextBuffer {
    fn get_text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    fn insert_text_at_end(&mut self, text: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(text);
    }
}
