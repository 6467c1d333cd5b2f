use std::sync::Arc;
use std::time::Duration;

use story_store::{HistoryKind, SaveOutcome};
use storyloom::{GenerationRuntime, GenerationStatus, TransitionError, Workbench};

use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::preferences::{Preferences, Theme};

/// Line-oriented front end over a [`GenerationRuntime`].
///
/// Every handler returns the lines to print; the caller owns the terminal.
pub struct CliApp {
    runtime: Arc<GenerationRuntime>,
    preferences: Preferences,
    pub should_exit: bool,
}

impl CliApp {
    pub fn new(runtime: Arc<GenerationRuntime>, preferences: Preferences) -> Self {
        Self {
            runtime,
            preferences,
            should_exit: false,
        }
    }

    pub fn runtime(&self) -> &Arc<GenerationRuntime> {
        &self.runtime
    }

    pub fn theme(&self) -> Theme {
        self.preferences.theme()
    }

    /// Handles one input line: a slash command, or text appended to the story.
    pub fn on_line(&mut self, line: &str) -> Vec<String> {
        let Some(command) = parse_slash_command(line) else {
            if !line.trim().is_empty() {
                self.runtime.lock_workbench().editor_mut().insert_text_at_end(line);
            }
            return Vec::new();
        };

        match command {
            SlashCommand::Generate => {
                let result = self.runtime.generate();
                self.describe_submission(result)
            }
            SlashCommand::Retry => {
                let result = self.runtime.retry();
                self.describe_submission(result)
            }
            SlashCommand::Cancel => match self.runtime.lock_workbench().cancel() {
                Ok(()) => vec!["Cancelled.".to_string()],
                Err(error) => vec![capitalize(&error.to_string())],
            },
            SlashCommand::Continue => match self.runtime.lock_workbench().continue_writing() {
                Ok(()) => vec!["Keep writing.".to_string()],
                Err(error) => vec![capitalize(&error.to_string())],
            },
            SlashCommand::Save => {
                let outcome = self.runtime.lock_workbench().save_story();
                vec![match outcome {
                    SaveOutcome::Created(id) => format!("Saved new story {id}"),
                    SaveOutcome::Updated(id) => format!("Updated story {id}"),
                    SaveOutcome::Skipped => "Nothing to save.".to_string(),
                }]
            }
            SlashCommand::Load(id) => {
                let mut workbench = self.runtime.lock_workbench();
                if workbench.load_story(&id) {
                    vec![workbench.editor().get_text()]
                } else {
                    vec![format!("No story with id {id}")]
                }
            }
            SlashCommand::New => {
                self.runtime.lock_workbench().new_story();
                vec!["Started a new story.".to_string()]
            }
            SlashCommand::Delete(id) => match self.runtime.lock_workbench().delete_story(&id) {
                Some(story) => vec![format!("Deleted \"{}\"", story.title)],
                None => vec![format!("No story with id {id}")],
            },
            SlashCommand::Stories => list_stories(&self.runtime.lock_workbench()),
            SlashCommand::History => list_history(&self.runtime.lock_workbench()),
            SlashCommand::ClearHistory => {
                self.runtime.lock_workbench().clear_history();
                vec!["History cleared.".to_string()]
            }
            SlashCommand::Show => {
                let text = self.runtime.lock_workbench().editor().get_text();
                if text.is_empty() {
                    vec!["(empty)".to_string()]
                } else {
                    vec![text]
                }
            }
            SlashCommand::Theme(requested) => self.on_theme(requested.as_deref()),
            SlashCommand::Help => vec![HELP_TEXT.to_string()],
            SlashCommand::Quit => {
                self.should_exit = true;
                Vec::new()
            }
            SlashCommand::MissingArgument(command) => {
                vec![format!("{command} needs a story id. See /stories.")]
            }
            SlashCommand::Unknown(command) => vec![format!("Unknown command: {command}")],
        }
    }

    /// Applies queued provider resolutions and reports the outcome.
    pub fn on_wake(&mut self) -> Vec<String> {
        if self.runtime.flush_pending_events() == 0 {
            return Vec::new();
        }

        describe_outcome(&self.runtime.lock_workbench())
    }

    /// Settles a generation still in flight once input has ended, so its
    /// reply is applied and recorded before the process exits.
    pub fn on_input_closed(&mut self, grace: Duration) -> Vec<String> {
        let pending = self.runtime.lock_workbench().state().status == GenerationStatus::Generating;
        if !self.runtime.wait_until_idle(grace) {
            tracing::warn!(grace_ms = grace.as_millis() as u64, "pending generation did not settle");
            return vec!["Gave up waiting for the pending reply.".to_string()];
        }

        if pending {
            describe_outcome(&self.runtime.lock_workbench())
        } else {
            Vec::new()
        }
    }

    fn describe_submission(&self, result: Result<(), TransitionError>) -> Vec<String> {
        if let Err(error) = result {
            return vec![capitalize(&error.to_string())];
        }

        let workbench = self.runtime.lock_workbench();
        match workbench.state().status {
            GenerationStatus::Generating => vec!["Generating...".to_string()],
            _ => describe_outcome(&workbench),
        }
    }

    fn on_theme(&mut self, requested: Option<&str>) -> Vec<String> {
        let theme = match requested {
            None => self.preferences.theme().toggled(),
            Some(value) => match value.parse::<Theme>() {
                Ok(theme) => theme,
                Err(error) => return vec![error],
            },
        };

        self.preferences.set_theme(theme);
        vec![format!("Theme: {theme}")]
    }
}

fn describe_outcome(workbench: &Workbench) -> Vec<String> {
    let state = workbench.state();
    match (state.status, &state.error) {
        (GenerationStatus::Success, _) => state
            .last_reply
            .iter()
            .map(|reply| format!("> {reply}"))
            .collect(),
        (GenerationStatus::Failure, Some(error)) => vec![
            format!("Error: {error}"),
            "Use /retry to try again or /cancel to dismiss.".to_string(),
        ],
        _ => Vec::new(),
    }
}

fn list_stories(workbench: &Workbench) -> Vec<String> {
    let stories = workbench.stories().list();
    if stories.is_empty() {
        return vec!["No saved stories.".to_string()];
    }

    let current = workbench.current_story_id();
    stories
        .iter()
        .map(|story| {
            let marker = if current == Some(story.id.as_str()) { '*' } else { ' ' };
            format!("{marker} {}  {}", story.id, story.title)
        })
        .collect()
}

fn list_history(workbench: &Workbench) -> Vec<String> {
    let history = workbench.history();
    if history.is_empty() {
        return vec!["No history yet.".to_string()];
    }

    history
        .entries()
        .map(|entry| {
            let label = match entry.kind {
                HistoryKind::User => "you",
                HistoryKind::Ai => "ai",
            };
            format!("[{label}] {}", entry.content.replace('\n', " "))
        })
        .collect()
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
