//! Generation lifecycle state machine.
//!
//! The controller is a reducer over [`GenerationEvent`]s plus provider
//! resolutions. It never performs I/O itself: issuing a call goes through a
//! [`CompletionHost`], replies are written to an [`EditorSurface`], and
//! history entries are appended to a [`HistoryLog`].

use std::fmt;

use completion_provider::{
    ChatMessage, CompletionResponse, ProviderFailure, RequestId,
};
use story_store::{HistoryKind, HistoryLog};
use tracing::{debug, warn};

use crate::editor::EditorSurface;
use crate::error::{classify_failure, GenerationError, GenerationEvent, StartError, TransitionError};

pub const SYSTEM_INSTRUCTIONS_ENV_VAR: &str = "STORYLOOM_SYSTEM_INSTRUCTIONS";
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str =
    "You are a creative writing assistant. Continue the user's story in the same voice, tense and style. Reply with the continuation only, without commentary.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Success,
    Failure,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Success => "success",
            Self::Failure => "failure",
        })
    }
}

/// Observable controller state.
///
/// `error` is `Some` only while `status` is [`GenerationStatus::Failure`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub status: GenerationStatus,
    pub error: Option<GenerationError>,
    pub last_reply: Option<String>,
}

/// Effect executor for provider calls.
///
/// Implementations start the call without blocking and later hand the
/// resolution back through [`GenerationController::on_completion_resolved`]
/// with the returned id.
pub trait CompletionHost {
    fn start_completion(&mut self, messages: Vec<ChatMessage>) -> Result<RequestId, StartError>;
}

pub fn system_instructions_from_env() -> String {
    let from_env = std::env::var(SYSTEM_INSTRUCTIONS_ENV_VAR).ok();
    sanitize_system_instructions(from_env)
}

fn sanitize_system_instructions(raw: Option<String>) -> String {
    let Some(value) = raw else {
        return DEFAULT_SYSTEM_INSTRUCTIONS.to_string();
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        DEFAULT_SYSTEM_INSTRUCTIONS.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationController {
    state: GenerationState,
    in_flight: Option<RequestId>,
    last_messages: Option<Vec<ChatMessage>>,
    system_instructions: String,
}

impl Default for GenerationController {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationController {
    pub fn new() -> Self {
        Self::with_system_instructions(None)
    }

    pub fn with_system_instructions(system_instructions: Option<String>) -> Self {
        Self {
            state: GenerationState::default(),
            in_flight: None,
            last_messages: None,
            system_instructions: sanitize_system_instructions(system_instructions),
        }
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn status(&self) -> GenerationStatus {
        self.state.status
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    /// Message list of the most recent attempt, replayed verbatim by retry.
    pub fn last_messages(&self) -> Option<&[ChatMessage]> {
        self.last_messages.as_deref()
    }

    /// Builds the provider message list for the current editor text.
    pub fn build_messages(&self, text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system_instructions.clone()),
            ChatMessage::user(text),
        ]
    }

    /// Handles a `GENERATE` request.
    ///
    /// Accepted from every status but `generating`. From `success` the
    /// controller passes through `idle` first. Empty editor text ends the
    /// attempt in `failure` without contacting the host.
    pub fn on_generate(
        &mut self,
        editor: &dyn EditorSurface,
        history: &mut HistoryLog,
        host: &mut dyn CompletionHost,
    ) -> Result<(), TransitionError> {
        if self.state.status == GenerationStatus::Generating {
            debug!(request_id = ?self.in_flight, "generate rejected while in flight");
            return Err(TransitionError::AlreadyGenerating);
        }

        let previous = self.state.status;
        if previous == GenerationStatus::Success {
            self.on_continue()?;
        }

        let result = self.submit_editor_text(editor, history, host);
        if result.is_err() && self.state.status != previous {
            self.transition(previous);
        }
        result
    }

    /// Handles `CONTINUE`: acknowledges a reply and returns to `idle`.
    pub fn on_continue(&mut self) -> Result<(), TransitionError> {
        self.require(GenerationStatus::Success, GenerationEvent::Continue)?;
        self.transition(GenerationStatus::Idle);
        Ok(())
    }

    /// Handles `RETRY` from `failure`.
    ///
    /// Re-issues the exact message list of the failed attempt. When the failed
    /// attempt never produced one (empty editor), the editor is read again as
    /// for a fresh generate.
    pub fn on_retry(
        &mut self,
        editor: &dyn EditorSurface,
        history: &mut HistoryLog,
        host: &mut dyn CompletionHost,
    ) -> Result<(), TransitionError> {
        self.require(GenerationStatus::Failure, GenerationEvent::Retry)?;

        match self.last_messages.clone() {
            Some(messages) => self.issue(messages, host).map(|_| ()),
            None => self.submit_editor_text(editor, history, host),
        }
    }

    /// Handles `CANCEL` from `failure`; `last_reply` is preserved.
    pub fn on_cancel(&mut self) -> Result<(), TransitionError> {
        self.require(GenerationStatus::Failure, GenerationEvent::Cancel)?;
        self.state.error = None;
        self.transition(GenerationStatus::Idle);
        Ok(())
    }

    /// Applies the resolution of a provider call.
    ///
    /// Returns `false` when the resolution is stale (not the in-flight
    /// request) and was ignored.
    pub fn on_completion_resolved(
        &mut self,
        request_id: RequestId,
        outcome: Result<CompletionResponse, ProviderFailure>,
        editor: &mut dyn EditorSurface,
        history: &mut HistoryLog,
    ) -> bool {
        if self.state.status != GenerationStatus::Generating || self.in_flight != Some(request_id)
        {
            debug!(
                request_id,
                in_flight = ?self.in_flight,
                status = %self.state.status,
                "ignoring stale completion"
            );
            return false;
        }

        self.in_flight = None;

        let reply = outcome.map_err(classify_failure).and_then(|response| {
            response
                .reply_text()
                .ok_or(GenerationError::MalformedResponse)
        });

        match reply {
            Ok(text) => {
                editor.insert_text_at_end(&text);
                history.append(HistoryKind::Ai, &text);
                self.state.last_reply = Some(text);
                self.transition(GenerationStatus::Success);
            }
            Err(error) => {
                warn!(request_id, kind = error.kind(), error = %error, "generation failed");
                self.fail(error);
            }
        }

        true
    }

    fn submit_editor_text(
        &mut self,
        editor: &dyn EditorSurface,
        history: &mut HistoryLog,
        host: &mut dyn CompletionHost,
    ) -> Result<(), TransitionError> {
        let text = editor.get_text();
        if text.trim().is_empty() {
            self.last_messages = None;
            self.fail(GenerationError::UserInput);
            return Ok(());
        }

        let messages = self.build_messages(&text);
        if self.issue(messages, host)? {
            history.append(HistoryKind::User, &text);
        }
        Ok(())
    }

    /// Enters `generating` and starts one call. Returns whether a call was
    /// actually started.
    fn issue(
        &mut self,
        messages: Vec<ChatMessage>,
        host: &mut dyn CompletionHost,
    ) -> Result<bool, TransitionError> {
        match host.start_completion(messages.clone()) {
            Ok(request_id) => {
                self.last_messages = Some(messages);
                self.in_flight = Some(request_id);
                self.state.error = None;
                self.transition(GenerationStatus::Generating);
                debug!(request_id, "completion issued");
                Ok(true)
            }
            Err(StartError::AlreadyInFlight) => Err(TransitionError::AlreadyGenerating),
            Err(error @ StartError::Spawn(_)) => {
                self.last_messages = Some(messages);
                self.fail(GenerationError::Unknown(error.to_string()));
                Ok(false)
            }
        }
    }

    fn fail(&mut self, error: GenerationError) {
        self.state.error = Some(error);
        self.transition(GenerationStatus::Failure);
    }

    fn require(
        &self,
        expected: GenerationStatus,
        event: GenerationEvent,
    ) -> Result<(), TransitionError> {
        if self.state.status == expected {
            return Ok(());
        }

        if self.state.status == GenerationStatus::Generating {
            return Err(TransitionError::AlreadyGenerating);
        }

        Err(TransitionError::NotAllowed {
            from: self.state.status,
            event,
        })
    }

    fn transition(&mut self, to: GenerationStatus) {
        debug!(from = %self.state.status, to = %to, "generation state transition");
        self.state.status = to;
    }
}
