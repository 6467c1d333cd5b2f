//! Generation error taxonomy and provider-failure classification.

use std::fmt;

use completion_provider::ProviderFailure;
use thiserror::Error;

use crate::controller::GenerationStatus;

/// Classified reason a generation attempt ended in `failure`.
///
/// `Display` renders the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Text submitted for generation was empty or whitespace-only.
    #[error("Write something before asking for a continuation.")]
    UserInput,

    /// Provider unreachable, or the request aborted before a response.
    #[error("Could not reach the completion service: {message}")]
    Network { message: String },

    /// Provider answered with a non-success status.
    #[error("{}", describe_http(.status, .message))]
    Http {
        status: u16,
        message: Option<String>,
    },

    /// Provider answered with success but no reply text could be extracted.
    #[error("The completion service returned no text.")]
    MalformedResponse,

    /// Anything not classifiable above.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl GenerationError {
    /// Stable short name of the error class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserInput => "user_input",
            Self::Network { .. } => "network",
            Self::Http { .. } => "http",
            Self::MalformedResponse => "malformed_response",
            Self::Unknown(_) => "unknown",
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe_http(status: &u16, message: &Option<String>) -> String {
    let status = *status;
    let summary = match status {
        401 | 403 => format!(
            "The completion service rejected the credentials (HTTP {status}). Check the API key."
        ),
        429 => "The completion service is rate limiting requests (HTTP 429). Wait a moment, then retry."
            .to_string(),
        500..=599 => format!("The completion service failed (HTTP {status})."),
        _ => format!("The completion service returned HTTP {status}."),
    };

    match message.as_deref().map(str::trim).filter(|message| !message.is_empty()) {
        Some(message) => format!("{summary} {message}"),
        None => summary,
    }
}

/// Maps a provider failure onto the generation error taxonomy.
#[must_use]
pub fn classify_failure(failure: ProviderFailure) -> GenerationError {
    match failure {
        ProviderFailure::Network { message } => GenerationError::Network { message },
        ProviderFailure::Http { status, message } => GenerationError::Http { status, message },
        ProviderFailure::MalformedBody { .. } => GenerationError::MalformedResponse,
        ProviderFailure::Other { message } => GenerationError::Unknown(message),
    }
}

/// Controller event, as named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationEvent {
    Generate,
    Continue,
    Retry,
    Cancel,
}

impl fmt::Display for GenerationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generate => "generate",
            Self::Continue => "continue",
            Self::Retry => "retry",
            Self::Cancel => "cancel",
        })
    }
}

/// Event rejected by the controller; state is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("a generation request is already in flight")]
    AlreadyGenerating,

    #[error("cannot {event} while {from}")]
    NotAllowed {
        from: GenerationStatus,
        event: GenerationEvent,
    },
}

/// Reason a host could not start a provider call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("a completion request is already in flight")]
    AlreadyInFlight,

    #[error("failed to start completion worker: {0}")]
    Spawn(String),
}
