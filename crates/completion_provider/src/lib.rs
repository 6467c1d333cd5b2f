//! Minimal provider-agnostic contract for a single text-completion call.
//!
//! This crate defines only the request/response/failure shapes shared by the
//! generation controller and provider adapters. It excludes transport details,
//! relay payloads, and any lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier for one provider call.
pub type RequestId = u64;

/// Error returned while constructing/configuring a provider before any call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Author of one message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// Provider-neutral message item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Input required to issue one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub request_id: RequestId,
    pub messages: Vec<ChatMessage>,
}

/// Successful provider response body.
///
/// A success status does not guarantee usable text; callers must go through
/// [`CompletionResponse::reply_text`] and treat `None` as a malformed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    body: Value,
}

impl CompletionResponse {
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// Wraps a bare reply string in the flat `{"content": ...}` shape.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(serde_json::json!({ "content": text.into() }))
    }

    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Extracts reply text from the response shapes relays commonly return.
    ///
    /// Checked in order: chat completions (`choices[0].message.content`),
    /// legacy completions (`choices[0].text`), content blocks
    /// (`content[].text`, concatenated), then flat `content`, `text` or
    /// `reply` strings. Empty text counts as absent.
    #[must_use]
    pub fn reply_text(&self) -> Option<String> {
        let first_choice = self.body.get("choices").and_then(|choices| choices.get(0));

        first_choice
            .and_then(|choice| choice.pointer("/message/content"))
            .and_then(non_empty_text)
            .or_else(|| first_choice.and_then(|choice| choice.get("text")).and_then(non_empty_text))
            .or_else(|| content_blocks_text(&self.body))
            .or_else(|| {
                ["content", "text", "reply"]
                    .iter()
                    .find_map(|field| self.body.get(field).and_then(non_empty_text))
            })
    }
}

fn non_empty_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
}

fn content_blocks_text(body: &Value) -> Option<String> {
    let blocks = body.get("content")?.as_array()?;
    let text = blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<String>();

    (!text.is_empty()).then_some(text)
}

/// Failure reported by a provider for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Provider unreachable, or the request aborted before any response.
    Network { message: String },
    /// Provider answered with a non-success status.
    Http {
        status: u16,
        message: Option<String>,
    },
    /// Provider answered with a success status but an unreadable body.
    MalformedBody { message: String },
    /// Anything not classifiable above.
    Other { message: String },
}

impl ProviderFailure {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn http(status: u16, message: Option<String>) -> Self {
        Self::Http { status, message }
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { message } => write!(f, "network error: {message}"),
            Self::Http {
                status,
                message: Some(message),
            } => write!(f, "HTTP {status}: {message}"),
            Self::Http {
                status,
                message: None,
            } => write!(f, "HTTP {status}"),
            Self::MalformedBody { message } => write!(f, "malformed response body: {message}"),
            Self::Other { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ProviderFailure {}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for executing one completion call.
///
/// `complete` blocks the calling thread until the provider resolves; callers
/// that need responsiveness run it off their own thread.
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Executes one completion request.
    fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderFailure>;
}
