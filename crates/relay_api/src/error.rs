use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum RelayApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    Unknown(String),
}

impl RelayApiError {
    /// Returns true when the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Request(error) => !error.is_builder(),
            _ => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status, _) => Some(*status),
            Self::Request(error) => error.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorPayload {
    Nested { error: ErrorPayloadFields },
    Flat { error: String },
    Message { message: String },
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayloadFields {
    pub message: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
}

impl ErrorPayloadFields {
    fn message_or_code(&self) -> Option<String> {
        self.message
            .as_deref()
            .and_then(non_empty_string)
            .or_else(|| self.code.as_deref().and_then(non_empty_string))
            .or_else(|| self.type_.as_deref().and_then(non_empty_string))
            .map(ToOwned::to_owned)
    }
}

impl fmt::Display for RelayApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {} {message}", status.as_u16()),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for RelayApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(error) => Some(error),
            Self::Serde(error) => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RelayApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for RelayApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

/// Extracts a human-readable message from an error response body.
///
/// Accepts `{"error":{"message":..}}`, `{"error":".."}` and `{"message":".."}`;
/// any other body yields the canonical status reason. Raw bodies are never
/// surfaced.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(|payload| match payload {
            ErrorPayload::Nested { error } => error.message_or_code(),
            ErrorPayload::Flat { error } => non_empty_string(&error).map(ToOwned::to_owned),
            ErrorPayload::Message { message } => non_empty_string(&message).map(ToOwned::to_owned),
        })
        .unwrap_or_else(|| canonical_reason(status))
}

/// Canonical reason phrase for `status`, e.g. `Bad Gateway`.
pub fn canonical_reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

fn non_empty_string(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
