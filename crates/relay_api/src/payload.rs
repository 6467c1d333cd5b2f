use serde::{Deserialize, Serialize};

/// One message in the relay payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub role: String,
    pub content: String,
}

impl RelayMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Canonical request payload for the relay generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<RelayMessage>,
}

impl RelayRequest {
    pub fn new(messages: Vec<RelayMessage>) -> Self {
        Self {
            model: None,
            messages,
        }
    }
}
