use std::time::Duration;

use crate::url::DEFAULT_RELAY_BASE_URL;

/// Transport configuration for relay requests.
#[derive(Debug, Clone)]
pub struct RelayApiConfig {
    /// Base URL of the relay; normalized to the generation endpoint.
    pub base_url: String,
    /// Optional bearer token passed to `Authorization`.
    pub api_key: Option<String>,
    /// Optional model identifier forwarded to the vendor.
    pub model: Option<String>,
    /// Optional request timeout. No timeout applies when unset.
    pub timeout: Option<Duration>,
}

impl Default for RelayApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELAY_BASE_URL.to_string(),
            api_key: None,
            model: None,
            timeout: None,
        }
    }
}

impl RelayApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
