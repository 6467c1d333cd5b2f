//! Relay-backed implementation of the shared `completion_provider` contract.
//!
//! This adapter translates `relay_api` transport outcomes into the
//! provider-neutral success/failure shapes expected by `storyloom`.

use std::sync::Arc;
use std::time::Duration;

use completion_provider::{
    ChatMessage, ChatRole, CompletionProvider, CompletionRequest, CompletionResponse,
    ProviderFailure, ProviderInitError, ProviderProfile,
};
use relay_api::{RelayApiClient, RelayApiConfig, RelayApiError, RelayMessage, RelayRequest};
use serde_json::Value;

pub use relay_api::url::DEFAULT_RELAY_BASE_URL;

/// Stable provider identifier used by startup selection.
pub const RELAY_PROVIDER_ID: &str = "relay";

/// Model label reported when the relay picks the vendor model itself.
pub const RELAY_DEFAULT_MODEL_LABEL: &str = "relay-default";

/// Runtime configuration for the relay provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout: Option<Duration>,
}

impl RelayProviderConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_relay_api_config(self) -> RelayApiConfig {
        let mut config = RelayApiConfig::new(self.base_url);

        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }

        if let Some(model) = self.model {
            config = config.with_model(model);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait RelayClient: Send + Sync {
    fn send(&self, request: &RelayRequest) -> Result<Value, RelayApiError>;
}

#[derive(Debug)]
struct DefaultRelayClient {
    client: RelayApiClient,
}

impl RelayClient for DefaultRelayClient {
    fn send(&self, request: &RelayRequest) -> Result<Value, RelayApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                RelayApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.send(request))
    }
}

/// `CompletionProvider` adapter backed by `relay_api` transport primitives.
pub struct RelayProvider {
    model_label: String,
    client: Arc<dyn RelayClient>,
}

impl RelayProvider {
    /// Creates a provider using real relay transport.
    pub fn new(config: RelayProviderConfig) -> Result<Self, ProviderInitError> {
        let model_label = model_label(config.model.as_deref());
        let client = Arc::new(DefaultRelayClient {
            client: RelayApiClient::new(config.into_relay_api_config()).map_err(map_init_error)?,
        });

        Ok(Self {
            model_label,
            client,
        })
    }

    #[cfg(test)]
    fn with_client_for_tests(model: Option<&str>, client: Arc<dyn RelayClient>) -> Self {
        Self {
            model_label: model_label(model),
            client,
        }
    }
}

impl CompletionProvider for RelayProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: RELAY_PROVIDER_ID.to_string(),
            model_id: self.model_label.clone(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderFailure> {
        let request_id = request.request_id;
        let relay_request = RelayRequest::new(
            request
                .messages
                .iter()
                .map(relay_message)
                .collect::<Vec<_>>(),
        );

        match self.client.send(&relay_request) {
            Ok(body) => Ok(CompletionResponse::new(body)),
            Err(error) => {
                tracing::warn!(request_id, error = %error, "relay request failed");
                Err(classify_relay_error(error))
            }
        }
    }
}

fn relay_message(message: &ChatMessage) -> RelayMessage {
    let role = match message.role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    };
    RelayMessage::new(role, message.content.clone())
}

fn classify_relay_error(error: RelayApiError) -> ProviderFailure {
    if error.is_transport() {
        return ProviderFailure::network(error.to_string());
    }

    match error {
        RelayApiError::Status(status, message) => {
            ProviderFailure::http(status.as_u16(), Some(message).filter(|m| !m.is_empty()))
        }
        RelayApiError::Serde(error) => ProviderFailure::MalformedBody {
            message: error.to_string(),
        },
        other => ProviderFailure::other(other.to_string()),
    }
}

fn model_label(model: Option<&str>) -> String {
    model
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(RELAY_DEFAULT_MODEL_LABEL)
        .to_string()
}

fn map_init_error(error: RelayApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize relay provider: {error}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use relay_api::error::parse_error_message;
    use serde_json::json;

    use super::*;

    struct FakeRelayClient {
        observed: Mutex<Vec<RelayRequest>>,
        outcome: Mutex<Option<Result<Value, RelayApiError>>>,
    }

    impl FakeRelayClient {
        fn new(outcome: Result<Value, RelayApiError>) -> Arc<Self> {
            Arc::new(Self {
                observed: Mutex::new(Vec::new()),
                outcome: Mutex::new(Some(outcome)),
            })
        }

        fn observed(&self) -> MutexGuard<'_, Vec<RelayRequest>> {
            self.observed.lock().expect("observed lock")
        }
    }

    impl RelayClient for FakeRelayClient {
        fn send(&self, request: &RelayRequest) -> Result<Value, RelayApiError> {
            self.observed().push(request.clone());
            self.outcome
                .lock()
                .expect("outcome lock")
                .take()
                .unwrap_or_else(|| Err(RelayApiError::Unknown("no scripted outcome".to_string())))
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            request_id: 9,
            messages: vec![
                ChatMessage::system("Continue the story."),
                ChatMessage::user("Once upon a time"),
            ],
        }
    }

    #[test]
    fn success_body_is_passed_through_for_text_extraction() {
        let client = FakeRelayClient::new(Ok(json!({
            "choices": [{ "message": { "content": "the hero arrived." } }]
        })));
        let provider = RelayProvider::with_client_for_tests(None, client.clone());

        let response = provider.complete(request()).expect("success");

        assert_eq!(response.reply_text().as_deref(), Some("the hero arrived."));
        let observed = client.observed();
        assert_eq!(observed.len(), 1);
        assert_eq!(
            observed[0].messages,
            vec![
                RelayMessage::new("system", "Continue the story."),
                RelayMessage::new("user", "Once upon a time"),
            ]
        );
    }

    #[test]
    fn status_errors_become_http_failures_with_message() {
        let status = relay_api::StatusCode::UNAUTHORIZED;
        let message = parse_error_message(status, r#"{"error":{"message":"Invalid API key"}}"#);
        let client = FakeRelayClient::new(Err(RelayApiError::Status(status, message)));
        let provider = RelayProvider::with_client_for_tests(None, client);

        let failure = provider.complete(request()).err().expect("failure");

        assert_eq!(
            failure,
            ProviderFailure::http(401, Some("Invalid API key".to_string()))
        );
    }

    #[test]
    fn unparseable_success_body_becomes_malformed_failure() {
        let serde_error =
            serde_json::from_str::<Value>("not json").expect_err("input is not JSON");
        let client = FakeRelayClient::new(Err(RelayApiError::Serde(serde_error)));
        let provider = RelayProvider::with_client_for_tests(None, client);

        let failure = provider.complete(request()).err().expect("failure");

        assert!(matches!(failure, ProviderFailure::MalformedBody { .. }));
    }

    #[test]
    fn other_transport_errors_are_unclassified() {
        let client = FakeRelayClient::new(Err(RelayApiError::InvalidBaseUrl("nope".to_string())));
        let provider = RelayProvider::with_client_for_tests(None, client);

        let failure = provider.complete(request()).err().expect("failure");

        assert_eq!(
            failure,
            ProviderFailure::other("invalid base URL: nope".to_string())
        );
    }

    #[test]
    fn unreachable_relay_is_a_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind local port");
        let addr = listener.local_addr().expect("local address");
        drop(listener);

        let provider = RelayProvider::new(RelayProviderConfig::new(format!("http://{addr}")))
            .expect("provider initializes");
        let failure = provider.complete(request()).err().expect("failure");

        assert!(
            matches!(failure, ProviderFailure::Network { .. }),
            "unexpected failure: {failure}"
        );
    }

    #[test]
    fn profile_reports_configured_or_default_model() {
        let client = FakeRelayClient::new(Ok(json!({})));
        let configured = RelayProvider::with_client_for_tests(Some(" writer-large "), client.clone());
        assert_eq!(configured.profile().model_id, "writer-large");
        assert_eq!(configured.profile().provider_id, RELAY_PROVIDER_ID);

        let defaulted = RelayProvider::with_client_for_tests(Some("  "), client);
        assert_eq!(defaulted.profile().model_id, RELAY_DEFAULT_MODEL_LABEL);
    }
}
