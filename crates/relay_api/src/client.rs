use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;

use crate::config::RelayApiConfig;
use crate::error::{canonical_reason, parse_error_message, RelayApiError};
use crate::headers::build_headers;
use crate::payload::RelayRequest;
use crate::url::normalize_relay_url;

#[derive(Debug)]
pub struct RelayApiClient {
    http: Client,
    config: RelayApiConfig,
}

impl RelayApiClient {
    pub fn new(config: RelayApiConfig) -> Result<Self, RelayApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(RelayApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RelayApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_relay_url(&self.config.base_url)
    }

    pub fn build_headers(&self) -> Result<HeaderMap, RelayApiError> {
        let mut out = HeaderMap::new();
        for (key, value) in build_headers(&self.config) {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| RelayApiError::InvalidHeader(format!("invalid header key: {key}")))?,
                HeaderValue::from_str(&value).map_err(|_| {
                    RelayApiError::InvalidHeader(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &RelayRequest,
    ) -> Result<reqwest::RequestBuilder, RelayApiError> {
        validate_request_payload(request)?;

        let endpoint = self.normalized_endpoint();
        reqwest::Url::parse(&endpoint)
            .map_err(|error| RelayApiError::InvalidBaseUrl(format!("{endpoint}: {error}")))?;

        let headers = self.build_headers()?;
        let payload = self.request_with_transport_defaults(request);
        Ok(self.http.post(endpoint).headers(headers).json(&payload))
    }

    fn request_with_transport_defaults(&self, request: &RelayRequest) -> RelayRequest {
        let mut payload = request.clone();
        if payload.model.is_none() {
            payload.model = self
                .config
                .model
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned);
        }
        payload
    }

    /// Sends one request and returns the parsed JSON body of a success response.
    ///
    /// Exactly one HTTP attempt is made; retry is left to the caller.
    pub async fn send(&self, request: &RelayRequest) -> Result<Value, RelayApiError> {
        let endpoint = self.normalized_endpoint();
        tracing::debug!(
            endpoint = %endpoint,
            messages = request.messages.len(),
            "sending relay request"
        );

        let response = self.build_request(request)?.send().await?;
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(error) if !status.is_success() => {
                tracing::warn!(status = status.as_u16(), %error, "relay error body unreadable");
                return Err(RelayApiError::Status(status, canonical_reason(status)));
            }
            Err(error) => {
                return Err(RelayApiError::Unknown(format!(
                    "failed to read response body: {error}"
                )));
            }
        };

        if !status.is_success() {
            let message = parse_error_message(status, &body);
            tracing::warn!(status = status.as_u16(), %message, "relay returned error status");
            return Err(RelayApiError::Status(status, message));
        }

        Ok(serde_json::from_str::<Value>(&body)?)
    }
}

fn validate_request_payload(request: &RelayRequest) -> Result<(), RelayApiError> {
    if request.messages.is_empty() {
        return Err(RelayApiError::Unknown(
            "relay request must contain at least one message".to_string(),
        ));
    }

    Ok(())
}
