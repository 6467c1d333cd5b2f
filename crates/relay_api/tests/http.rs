use std::time::Duration;

use relay_api::{
    normalize_relay_url, RelayApiClient, RelayApiConfig, RelayApiError, RelayMessage,
    RelayRequest,
};
use serde_json::{json, Value};

fn sample_request() -> RelayRequest {
    RelayRequest::new(vec![
        RelayMessage::new("system", "Continue the story."),
        RelayMessage::new("user", "Once upon a time"),
    ])
}

#[test]
fn http_request_builds_relay_endpoint() {
    let config = RelayApiConfig::new("https://relay.example.com");
    let client = RelayApiClient::new(config).expect("client");

    let http_request = client
        .build_request(&sample_request())
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request.url().as_str(),
        normalize_relay_url("https://relay.example.com")
    );
    assert_eq!(http_request.method(), "POST");
    assert!(http_request.headers().get("authorization").is_none());
}

#[test]
fn http_request_carries_bearer_and_default_model() {
    let config = RelayApiConfig::new("https://relay.example.com/api")
        .with_api_key("sk-test")
        .with_model("writer-large")
        .with_timeout(Duration::from_secs(30));
    let client = RelayApiClient::new(config).expect("client");

    let http_request = client
        .build_request(&sample_request())
        .expect("build request")
        .build()
        .expect("request");

    assert_eq!(
        http_request
            .headers()
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer sk-test")
    );

    let body = http_request
        .body()
        .and_then(|body| body.as_bytes())
        .expect("json body is buffered");
    let payload: Value = serde_json::from_slice(body).expect("body is JSON");
    assert_eq!(
        payload,
        json!({
            "model": "writer-large",
            "messages": [
                { "role": "system", "content": "Continue the story." },
                { "role": "user", "content": "Once upon a time" }
            ]
        })
    );
}

#[test]
fn explicit_request_model_wins_over_config_default() {
    let config = RelayApiConfig::new("https://relay.example.com").with_model("default-model");
    let client = RelayApiClient::new(config).expect("client");
    let mut request = sample_request();
    request.model = Some("explicit".to_string());

    let http_request = client
        .build_request(&request)
        .expect("build request")
        .build()
        .expect("request");
    let payload: Value = serde_json::from_slice(
        http_request
            .body()
            .and_then(|body| body.as_bytes())
            .expect("json body is buffered"),
    )
    .expect("body is JSON");

    assert_eq!(payload["model"], "explicit");
}

#[test]
fn empty_message_list_is_rejected_before_sending() {
    let client = RelayApiClient::new(RelayApiConfig::default()).expect("client");
    let error = client
        .build_request(&RelayRequest::new(Vec::new()))
        .err()
        .expect("empty payload must fail");

    assert!(matches!(error, RelayApiError::Unknown(_)));
}

#[test]
fn unparseable_base_url_is_reported() {
    let client = RelayApiClient::new(RelayApiConfig::new("not a url")).expect("client");
    let error = client
        .build_request(&sample_request())
        .err()
        .expect("invalid base url must fail");

    assert!(matches!(error, RelayApiError::InvalidBaseUrl(_)));
}
