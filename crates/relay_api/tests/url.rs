use relay_api::normalize_relay_url;
use relay_api::url::DEFAULT_RELAY_BASE_URL;

#[test]
fn url_normalization_keeps_existing_generate_endpoint() {
    assert_eq!(
        normalize_relay_url("https://relay.example.com/api/generate"),
        "https://relay.example.com/api/generate"
    );
}

#[test]
fn url_normalization_appends_generate_to_api_base() {
    assert_eq!(
        normalize_relay_url("https://relay.example.com/api/"),
        "https://relay.example.com/api/generate"
    );
}

#[test]
fn url_normalization_appends_full_path_to_generic_base() {
    assert_eq!(
        normalize_relay_url("https://relay.example.com"),
        "https://relay.example.com/api/generate"
    );
}

#[test]
fn url_normalization_uses_default_for_blank_input() {
    assert_eq!(
        normalize_relay_url("   "),
        format!("{DEFAULT_RELAY_BASE_URL}/api/generate")
    );
}
