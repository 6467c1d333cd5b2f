/// Default base URL for relay requests.
pub const DEFAULT_RELAY_BASE_URL: &str = "http://127.0.0.1:3000";

/// Path of the relay generation endpoint.
pub const RELAY_GENERATE_PATH: &str = "/api/generate";

/// Normalize a base URL to the relay generation endpoint.
///
/// Normalization rules:
/// 1) keep `/api/generate` unchanged
/// 2) append `/generate` when path ends in `/api`
/// 3) append `/api/generate` otherwise
pub fn normalize_relay_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_RELAY_BASE_URL
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(RELAY_GENERATE_PATH) {
        return trimmed.to_string();
    }
    if trimmed.ends_with("/api") {
        return format!("{trimmed}/generate");
    }
    format!("{trimmed}{RELAY_GENERATE_PATH}")
}
