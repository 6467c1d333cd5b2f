//! Transport-only client for the completion relay.
//!
//! This crate owns request building, sending, and error parsing for the relay
//! endpoint only. It contains no lifecycle state, no retry policy, and no
//! knowledge of how reply text is extracted from a successful body.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::RelayApiClient;
pub use config::RelayApiConfig;
pub use error::RelayApiError;
pub use payload::{RelayMessage, RelayRequest};
pub use reqwest::StatusCode;
pub use url::normalize_relay_url;
