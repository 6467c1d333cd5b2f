//! Line-oriented writing assistant front end.
//!
//! ## Provider bootstrap
//!
//! - `STORYLOOM_PROVIDER=mock` (default) for offline deterministic replies
//! - `STORYLOOM_PROVIDER=relay` for the HTTP completion relay
//!
//! When `STORYLOOM_PROVIDER=relay`, set `STORYLOOM_CONFIG_PATH` to a UTF-8
//! JSON file with this shape:
//!
//! ```json
//! {
//!   "base_url": "http://127.0.0.1:3000",
//!   "api_key_env": "STORYLOOM_API_KEY",
//!   "model": "gpt-4o-mini",
//!   "timeout_sec": 60
//! }
//! ```
//!
//! Contract notes:
//! - every field is optional; `base_url` defaults to the local relay.
//! - `timeout_sec` must be > 0 when provided. Without it no timeout applies.
//! - Unknown JSON fields are rejected.
//!
//! ## Storage
//!
//! History, stories and the theme preference are stored as one JSON file per
//! key under `STORYLOOM_DATA_DIR` (default `./.storyloom`).
//!
//! ## Logging
//!
//! Logs go to stderr, filtered by `STORYLOOM_LOG` or `RUST_LOG` (default
//! `warn`).

pub mod app;
pub mod commands;
pub mod preferences;
pub mod providers;
