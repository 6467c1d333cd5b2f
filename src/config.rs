//! Environment configuration.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const PROVIDER_ENV_VAR: &str = "STORYLOOM_PROVIDER";
pub const CONFIG_PATH_ENV_VAR: &str = "STORYLOOM_CONFIG_PATH";
pub const DATA_DIR_ENV_VAR: &str = "STORYLOOM_DATA_DIR";
pub const DEFAULT_PROVIDER_ID: &str = "mock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("STORYLOOM_CONFIG_PATH must be set when STORYLOOM_PROVIDER={provider}")]
    MissingConfigPath { provider: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Startup configuration gathered from `STORYLOOM_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub provider: String,
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub system_instructions: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            provider: env_string_opt(PROVIDER_ENV_VAR)
                .map(|value| value.trim().to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_PROVIDER_ID.to_string()),
            config_path: env_string_opt(CONFIG_PATH_ENV_VAR).map(PathBuf::from),
            data_dir: env_string_opt(DATA_DIR_ENV_VAR).map(PathBuf::from),
            system_instructions: env_string_opt(crate::controller::SYSTEM_INSTRUCTIONS_ENV_VAR),
        }
    }

    /// Directory backing the key/value store: `STORYLOOM_DATA_DIR`, else
    /// `.storyloom` under `cwd`.
    pub fn data_root(&self, cwd: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| story_store::data_root(cwd))
    }

    /// Loads the relay file named by `STORYLOOM_CONFIG_PATH`.
    pub fn relay_file(&self) -> Result<RelayFileConfig, ConfigError> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingConfigPath {
                provider: self.provider.clone(),
            })?;
        RelayFileConfig::load(path)
    }
}

/// Relay provider settings read from a JSON file.
///
/// ```json
/// { "base_url": "http://127.0.0.1:3000", "api_key_env": "STORYLOOM_API_KEY",
///   "model": "gpt-4o-mini", "timeout_sec": 60 }
/// ```
///
/// Every field is optional; unknown fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayFileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

impl RelayFileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.timeout_sec == Some(0) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "timeout_sec must be > 0".to_string(),
            });
        }
        if config
            .api_key_env
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "api_key_env must not be empty".to_string(),
            });
        }

        Ok(config)
    }

    /// API key read from the variable named by `api_key_env`, if set.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env.as_deref().and_then(env_string_opt)
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_select_mock_and_cwd_data_root() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PROVIDER_ENV_VAR, None);
        let _g2 = set_env_guard(CONFIG_PATH_ENV_VAR, None);
        let _g3 = set_env_guard(DATA_DIR_ENV_VAR, None);

        let config = EnvConfig::from_env();
        assert_eq!(config.provider, DEFAULT_PROVIDER_ID);
        assert!(config.config_path.is_none());
        assert_eq!(
            config.data_root(Path::new("/work")),
            PathBuf::from("/work/.storyloom")
        );
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PROVIDER_ENV_VAR, Some(" Relay "));
        let _g2 = set_env_guard(CONFIG_PATH_ENV_VAR, Some("/etc/storyloom.json"));
        let _g3 = set_env_guard(DATA_DIR_ENV_VAR, Some("/var/lib/storyloom"));

        let config = EnvConfig::from_env();
        assert_eq!(config.provider, "relay");
        assert_eq!(
            config.config_path.as_deref(),
            Some(Path::new("/etc/storyloom.json"))
        );
        assert_eq!(
            config.data_root(Path::new("/work")),
            PathBuf::from("/var/lib/storyloom")
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let _lock = env_lock();
        let _g1 = set_env_guard(PROVIDER_ENV_VAR, Some("  "));
        let _g2 = set_env_guard(DATA_DIR_ENV_VAR, Some(""));

        let config = EnvConfig::from_env();
        assert_eq!(config.provider, DEFAULT_PROVIDER_ID);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn relay_file_requires_config_path() {
        let config = EnvConfig {
            provider: "relay".to_string(),
            config_path: None,
            data_dir: None,
            system_instructions: None,
        };

        let error = config.relay_file().expect_err("missing path should fail");
        assert!(matches!(error, ConfigError::MissingConfigPath { .. }));
        assert!(error.to_string().contains(CONFIG_PATH_ENV_VAR));
    }

    #[test]
    fn relay_file_parses_known_fields() {
        let parsed = RelayFileConfig::parse(
            Path::new("relay.json"),
            r#"{ "base_url": "http://localhost:3000", "model": "m", "timeout_sec": 30 }"#,
        )
        .expect("valid config");

        assert_eq!(parsed.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(parsed.model.as_deref(), Some("m"));
        assert_eq!(parsed.timeout_sec, Some(30));
        assert_eq!(parsed.api_key_env, None);
    }

    #[test]
    fn relay_file_rejects_unknown_fields_and_zero_timeout() {
        let unknown = RelayFileConfig::parse(Path::new("relay.json"), r#"{ "retries": 3 }"#);
        assert!(matches!(unknown, Err(ConfigError::Parse { .. })));

        let zero = RelayFileConfig::parse(Path::new("relay.json"), r#"{ "timeout_sec": 0 }"#);
        assert!(matches!(zero, Err(ConfigError::Invalid { ref message, .. }) if message.contains("timeout_sec")));
    }

    #[test]
    fn relay_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("relay.json");
        fs::write(&path, r#"{ "api_key_env": "STORYLOOM_TEST_RELAY_KEY" }"#).expect("write config");

        let _lock = env_lock();
        let _g1 = set_env_guard("STORYLOOM_TEST_RELAY_KEY", Some("sk-test"));

        let parsed = RelayFileConfig::load(&path).expect("config loads");
        assert_eq!(parsed.api_key().as_deref(), Some("sk-test"));

        let missing = RelayFileConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
