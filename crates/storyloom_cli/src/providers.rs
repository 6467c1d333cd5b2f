use std::sync::Arc;
use std::time::Duration;

use completion_provider::CompletionProvider;
use completion_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use completion_provider_relay::{
    RelayProvider, RelayProviderConfig, DEFAULT_RELAY_BASE_URL, RELAY_PROVIDER_ID,
};
use storyloom::config::{EnvConfig, RelayFileConfig};

pub fn provider_from_config(config: &EnvConfig) -> Result<Arc<dyn CompletionProvider>, String> {
    match config.provider.as_str() {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        RELAY_PROVIDER_ID => {
            let file = config.relay_file().map_err(|error| error.to_string())?;
            relay_provider(&file)
        }
        unknown => Err(format!(
            "Unsupported provider '{unknown}'. Available providers: {MOCK_PROVIDER_ID}, {RELAY_PROVIDER_ID}"
        )),
    }
}

pub fn relay_provider(file: &RelayFileConfig) -> Result<Arc<dyn CompletionProvider>, String> {
    let mut config = RelayProviderConfig::new(
        file.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_RELAY_BASE_URL.to_string()),
    );

    if let Some(api_key) = file.api_key() {
        config = config.with_api_key(api_key);
    } else if let Some(name) = file.api_key_env.as_deref() {
        tracing::warn!(variable = name, "api key variable is unset; sending without credentials");
    }

    if let Some(model) = file.model.as_deref() {
        config = config.with_model(model);
    }

    if let Some(timeout_sec) = file.timeout_sec {
        config = config.with_timeout(Duration::from_secs(timeout_sec));
    }

    let provider = RelayProvider::new(config).map_err(|error| error.to_string())?;
    Ok(Arc::new(provider))
}
