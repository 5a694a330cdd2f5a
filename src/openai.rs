//! OpenAI-compatible client configuration.

use crate::config::LlmSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint.
///
/// The API key is read from the environment variable named by
/// `settings.api_key_env`. A missing key is not an error here: requests will
/// fail and every caller degrades to its fallback text.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(&settings.api_key_env).unwrap_or_default();
    create_client_with_key(settings, &api_key)
}

/// Create a client with an explicit API key.
pub fn create_client_with_key(settings: &LlmSettings, api_key: &str) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
