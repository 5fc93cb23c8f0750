//! OpenAI client configuration with sensible defaults.

use crate::config::GenerationSettings;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Shared client type for chat and embedding calls.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Create an OpenAI client from generation settings.
///
/// The API key and base URL are resolved here; a missing key still yields a
/// client so callers can report the problem per request.
pub fn create_client(settings: &GenerationSettings) -> Result<OpenAIClient> {
    let timeout = if settings.timeout_seconds == 0 {
        DEFAULT_TIMEOUT_SECS
    } else {
        settings.timeout_seconds
    };

    let mut config = OpenAIConfig::new();
    if let Some(key) = settings.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(timeout))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(config: OpenAIConfig, timeout: Duration) -> Result<OpenAIClient> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
