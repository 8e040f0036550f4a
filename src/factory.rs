use crate::provider::ChatProvider;
use crate::{Error, OpenAIProvider};
use std::env;
use std::sync::Arc;

/// Default OpenAI-compatible router used for description generation.
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Configuration for creating the chat provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `HF_TOKEN` (or `OPENAI_API_KEY`) supplies the credential and
    /// `PROVIDER_BASE_URL` overrides the router address.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = env::var("HF_TOKEN")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                Error::config("HF_TOKEN or OPENAI_API_KEY environment variable is required")
            })?;
        let base_url = env::var("PROVIDER_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self::new(base_url, api_key))
    }
}

/// Factory for the shared provider handle.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the provider once; the returned handle is shared by all requests.
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn ChatProvider>, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::config("provider API key must not be empty"));
        }
        let provider =
            OpenAIProvider::new_with_base_url(config.api_key.clone(), config.base_url.clone())?;
        Ok(Arc::new(provider))
    }

    /// Create the provider from environment variables.
    pub fn from_env() -> Result<Arc<dyn ChatProvider>, Error> {
        Self::create(&ProviderConfig::from_env()?)
    }
}
