use thiserror::Error;

/// Errors that can occur across the generation pipeline and the todo store.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed input, rejected before any external call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Streaming error: {0}")]
    Streaming(String),

    /// The generation endpoint reported a terminal error event.
    #[error("Generation failed: {0}")]
    Upstream(String),

    /// The generation endpoint could not be reached or answered with a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single protocol line could not be decoded.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Import error: {0}")]
    Import(String),
}

impl Error {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Error::InvalidRequest(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into())
    }

    pub fn malformed_event(message: impl Into<String>) -> Self {
        Error::MalformedEvent(message.into())
    }

    pub fn store(message: impl Into<String>) -> Self {
        Error::Store(message.into())
    }

    pub fn import(message: impl Into<String>) -> Self {
        Error::Import(message.into())
    }
}
