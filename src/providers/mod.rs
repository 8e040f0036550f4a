//! Provider implementations for model services.

pub mod openai;

pub use openai::OpenAIProvider;
