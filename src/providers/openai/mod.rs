//! OpenAI-compatible Chat Completions provider (OpenAI, Hugging Face router, vLLM, ...).

pub mod client;
pub mod types;

pub use client::OpenAIProvider;
