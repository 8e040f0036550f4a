//! Backend for a task list with AI-written task descriptions.
//!
//! A [`DescriptionGenerator`] streams a chat completion from an
//! OpenAI-compatible provider, re-emits it one character at a time under a
//! character budget and finishes with a cleaned description. The
//! [`server`] module exposes that stream over HTTP as `data: <json>` lines,
//! and [`DescriptionClient`] consumes it incrementally. Tasks themselves are
//! persisted through a [`store::TodoStore`].

pub mod error;
pub mod types;
pub mod provider;
pub mod providers;
pub mod response;
pub mod frame_stream;
pub mod sse_stream;
pub mod accumulator;
pub mod cleaner;
pub mod generation;
pub mod consumer;
pub mod store;
pub mod factory;
pub mod config;
pub mod server;

// Re-export core types for easy usage
pub use error::Error;
pub use types::*;
pub use provider::ChatProvider;
pub use providers::*;
pub use response::*;
pub use sse_stream::SseEvent;
pub use accumulator::BudgetAccumulator;
pub use cleaner::clean_model_output;
pub use generation::{build_prompt, DescriptionGenerator, GENERATION_FAILED};
pub use consumer::{DescriptionClient, DescriptionDraft, DraftStatus};
pub use factory::{ProviderConfig, ProviderFactory};
