//! Types for streaming responses.

use crate::types::{FinishReason, Usage};

/// Events emitted by a provider while a completion streams in.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A chunk of content was received.
    ContentDelta { delta: String },
    /// The stream has finished.
    Done {
        finish_reason: FinishReason,
        usage: Option<Usage>,
    },
    /// The provider reported an error inside the stream.
    Error { error: String },
}
