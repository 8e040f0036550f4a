use crate::{ChatRequest, Error, Response};

/// A chat model that streams its answer back.
///
/// One instance is built at startup and shared by every request, so
/// implementations must not keep per-request mutable state.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// Open a streaming chat completion.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<Response, Error>;

    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;
}
