use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Run each request inside a span tagged with a fresh request id.
///
/// Generation tasks spawned by a handler inherit the span, so their log
/// lines carry the same id until the stream ends.
pub async fn request_span(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let span = tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    );

    async move {
        let response = next.run(request).await;
        tracing::debug!(status = %response.status(), "response headers sent");
        response
    }
    .instrument(span)
    .await
}
