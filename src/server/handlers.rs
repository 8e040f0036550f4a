use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::{GenerationRequest, GenerationRequestBody};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `POST /generate-description`: validate the request, then stream one
/// event line per generated character followed by a single terminal line.
pub async fn generate_description(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let request = GenerationRequest::try_from(body)?;

    info!(
        title = %request.title,
        word_limit = request.word_limit,
        "accepted description request"
    );

    let events = state.generator.spawn(request);
    let lines = ReceiverStream::new(events)
        .map(|event| Ok::<_, Infallible>(Bytes::from(event.to_wire())));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(lines))
        .map_err(|e| ApiError::internal("failed to open description stream", e))
}
