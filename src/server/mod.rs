//! HTTP surface: the streaming description endpoint, a health probe and,
//! when a store is configured, the task CRUD/import/export/statistics routes.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod todos;

pub use error::ApiError;
pub use state::AppState;

use std::future::Future;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::Error;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-description", post(handlers::generate_description))
        .with_state(state.clone());

    if let Some(store) = state.store {
        app = app.merge(todos::routes(store));
    }

    app.layer(axum::middleware::from_fn(middleware::request_span))
        .layer(TraceLayer::new_for_http())
}

/// Serve the application on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| Error::config(format!("listener has no local address: {e}")))?;
    info!(%addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::transport(format!("server error: {e}")))
}
