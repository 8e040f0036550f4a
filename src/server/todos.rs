use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use crate::store::{
    export_csv, import_rows, parse_csv, validate_rows, ImportReport, TodoStats, TodoStore,
};
use crate::{Error, NewTodo, Todo, TodoPatch};

type Store = Arc<dyn TodoStore>;

pub fn routes(store: Store) -> Router {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/export", get(export_todos))
        .route("/todos/import", post(import_todos))
        .route("/todos/stats", get(todo_stats))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .with_state(store)
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

async fn list_todos(State(store): State<Store>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(store.list().await?))
}

async fn create_todo(
    State(store): State<Store>,
    payload: Result<Json<CreateTodoBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let body = json_body(payload)?;
    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err(Error::invalid_request("title must not be empty").into());
    }
    let description = body.description.as_deref().map(str::trim).unwrap_or_default();

    let todo = store.create(&NewTodo::new(title, description)).await?;
    info!(id = %todo.id, "task created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(store): State<Store>,
    Path(id): Path<String>,
    payload: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let mut patch = json_body(payload)?;
    if let Some(title) = patch.title.as_mut() {
        *title = title.trim().to_string();
        if title.is_empty() {
            return Err(Error::invalid_request("title must not be empty").into());
        }
    }
    if let Some(description) = patch.description.as_mut() {
        *description = description.trim().to_string();
    }

    Ok(Json(store.update(&id, &patch).await?))
}

async fn delete_todo(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    store.delete(&id).await?;
    info!(%id, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn export_todos(State(store): State<Store>) -> Result<Response, ApiError> {
    let todos = store.list().await?;
    let filename = format!("todos_{}.csv", Local::now().format("%Y-%m-%d"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        export_csv(&todos),
    )
        .into_response())
}

async fn import_todos(
    State(store): State<Store>,
    body: String,
) -> Result<Json<ImportReport>, ApiError> {
    let rows = parse_csv(&body)?;
    validate_rows(&rows)?;

    let report = import_rows(store.as_ref(), &rows).await;
    if report.succeeded == 0 {
        return Err(Error::store(format!("none of the {} rows could be imported", rows.len())).into());
    }
    Ok(Json(report))
}

async fn todo_stats(State(store): State<Store>) -> Result<Json<TodoStats>, ApiError> {
    let todos = store.list().await?;
    Ok(Json(TodoStats::compute(&todos, Local::now())))
}
