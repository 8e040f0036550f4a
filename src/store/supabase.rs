use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::debug;

use super::TodoStore;
use crate::{Error, NewTodo, Todo, TodoPatch};

const TABLE: &str = "todos";

/// [`TodoStore`] backed by the Supabase REST (PostgREST) API.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct PatchWithTimestamp<'a> {
    #[serde(flatten)]
    patch: &'a TodoPatch,
    updated_at: chrono::DateTime<Utc>,
}

impl SupabaseStore {
    pub fn new(base_url: String, api_key: String) -> Result<Self, Error> {
        if base_url.trim().is_empty() {
            return Err(Error::config("Supabase URL must not be empty"));
        }

        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into a store error naming the operation.
    async fn check(operation: &str, response: Response) -> Result<Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(Error::store(format!("{operation} failed ({status}): {body}")))
    }

    async fn single_row(operation: &str, response: Response) -> Result<Todo, Error> {
        let rows: Vec<Todo> = Self::check(operation, response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::store(format!("{operation} failed: no row returned")))
    }
}

#[async_trait::async_trait]
impl TodoStore for SupabaseStore {
    async fn list(&self) -> Result<Vec<Todo>, Error> {
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        let todos: Vec<Todo> = Self::check("list todos", response).await?.json().await?;
        debug!(count = todos.len(), "loaded todos");
        Ok(todos)
    }

    async fn create(&self, todo: &NewTodo) -> Result<Todo, Error> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&[todo])
            .send()
            .await?;

        Self::single_row("create todo", response).await
    }

    async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, Error> {
        let body = PatchWithTimestamp {
            patch,
            updated_at: Utc::now(),
        };
        let response = self
            .authorized(self.client.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        Self::single_row("update todo", response).await
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let response = self
            .authorized(self.client.delete(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        Self::check("delete todo", response).await?;
        Ok(())
    }
}
