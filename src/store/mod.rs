//! Persistence of tasks in a hosted row store, plus CSV import/export and
//! statistics over the stored rows.

pub mod csv;
pub mod stats;
pub mod supabase;

pub use self::csv::{export_csv, import_rows, parse_csv, validate_rows, ImportReport};
pub use stats::{DayBucket, TodoStats};
pub use supabase::SupabaseStore;

use crate::{Error, NewTodo, Todo, TodoPatch};

/// Row-level CRUD over the `todos` table.
#[async_trait::async_trait]
pub trait TodoStore: Send + Sync + 'static {
    /// All tasks, newest first.
    async fn list(&self) -> Result<Vec<Todo>, Error>;

    /// Insert a task and return the stored row.
    async fn create(&self, todo: &NewTodo) -> Result<Todo, Error>;

    /// Update a task and return the stored row. `updated_at` is refreshed on
    /// every update.
    async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;

    async fn set_completed(&self, id: &str, completed: bool) -> Result<Todo, Error> {
        self.update(id, &TodoPatch::completed(completed)).await
    }
}
