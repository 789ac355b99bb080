use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::domain::{
    repository::TodoItemRepository,
    todo_item::{descriptions_match, TodoItem, TodoItemId},
};

#[derive(Clone)]
pub struct SqliteTodoItemRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoItemRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let mut options = SqlitePoolOptions::new().max_connections(5);
        match sqlite_file_path(database_url) {
            Some(path) => prepare_sqlite_file(&path)?,
            // An in-memory database is dropped with its last connection, so keep one open.
            None => options = options.min_connections(1).idle_timeout(None).max_lifetime(None),
        }
        let pool = options
            .connect(database_url)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoItemRepository for SqliteTodoItemRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todo_items (
                id TEXT PRIMARY KEY,
                description TEXT NOT NULL,
                is_completed INTEGER NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: TodoItemId) -> Result<Option<TodoItem>> {
        let row = sqlx::query("SELECT id, description, is_completed FROM todo_items WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_item).transpose()
    }

    async fn exists_by_id(&self, id: TodoItemId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM todo_items WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn exists_incomplete_with_description(&self, exclude_id: TodoItemId, description: &str) -> Result<bool> {
        // SQLite's lower() only folds ASCII, so the comparison happens here.
        let rows = sqlx::query("SELECT description FROM todo_items WHERE is_completed = 0 AND id <> ?1")
            .bind(exclude_id.to_string())
            .fetch_all(&*self.pool)
            .await?;
        for row in rows {
            let existing: String = row.try_get("description")?;
            if descriptions_match(&existing, description) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn insert(&self, item: &TodoItem) -> Result<()> {
        sqlx::query("INSERT INTO todo_items (id, description, is_completed) VALUES (?1, ?2, ?3)")
            .bind(item.id.to_string())
            .bind(&item.description)
            .bind(item.is_completed)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn update(&self, item: &TodoItem) -> Result<()> {
        let result = sqlx::query("UPDATE todo_items SET description = ?2, is_completed = ?3 WHERE id = ?1")
            .bind(item.id.to_string())
            .bind(&item.description)
            .bind(item.is_completed)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("todo item {} not found", item.id);
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TodoItem>> {
        let rows = sqlx::query("SELECT id, description, is_completed FROM todo_items ORDER BY rowid")
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_item).collect()
    }
}

fn row_to_item(row: SqliteRow) -> Result<TodoItem> {
    let id_str: String = row.try_get("id")?;
    let description: String = row.try_get("description")?;
    let is_completed: bool = row.try_get("is_completed")?;
    let id = Uuid::parse_str(&id_str).with_context(|| format!("malformed todo item id {id_str:?}"))?;
    Ok(TodoItem { id: TodoItemId(id), description, is_completed })
}

/// File path behind a `sqlite:` URL, or `None` when there is no file to create.
fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") {
        return None;
    }
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    // Windows drive paths arrive as /C:/dir/file.db
    let path = match path.as_bytes() {
        [b'/', _, b':', ..] if cfg!(windows) => &path[1..],
        _ => path,
    };
    Some(PathBuf::from(path))
}

/// Creates the database file and its parent directories, since sqlx will not.
fn prepare_sqlite_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    if !path.exists() {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("creating sqlite file {}", path.display()))?;
    }
    Ok(())
}
