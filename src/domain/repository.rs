use async_trait::async_trait;
use super::todo_item::{TodoItem, TodoItemId};

/// Persistence contract for todo items.
#[async_trait]
pub trait TodoItemRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: TodoItemId) -> anyhow::Result<Option<TodoItem>>;
    async fn exists_by_id(&self, id: TodoItemId) -> anyhow::Result<bool>;
    /// True when an incomplete item other than `exclude_id` has a case-insensitively equal description.
    async fn exists_incomplete_with_description(&self, exclude_id: TodoItemId, description: &str) -> anyhow::Result<bool>;
    /// Fails if an item with the same id is already stored.
    async fn insert(&self, item: &TodoItem) -> anyhow::Result<()>;
    /// Fails if no stored item has `item.id`.
    async fn update(&self, item: &TodoItem) -> anyhow::Result<()>;
    async fn list_all(&self) -> anyhow::Result<Vec<TodoItem>>;
}
