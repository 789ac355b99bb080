use crate::domain::repository::TodoItemRepository;
use crate::domain::todo_item::{RuleViolation, TodoItem, TodoItemId, ValidationResult};
use anyhow::Result;
use async_trait::async_trait;

/// Which completion states `list_items` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub include_complete: bool,
    pub include_incomplete: bool,
}

impl Default for ListFilter {
    fn default() -> Self { Self { include_complete: true, include_incomplete: true } }
}

impl ListFilter {
    fn accepts(&self, item: &TodoItem) -> bool {
        if item.is_completed { self.include_complete } else { self.include_incomplete }
    }
}

/// Validation and mutation rules for todo items.
///
/// Read faults from the store are returned as errors. Write faults are
/// reported through a failed [`ValidationResult`].
#[async_trait]
pub trait TodoItemService: Send + Sync + 'static {
    async fn list_items(&self, filter: ListFilter) -> Result<Vec<TodoItem>>;
    async fn get_item(&self, id: TodoItemId) -> Result<Option<TodoItem>>;
    async fn create_item(&self, item: Option<TodoItem>) -> Result<ValidationResult>;
    async fn edit_item(&self, target_id: TodoItemId, item: TodoItem) -> Result<ValidationResult>;
}

#[derive(Clone)]
pub struct TodoItemServiceImpl<R: TodoItemRepository> {
    repo: R,
}

impl<R: TodoItemRepository> TodoItemServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }

    pub async fn id_exists(&self, id: TodoItemId) -> Result<bool> {
        self.repo.exists_by_id(id).await
    }

    pub async fn description_exists(&self, exclude_id: TodoItemId, description: &str) -> Result<bool> {
        self.repo.exists_incomplete_with_description(exclude_id, description).await
    }
}

fn reject(item: TodoItem, violation: RuleViolation) -> ValidationResult {
    tracing::debug!(id = %item.id, %violation, "todo item rejected");
    ValidationResult::invalid(Some(item), violation)
}

#[async_trait]
impl<R: TodoItemRepository> TodoItemService for TodoItemServiceImpl<R> {
    async fn list_items(&self, filter: ListFilter) -> Result<Vec<TodoItem>> {
        if !filter.include_complete && !filter.include_incomplete {
            return Ok(Vec::new());
        }
        let items = self.repo.list_all().await?;
        Ok(items.into_iter().filter(|item| filter.accepts(item)).collect())
    }

    async fn get_item(&self, id: TodoItemId) -> Result<Option<TodoItem>> {
        if id.is_empty() {
            return Ok(None);
        }
        self.repo.find_by_id(id).await
    }

    async fn create_item(&self, item: Option<TodoItem>) -> Result<ValidationResult> {
        let Some(mut item) = item else {
            return Ok(ValidationResult::invalid(None, RuleViolation::MissingItem));
        };

        if item.id.is_empty() {
            item.id = TodoItemId::new();
        } else if self.id_exists(item.id).await? {
            return Ok(reject(item, RuleViolation::IdAlreadyExists));
        }

        if self.description_exists(item.id, &item.description).await? {
            return Ok(reject(item, RuleViolation::DescriptionAlreadyExists));
        }

        if item.is_completed {
            return Ok(reject(item, RuleViolation::CreatedComplete));
        }

        if let Err(e) = self.repo.insert(&item).await {
            tracing::warn!(id = %item.id, error = %e, "failed to insert todo item");
            return Ok(reject(item, RuleViolation::CreateNotSaved));
        }

        Ok(ValidationResult::valid(item))
    }

    async fn edit_item(&self, target_id: TodoItemId, item: TodoItem) -> Result<ValidationResult> {
        if target_id != item.id {
            return Ok(reject(item, RuleViolation::IdMismatch));
        }

        // Uniqueness is checked before the target is known to exist.
        if self.description_exists(target_id, &item.description).await? {
            return Ok(reject(item, RuleViolation::DescriptionAlreadyExists));
        }

        let Some(mut original) = self.get_item(target_id).await? else {
            return Ok(reject(item, RuleViolation::IdDoesNotExist));
        };

        let description_changed = original.description != item.description;
        if original.is_completed && description_changed {
            return Ok(reject(item, RuleViolation::EditCompleted));
        }
        if item.is_completed && !original.is_completed && description_changed {
            return Ok(reject(item, RuleViolation::EditDescriptionOnComplete));
        }

        original.description = item.description;
        original.is_completed = item.is_completed;

        if let Err(e) = self.repo.update(&original).await {
            tracing::warn!(id = %original.id, error = %e, "failed to update todo item");
            return Ok(reject(original, RuleViolation::EditNotSaved));
        }

        Ok(ValidationResult::valid(original))
    }
}
