use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier of a todo item. The nil UUID is the empty id and never names a stored item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(transparent)]
pub struct TodoItemId(pub Uuid);

impl TodoItemId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }

    pub fn empty() -> Self { Self(Uuid::nil()) }

    pub fn is_empty(&self) -> bool { self.0.is_nil() }
}

impl fmt::Display for TodoItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: TodoItemId,
    pub description: String,
    pub is_completed: bool,
}

impl TodoItem {
    pub fn new(id: TodoItemId, description: impl Into<String>, is_completed: bool) -> Self {
        Self { id, description: description.into(), is_completed }
    }
}

/// Case-insensitive description comparison used for uniqueness among incomplete items.
pub fn descriptions_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Raw request body. Every field is optional until converted into a [`TodoItem`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemPayload {
    #[serde(default, deserialize_with = "blank_id_as_none")]
    pub id: Option<Uuid>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

/// An empty or blank `id` string means the caller has no id yet.
fn blank_id_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => Uuid::parse_str(s.trim()).map(Some).map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("The Description field is required.")]
    MissingDescription,
    #[error("The IsCompleted field is required.")]
    MissingIsCompleted,
}

impl TryFrom<TodoItemPayload> for TodoItem {
    type Error = PayloadError;

    fn try_from(payload: TodoItemPayload) -> Result<Self, Self::Error> {
        let description = payload
            .description
            .filter(|d| !d.trim().is_empty())
            .ok_or(PayloadError::MissingDescription)?;
        let is_completed = payload.is_completed.ok_or(PayloadError::MissingIsCompleted)?;
        Ok(TodoItem {
            id: payload.id.map(TodoItemId).unwrap_or_else(TodoItemId::empty),
            description,
            is_completed,
        })
    }
}

/// Reasons a create or edit is refused. The display text is what callers see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    #[error("Todo item doesn't exist.")]
    MissingItem,
    #[error("Id already exists.")]
    IdAlreadyExists,
    #[error("Description already exists.")]
    DescriptionAlreadyExists,
    #[error("Todo item must be incomplete when created.")]
    CreatedComplete,
    #[error("Todo item couldn't be saved.")]
    CreateNotSaved,
    #[error("Id does not match.")]
    IdMismatch,
    #[error("Id does not exist.")]
    IdDoesNotExist,
    #[error("Cannot edit completed todo item.")]
    EditCompleted,
    #[error("Cannot edit description for a completed todo item.")]
    EditDescriptionOnComplete,
    #[error("Todo item could not be saved.")]
    EditNotSaved,
}

/// Outcome of a create or edit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub item: Option<TodoItem>,
    pub is_valid: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn valid(item: TodoItem) -> Self {
        Self { item: Some(item), is_valid: true, message: String::new() }
    }

    pub fn invalid(item: Option<TodoItem>, violation: RuleViolation) -> Self {
        Self { item, is_valid: false, message: violation.to_string() }
    }
}
