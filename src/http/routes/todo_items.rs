use axum::{extract::{rejection::JsonRejection, Path, Query, State}, routing::get, Router, Json};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ::http::header::LOCATION;
use serde::Deserialize;

use crate::{
    application::todo_item_service::{ListFilter, TodoItemService},
    domain::todo_item::{TodoItem, TodoItemId, TodoItemPayload, ValidationResult},
    http::types::ApiError,
};

#[derive(Clone)]
pub struct AppState<S: TodoItemService> { pub service: S }

pub fn router<S: TodoItemService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/items", get(list_items::<S>).post(create_item::<S>))
        .route("/items/:id", get(get_item::<S>).put(edit_item::<S>))
        .with_state(state)
}

/// Query flags for `GET /items`. Only incomplete items are listed unless asked otherwise.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListQuery { include_complete: bool, include_incomplete: bool }

impl Default for ListQuery {
    fn default() -> Self { Self { include_complete: false, include_incomplete: true } }
}

async fn list_items<S: TodoItemService>(State(state): State<AppState<S>>, Query(query): Query<ListQuery>) -> Result<Json<Vec<TodoItem>>, ApiError> {
    tracing::info!(?query, "get todo items");
    let filter = ListFilter { include_complete: query.include_complete, include_incomplete: query.include_incomplete };
    let items = state.service.list_items(filter).await.map_err(ApiError::internal)?;
    Ok(Json(items))
}

async fn get_item<S: TodoItemService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<TodoItem>, ApiError> {
    let id = parse_id(&id)?;
    tracing::info!(%id, "get todo item");
    match state.service.get_item(id).await.map_err(ApiError::internal)? {
        Some(item) => Ok(Json(item)),
        None => Err(ApiError::not_found("Todo item does not exist.")),
    }
}

async fn create_item<S: TodoItemService>(State(state): State<AppState<S>>, payload: Result<Json<Option<TodoItemPayload>>, JsonRejection>) -> Result<Response, ApiError> {
    tracing::info!("post todo item");
    let Json(payload) = payload.map_err(malformed_body)?;
    let item = payload.map(TodoItem::try_from).transpose().map_err(|e| ApiError::bad_request(e.to_string()))?;
    match state.service.create_item(item).await.map_err(ApiError::internal)? {
        ValidationResult { is_valid: true, item: Some(item), .. } => {
            let location = format!("/items/{}", item.id);
            Ok((StatusCode::CREATED, [(LOCATION, location)], Json(item)).into_response())
        }
        rejected => {
            tracing::info!(message = %rejected.message, "post todo item was invalid");
            Err(ApiError::bad_request(rejected.message))
        }
    }
}

async fn edit_item<S: TodoItemService>(State(state): State<AppState<S>>, Path(id): Path<String>, payload: Result<Json<TodoItemPayload>, JsonRejection>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    tracing::info!(%id, "put todo item");
    let Json(payload) = payload.map_err(malformed_body)?;
    let item = TodoItem::try_from(payload).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let result = state.service.edit_item(id, item).await.map_err(ApiError::internal)?;
    if result.is_valid {
        Ok(StatusCode::NO_CONTENT)
    } else {
        tracing::info!(%id, message = %result.message, "put todo item was invalid");
        Err(ApiError::bad_request(result.message))
    }
}

fn malformed_body(rejection: JsonRejection) -> ApiError {
    tracing::info!(error = %rejection.body_text(), "malformed todo item body");
    ApiError::bad_request(rejection.body_text())
}

fn parse_id(s: &str) -> Result<TodoItemId, ApiError> {
    uuid::Uuid::parse_str(s).map(TodoItemId).map_err(|_| ApiError::bad_request("invalid id"))
}
