//! Task CRUD handlers, scoped to the calling user.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use duebot_types::error::TaskError;
use duebot_types::task::{CreateTaskRequest, Task, TaskId, UpdateTaskRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::JsonBody;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Unknown or malformed ids both read as "not found".
fn parse_task_id(raw: &str) -> Result<TaskId, AppError> {
    raw.parse().map_err(|_| AppError::Task(TaskError::NotFound))
}

fn task_link(task: &Task) -> String {
    format!("/api/v1/tasks/{}", task.id)
}

/// GET /api/v1/tasks - List the caller's tasks, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Task>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let tasks = state.task_service.list(current.user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(tasks, request_id, elapsed).with_link("self", "/api/v1/tasks"),
    ))
}

/// POST /api/v1/tasks - Create a task.
pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(body): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Task>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let task = state.task_service.create(current.user.id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = task_link(&task);
    let resp = ApiResponse::success(task, request_id, elapsed).with_link("self", &link);
    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_task_id(&id)?;
    let task = state.task_service.get(current.user.id, &id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = task_link(&task);
    Ok(Json(
        ApiResponse::success(task, request_id, elapsed).with_link("self", &link),
    ))
}

/// PUT/PATCH /api/v1/tasks/{id} - Apply the provided fields.
pub async fn update_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateTaskRequest>,
) -> Result<Json<ApiResponse<Task>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_task_id(&id)?;
    let task = state.task_service.update(current.user.id, &id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = task_link(&task);
    Ok(Json(
        ApiResponse::success(task, request_id, elapsed).with_link("self", &link),
    ))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_task_id(&id)?;
    state.task_service.delete(current.user.id, &id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true, "id": id}),
        request_id,
        elapsed,
    )))
}
