//! Category CRUD handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use duebot_types::category::{Category, CategoryId, CreateCategoryRequest, UpdateCategoryRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::JsonBody;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/categories - List the caller's categories by name.
pub async fn list_categories(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Vec<Category>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let categories = state.category_service.list(current.user.id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(categories, request_id, elapsed)
            .with_link("self", "/api/v1/categories"),
    ))
}

/// POST /api/v1/categories
pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(body): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let category = state.category_service.create(current.user.id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = format!("/api/v1/categories/{}", category.id);
    let resp = ApiResponse::success(category, request_id, elapsed).with_link("self", &link);
    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let category = state
        .category_service
        .get(current.user.id, CategoryId(id))
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(category, request_id, elapsed)))
}

/// PUT/PATCH /api/v1/categories/{id} - Rename.
pub async fn update_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(body): JsonBody<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let category = state
        .category_service
        .rename(current.user.id, CategoryId(id), body)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(category, request_id, elapsed)))
}

/// DELETE /api/v1/categories/{id} - Tasks keep existing without the link.
pub async fn delete_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    state
        .category_service
        .delete(current.user.id, CategoryId(id))
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(
        serde_json::json!({"deleted": true, "id": id}),
        request_id,
        elapsed,
    )))
}
