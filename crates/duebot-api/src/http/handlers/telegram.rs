//! Chat registration used by the bot before every command.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use duebot_types::user::{RegisterRequest, Registration};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::extractors::json::JsonBody;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/telegram/register - Bind a chat to the caller.
pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Json<ApiResponse<Registration>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let registration = state
        .account_service
        .register(&current.user, current.telegram_user_id, body.telegram_chat_id)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(registration, request_id, elapsed)))
}
