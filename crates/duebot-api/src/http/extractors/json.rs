//! JSON body extractor whose rejections use the error envelope.

use axum::extract::FromRequest;

use crate::http::error::AppError;

/// Drop-in for `axum::Json` on request bodies: malformed or incomplete JSON
/// becomes a 400 `VALIDATION_ERROR` instead of axum's plain-text 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
