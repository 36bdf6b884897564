//! Axum router configuration with middleware.
//!
//! All resource routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Tasks
        .route(
            "/tasks",
            get(handlers::task::list_tasks).post(handlers::task::create_task),
        )
        .route(
            "/tasks/{id}",
            get(handlers::task::get_task)
                .put(handlers::task::update_task)
                .patch(handlers::task::update_task)
                .delete(handlers::task::delete_task),
        )
        // Categories
        .route(
            "/categories",
            get(handlers::category::list_categories).post(handlers::category::create_category),
        )
        .route(
            "/categories/{id}",
            get(handlers::category::get_category)
                .put(handlers::category::update_category)
                .patch(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
        // Telegram
        .route("/telegram/register", post(handlers::telegram::register));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
