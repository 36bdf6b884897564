//! HTTP/REST API layer for duebot.
//!
//! Axum-based REST API at `/api/v1/` with header authentication, envelope
//! response format, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
