//! Shared domain types for duebot.
//!
//! Users, categories, tasks, their request payloads, error enums and the
//! application configuration shape.
//!
//! Zero infrastructure dependencies: serde, chrono, chrono-tz and thiserror only.

pub mod category;
pub mod config;
pub mod error;
pub mod task;
pub mod user;
