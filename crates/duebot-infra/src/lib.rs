//! Infrastructure layer for duebot.
//!
//! Implementations of the ports defined in `duebot-core`: SQLite storage,
//! SHA-256 task keys, the Telegram Bot API client, plus the HTTP client the
//! bot uses to reach the REST API and the config loader.

pub mod backend;
pub mod config;
pub mod crypto;
pub mod sqlite;
pub mod telegram;
