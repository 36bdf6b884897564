//! Telegram bot: command parsing, message rendering and the long-poll runner.

pub mod commands;
pub mod format;
pub mod keyboard;
pub mod runner;

pub use runner::BotRunner;
