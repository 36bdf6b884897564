//! Application configuration types for duebot.
//!
//! `AppConfig` mirrors `config.toml` in the data directory. Every field has a
//! default so an empty or missing file yields a working local setup.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Top-level configuration shared by the server, the bot and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite URL. Resolved against the data directory when absent.
    #[serde(default)]
    pub database_url: Option<String>,

    /// IANA zone used to render due dates and interpret dialog input.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,
}

impl AppConfig {
    /// Parse the configured time zone.
    pub fn tz(&self) -> Result<Tz, String> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| format!("unknown time zone: '{}'", self.time_zone))
    }
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            time_zone: default_time_zone(),
            server: ServerConfig::default(),
            telegram: TelegramConfig::default(),
            backend: BackendConfig::default(),
            reminder: ReminderConfig::default(),
        }
    }
}

/// HTTP listener settings for `duebot serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Telegram Bot API access.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Without it reminders are skipped and the bot cannot start.
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,
    #[serde(default = "default_telegram_url")]
    pub api_base_url: String,
    #[serde(default = "default_telegram_timeout")]
    pub request_timeout_secs: u64,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    10
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_telegram_url(),
            request_timeout_secs: default_telegram_timeout(),
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Where the bot reaches the REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub api_base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_backend_timeout() -> u64 {
    15
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_backend_url(),
            request_timeout_secs: default_backend_timeout(),
        }
    }
}

/// Reminder sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression or human form such as "every minute".
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "every minute".to_string()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
        }
    }
}
