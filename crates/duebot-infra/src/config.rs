//! Configuration loader for duebot.
//!
//! Reads `config.toml` from the data directory (`~/.duebot/` by default),
//! then applies environment overrides. Falls back to defaults when the file
//! is missing or malformed.

use std::path::{Path, PathBuf};

use duebot_types::config::AppConfig;

/// Load `.env` from the working directory, if any.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!("failed to read .env: {err}"),
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `DUEBOT_DATA_DIR` environment variable
/// 2. `~/.duebot`
/// 3. `.duebot` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DUEBOT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".duebot");
    }

    PathBuf::from(".duebot")
}

/// Load configuration from `{data_dir}/config.toml` plus process environment.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config = load_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Parse `{data_dir}/config.toml` without looking at the environment.
///
/// - Missing file: defaults.
/// - Unreadable or malformed file: warning, then defaults.
pub async fn load_config_file(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Apply environment overrides on top of file configuration.
///
/// `lookup` returns the value of an environment variable; blank values are
/// ignored.
pub fn apply_env_overrides<F>(mut config: AppConfig, lookup: F) -> AppConfig
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("DUEBOT_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(tz) = get("TIME_ZONE") {
        config.time_zone = tz.trim().to_string();
    }
    if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
        config.telegram.bot_token = Some(token.trim().to_string());
    }
    if let Some(url) = get("BACKEND_API_BASE_URL") {
        config.backend.api_base_url = url.trim().to_string();
    }
    if let Some(raw) = get("BOT_REQUEST_TIMEOUT") {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.backend.request_timeout_secs = secs,
            _ => tracing::warn!("ignoring invalid BOT_REQUEST_TIMEOUT '{raw}'"),
        }
    }
    config
}

/// Database URL: the configured one, or a file in the data directory.
pub fn database_url(config: &AppConfig, data_dir: &Path) -> String {
    match &config.database_url {
        Some(url) => url.clone(),
        None => format!("sqlite://{}?mode=rwc", data_dir.join("duebot.db").display()),
    }
}
