//! reqwest client for the duebot REST API.
//!
//! Every request names the acting Telegram user in `X-Telegram-User-Id`.
//! Responses arrive in the `{data, meta, errors}` envelope; this client
//! unwraps `data` or surfaces the first error.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use duebot_types::category::{Category, CreateCategoryRequest};
use duebot_types::config::BackendConfig;
use duebot_types::task::{CreateTaskRequest, Task};
use duebot_types::user::{RegisterRequest, Registration};

/// Header carrying the caller's Telegram user id.
pub const USER_ID_HEADER: &str = "X-Telegram-User-Id";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("unexpected backend response: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: String,
    message: String,
}

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        telegram_user_id: i64,
    ) -> Result<T, BackendError> {
        let resp = request
            .header(USER_ID_HEADER, telegram_user_id.to_string())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|env| env.errors.into_iter().next())
                .map(|err| {
                    tracing::debug!(code = %err.code, "backend error");
                    err.message
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;
        envelope
            .data
            .ok_or_else(|| BackendError::Decode("response has no data".to_string()))
    }

    /// Bind the sender's chat to their account; runs before every command.
    pub async fn register_user(
        &self,
        telegram_user_id: i64,
        telegram_chat_id: i64,
    ) -> Result<Registration, BackendError> {
        let body = RegisterRequest {
            telegram_chat_id: Some(telegram_chat_id),
        };
        let request = self.http.post(self.url("/telegram/register")).json(&body);
        self.send(request, telegram_user_id).await
    }

    pub async fn list_tasks(&self, telegram_user_id: i64) -> Result<Vec<Task>, BackendError> {
        let request = self.http.get(self.url("/tasks"));
        self.send(request, telegram_user_id).await
    }

    pub async fn create_task(
        &self,
        telegram_user_id: i64,
        title: &str,
        description: &str,
        due_date: DateTime<Utc>,
        category_names: &[String],
    ) -> Result<Task, BackendError> {
        let body = CreateTaskRequest {
            title: title.to_string(),
            description: Some(description.to_string()),
            due_date,
            is_completed: None,
            category_ids: None,
            category_names: Some(category_names.to_vec()),
        };
        let request = self.http.post(self.url("/tasks")).json(&body);
        self.send(request, telegram_user_id).await
    }

    pub async fn list_categories(
        &self,
        telegram_user_id: i64,
    ) -> Result<Vec<Category>, BackendError> {
        let request = self.http.get(self.url("/categories"));
        self.send(request, telegram_user_id).await
    }

    pub async fn create_category(
        &self,
        telegram_user_id: i64,
        name: &str,
    ) -> Result<Category, BackendError> {
        let body = CreateCategoryRequest {
            name: name.to_string(),
        };
        let request = self.http.post(self.url("/categories")).json(&body);
        self.send(request, telegram_user_id).await
    }
}
