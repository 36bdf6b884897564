//! reqwest client for the Telegram Bot API.
//!
//! Every call goes to `{api_base_url}/bot{token}/{method}`. The token is held
//! as a [`SecretString`] and request URLs are stripped from transport errors,
//! so it never reaches the logs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;

use duebot_core::reminder::Messenger;
use duebot_types::config::TelegramConfig;
use duebot_types::error::NotifyError;

use super::types::{ApiResponse, Message, ReplyMarkup, TgUser, Update};

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    request_timeout: Duration,
}

impl TelegramClient {
    /// Build a client. A missing token is allowed: calls then fail with
    /// `NotifyError::NotConfigured`.
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let request_timeout = Duration::from_secs(config.request_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config
                .bot_token
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .map(|t| SecretString::from(t.to_string())),
            request_timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    fn api_url(&self, method: &str) -> Result<String, NotifyError> {
        let token = self.token.as_ref().ok_or(NotifyError::NotConfigured)?;
        Ok(format!("{}/bot{}/{method}", self.base_url, token.expose_secret()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T, NotifyError> {
        let mut request = self.http.post(self.api_url(method)?).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();
        match parsed {
            Some(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Some(ApiResponse { description, .. }) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: description.unwrap_or_else(|| "unknown error".to_string()),
            }),
            None => Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// `sendMessage`, optionally with a keyboard.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<&ReplyMarkup>,
    ) -> Result<Message, NotifyError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| NotifyError::Transport(e.to_string()))?;
        }
        self.call("sendMessage", &payload, None).await
    }

    /// Long-poll `getUpdates`. The HTTP timeout is extended by `timeout_secs`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, NotifyError> {
        let mut payload = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        let timeout = self.request_timeout + Duration::from_secs(timeout_secs);
        self.call("getUpdates", &payload, Some(timeout)).await
    }

    /// Acknowledge a button press, optionally with a toast.
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), NotifyError> {
        let mut payload = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", &payload, None).await?;
        Ok(())
    }

    pub async fn get_me(&self) -> Result<TgUser, NotifyError> {
        self.call("getMe", &json!({}), None).await
    }
}

impl Messenger for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.send_message(chat_id, text, None).await.map(|_| ())
    }
}

/// Next `getUpdates` offset: one past the highest update seen.
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .max(current)
}
