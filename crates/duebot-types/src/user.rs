use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

/// Database identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user account.
///
/// Accounts are never created explicitly: the first request carrying a
/// Telegram user id creates `tg_<id>` on the fly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Link between a user account and a Telegram identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub telegram_user_id: Option<i64>,
    /// Chat reminders are delivered to. `None` until the bot registers the user.
    pub telegram_chat_id: Option<i64>,
}

/// Public view of a profile as returned by the register endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub telegram_user_id: Option<i64>,
    pub telegram_chat_id: Option<i64>,
}

impl From<&UserProfile> for ProfileView {
    fn from(profile: &UserProfile) -> Self {
        Self {
            telegram_user_id: profile.telegram_user_id,
            telegram_chat_id: profile.telegram_chat_id,
        }
    }
}

/// Result of binding a Telegram chat to the calling account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub user_id: UserId,
    pub username: String,
    pub profile: ProfileView,
}

/// Body of `POST /telegram/register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub telegram_chat_id: Option<i64>,
}

/// Username assigned to the account behind a Telegram user id.
pub fn telegram_username(telegram_user_id: i64) -> String {
    format!("tg_{telegram_user_id}")
}
