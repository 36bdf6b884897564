use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::category::{Category, CategoryId};
use crate::user::UserId;

/// Length of a task key in hex characters.
pub const TASK_ID_LEN: usize = 32;

/// Maximum length of a task title, in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Content-derived task key: the first 32 hex characters of a SHA-256 digest.
///
/// See [`task_key_source`] for the hashed input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Build a key from a full hex digest, keeping the first 32 characters.
    ///
    /// Returns `None` if the digest is shorter than a key or not hex.
    pub fn from_digest(hex_digest: &str) -> Option<Self> {
        let prefix = hex_digest.get(..TASK_ID_LEN)?;
        prefix.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TASK_ID_LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid task id: '{s}'"));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// A task owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    /// Set by the reminder sweep once the due-date message was delivered.
    pub notification_sent: bool,
    pub categories: Vec<Category>,
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    /// Existing categories of the caller to attach.
    #[serde(default)]
    pub category_ids: Option<Vec<CategoryId>>,
    /// Category names; missing ones are created for the caller.
    #[serde(default)]
    pub category_names: Option<Vec<String>>,
}

/// Body of `PUT/PATCH /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub category_ids: Option<Vec<CategoryId>>,
    #[serde(default)]
    pub category_names: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    /// Whether the request touches the category links at all.
    pub fn replaces_categories(&self) -> bool {
        self.category_ids.is_some() || self.category_names.is_some()
    }
}

/// A due, unnotified task together with where to deliver its reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTask {
    pub task: Task,
    pub user_id: UserId,
    pub chat_id: Option<i64>,
}

/// Trim and validate a task title.
pub fn normalize_title(raw: &str) -> Result<String, String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err("title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(title.to_string())
}

/// Render a UTC instant the way the task key expects it:
/// RFC 3339 with a `+00:00` offset, microseconds only when non-zero.
pub fn key_timestamp(dt: &DateTime<Utc>) -> String {
    let format = if dt.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(format, false)
}

/// Input string hashed into a [`TaskId`]:
/// `"{user_id}:{title}:{due_date}:{created_unix_secs}"`.
pub fn task_key_source(
    user_id: UserId,
    title: &str,
    due_date: &DateTime<Utc>,
    created_at: &DateTime<Utc>,
) -> String {
    format!(
        "{}:{}:{}:{}",
        user_id,
        title,
        key_timestamp(due_date),
        created_at.timestamp()
    )
}
