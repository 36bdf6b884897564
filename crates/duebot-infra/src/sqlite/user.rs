//! SQLite user and profile repository.

use chrono::Utc;
use sqlx::Row;

use duebot_core::repository::user::UserRepository;
use duebot_types::error::RepositoryError;
use duebot_types::user::{User, UserId, UserProfile};

use super::pool::DatabasePool;
use super::{format_datetime, map_write_error, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: i64,
    username: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: UserId(self.id),
            username: self.username,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<UserProfile, sqlx::Error> {
    Ok(UserProfile {
        user_id: UserId(row.try_get("user_id")?),
        telegram_user_id: row.try_get("telegram_user_id")?,
        telegram_chat_id: row.try_get("telegram_chat_id")?,
    })
}

impl UserRepository for SqliteUserRepository {
    async fn get_or_create_by_username(&self, username: &str) -> Result<User, RepositoryError> {
        sqlx::query(
            "INSERT INTO users (username, created_at) VALUES (?, ?)
             ON CONFLICT(username) DO NOTHING",
        )
        .bind(username)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // Read through the writer so the row just inserted is visible.
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        UserRow::from_row(&row)
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            .into_user()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, telegram_user_id, telegram_chat_id FROM user_profiles WHERE user_id = ?",
        )
        .bind(user_id.0)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.map(|r| profile_from_row(&r))
            .transpose()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, RepositoryError> {
        sqlx::query(
            "INSERT INTO user_profiles (user_id, telegram_user_id, telegram_chat_id)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 telegram_user_id = excluded.telegram_user_id,
                 telegram_chat_id = excluded.telegram_chat_id",
        )
        .bind(profile.user_id.0)
        .bind(profile.telegram_user_id)
        .bind(profile.telegram_chat_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                format!("telegram identity already bound to another user ({})", profile.user_id)
            })
        })?;

        Ok(profile.clone())
    }
}
