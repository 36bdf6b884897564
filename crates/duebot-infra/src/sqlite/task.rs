//! SQLite task repository.
//!
//! Category links live in `task_categories`; their insertion order is kept
//! (ordered by rowid) so a task lists its categories as they were given.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row;

use duebot_core::repository::task::TaskRepository;
use duebot_types::category::{Category, CategoryId};
use duebot_types::error::RepositoryError;
use duebot_types::task::{DueTask, Task, TaskId};
use duebot_types::user::UserId;

use super::pool::DatabasePool;
use super::{format_datetime, map_write_error, parse_datetime};

/// SQLite-backed implementation of `TaskRepository`.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: DatabasePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Category links of every task owned by `owner`, keyed by task id.
    async fn categories_by_owner(
        &self,
        owner: UserId,
    ) -> Result<HashMap<String, Vec<Category>>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT tc.task_id, c.id, c.name
             FROM task_categories tc
             JOIN tasks t ON t.id = tc.task_id
             JOIN categories c ON c.id = tc.category_id
             WHERE t.user_id = ?
             ORDER BY tc.rowid",
        )
        .bind(owner.0)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut map: HashMap<String, Vec<Category>> = HashMap::new();
        for row in &rows {
            let task_id: String = row.try_get("task_id").map_err(query_err)?;
            map.entry(task_id).or_default().push(Category {
                id: CategoryId(row.try_get("id").map_err(query_err)?),
                name: row.try_get("name").map_err(query_err)?,
            });
        }
        Ok(map)
    }

    async fn categories_of(&self, task_id: &str) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT c.id, c.name
             FROM task_categories tc
             JOIN categories c ON c.id = tc.category_id
             WHERE tc.task_id = ?
             ORDER BY tc.rowid",
        )
        .bind(task_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId(row.try_get("id").map_err(query_err)?),
                    name: row.try_get("name").map_err(query_err)?,
                })
            })
            .collect()
    }

    async fn replace_links(
        tx: &mut sqlx::SqliteConnection,
        task_id: &TaskId,
        categories: &[Category],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM task_categories WHERE task_id = ?")
            .bind(task_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        for category in categories {
            sqlx::query(
                "INSERT OR IGNORE INTO task_categories (task_id, category_id) VALUES (?, ?)",
            )
            .bind(task_id.as_str())
            .bind(category.id.0)
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;
        }
        Ok(())
    }
}

fn query_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

/// Internal row type for mapping SQLite rows to a `Task` without categories.
struct TaskRow {
    id: String,
    title: String,
    description: String,
    created_at: String,
    due_date: String,
    is_completed: bool,
    notification_sent: bool,
}

impl TaskRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            due_date: row.try_get("due_date")?,
            is_completed: row.try_get("is_completed")?,
            notification_sent: row.try_get("notification_sent")?,
        })
    }

    fn into_task(self, categories: Vec<Category>) -> Result<Task, RepositoryError> {
        let id = self
            .id
            .parse::<TaskId>()
            .map_err(RepositoryError::Query)?;

        Ok(Task {
            id,
            title: self.title,
            description: self.description,
            created_at: parse_datetime(&self.created_at)?,
            due_date: parse_datetime(&self.due_date)?,
            is_completed: self.is_completed,
            notification_sent: self.notification_sent,
            categories,
        })
    }
}

const TASK_COLUMNS: &str =
    "t.id, t.title, t.description, t.created_at, t.due_date, t.is_completed, t.notification_sent";

impl TaskRepository for SqliteTaskRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<Task>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.user_id = ? ORDER BY t.created_at DESC, t.rowid DESC"
        ))
        .bind(owner.0)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut links = self.categories_by_owner(owner).await?;
        rows.iter()
            .map(|row| {
                let task_row = TaskRow::from_row(row).map_err(query_err)?;
                let categories = links.remove(&task_row.id).unwrap_or_default();
                task_row.into_task(categories)
            })
            .collect()
    }

    async fn get(&self, owner: UserId, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ? AND t.user_id = ?"
        ))
        .bind(id.as_str())
        .bind(owner.0)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_err)?;

        match row {
            Some(row) => {
                let task_row = TaskRow::from_row(&row).map_err(query_err)?;
                let categories = self.categories_of(&task_row.id).await?;
                Ok(Some(task_row.into_task(categories)?))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, owner: UserId, task: &Task) -> Result<Task, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        sqlx::query(
            "INSERT INTO tasks (id, user_id, title, description, created_at, due_date, is_completed, notification_sent)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id.as_str())
        .bind(owner.0)
        .bind(&task.title)
        .bind(&task.description)
        .bind(format_datetime(&task.created_at))
        .bind(format_datetime(&task.due_date))
        .bind(task.is_completed)
        .bind(task.notification_sent)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, || format!("task '{}' already exists", task.id)))?;

        Self::replace_links(&mut *tx, &task.id, &task.categories).await?;
        tx.commit().await.map_err(query_err)?;

        Ok(task.clone())
    }

    async fn update(&self, owner: UserId, task: &Task) -> Result<Task, RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_err)?;

        // notification_sent is owned by the reminder sweep.
        let result = sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, due_date = ?, is_completed = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(format_datetime(&task.due_date))
        .bind(task.is_completed)
        .bind(task.id.as_str())
        .bind(owner.0)
        .execute(&mut *tx)
        .await
        .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Self::replace_links(&mut *tx, &task.id, &task.categories).await?;
        tx.commit().await.map_err(query_err)?;

        Ok(task.clone())
    }

    async fn delete(&self, owner: UserId, id: &TaskId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id.as_str())
            .bind(owner.0)
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_due_unnotified(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueTask>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS}, t.user_id, p.telegram_chat_id
             FROM tasks t
             LEFT JOIN user_profiles p ON p.user_id = t.user_id
             WHERE t.is_completed = 0 AND t.notification_sent = 0 AND t.due_date <= ?
             ORDER BY t.due_date"
        ))
        .bind(format_datetime(&now))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_err)?;

        let mut due = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_id: i64 = row.try_get("user_id").map_err(query_err)?;
            let chat_id: Option<i64> = row.try_get("telegram_chat_id").map_err(query_err)?;
            let task_row = TaskRow::from_row(row).map_err(query_err)?;
            let categories = self.categories_of(&task_row.id).await?;
            due.push(DueTask {
                task: task_row.into_task(categories)?,
                user_id: UserId(user_id),
                chat_id,
            });
        }
        Ok(due)
    }

    async fn mark_notified(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE tasks SET notification_sent = 1 WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool.writer)
            .await
            .map_err(query_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
