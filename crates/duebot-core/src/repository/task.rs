//! Task repository trait definition.

use chrono::{DateTime, Utc};

use duebot_types::error::RepositoryError;
use duebot_types::task::{DueTask, Task, TaskId};
use duebot_types::user::UserId;

/// Repository trait for task persistence.
///
/// `create` and `update` persist `task.categories` as the full link set.
pub trait TaskRepository: Send + Sync {
    /// List the owner's tasks, newest first.
    fn list(
        &self,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, RepositoryError>> + Send;

    /// Get one of the owner's tasks with its categories.
    fn get(
        &self,
        owner: UserId,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<Option<Task>, RepositoryError>> + Send;

    /// Insert a task and its category links.
    fn create(
        &self,
        owner: UserId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Task, RepositoryError>> + Send;

    /// Overwrite the mutable fields of a task and replace its category links.
    fn update(
        &self,
        owner: UserId,
        task: &Task,
    ) -> impl std::future::Future<Output = Result<Task, RepositoryError>> + Send;

    /// Permanently delete one of the owner's tasks.
    fn delete(
        &self,
        owner: UserId,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Incomplete tasks not yet notified with `due_date <= now`, across all users.
    fn list_due_unnotified(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<DueTask>, RepositoryError>> + Send;

    /// Flag a task as notified.
    fn mark_notified(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
