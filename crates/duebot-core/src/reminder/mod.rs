//! Due-date reminder sweep.
//!
//! [`ReminderService::run_once`] is the whole job: load due, unnotified
//! tasks, send one message per task, flag the delivered ones. The
//! [`scheduler`] module fires it periodically.

pub mod scheduler;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use duebot_types::error::{NotifyError, RepositoryError};
use duebot_types::task::Task;

use crate::repository::task::TaskRepository;

/// Outbound text channel (the Telegram Bot API in production).
pub trait Messenger: Send + Sync {
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), NotifyError>> + Send;
}

impl<M: Messenger> Messenger for std::sync::Arc<M> {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        self.as_ref().send_text(chat_id, text).await
    }
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    /// Tasks that matched the due/unnotified query.
    pub due: usize,
    pub sent: usize,
    /// Owner has no registered chat.
    pub skipped: usize,
    pub failed: usize,
}

/// Render the reminder text for a task in `tz`.
pub fn format_reminder(task: &Task, tz: &Tz) -> String {
    let categories = if task.categories.is_empty() {
        "no category".to_string()
    } else {
        task.categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let due = task.due_date.with_timezone(tz).format("%Y-%m-%d %H:%M");
    format!(
        "⏰ Task due\nTitle: {}\nCategories: {}\nDue: {}",
        task.title, categories, due
    )
}

pub struct ReminderService<T: TaskRepository, M: Messenger> {
    task_repo: T,
    messenger: M,
    tz: Tz,
}

impl<T: TaskRepository, M: Messenger> ReminderService<T, M> {
    pub fn new(task_repo: T, messenger: M, tz: Tz) -> Self {
        Self {
            task_repo,
            messenger,
            tz,
        }
    }

    /// Run a single sweep as of `now`.
    ///
    /// Failed sends leave the task unnotified so the next sweep picks it up
    /// again. Only the initial query error aborts the sweep.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<ReminderReport, RepositoryError> {
        let due = self.task_repo.list_due_unnotified(now).await?;
        let mut report = ReminderReport {
            due: due.len(),
            ..Default::default()
        };

        for item in due {
            let Some(chat_id) = item.chat_id else {
                tracing::debug!(task_id = %item.task.id, user_id = %item.user_id, "no chat registered, skipping");
                report.skipped += 1;
                continue;
            };

            let text = format_reminder(&item.task, &self.tz);
            match self.messenger.send_text(chat_id, &text).await {
                Ok(()) => {}
                Err(NotifyError::NotConfigured) => {
                    tracing::warn!(task_id = %item.task.id, "bot token not configured, reminder not sent");
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!(task_id = %item.task.id, chat_id, error = %e, "failed to send reminder");
                    report.failed += 1;
                    continue;
                }
            }

            match self.task_repo.mark_notified(&item.task.id).await {
                Ok(()) => {
                    tracing::info!(task_id = %item.task.id, chat_id, "reminder sent");
                    report.sent += 1;
                }
                Err(e) => {
                    tracing::error!(task_id = %item.task.id, error = %e, "reminder sent but not recorded");
                    report.failed += 1;
                }
            }
        }

        if report.due > 0 {
            tracing::info!(
                due = report.due,
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "reminder sweep finished"
            );
        }
        Ok(report)
    }
}
