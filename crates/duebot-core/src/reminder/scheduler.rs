//! Periodic trigger for the reminder sweep, wrapping `tokio-cron-scheduler`.
//!
//! Schedules are cron expressions (5 or 6 fields) or a small set of
//! human-readable forms, see [`normalize_schedule`]. They are read in the
//! configured time zone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use super::{Messenger, ReminderService};
use crate::repository::task::TaskRepository;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    JobError(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Normalize a schedule string to a 6-field cron expression.
///
/// Supported patterns (case-insensitive):
/// - "every N seconds"     -> "*/N * * * * *"
/// - "every N minutes"     -> "0 */N * * * *"
/// - "every N hours"       -> "0 0 */N * * *"
/// - "every minute"        -> "0 * * * * *"
/// - "every hour", "hourly" -> "0 0 * * * *"
/// - "every day", "daily"  -> "0 0 0 * * *"
/// - "every day at HH:MM"  -> "0 MM HH * * *"
///
/// A 5-field cron expression gets a leading seconds field; 6 fields pass through.
pub fn normalize_schedule(input: &str) -> Result<String, SchedulerError> {
    let trimmed = input.trim();
    let invalid = || SchedulerError::InvalidSchedule(input.to_string());

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts.len() {
        5 => return Ok(format!("0 {trimmed}")),
        6 => return Ok(trimmed.to_string()),
        _ => {}
    }

    let lower = trimmed.to_lowercase();
    match lower.as_str() {
        "every minute" | "minutely" => return Ok("0 * * * * *".to_string()),
        "every hour" | "hourly" => return Ok("0 0 * * * *".to_string()),
        "every day" | "daily" => return Ok("0 0 0 * * *".to_string()),
        _ => {}
    }

    let Some(rest) = lower.strip_prefix("every ") else {
        return Err(SchedulerError::InvalidSchedule(format!(
            "unrecognized schedule format: '{trimmed}'"
        )));
    };

    if let Some(at) = rest.strip_prefix("day at ") {
        let (hour, minute) = at.split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
        let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;
        if hour >= 24 || minute >= 60 {
            return Err(invalid());
        }
        return Ok(format!("0 {minute} {hour} * * *"));
    }

    let words: Vec<&str> = rest.split_whitespace().collect();
    let [count, unit] = words.as_slice() else {
        return Err(invalid());
    };
    let n: u32 = count.parse().map_err(|_| invalid())?;
    if n == 0 {
        return Err(SchedulerError::InvalidSchedule(
            "interval must be > 0".to_string(),
        ));
    }
    match unit.trim_end_matches('s') {
        "second" => Ok(format!("*/{n} * * * * *")),
        "minute" => Ok(format!("0 */{n} * * * *")),
        "hour" => Ok(format!("0 0 */{n} * * *")),
        _ => Err(invalid()),
    }
}

/// Callback invoked each time the schedule fires.
pub type SweepCallback =
    Arc<dyn Fn(DateTime<Utc>) -> futures_util::future::BoxFuture<'static, ()> + Send + Sync>;

/// Build a callback running one sweep of `service` per tick.
///
/// Sweep errors are logged; the schedule keeps running.
pub fn sweep_callback<T, M>(service: Arc<ReminderService<T, M>>) -> SweepCallback
where
    T: TaskRepository + 'static,
    M: Messenger + 'static,
{
    Arc::new(move |now| {
        let service = Arc::clone(&service);
        Box::pin(async move {
            if let Err(e) = service.run_once(now).await {
                tracing::error!(error = %e, "reminder sweep failed");
            }
        })
    })
}

struct Running {
    scheduler: JobScheduler,
    job_id: Uuid,
}

/// Owns the cron job that drives reminder sweeps.
pub struct ReminderScheduler {
    inner: Arc<RwLock<Option<Running>>>,
}

impl ReminderScheduler {
    /// Create a scheduler (not yet started).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Start the underlying scheduler and register the sweep on `schedule`,
    /// evaluated in `tz`.
    pub async fn start(
        &self,
        schedule: &str,
        tz: Tz,
        callback: SweepCallback,
    ) -> Result<(), SchedulerError> {
        let cron_expr = normalize_schedule(schedule)?;

        let job = Job::new_async_tz(cron_expr.as_str(), tz, move |_uuid, _lock| {
            let cb = Arc::clone(&callback);
            Box::pin(async move {
                let now = Utc::now();
                tracing::debug!(%now, "reminder trigger fired");
                cb(now).await;
            })
        })
        .map_err(|e| SchedulerError::InvalidSchedule(e.to_string()))?;
        let job_id = job.guid();

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;
        scheduler
            .add(job)
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;
        scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))?;

        let mut inner = self.inner.write().await;
        *inner = Some(Running { scheduler, job_id });

        tracing::info!(schedule, cron = %cron_expr, %tz, "reminder scheduler started");
        Ok(())
    }

    /// Stop the scheduler. A no-op when it was never started.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let mut inner = self.inner.write().await;
        if let Some(Running { mut scheduler, .. }) = inner.take() {
            scheduler
                .shutdown()
                .await
                .map_err(|e| SchedulerError::JobError(e.to_string()))?;
            tracing::info!("reminder scheduler stopped");
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// When the sweep fires next, if the scheduler is running.
    pub async fn next_run(&self) -> Result<Option<DateTime<Utc>>, SchedulerError> {
        let inner = self.inner.read().await;
        let Some(running) = inner.as_ref() else {
            return Ok(None);
        };
        let mut scheduler = running.scheduler.clone();
        scheduler
            .next_tick_for_job(running.job_id)
            .await
            .map_err(|e| SchedulerError::JobError(e.to_string()))
    }
}

impl Default for ReminderScheduler {
    fn default() -> Self {
        Self::new()
    }
}
