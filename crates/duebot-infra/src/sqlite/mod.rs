//! SQLite storage layer.
//!
//! Repository implementations backed by SQLite with WAL mode and split
//! read/write connection pools.

pub mod category;
pub mod pool;
pub mod task;
pub mod user;

use chrono::{DateTime, SecondsFormat, Utc};

use duebot_types::error::RepositoryError;

/// Fixed-width UTC timestamp, so text order equals time order.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Map a sqlx error, turning UNIQUE violations into `Conflict`.
pub(crate) fn map_write_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> RepositoryError {
    match e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict(conflict())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::pool::DatabasePool;

    pub(crate) async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_datetime_fixed_width() {
        let a = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1500);
        assert_eq!(format_datetime(&a), "2025-01-01T00:00:00.000000Z");
        assert_eq!(format_datetime(&b), "2025-01-01T00:00:00.001500Z");
        assert!(format_datetime(&a) < format_datetime(&b));
        assert_eq!(parse_datetime(&format_datetime(&b)).unwrap(), b);
    }
}
