//! Retry on transient SQLite lock errors
//!
//! Parallel sources write through separate transactions; SQLite answers
//! write contention with SQLITE_BUSY / SQLITE_LOCKED. Those are retried with
//! exponential backoff until `max_wait` elapses. Any other error is returned
//! immediately.

use crate::error::IngestError;
use std::future::Future;
use std::time::{Duration, Instant};

const INITIAL_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Whether `err` is a transient lock error worth retrying
pub fn is_lock_error(err: &IngestError) -> bool {
    let db_err = match err {
        IngestError::Database(e) => e,
        IngestError::Common(fakt_common::Error::Database(e)) => e,
        IngestError::Rollback { source, .. } => return is_lock_error(source),
        _ => return false,
    };

    match db_err.as_database_error() {
        Some(e) => {
            let primary = e
                .code()
                .and_then(|c| c.parse::<i32>().ok())
                .map(|c| c & 0xff);
            matches!(primary, Some(SQLITE_BUSY) | Some(SQLITE_LOCKED))
                || e.message().contains("database is locked")
        }
        None => false,
    }
}

/// Run `operation` until it succeeds, fails with a non-lock error, or
/// `max_wait` is used up.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait: Duration,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let start_time = Instant::now();
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Database operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if is_lock_error(&err) => {
                let elapsed = start_time.elapsed();
                if elapsed >= max_wait {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Database still locked, giving up"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Database locked, will retry after backoff"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::ConnectOptions;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_on_lock("test_op", Duration::from_secs(1), || async {
            Ok::<_, IngestError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_non_lock_error_fails_immediately() {
        let mut attempts = 0;

        let result = retry_on_lock("test_op", Duration::from_secs(5), || {
            attempts += 1;
            async { Err::<i32, _>(IngestError::VenueNotFound("Unknown Room".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(IngestError::VenueNotFound(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_pool_closed_is_not_a_lock_error() {
        assert!(!is_lock_error(&IngestError::Database(sqlx::Error::PoolClosed)));
    }

    #[test]
    fn test_rollback_of_non_lock_error_is_not_retryable() {
        let err = IngestError::Rollback {
            source: Box::new(IngestError::VenueNotFound("Unknown Room".to_string())),
            rollback: sqlx::Error::PoolClosed,
        };
        assert!(!is_lock_error(&err));
    }

    #[tokio::test]
    async fn test_real_lock_error_detected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("locked.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let holder = sqlx::SqlitePool::connect(&url).await.unwrap();
        sqlx::query("CREATE TABLE t (x INTEGER)").execute(&holder).await.unwrap();
        let mut contender = SqliteConnectOptions::from_str(&url)
            .unwrap()
            .busy_timeout(Duration::ZERO)
            .connect()
            .await
            .unwrap();

        let mut tx = holder.begin().await.unwrap();
        sqlx::query("INSERT INTO t VALUES (1)").execute(&mut *tx).await.unwrap();

        let err = sqlx::query("INSERT INTO t VALUES (2)")
            .execute(&mut contender)
            .await
            .unwrap_err();
        let locked = IngestError::Database(err);
        assert!(is_lock_error(&locked));

        // A failed rollback keeps the original lock error retryable
        let wrapped = IngestError::Rollback {
            source: Box::new(locked),
            rollback: sqlx::Error::PoolClosed,
        };
        assert!(is_lock_error(&wrapped));

        tx.rollback().await.unwrap();
    }
}
