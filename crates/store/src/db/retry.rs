//! Retrying executor for transient lock contention.
//!
//! Runs one statement against the write connection. A busy/locked failure
//! is retried with exponential backoff; any other failure surfaces
//! immediately. The executor decides how many times to try; the queue in
//! [`super::serializer`] decides when a statement may run at all.

use std::time::Duration;

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use super::StoreError;
use super::statement::{Statement, WriteOutcome};

/// Bounded retry policy for busy/locked failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure. Total attempts are
    /// `max_retries + 1`.
    pub max_retries: u32,
    /// Base backoff delay; retry `n` waits `initial_delay * 2^n`.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `attempt` (1-based).
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.initial_delay * 2_u32.saturating_pow(attempt)
    }
}

/// Whether a failure means the store was temporarily busy or locked.
///
/// SQLite reports `SQLITE_BUSY` (5) when another connection holds a
/// conflicting lock and `SQLITE_LOCKED` (6) for intra-connection table
/// locks; extended codes keep the primary code in the low byte.
#[must_use]
pub fn is_busy_error(error: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = error else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<u32>().ok())
        .is_some_and(|code| matches!(code & 0xFF, 5 | 6))
}

/// Execute one statement, retrying busy/locked failures per `policy`.
///
/// # Errors
///
/// Returns [`StoreError::RetriesExhausted`] once the retry budget is spent
/// on busy failures, or [`StoreError::Database`] immediately for any other
/// failure.
pub async fn execute_with_retry(
    conn: &mut SqliteConnection,
    stmt: &Statement,
    policy: &RetryPolicy,
) -> Result<WriteOutcome, StoreError> {
    let mut attempt: u32 = 0;

    loop {
        match stmt.to_query().execute(&mut *conn).await {
            Ok(result) => return Ok(result.into()),
            Err(error) if is_busy_error(&error) => {
                if attempt >= policy.max_retries {
                    warn!(
                        sql = stmt.sql(),
                        attempts = attempt + 1,
                        "store still busy after final attempt"
                    );
                    return Err(StoreError::RetriesExhausted {
                        attempts: attempt + 1,
                        source: error,
                    });
                }
                attempt += 1;
                let delay = policy.backoff_delay(attempt);
                debug!(
                    sql = stmt.sql(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "store busy, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(StoreError::Database(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn non_database_errors_are_not_busy() {
        assert!(!is_busy_error(&sqlx::Error::RowNotFound));
    }
}
