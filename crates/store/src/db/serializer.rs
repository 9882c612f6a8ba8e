//! FIFO write queue over the single write connection.
//!
//! The serializer is the sole mutator of the database file. It owns the
//! write connection inside a dedicated task; callers hand it statements
//! over an unbounded channel and await a oneshot completion. The channel
//! is the queue, the task loop is the idle/processing state machine:
//! exactly one request is in flight at a time, the next is picked up only
//! after the current one has resolved its completion, and a failed request
//! never stops the loop.
//!
//! Ordering: a request is admitted when its `enqueue` future is first
//! polled. Between two admitted requests, the earlier one fully completes
//! (including its transaction and any retry backoff) before the later one
//! is sent to the store. There is no priority, cancellation, or
//! deduplication; once admitted, a request runs to completion or exhausts
//! its retries.

use sqlx::SqliteConnection;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument};

use super::StoreError;
use super::retry::{RetryPolicy, execute_with_retry};
use super::statement::{Statement, WriteOutcome};

/// How a queued statement should be executed.
#[derive(Debug)]
enum WriteJob {
    /// Run the statement as-is.
    Exec(Statement),
    /// Wrap the statement in `BEGIN IMMEDIATE` .. `COMMIT`, rolling back
    /// on failure.
    Transactional(Statement),
}

impl WriteJob {
    const fn statement(&self) -> &Statement {
        match self {
            Self::Exec(stmt) | Self::Transactional(stmt) => stmt,
        }
    }
}

/// A queued write plus its completion channel. Created on `enqueue`,
/// destroyed as soon as the completion fires. Never persisted.
struct PendingWrite {
    job: WriteJob,
    reply: oneshot::Sender<Result<WriteOutcome, StoreError>>,
}

/// Handle to the write queue. Cheap to clone; all clones feed the same
/// FIFO. Dropping every clone closes the queue and ends the writer task
/// after it drains.
#[derive(Clone)]
pub struct WriteSerializer {
    tx: mpsc::UnboundedSender<PendingWrite>,
}

impl WriteSerializer {
    /// Take ownership of the write connection and start the writer task.
    pub(crate) fn spawn(conn: SqliteConnection, retry: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(conn, rx, retry));
        Self { tx }
    }

    /// Enqueue a write and await its outcome.
    ///
    /// # Errors
    ///
    /// Propagates the executed statement's failure, or
    /// [`StoreError::QueueClosed`] if the writer task is gone.
    pub async fn enqueue(&self, stmt: Statement) -> Result<WriteOutcome, StoreError> {
        self.submit(WriteJob::Exec(stmt)).await
    }

    /// Enqueue a write that must run inside its own immediate-mode
    /// transaction.
    ///
    /// The transaction spans the statement's whole retry budget, so its
    /// backoff sleeps block the queue. That is intentional: with one
    /// writer, holding the queue is what keeps the update atomic with
    /// respect to every other write.
    ///
    /// # Errors
    ///
    /// As [`enqueue`](Self::enqueue); the transaction is rolled back before
    /// any failure is surfaced.
    pub async fn enqueue_transactional(&self, stmt: Statement) -> Result<WriteOutcome, StoreError> {
        self.submit(WriteJob::Transactional(stmt)).await
    }

    async fn submit(&self, job: WriteJob) -> Result<WriteOutcome, StoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingWrite {
                job,
                reply: reply_tx,
            })
            .map_err(|_| StoreError::QueueClosed)?;
        reply_rx.await.map_err(|_| StoreError::QueueClosed)?
    }
}

#[instrument(skip_all, name = "write_serializer")]
async fn writer_loop(
    mut conn: SqliteConnection,
    mut rx: mpsc::UnboundedReceiver<PendingWrite>,
    retry: RetryPolicy,
) {
    while let Some(request) = rx.recv().await {
        debug!(sql = request.job.statement().sql(), "dispatching queued write");
        let result = match &request.job {
            WriteJob::Exec(stmt) => execute_with_retry(&mut conn, stmt, &retry).await,
            WriteJob::Transactional(stmt) => {
                run_in_transaction(&mut conn, stmt, &retry).await
            }
        };
        if let Err(err) = &result {
            error!(sql = request.job.statement().sql(), error = %err, "queued write failed");
        }
        // The caller may have dropped its completion; the write itself
        // already happened either way.
        let _ = request.reply.send(result);
    }
    debug!("write queue closed, writer task exiting");
}

/// Immediate-mode transaction around one retried statement.
///
/// `BEGIN IMMEDIATE` takes the write lock eagerly so the transaction can
/// never deadlock on a lock upgrade. Commit or rollback fires exactly once
/// on every exit path; a rollback failure is logged but never masks the
/// original error.
async fn run_in_transaction(
    conn: &mut SqliteConnection,
    stmt: &Statement,
    retry: &RetryPolicy,
) -> Result<WriteOutcome, StoreError> {
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .map_err(StoreError::Database)?;

    match execute_with_retry(conn, stmt, retry).await {
        Ok(outcome) => match sqlx::query("COMMIT").execute(&mut *conn).await {
            Ok(_) => Ok(outcome),
            Err(commit_err) => {
                rollback(conn).await;
                Err(StoreError::Database(commit_err))
            }
        },
        Err(err) => {
            rollback(conn).await;
            Err(err)
        }
    }
}

async fn rollback(conn: &mut SqliteConnection) {
    if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(conn).await {
        error!(error = %rollback_err, "rollback failed");
    }
}
