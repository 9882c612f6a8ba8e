//! Database access for the Order Desk store.
//!
//! # Layout
//!
//! - [`serializer`] - FIFO write queue over the single write connection
//! - [`retry`] - retrying executor for transient busy/locked failures
//! - [`schema`] - base schema and additive startup reconciliation
//! - [`statement`] - parameterized statements and write outcomes
//! - [`users`], [`orders`], [`reviews`], [`contact`] - entity repositories
//!
//! # Tables
//!
//! - `users` - Accounts (unique email, credential hash, profile, 2FA state)
//! - `orders` - Customer orders with JSON line items; indexed by id and by
//!   owning user
//! - `contact_messages` - Contact form submissions (append-only)
//! - `reviews` - User reviews (append-only, owner-deletable)

pub mod contact;
pub mod orders;
pub mod retry;
pub mod reviews;
pub mod schema;
pub mod serializer;
pub mod statement;
pub mod users;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::config::StoreConfig;

pub use contact::ContactMessageRepository;
pub use orders::OrderRepository;
pub use retry::RetryPolicy;
pub use reviews::ReviewRepository;
pub use schema::ReconcileReport;
pub use serializer::WriteSerializer;
pub use statement::{SqlParam, Statement, WriteOutcome};
pub use users::UserRepository;

/// Errors that can occur during store operations.
///
/// Not-found and not-owned are deliberately absent: those are normal
/// outcomes, represented as `None` or a zero row count.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Permanent statement failure (constraint violation, malformed SQL,
    /// missing table). Never retried.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store stayed busy/locked through the whole retry budget. Carries
    /// the last underlying busy error.
    #[error("write retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// Total attempts made, including the first.
        attempts: u32,
        /// The final busy error.
        #[source]
        source: sqlx::Error,
    },

    /// Data in the store is corrupted or invalid (e.g. a malformed line-item
    /// blob). Distinct from not-found; never silently swallowed.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Unique constraint violation (e.g. duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The write queue shut down before the request resolved.
    #[error("write queue closed")]
    QueueClosed,
}

/// Handle to the embedded store: one write queue, one read pool.
///
/// Cheap to clone; every clone shares the same serializer, preserving
/// "exactly one serializer per store". Construct once at startup with
/// [`Store::open`] and pass handles to whatever needs entity access.
#[derive(Clone)]
pub struct Store {
    /// Read pool. Writes never touch it; SQLite's WAL isolation governs
    /// read consistency against the queued writes.
    pub(crate) pool: SqlitePool,
    /// The sole mutator of the database file.
    pub(crate) writer: WriteSerializer,
}

impl Store {
    /// Open the store: connect, create missing tables, reconcile the
    /// schema. Must be called from within a tokio runtime (the write
    /// serializer spawns its task on it).
    ///
    /// Reconciliation failures are logged but do not fail startup; see
    /// [`schema`] for the trade-off.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database file cannot be
    /// opened or the base schema cannot be created. These are the only
    /// unrecoverable startup failures.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let writer_conn = {
            use sqlx::ConnectOptions;
            options.clone().connect().await?
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(config.read_connections)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            writer: WriteSerializer::spawn(writer_conn, config.retry),
        };

        schema::create_base_schema(&store).await?;
        store.reconcile_schema().await;

        Ok(store)
    }

    /// Re-run schema reconciliation. Idempotent: against a current schema
    /// it issues zero statements.
    pub async fn reconcile_schema(&self) -> ReconcileReport {
        schema::reconcile(self).await
    }

    /// User account repository.
    #[must_use]
    pub const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    /// Order repository.
    #[must_use]
    pub const fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(self)
    }

    /// Review repository.
    #[must_use]
    pub const fn reviews(&self) -> ReviewRepository<'_> {
        ReviewRepository::new(self)
    }

    /// Contact message repository.
    #[must_use]
    pub const fn contact_messages(&self) -> ContactMessageRepository<'_> {
        ContactMessageRepository::new(self)
    }

    /// The write queue, for callers composing their own statements.
    #[must_use]
    pub const fn writer(&self) -> &WriteSerializer {
        &self.writer
    }

    /// Close the read pool. The writer task ends once every store clone is
    /// dropped and the queue has drained.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map a unique-constraint failure to [`StoreError::Conflict`].
pub(crate) fn map_unique_violation(error: StoreError, message: &str) -> StoreError {
    match error {
        StoreError::Database(sqlx::Error::Database(ref db_err))
            if db_err.is_unique_violation() =>
        {
            StoreError::Conflict(message.to_owned())
        }
        other => other,
    }
}
