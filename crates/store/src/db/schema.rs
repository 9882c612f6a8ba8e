//! Base schema and additive reconciliation.
//!
//! The schema predates this layer: live databases exist that were created
//! before some columns did. Startup therefore runs in two phases, both
//! serialized through the write queue:
//!
//! 1. `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT EXISTS` for the
//!    full current schema.
//! 2. Reconciliation: diff each managed table's live column list against
//!    the required columns and `ALTER TABLE .. ADD COLUMN` whatever is
//!    missing. Columns are only ever added, never dropped or renamed.
//!
//! Table branches reconcile concurrently; the steps within one table
//! (inspect, add, backfill) are strictly ordered. A failed branch is
//! logged and skipped rather than aborting startup, which means the
//! process can serve requests against a partially reconciled schema until
//! the next restart retries it.

use sqlx::{Row, SqlitePool};
use tracing::{error, info, instrument};

use super::statement::Statement;
use super::{Store, StoreError};

/// Avatar path assigned to users who never uploaded one.
pub(crate) const DEFAULT_AVATAR: &str = "image/avatar.png";

const CREATE_TABLE_USERS: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT UNIQUE,
    password TEXT,
    phone TEXT,
    address TEXT,
    avatar TEXT DEFAULT 'image/avatar.png',
    two_factor_secret TEXT,
    two_factor_enabled INTEGER DEFAULT 0
)";

const CREATE_TABLE_ORDERS: &str = r"
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    name TEXT,
    email TEXT,
    telegram TEXT,
    service TEXT,
    message TEXT,
    status TEXT DEFAULT 'processing',
    total_amount REAL,
    payment_status TEXT DEFAULT 'pending',
    services TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
)";

const CREATE_TABLE_CONTACT_MESSAGES: &str = r"
CREATE TABLE IF NOT EXISTS contact_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT,
    telegram TEXT,
    message TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_TABLE_REVIEWS: &str = r"
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    rating INTEGER,
    comment TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
)";

// Orders are listed per user and fetched by id on every account page.
const CREATE_INDEX_ORDERS_USER_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id)";
const CREATE_INDEX_ORDERS_ID: &str = "CREATE INDEX IF NOT EXISTS idx_orders_id ON orders(id)";

/// A column a managed table must have, with its additive migration.
struct ColumnSpec {
    name: &'static str,
    /// Type and default, exactly as it appears after `ADD COLUMN <name>`.
    definition: &'static str,
    /// Statement to run right after the column is added, as a second
    /// serialized write. Used to backfill defaults into pre-existing rows.
    backfill: Option<&'static str>,
}

/// Required columns for one managed table.
struct TableSpec {
    table: &'static str,
    columns: &'static [ColumnSpec],
}

static MANAGED_TABLES: &[TableSpec] = &[
    TableSpec {
        table: "users",
        columns: &[
            ColumnSpec {
                name: "avatar",
                definition: "TEXT",
                backfill: Some("UPDATE users SET avatar = 'image/avatar.png' WHERE avatar IS NULL"),
            },
            ColumnSpec {
                name: "two_factor_secret",
                definition: "TEXT",
                backfill: None,
            },
            ColumnSpec {
                name: "two_factor_enabled",
                definition: "INTEGER DEFAULT 0",
                backfill: None,
            },
        ],
    },
    TableSpec {
        table: "orders",
        columns: &[
            ColumnSpec {
                name: "status",
                definition: "TEXT DEFAULT 'processing'",
                backfill: None,
            },
            ColumnSpec {
                name: "total_amount",
                definition: "REAL",
                backfill: None,
            },
            ColumnSpec {
                name: "payment_status",
                definition: "TEXT DEFAULT 'pending'",
                backfill: None,
            },
            ColumnSpec {
                name: "services",
                definition: "TEXT",
                backfill: None,
            },
            ColumnSpec {
                name: "user_id",
                definition: "INTEGER",
                backfill: None,
            },
        ],
    },
];

/// What a reconciliation run actually did.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileReport {
    /// Serialized statements issued (`ALTER TABLE` plus backfills). Zero
    /// means the schema was already current.
    pub statements_issued: usize,
    /// Table branches that failed and were skipped.
    pub failed_tables: usize,
}

/// Create all tables and indexes that do not exist yet, in order, through
/// the write queue.
pub(crate) async fn create_base_schema(store: &Store) -> Result<(), StoreError> {
    for sql in [
        CREATE_TABLE_USERS,
        CREATE_TABLE_ORDERS,
        CREATE_TABLE_CONTACT_MESSAGES,
        CREATE_TABLE_REVIEWS,
        CREATE_INDEX_ORDERS_USER_ID,
        CREATE_INDEX_ORDERS_ID,
    ] {
        store.writer.enqueue(Statement::new(sql)).await?;
    }
    Ok(())
}

/// Reconcile every managed table concurrently.
///
/// Failures are logged per branch and reported in the result rather than
/// propagated; reads and writes that were already queued interleave safely
/// with the issued migrations.
#[instrument(skip_all)]
pub(crate) async fn reconcile(store: &Store) -> ReconcileReport {
    let mut branches = Vec::with_capacity(MANAGED_TABLES.len());
    for spec in MANAGED_TABLES {
        let store = store.clone();
        branches.push(tokio::spawn(async move {
            reconcile_table(&store, spec).await
        }));
    }

    let mut report = ReconcileReport::default();
    for (branch, spec) in branches.into_iter().zip(MANAGED_TABLES) {
        match branch.await {
            Ok(Ok(issued)) => report.statements_issued += issued,
            Ok(Err(err)) => {
                error!(table = spec.table, error = %err, "schema reconciliation branch failed");
                report.failed_tables += 1;
            }
            Err(join_err) => {
                error!(table = spec.table, error = %join_err, "schema reconciliation branch panicked");
                report.failed_tables += 1;
            }
        }
    }

    if report.statements_issued > 0 {
        info!(
            statements = report.statements_issued,
            "schema reconciled with additive migrations"
        );
    }
    report
}

/// Inspect one table, add its missing columns, run backfills. Strictly
/// ordered within the table.
async fn reconcile_table(store: &Store, spec: &TableSpec) -> Result<usize, StoreError> {
    let existing = existing_columns(&store.pool, spec.table).await?;
    let mut issued = 0;

    for column in missing_columns(&existing, spec) {
        let alter = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            spec.table, column.name, column.definition
        );
        info!(table = spec.table, column = column.name, "adding missing column");
        store.writer.enqueue(Statement::new(alter)).await?;
        issued += 1;

        if let Some(backfill) = column.backfill {
            store.writer.enqueue(Statement::new(backfill)).await?;
            issued += 1;
        }
    }

    Ok(issued)
}

/// Live column names of a table, read outside the write queue.
async fn existing_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>, StoreError> {
    // Table names come from the static specs; PRAGMA cannot bind them.
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name").map_err(StoreError::from))
        .collect()
}

fn missing_columns<'a>(existing: &[String], spec: &'a TableSpec) -> Vec<&'a ColumnSpec> {
    spec.columns
        .iter()
        .filter(|column| !existing.iter().any(|name| name == column.name))
        .collect()
}
