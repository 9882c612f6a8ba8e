//! Parameterized write statements and their outcomes.
//!
//! A [`Statement`] is the in-memory form of a pending write: the SQL text
//! plus its bound parameters. It lives only as long as the queue entry that
//! carries it.

use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult};

/// A single bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// SQL NULL.
    Null,
    /// 64-bit integer (also used for booleans, 0/1).
    Integer(i64),
    /// Double-precision float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A write statement awaiting execution.
#[derive(Debug, Clone)]
pub struct Statement {
    pub(crate) sql: String,
    pub(crate) params: Vec<SqlParam>,
}

impl Statement {
    /// Create a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append a bound parameter, in positional order.
    #[must_use]
    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }

    /// The SQL text, for logging.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Build the sqlx query with all parameters bound.
    pub(crate) fn to_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for param in &self.params {
            query = match param {
                SqlParam::Null => query.bind(Option::<String>::None),
                SqlParam::Integer(v) => query.bind(*v),
                SqlParam::Real(v) => query.bind(*v),
                SqlParam::Text(v) => query.bind(v.as_str()),
            };
        }
        query
    }
}

/// Result of a successfully executed write.
#[derive(Debug, Clone, Copy)]
pub struct WriteOutcome {
    /// Rowid assigned by the most recent `INSERT` on the connection.
    pub last_insert_rowid: i64,
    /// Number of rows changed by the statement.
    pub rows_affected: u64,
}

impl From<SqliteQueryResult> for WriteOutcome {
    fn from(result: SqliteQueryResult) -> Self {
        Self {
            last_insert_rowid: result.last_insert_rowid(),
            rows_affected: result.rows_affected(),
        }
    }
}
