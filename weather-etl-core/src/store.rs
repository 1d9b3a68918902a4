//! Relational store backends.
//!
//! The pipeline needs only two things from a SQL driver: run a statement,
//! and insert a batch of rows inside one transaction. Both PostgreSQL and
//! SQLite are supported through sqlx; the backend is picked from the
//! database URL scheme.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DatabaseError;

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// SQL flavour spoken by a backend; only DDL differs between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

/// A single bound value in an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Float(f64),
    Int(i32),
    Date(NaiveDate),
}

#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    fn dialect(&self) -> Dialect;

    /// Execute a statement that returns no rows.
    async fn execute(&self, statement: &str) -> Result<(), DatabaseError>;

    /// Insert `rows` into `table` in a single transaction; either every row
    /// is committed or none is. Returns the number of rows inserted.
    ///
    /// `columns` are trusted identifiers, never user input.
    async fn insert_rows(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, DatabaseError>;
}

/// Open the backend matching `url`'s scheme.
pub async fn connect(url: &str) -> Result<Arc<dyn WeatherStore>, DatabaseError> {
    let url = url.trim();

    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        tracing::debug!("connecting to PostgreSQL");
        Ok(Arc::new(PostgresStore::connect(url).await?))
    } else if url.starts_with("sqlite:") {
        tracing::debug!(url, "opening SQLite database");
        Ok(Arc::new(SqliteStore::connect(url).await?))
    } else {
        Err(DatabaseError::UnsupportedUrl(redact_url(url)))
    }
}

/// Rows per INSERT statement so that bind parameters stay under `limit`.
pub(crate) fn rows_per_statement(column_count: usize, limit: usize) -> usize {
    (limit / column_count.max(1)).max(1)
}

pub(crate) fn insert_prefix(table: &str, columns: &[&str]) -> String {
    format!("INSERT INTO {table} ({}) ", columns.join(", "))
}

/// Hide credentials before a URL ends up in an error message.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
