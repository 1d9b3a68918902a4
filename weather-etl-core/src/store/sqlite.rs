use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    QueryBuilder, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};

use super::{Dialect, SqlValue, WeatherStore, insert_prefix, rows_per_statement};
use crate::error::DatabaseError;

/// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER` since 3.32.
const MAX_BIND_PARAMS: usize = 32_766;

/// SQLite-backed store. The pool holds a single connection so there is only
/// ever one writer, and `sqlite::memory:` databases survive for the pool's
/// lifetime.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    max_rows_per_statement: Option<usize>,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool,
            max_rows_per_statement: None,
        })
    }

    /// Fresh private in-memory database.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Self::connect("sqlite::memory:").await
    }

    /// Split batches into statements of at most `rows` rows; they still share
    /// one transaction.
    pub fn with_max_rows_per_statement(mut self, rows: usize) -> Self {
        self.max_rows_per_statement = Some(rows.max(1));
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl WeatherStore for SqliteStore {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, statement: &str) -> Result<(), DatabaseError> {
        sqlx::query(statement).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &str,
        columns: &[&str],
        rows: &[Vec<SqlValue>],
    ) -> Result<u64, DatabaseError> {
        let chunk_size = self
            .max_rows_per_statement
            .unwrap_or_else(|| rows_per_statement(columns.len(), MAX_BIND_PARAMS));

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(chunk_size) {
            let mut builder = QueryBuilder::<Sqlite>::new(insert_prefix(table, columns));
            builder.push_values(chunk, |mut row_sql, row| {
                for value in row {
                    match value {
                        SqlValue::Text(v) => row_sql.push_bind(v.clone()),
                        SqlValue::Float(v) => row_sql.push_bind(*v),
                        SqlValue::Int(v) => row_sql.push_bind(*v),
                        SqlValue::Date(v) => row_sql.push_bind(*v),
                    };
                }
            });
            inserted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }
}
