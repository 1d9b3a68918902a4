use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
};

use super::{Dialect, SqlValue, WeatherStore, insert_prefix, rows_per_statement};
use crate::error::DatabaseError;

/// PostgreSQL caps a statement at 65535 bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WeatherStore for PostgresStore {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(rows_per_statement(columns.len(), MAX_BIND_PARAMS)) {
            let mut builder = QueryBuilder::<Postgres>::new(insert_prefix(table, columns));
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

        // Dropping `tx` on an early return rolls the whole batch back.
        tx.commit().await?;
        Ok(inserted)
    }
}
