use std::sync::Arc;

use crate::{
    error::DatabaseError,
    store::{Dialect, WeatherStore},
};

pub const WEATHER_TABLE: &str = "weather";

const POSTGRES_DDL: &str = "
CREATE TABLE IF NOT EXISTS weather (
    id SERIAL PRIMARY KEY,
    city VARCHAR(255),
    country VARCHAR(255),
    temperature FLOAT,
    humidity INTEGER,
    wind_speed FLOAT,
    weather_description VARCHAR(255),
    date DATE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const SQLITE_DDL: &str = "
CREATE TABLE IF NOT EXISTS weather (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city TEXT,
    country TEXT,
    temperature REAL,
    humidity INTEGER,
    wind_speed REAL,
    weather_description TEXT,
    date DATE,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

/// `CREATE TABLE IF NOT EXISTS` for the `weather` table in `dialect`.
pub fn create_table_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => POSTGRES_DDL,
        Dialect::Sqlite => SQLITE_DDL,
    }
}

/// Makes sure the `weather` table exists. Safe to run on every invocation.
#[derive(Debug, Clone)]
pub struct SchemaManager {
    store: Arc<dyn WeatherStore>,
}

impl SchemaManager {
    pub fn new(store: Arc<dyn WeatherStore>) -> Self {
        Self { store }
    }

    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        tracing::debug!(table = WEATHER_TABLE, "ensuring table exists");
        self.store
            .execute(create_table_sql(self.store.dialect()))
            .await
    }
}
