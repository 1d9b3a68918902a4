use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::DatabaseError,
    model::WeatherRecord,
    schema::WEATHER_TABLE,
    store::{SqlValue, WeatherStore},
};

/// A writable column of the `weather` table, mapped from a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherColumn {
    City,
    Country,
    Temperature,
    Humidity,
    WindSpeed,
    WeatherDescription,
    Date,
}

const DEFAULT_COLUMNS: [WeatherColumn; 5] = [
    WeatherColumn::City,
    WeatherColumn::Temperature,
    WeatherColumn::Humidity,
    WeatherColumn::WeatherDescription,
    WeatherColumn::Date,
];

impl WeatherColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherColumn::City => "city",
            WeatherColumn::Country => "country",
            WeatherColumn::Temperature => "temperature",
            WeatherColumn::Humidity => "humidity",
            WeatherColumn::WindSpeed => "wind_speed",
            WeatherColumn::WeatherDescription => "weather_description",
            WeatherColumn::Date => "date",
        }
    }

    pub const fn all() -> &'static [WeatherColumn] {
        &[
            WeatherColumn::City,
            WeatherColumn::Country,
            WeatherColumn::Temperature,
            WeatherColumn::Humidity,
            WeatherColumn::WindSpeed,
            WeatherColumn::WeatherDescription,
            WeatherColumn::Date,
        ]
    }

    /// Columns written when nothing else is configured. `country` and
    /// `wind_speed` are left out.
    pub const fn default_set() -> &'static [WeatherColumn] {
        &DEFAULT_COLUMNS
    }

    fn value(&self, record: &WeatherRecord) -> SqlValue {
        match self {
            WeatherColumn::City => SqlValue::Text(record.city.clone()),
            WeatherColumn::Country => SqlValue::Text(record.country.clone()),
            WeatherColumn::Temperature => SqlValue::Float(record.temperature_c),
            WeatherColumn::Humidity => SqlValue::Int(i32::from(record.humidity_pct)),
            WeatherColumn::WindSpeed => SqlValue::Float(record.wind_speed_mps),
            WeatherColumn::WeatherDescription => SqlValue::Text(record.description.clone()),
            WeatherColumn::Date => SqlValue::Date(record.observation_date),
        }
    }
}

impl std::fmt::Display for WeatherColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a call to [`WeatherWriter::store`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The batch was empty; the database was not touched.
    NothingToInsert,
    Inserted { rows: u64 },
}

/// Writes a batch of records to the `weather` table in one transaction.
#[derive(Debug, Clone)]
pub struct WeatherWriter {
    store: Arc<dyn WeatherStore>,
    columns: Vec<WeatherColumn>,
}

impl WeatherWriter {
    pub fn new(store: Arc<dyn WeatherStore>, columns: Vec<WeatherColumn>) -> Self {
        Self { store, columns }
    }

    pub fn with_default_columns(store: Arc<dyn WeatherStore>) -> Self {
        Self::new(store, WeatherColumn::default_set().to_vec())
    }

    pub fn columns(&self) -> &[WeatherColumn] {
        &self.columns
    }

    pub async fn store(&self, records: &[WeatherRecord]) -> Result<WriteOutcome, DatabaseError> {
        if records.is_empty() {
            tracing::info!("No weather data to insert.");
            return Ok(WriteOutcome::NothingToInsert);
        }

        let column_names: Vec<&str> = self.columns.iter().map(WeatherColumn::as_str).collect();
        let rows: Vec<Vec<SqlValue>> = records
            .iter()
            .map(|record| self.columns.iter().map(|c| c.value(record)).collect())
            .collect();

        tracing::info!(rows = rows.len(), table = WEATHER_TABLE, "Inserting weather rows");
        let inserted = self
            .store
            .insert_rows(WEATHER_TABLE, &column_names, &rows)
            .await?;
        tracing::info!(rows = inserted, "Insertion complete.");

        Ok(WriteOutcome::Inserted { rows: inserted })
    }
}
