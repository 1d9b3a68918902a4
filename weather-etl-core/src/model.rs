use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchErrorKind;

/// A single query target: a named point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityQuery {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CityQuery {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// True when latitude is in [-90, 90] and longitude in [-180, 180].
    pub fn has_valid_coordinates(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One parsed observation, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub city: String,
    pub country: String,
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub description: String,
    /// UTC calendar day the reading was taken, not the row's insertion time.
    pub observation_date: NaiveDate,
}

/// A city that did not produce a record, after retries were exhausted or a
/// fatal error was hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub city: String,
    pub kind: FetchErrorKind,
    pub attempts: u32,
    pub message: String,
}

/// Everything the fetch phase produced. Order carries no meaning.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub records: Vec<WeatherRecord>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_bounds_are_inclusive() {
        assert!(CityQuery::new("North Pole", 90.0, 180.0).has_valid_coordinates());
        assert!(CityQuery::new("South Pole", -90.0, -180.0).has_valid_coordinates());
        assert!(!CityQuery::new("Nowhere", 90.5, 0.0).has_valid_coordinates());
        assert!(!CityQuery::new("Nowhere", 0.0, -180.01).has_valid_coordinates());
    }
}
