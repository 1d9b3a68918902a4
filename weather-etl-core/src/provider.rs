use crate::{
    config::FetchConfig,
    error::FetchError,
    model::{CityQuery, WeatherRecord},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Fetches the current observation for one city.
///
/// Implementations hold no mutable state shared between calls, so a single
/// provider can serve every concurrent fetch of a run.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, city: &CityQuery) -> Result<WeatherRecord, FetchError>;
}

/// Construct the OpenWeather provider from a validated API key and fetch
/// settings.
pub fn provider_from_config(
    api_key: &str,
    fetch: &FetchConfig,
) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let provider = OpenWeatherProvider::builder(api_key)
        .base_url(&fetch.base_url)
        .timeout(fetch.timeout())
        .build()?;

    Ok(Arc::new(provider))
}
