//! Core library for the `weather-etl` pipeline.
//!
//! This crate defines:
//! - The city catalog and shared domain models
//! - The OpenWeather provider and the bounded fetch fan-out
//! - Schema management and the atomic batch writer over PostgreSQL or SQLite
//! - The `schema -> fetch -> store` pipeline
//!
//! It is used by `weather-etl-cli`, but can also be driven from other binaries
//! or schedulers.

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fanout;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod schema;
pub mod store;
pub mod writer;

pub use config::{Config, FetchConfig, StoreConfig};
pub use coordinator::FetchCoordinator;
pub use error::{DatabaseError, FetchError, FetchErrorKind};
pub use model::{CityQuery, FetchFailure, FetchReport, WeatherRecord};
pub use pipeline::{Pipeline, PipelineError, PipelineState, RunReport, Stage};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use retry::RetryPolicy;
pub use schema::SchemaManager;
pub use store::WeatherStore;
pub use writer::{WeatherColumn, WeatherWriter, WriteOutcome};
