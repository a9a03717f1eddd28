//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather client behind the [`WeatherProvider`] trait
//! - Unit selection, the city resolution pipeline and its result cache
//! - Display models for rendering a report
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod present;
pub mod provider;
pub mod units;

pub use cache::TtlCache;
pub use config::Config;
pub use error::WeatherError;
pub use model::{
    FORECAST_HORIZON, ForecastPoint, LocationCandidate, QueryKey, ReportSource, WeatherQuery,
    WeatherReport, WeatherSnapshot,
};
pub use pipeline::{LatestQuery, LocationCache, ReportCache, Resolver};
pub use present::ReportView;
pub use provider::{
    WeatherProvider,
    openweather::{OpenWeatherClient, icon_url},
    provider_from_config,
};
pub use units::{UnitPreference, UnitSystem, select_units};
