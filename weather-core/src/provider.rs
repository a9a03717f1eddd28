use crate::{
    Config, ForecastPoint, LocationCandidate, UnitSystem, WeatherError, WeatherSnapshot,
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Remote operations the resolver needs from a weather service.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Direct geocoding. No match is an empty vector, not an error.
    async fn geocode(
        &self,
        query: &str,
        limit: u8,
        lang: &str,
    ) -> Result<Vec<LocationCandidate>, WeatherError>;

    async fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        lang: &str,
    ) -> Result<WeatherSnapshot, WeatherError>;

    /// Ascending by time, at most [`crate::FORECAST_HORIZON`] points.
    async fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        lang: &str,
    ) -> Result<Vec<ForecastPoint>, WeatherError>;

    /// Legacy lookup by free-text name; only used when geocoding finds nothing.
    async fn current_by_name(
        &self,
        city: &str,
        units: UnitSystem,
        lang: &str,
    ) -> Result<WeatherSnapshot, WeatherError>;
}

/// Construct the OpenWeather client from config and the process environment.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherClient, WeatherError> {
    let api_key = config.resolve_api_key(std::env::var(crate::config::API_KEY_ENV).ok())?;

    let mut client = OpenWeatherClient::new(api_key)?;
    if let Some(url) = config.geo_base_url.as_deref() {
        client = client.with_geo_base_url(url);
    }
    if let Some(url) = config.data_base_url.as_deref() {
        client = client.with_data_base_url(url);
    }

    Ok(client)
}
