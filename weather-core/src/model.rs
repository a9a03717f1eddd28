use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{UnitPreference, UnitSystem, WeatherError};

/// Maximum number of forecast points kept (3-hour spacing, about 48 hours).
pub const FORECAST_HORIZON: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WeatherQuery {
    pub city: String,
    pub units: UnitPreference,
    pub lang: String,
}

impl WeatherQuery {
    pub fn new(city: impl Into<String>, units: UnitPreference, lang: impl Into<String>) -> Self {
        Self { city: city.into(), units, lang: lang.into() }
    }

    /// Normalized cache key; rejects blank city names.
    pub fn key(&self) -> Result<QueryKey, WeatherError> {
        let city = self.city.trim();
        if city.is_empty() {
            return Err(WeatherError::validation("city name must not be empty"));
        }

        Ok(QueryKey {
            city: city.to_string(),
            units: self.units,
            lang: self.lang.trim().to_string(),
        })
    }
}

/// Identity of a query for caching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub city: String,
    pub units: UnitPreference,
    pub lang: String,
}

/// Top-ranked geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub name: String,
    #[serde(default)]
    pub local_names: HashMap<String, String>,
    #[serde(default)]
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl LocationCandidate {
    /// Localized name for `lang`, falling back to the default name.
    /// Empty localized entries count as missing.
    pub fn display_name(&self, lang: &str) -> &str {
        self.local_names
            .get(local_names_key(lang))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

/// OpenWeather uses `kr` as the Korean request language while `local_names`
/// is keyed by ISO 639-1 codes.
fn local_names_key(lang: &str) -> &str {
    match lang {
        "kr" => "ko",
        other => other,
    }
}

/// Current conditions for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    pub country_code: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub wind_speed: f64,
    pub condition_code: String,
    pub condition_description: String,
    pub sunrise_epoch: Option<i64>,
    pub sunset_epoch: Option<i64>,
    pub utc_offset_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Provider epoch shifted by the city's UTC offset.
    pub local_timestamp: i64,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub precipitation_probability_pct: u8,
    pub condition_code: String,
    pub condition_description: String,
}

/// How the location of a report was determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSource {
    Geocoded { lat: f64, lon: f64 },
    /// Geocoding found nothing; weather was looked up by name and has no forecast.
    NameFallback,
}

/// Everything shown for one query. Current weather and forecast share `units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub units: UnitSystem,
    pub source: ReportSource,
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastPoint>,
}
