use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::{
    FORECAST_HORIZON, ForecastPoint, LocationCandidate, UnitSystem, WeatherError, WeatherSnapshot,
};

use super::WeatherProvider;

pub const GEO_BASE_URL: &str = "https://api.openweathermap.org/geo/1.0";
pub const DATA_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// PNG icon (@2x) for an OpenWeather icon code such as `10d`.
pub fn icon_url(icon_code: &str) -> String {
    format!("{ICON_URL_BASE}/{icon_code}@2x.png")
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    http: Client,
    geo_base_url: String,
    data_base_url: String,
}

impl OpenWeatherClient {
    /// Fails with a configuration error on an empty key, before any request is made.
    pub fn new(api_key: impl Into<String>) -> Result<Self, WeatherError> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(WeatherError::configuration("OpenWeather API key is empty"));
        }

        // No idle connections are kept between calls.
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            api_key,
            http,
            geo_base_url: GEO_BASE_URL.to_string(),
            data_base_url: DATA_BASE_URL.to_string(),
        })
    }

    pub fn with_geo_base_url(mut self, url: &str) -> Self {
        self.geo_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_base_url(mut self, url: &str) -> Self {
        self.data_base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn geo_base_url(&self) -> &str {
        &self.geo_base_url
    }

    pub fn data_base_url(&self) -> &str {
        &self.data_base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<T, WeatherError> {
        debug!(url, ?params, "OpenWeather {what} request");

        let res = self
            .http
            .get(url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "OpenWeather {what} request failed");
            return Err(WeatherError::provider(status.as_u16(), error_message(&body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::provider(status.as_u16(), format!("malformed {what} response: {e}"))
        })
    }

    async fn fetch_current(
        &self,
        mut params: Vec<(&str, String)>,
        units: UnitSystem,
        lang: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        params.push(("units", units.as_query().to_string()));
        params.push(("lang", lang.to_string()));

        let url = format!("{}/weather", self.data_base_url);
        let parsed: OwCurrentResponse = self.get_json(&url, &params, "current weather").await?;
        parsed.into_snapshot()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn geocode(
        &self,
        query: &str,
        limit: u8,
        lang: &str,
    ) -> Result<Vec<LocationCandidate>, WeatherError> {
        let mut params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        if !lang.is_empty() {
            params.push(("lang", lang.to_string()));
        }

        let url = format!("{}/direct", self.geo_base_url);
        self.get_json(&url, &params, "geocoding").await
    }

    async fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        lang: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let params = vec![("lat", lat.to_string()), ("lon", lon.to_string())];
        self.fetch_current(params, units, lang).await
    }

    async fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
        lang: &str,
    ) -> Result<Vec<ForecastPoint>, WeatherError> {
        let params = vec![
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("units", units.as_query().to_string()),
            ("lang", lang.to_string()),
        ];

        let url = format!("{}/forecast", self.data_base_url);
        let parsed: OwForecastResponse = self.get_json(&url, &params, "forecast").await?;
        parsed.into_points()
    }

    async fn current_by_name(
        &self,
        city: &str,
        units: UnitSystem,
        lang: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_current(vec![("q", city.to_string())], units, lang).await
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
    pressure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let pressure_hpa = self.main.pressure.ok_or_else(|| {
            WeatherError::provider(200, "malformed current weather response: missing main.pressure")
        })?;
        let (condition_code, condition_description) = first_condition(self.weather);

        Ok(WeatherSnapshot {
            city_name: self.name,
            country_code: self.sys.country.filter(|c| !c.is_empty()),
            temperature: self.main.temp,
            feels_like: self.main.feels_like,
            humidity_pct: self.main.humidity,
            pressure_hpa,
            wind_speed: self.wind.speed,
            condition_code,
            condition_description,
            sunrise_epoch: self.sys.sunrise,
            sunset_epoch: self.sys.sunset,
            utc_offset_seconds: self.timezone,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwForecastCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
    #[serde(default)]
    city: OwForecastCity,
}

impl OwForecastResponse {
    fn into_points(self) -> Result<Vec<ForecastPoint>, WeatherError> {
        let offset = i64::from(self.city.timezone);
        let mut list = self.list;
        list.sort_by_key(|e| e.dt);
        list.truncate(FORECAST_HORIZON);

        list.into_iter()
            .map(|e| {
                let local_timestamp = e.dt.checked_add(offset).ok_or_else(|| {
                    WeatherError::provider(
                        200,
                        format!("malformed forecast response: dt {} out of range", e.dt),
                    )
                })?;
                let (condition_code, condition_description) = first_condition(e.weather);

                Ok(ForecastPoint {
                    local_timestamp,
                    temperature: e.main.temp,
                    feels_like: e.main.feels_like,
                    humidity_pct: e.main.humidity,
                    wind_speed: e.wind.speed,
                    precipitation_probability_pct: probability_pct(e.pop),
                    condition_code,
                    condition_description,
                })
            })
            .collect()
    }
}

fn first_condition(weather: Vec<OwWeather>) -> (String, String) {
    weather
        .into_iter()
        .next()
        .map(|w| (w.icon, w.description))
        .unwrap_or_default()
}

fn probability_pct(pop: f64) -> u8 {
    (pop * 100.0).round().clamp(0.0, 100.0) as u8
}

/// The provider's `message` field, or the raw body when there is none.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| truncate_body(body))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
