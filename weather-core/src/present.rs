//! Display-ready rows built from a [`WeatherReport`].

use chrono::DateTime;
use serde::Serialize;
use std::fmt::Write as _;

use crate::{ForecastPoint, ReportSource, UnitSystem, WeatherReport, WeatherSnapshot, icon_url};

const PLACEHOLDER: &str = "—";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionCategory {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Thunderstorm,
    Snow,
    Mist,
}

/// Icon-code prefix to category.
const CATEGORY_TABLE: &[(&str, ConditionCategory)] = &[
    ("01", ConditionCategory::Clear),
    ("02", ConditionCategory::PartlyCloudy),
    ("03", ConditionCategory::Cloudy),
    ("04", ConditionCategory::Cloudy),
    ("09", ConditionCategory::Rain),
    ("10", ConditionCategory::Rain),
    ("11", ConditionCategory::Thunderstorm),
    ("13", ConditionCategory::Snow),
    ("50", ConditionCategory::Mist),
];

impl ConditionCategory {
    pub fn from_code(code: &str) -> Option<Self> {
        let prefix = code.get(..2)?;
        CATEGORY_TABLE.iter().find(|(p, _)| *p == prefix).map(|(_, c)| *c)
    }

    /// (day, night) glyphs; only clear and partly-cloudy differ.
    fn glyphs(self) -> (&'static str, &'static str) {
        match self {
            ConditionCategory::Clear => ("☀️", "🌙"),
            ConditionCategory::PartlyCloudy => ("🌤️", "☁️"),
            ConditionCategory::Cloudy => ("☁️", "☁️"),
            ConditionCategory::Rain => ("🌧️", "🌧️"),
            ConditionCategory::Thunderstorm => ("⛈️", "⛈️"),
            ConditionCategory::Snow => ("❄️", "❄️"),
            ConditionCategory::Mist => ("🌫️", "🌫️"),
        }
    }
}

/// Glyph for an icon code like `10n`. Unknown codes map to "".
pub fn condition_glyph(code: &str) -> &'static str {
    let Some(category) = ConditionCategory::from_code(code) else {
        return "";
    };

    let (day, night) = category.glyphs();
    if code.ends_with('n') { night } else { day }
}

/// Wall-clock time at a UTC offset. Missing or zero epochs render as a placeholder.
pub fn format_local(epoch: Option<i64>, utc_offset_seconds: i32) -> String {
    match epoch {
        Some(ts) if ts != 0 => ts
            .checked_add(i64::from(utc_offset_seconds))
            .map(format_shifted)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Format a timestamp that already carries the local offset.
fn format_shifted(local_ts: i64) -> String {
    DateTime::from_timestamp(local_ts, 0)
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotView {
    pub title: String,
    pub description: String,
    pub glyph: &'static str,
    pub icon_url: Option<String>,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub pressure: String,
    pub sunrise: String,
    pub sunset: String,
}

impl SnapshotView {
    pub fn new(snapshot: &WeatherSnapshot, units: UnitSystem) -> Self {
        let title = match snapshot.country_code.as_deref() {
            Some(country) if !country.is_empty() => format!("{}, {country}", snapshot.city_name),
            _ => snapshot.city_name.clone(),
        };
        let icon_url =
            (!snapshot.condition_code.is_empty()).then(|| icon_url(&snapshot.condition_code));

        Self {
            title,
            description: capitalize(&snapshot.condition_description),
            glyph: condition_glyph(&snapshot.condition_code),
            icon_url,
            temperature: format!("{:.1}{}", snapshot.temperature, units.temperature_symbol()),
            feels_like: format!("{:.1}{}", snapshot.feels_like, units.temperature_symbol()),
            humidity: format!("{}%", snapshot.humidity_pct),
            wind: format!("{} {}", snapshot.wind_speed, units.wind_speed_unit()),
            pressure: format!("{} hPa", snapshot.pressure_hpa),
            sunrise: format_local(snapshot.sunrise_epoch, snapshot.utc_offset_seconds),
            sunset: format_local(snapshot.sunset_epoch, snapshot.utc_offset_seconds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub time: String,
    pub glyph: &'static str,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub precipitation: String,
}

impl ForecastRow {
    pub fn new(point: &ForecastPoint, units: UnitSystem) -> Self {
        Self {
            time: format_shifted(point.local_timestamp),
            glyph: condition_glyph(&point.condition_code),
            description: capitalize(&point.condition_description),
            temperature: format!("{:.1}{}", point.temperature, units.temperature_symbol()),
            feels_like: format!("{:.1}{}", point.feels_like, units.temperature_symbol()),
            humidity: format!("{}%", point.humidity_pct),
            wind: format!("{} {}", point.wind_speed, units.wind_speed_unit()),
            precipitation: format!("{}%", point.precipitation_probability_pct),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub current: SnapshotView,
    pub forecast: Vec<ForecastRow>,
    /// Set when the forecast is missing because the city could not be geocoded.
    pub notice: Option<String>,
}

impl ReportView {
    pub fn new(report: &WeatherReport) -> Self {
        let notice = match report.source {
            ReportSource::NameFallback => Some(
                "Forecast unavailable: the city could not be geocoded, showing current weather only."
                    .to_string(),
            ),
            ReportSource::Geocoded { .. } => None,
        };

        Self {
            current: SnapshotView::new(&report.snapshot, report.units),
            forecast: report.forecast.iter().map(|p| ForecastRow::new(p, report.units)).collect(),
            notice,
        }
    }

    /// Plain-text rendering for terminals.
    pub fn render_text(&self) -> String {
        let c = &self.current;
        let mut out = String::new();

        let _ = writeln!(out, "{} {}", c.glyph, c.title);
        if !c.description.is_empty() {
            let _ = writeln!(out, "{}", c.description);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Temperature : {}", c.temperature);
        let _ = writeln!(out, "Feels like  : {}", c.feels_like);
        let _ = writeln!(out, "Humidity    : {}", c.humidity);
        let _ = writeln!(out, "Wind        : {}", c.wind);
        let _ = writeln!(out, "Pressure    : {}", c.pressure);
        let _ = writeln!(out, "Sunrise     : {}", c.sunrise);
        let _ = writeln!(out, "Sunset      : {}", c.sunset);

        if let Some(notice) = &self.notice {
            let _ = writeln!(out);
            let _ = writeln!(out, "{notice}");
        }

        if !self.forecast.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Forecast");
            for row in &self.forecast {
                let _ = writeln!(
                    out,
                    "{}  {:<2} {:>8}  rain {:>4}  {:>4}  {:>9}  {}",
                    row.time,
                    row.glyph,
                    row.temperature,
                    row.precipitation,
                    row.humidity,
                    row.wind,
                    row.description,
                );
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            city_name: "Seoul".to_string(),
            country_code: Some("KR".to_string()),
            temperature: 21.46,
            feels_like: 20.9,
            humidity_pct: 40,
            pressure_hpa: 1015,
            wind_speed: 3.6,
            condition_code: "01n".to_string(),
            condition_description: "clear sky".to_string(),
            sunrise_epoch: Some(1_700_000_000),
            sunset_epoch: None,
            utc_offset_seconds: 32400,
        }
    }

    #[test]
    fn glyph_by_category_and_time_of_day() {
        assert_eq!(condition_glyph("01d"), "☀️");
        assert_eq!(condition_glyph("01n"), "🌙");
        assert_eq!(condition_glyph("02d"), "🌤️");
        assert_eq!(condition_glyph("02n"), "☁️");
        assert_eq!(condition_glyph("04d"), "☁️");
        assert_eq!(condition_glyph("09n"), "🌧️");
        assert_eq!(condition_glyph("10d"), "🌧️");
        assert_eq!(condition_glyph("11d"), "⛈️");
        assert_eq!(condition_glyph("13n"), "❄️");
        assert_eq!(condition_glyph("50d"), "🌫️");
    }

    #[test]
    fn unknown_codes_have_no_glyph() {
        for code in ["", "7", "99d", "xx", "날씨"] {
            assert_eq!(condition_glyph(code), "", "{code}");
        }
        assert_eq!(ConditionCategory::from_code("05d"), None);
    }

    #[test]
    fn local_time_is_pure() {
        let first = format_local(Some(1_700_000_000), 32400);
        for _ in 0..5 {
            assert_eq!(format_local(Some(1_700_000_000), 32400), first);
        }
        assert_eq!(first, "2023-11-15 07:13");
    }

    #[test]
    fn missing_epochs_render_placeholder() {
        assert_eq!(format_local(None, 32400), PLACEHOLDER);
        assert_eq!(format_local(Some(0), 0), PLACEHOLDER);
    }

    #[test]
    fn out_of_range_epochs_render_placeholder() {
        assert_eq!(format_local(Some(i64::MAX), 32400), PLACEHOLDER);
        assert_eq!(format_local(Some(i64::MIN), -3600), PLACEHOLDER);
        // In range for i64 but not a representable date.
        assert_eq!(format_local(Some(i64::MAX - 100_000), 0), PLACEHOLDER);
    }

    #[test]
    fn snapshot_view_formats_with_units() {
        let view = SnapshotView::new(&snapshot(), UnitSystem::Metric);
        assert_eq!(view.title, "Seoul, KR");
        assert_eq!(view.description, "Clear sky");
        assert_eq!(view.temperature, "21.5°C");
        assert_eq!(view.wind, "3.6 m/s");
        assert_eq!(view.pressure, "1015 hPa");
        assert_eq!(view.sunset, PLACEHOLDER);
        assert_eq!(view.icon_url.as_deref(), Some("https://openweathermap.org/img/wn/01n@2x.png"));

        let imperial = SnapshotView::new(&snapshot(), UnitSystem::Imperial);
        assert_eq!(imperial.feels_like, "20.9°F");
        assert_eq!(imperial.wind, "3.6 mph");
    }

    #[test]
    fn title_without_country() {
        let mut snap = snapshot();
        snap.country_code = None;
        assert_eq!(SnapshotView::new(&snap, UnitSystem::Metric).title, "Seoul");
    }

    #[test]
    fn forecast_row_uses_shifted_timestamp() {
        let point = ForecastPoint {
            local_timestamp: 1_700_000_000 + 32400,
            temperature: 8.0,
            feels_like: 6.25,
            humidity_pct: 81,
            wind_speed: 1.5,
            precipitation_probability_pct: 42,
            condition_code: "10n".to_string(),
            condition_description: "약한 비".to_string(),
        };

        let row = ForecastRow::new(&point, UnitSystem::Metric);
        assert_eq!(row.time, "2023-11-15 07:13");
        assert_eq!(row.precipitation, "42%");
        assert_eq!(row.glyph, "🌧️");
        assert_eq!(row.description, "약한 비");
    }

    #[test]
    fn fallback_report_carries_notice_and_no_forecast() {
        let report = WeatherReport {
            units: UnitSystem::Metric,
            source: ReportSource::NameFallback,
            snapshot: snapshot(),
            forecast: Vec::new(),
        };

        let view = ReportView::new(&report);
        assert!(view.notice.is_some());
        let text = view.render_text();
        assert!(text.contains("Seoul, KR"));
        assert!(text.contains("Forecast unavailable"));
        assert!(!text.contains("\nForecast\n"));
    }
}
