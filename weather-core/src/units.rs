//! Measurement-unit selection.
//!
//! An explicit user choice always wins; otherwise the country of the resolved
//! location decides.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

/// Countries whose default is imperial units.
const IMPERIAL_COUNTRIES: &[&str] = &["US", "LR", "MM"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Value of the provider's `units` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// What the user asked for: a fixed system, or auto-detection by country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum UnitPreference {
    #[default]
    Auto,
    Metric,
    Imperial,
}

impl UnitPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitPreference::Auto => "auto",
            UnitPreference::Metric => "metric",
            UnitPreference::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [UnitPreference] {
        &[UnitPreference::Auto, UnitPreference::Metric, UnitPreference::Imperial]
    }

    /// The explicit override, if any.
    pub fn explicit(&self) -> Option<UnitSystem> {
        match self {
            UnitPreference::Auto => None,
            UnitPreference::Metric => Some(UnitSystem::Metric),
            UnitPreference::Imperial => Some(UnitSystem::Imperial),
        }
    }
}

impl fmt::Display for UnitPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitPreference {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(UnitPreference::Auto),
            "metric" => Ok(UnitPreference::Metric),
            "imperial" => Ok(UnitPreference::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown units '{value}'. Supported values: auto, metric, imperial."
            )),
        }
    }
}

impl TryFrom<String> for UnitPreference {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UnitPreference::try_from(value.as_str())
    }
}

impl std::str::FromStr for UnitPreference {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitPreference::try_from(s)
    }
}

/// Pick the unit system for a query.
pub fn select_units(country: Option<&str>, user_override: Option<UnitSystem>) -> UnitSystem {
    if let Some(units) = user_override {
        return units;
    }

    match country {
        Some(code) if IMPERIAL_COUNTRIES.iter().any(|c| c.eq_ignore_ascii_case(code.trim())) => {
            UnitSystem::Imperial
        }
        _ => UnitSystem::Metric,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imperial_countries_in_any_case() {
        for code in ["US", "us", "Us", "LR", "lr", "MM", "mM"] {
            assert_eq!(select_units(Some(code), None), UnitSystem::Imperial, "{code}");
        }
    }

    #[test]
    fn everything_else_is_metric() {
        for code in ["KR", "GB", "CA", "FR", "", "USA", "zz"] {
            assert_eq!(select_units(Some(code), None), UnitSystem::Metric, "{code}");
        }
        assert_eq!(select_units(None, None), UnitSystem::Metric);
    }

    #[test]
    fn override_always_wins() {
        for country in [Some("US"), Some("KR"), Some("MM"), None] {
            for units in [UnitSystem::Metric, UnitSystem::Imperial] {
                assert_eq!(select_units(country, Some(units)), units);
            }
        }
    }

    #[test]
    fn preference_parses_case_insensitively() {
        for pref in UnitPreference::all() {
            let upper = pref.as_str().to_uppercase();
            assert_eq!(UnitPreference::try_from(upper.as_str()).unwrap(), *pref);
        }
        let err = UnitPreference::try_from("kelvin").unwrap_err();
        assert!(err.to_string().contains("Unknown units"));
    }

    #[test]
    fn auto_has_no_explicit_override() {
        assert_eq!(UnitPreference::Auto.explicit(), None);
        assert_eq!(UnitPreference::Imperial.explicit(), Some(UnitSystem::Imperial));
    }

    #[test]
    fn display_symbols() {
        assert_eq!(UnitSystem::Metric.temperature_symbol(), "°C");
        assert_eq!(UnitSystem::Imperial.wind_speed_unit(), "mph");
        assert_eq!(UnitSystem::Imperial.as_query(), "imperial");
    }
}
