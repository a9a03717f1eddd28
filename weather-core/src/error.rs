use thiserror::Error;

/// Failures of a single weather query.
///
/// Every variant is scoped to one query; none of them leaves the resolver
/// unusable for the next one.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Missing API key or unusable configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected user input, raised before any network call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Geocoding produced no candidate for the given name.
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Non-success status, or a body that could not be turned into a typed value.
    #[error("OpenWeather API error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Timeout or transport failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl WeatherError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn provider(status: u16, message: impl Into<String>) -> Self {
        Self::Provider { status, message: message.into() }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "API key is not configured.\n\
                 Hint: set OPENWEATHER_API_KEY or run `weather configure`."
                .to_string(),
            Self::Validation(_) => "Please enter a city name.".to_string(),
            Self::NotFound(city) => format!("Could not find a city named '{city}'."),
            Self::Provider { status, message } => {
                format!("Failed to fetch weather data ({status}): {message}")
            }
            Self::Network(e) if e.is_timeout() => {
                "The weather service did not respond in time.".to_string()
            }
            Self::Network(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Only configuration problems affect every subsequent query.
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_display_carries_status_and_message() {
        let err = WeatherError::provider(401, "Invalid API key");
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid API key"));
    }

    #[test]
    fn user_messages() {
        assert!(WeatherError::configuration("x").user_message().contains("OPENWEATHER_API_KEY"));
        assert!(WeatherError::validation("empty").user_message().contains("city name"));
        assert!(
            WeatherError::NotFound("Atlantis".into())
                .user_message()
                .contains("Atlantis")
        );
    }

    #[test]
    fn only_configuration_is_fatal() {
        assert!(WeatherError::configuration("missing").is_fatal_for_session());
        assert!(!WeatherError::validation("empty").is_fatal_for_session());
        assert!(!WeatherError::provider(500, "boom").is_fatal_for_session());
    }
}
