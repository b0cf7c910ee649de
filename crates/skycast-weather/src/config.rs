use std::time::Duration;

use url::Url;

use crate::error::WeatherError;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_MAX_CITIES: usize = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10 * 60;
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 5;

/// Client settings. `Default` yields the fixed production values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    /// Current-weather endpoint; `q` and `appid` are appended as query parameters
    pub base_url: String,
    /// Max number of cities kept in a client's cache
    pub max_cities: usize,
    /// How long a cached response counts as fresh
    pub cache_ttl: Duration,
    /// Time between refresh cycles in polling mode
    pub polling_interval: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_cities: DEFAULT_MAX_CITIES,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            polling_interval: Duration::from_secs(DEFAULT_POLLING_INTERVAL_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

impl WeatherConfig {
    /// Default settings against a different endpoint.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Check that the settings can back a working client.
    ///
    /// # Errors
    /// Returns `WeatherError::Validation` naming the first invalid field.
    pub fn validate(&self) -> Result<(), WeatherError> {
        match Url::parse(&self.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => {
                return Err(WeatherError::Validation(format!(
                    "base_url: unsupported scheme '{}'",
                    url.scheme()
                )))
            }
            Err(e) => {
                return Err(WeatherError::Validation(format!(
                    "base_url: invalid URL '{}': {}",
                    self.base_url, e
                )))
            }
        }

        if self.max_cities == 0 {
            return Err(WeatherError::Validation(
                "max_cities: must be at least 1".to_string(),
            ));
        }
        if self.polling_interval.is_zero() {
            return Err(WeatherError::Validation(
                "polling_interval: must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(WeatherError::Validation(
                "timeouts: must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
