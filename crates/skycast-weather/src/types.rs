use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::WeatherError;

/// How a client keeps its cached cities up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fetch only when a caller asks for a city that is missing or stale
    OnDemand,
    /// Additionally refresh every cached city on a fixed interval
    Polling,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDemand => "on_demand",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_demand" | "on-demand" | "ondemand" => Ok(Self::OnDemand),
            "polling" => Ok(Self::Polling),
            "" => Err(WeatherError::Validation("Mode must not be empty".to_string())),
            other => Err(WeatherError::Validation(format!("Unknown mode: {}", other))),
        }
    }
}

/// Normalized cache key for a city: trimmed and lower-cased.
///
/// Two raw names that normalize equal address the same cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityKey(String);

impl CityKey {
    pub fn new(city: &str) -> Self {
        Self(city.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Short condition summary (first entry of the upstream `weather` list)
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct WeatherInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureInfo {
    pub temp: f64,
    pub feels_like: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct WindInfo {
    pub speed: f64,
}

/// Sunrise and sunset as unix seconds
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SysInfo {
    pub sunrise: i64,
    pub sunset: i64,
}

/// Current weather for one city, as returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WeatherResponse {
    /// Absent when upstream sent no (or an empty) `weather` list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherInfo>,
    pub temperature: TemperatureInfo,
    pub visibility: i32,
    pub wind: WindInfo,
    /// Observation time, unix seconds
    pub datetime: i64,
    pub sys: SysInfo,
    /// Shift from UTC in seconds
    pub timezone: i32,
    /// Display name as reported upstream; may differ from the lookup key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
