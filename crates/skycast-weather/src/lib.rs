//! Current-weather SDK for Skycast
//!
//! Fetches current weather by city name from an OpenWeatherMap-compatible
//! API, keeps recent answers in a small TTL/LRU cache, and can refresh cached
//! cities in the background.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mapping;
pub mod registry;
pub mod types;

pub use cache::WeatherCache;
pub use client::{RefreshReport, WeatherClient};
pub use config::WeatherConfig;
pub use error::WeatherError;
pub use fetch::WeatherFetcher;
pub use mapping::parse_weather_response;
pub use registry::{create_client, destroy_client, get_registered_client, ClientRegistry};
pub use types::*;
