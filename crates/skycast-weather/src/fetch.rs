//! One HTTP round trip to the current-weather endpoint.

use reqwest::Client;
use tracing::instrument;

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::mapping::{extract_error_message, parse_weather_response};
use crate::types::WeatherResponse;

const USER_AGENT: &str = concat!("skycast-weather/", env!("CARGO_PKG_VERSION"));

/// Mask a credential for log output.
pub(crate) fn mask_key(api_key: &str) -> String {
    let prefix: String = api_key.chars().take(4).collect();
    format!("{}***", prefix)
}

pub struct WeatherFetcher {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for WeatherFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherFetcher")
            .field("api_key", &self.masked_key())
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WeatherFetcher {
    /// Build a fetcher with the connect and read timeouts from `config`.
    ///
    /// # Errors
    /// Returns `WeatherError::Network` if the HTTP client cannot be built.
    pub fn new(api_key: &str, config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.clone(),
        })
    }

    fn request_url(&self, city: &str) -> String {
        format!(
            "{}?q={}&appid={}",
            self.base_url,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key),
        )
    }

    /// Fetch current weather for `city` as typed by the caller.
    ///
    /// # Errors
    /// - `Network` when the round trip cannot complete
    /// - `NotFound` for a 404 answer
    /// - `Api` for any other non-success status
    /// - `Parsing` when the success body is not a JSON object
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch(&self, city: &str) -> Result<WeatherResponse, WeatherError> {
        let url = self.request_url(city);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Network error when calling weather API for city '{}': {}", city, e);
                return Err(WeatherError::Network(e.without_url()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Failed to read weather API response for city '{}': {}", city, e);
                return Err(WeatherError::Network(e.without_url()));
            }
        };

        tracing::debug!("HTTP {} from weather API for city '{}'", status.as_u16(), city);

        if !status.is_success() {
            let err = WeatherError::from_status(status.as_u16(), extract_error_message(&body), body);
            if err.is_not_found() {
                tracing::info!("City '{}' not found by weather API", city);
            } else {
                tracing::warn!("Weather API error for city '{}': status {}", city, status.as_u16());
            }
            return Err(err);
        }

        parse_weather_response(&body).inspect_err(|e| {
            tracing::error!("Failed to parse weather API response for city '{}': {}", city, e);
        })
    }

    /// Masked form of the credential, safe for logs.
    pub fn masked_key(&self) -> String {
        mask_key(&self.api_key)
    }
}
