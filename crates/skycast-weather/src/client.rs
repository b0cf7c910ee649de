//! Weather client: cache-first lookups plus optional background polling.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cache::WeatherCache;
use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::fetch::WeatherFetcher;
use crate::types::{CityKey, Mode, WeatherResponse};

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failed: usize,
}

/// State shared between the client handle and its poller task.
#[derive(Debug)]
struct ClientInner {
    fetcher: WeatherFetcher,
    cache: WeatherCache,
}

impl ClientInner {
    async fn refresh_all(&self) -> RefreshReport {
        let snapshot = self.cache.snapshot();
        let mut report = RefreshReport::default();

        if snapshot.is_empty() {
            tracing::debug!("Polling skipped for API key '{}': cache is empty", self.fetcher.masked_key());
            return report;
        }

        tracing::debug!(
            "Polling {} cached cities for API key '{}'",
            snapshot.len(),
            self.fetcher.masked_key()
        );

        for (key, current) in snapshot {
            // Re-query by display name; the entry stays under its original key
            let city = current
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| key.as_str().to_string());

            match self.fetcher.fetch(&city).await {
                Ok(fresh) => {
                    self.cache.put(key, fresh);
                    report.refreshed += 1;
                    tracing::debug!("Refreshed weather for city '{}'", city);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("Failed to refresh weather for city '{}': {}", city, e);
                }
            }
        }

        report
    }
}

struct Poller {
    cancel: CancellationToken,
}

async fn poll_loop(inner: Arc<ClientInner>, interval: Duration, cancel: CancellationToken) {
    // First tick completes immediately
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let report = inner.refresh_all().await;
        if report.failed > 0 {
            tracing::debug!(
                "Polling cycle finished with {} refreshed, {} failed",
                report.refreshed,
                report.failed
            );
        }
    }

    tracing::debug!("Polling loop exited for API key '{}'", inner.fetcher.masked_key());
}

/// Weather client bound to one API key.
///
/// Lookups are served from an in-memory cache while fresh. In
/// [`Mode::Polling`] a background task refreshes every cached city on a fixed
/// interval until [`WeatherClient::shutdown`] is called or the client is
/// dropped.
pub struct WeatherClient {
    inner: Arc<ClientInner>,
    mode: Mode,
    poller: Mutex<Option<Poller>>,
}

impl std::fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("api_key", &self.inner.fetcher.masked_key())
            .field("mode", &self.mode)
            .field("polling", &self.is_polling())
            .finish()
    }
}

impl WeatherClient {
    /// Create a client. In polling mode this spawns the poller on the
    /// current Tokio runtime, which runs its first cycle immediately.
    ///
    /// # Errors
    /// - `Validation` for a blank API key or invalid config
    /// - `Runtime` when polling is requested outside a Tokio runtime
    /// - `Network` when the HTTP client cannot be built
    pub fn new(api_key: &str, mode: Mode, config: &WeatherConfig) -> Result<Self, WeatherError> {
        if api_key.trim().is_empty() {
            return Err(WeatherError::Validation(
                "API key must not be null or empty".to_string(),
            ));
        }
        config.validate()?;

        let inner = Arc::new(ClientInner {
            fetcher: WeatherFetcher::new(api_key, config)?,
            cache: WeatherCache::new(config.max_cities, config.cache_ttl),
        });

        let poller = match mode {
            Mode::OnDemand => None,
            Mode::Polling => {
                let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
                    WeatherError::Runtime(format!("polling mode requires a Tokio runtime: {}", e))
                })?;

                tracing::info!("Starting polling scheduler for API key '{}'", inner.fetcher.masked_key());
                let cancel = CancellationToken::new();
                runtime.spawn(poll_loop(
                    Arc::clone(&inner),
                    config.polling_interval,
                    cancel.clone(),
                ));
                Some(Poller { cancel })
            }
        };

        Ok(Self {
            inner,
            mode,
            poller: Mutex::new(poller),
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a background poller is still scheduled.
    pub fn is_polling(&self) -> bool {
        self.poller.lock().is_some()
    }

    /// Read access to the client's cache.
    pub fn cache(&self) -> &WeatherCache {
        &self.inner.cache
    }

    /// Current weather for `city`, from cache when fresh.
    ///
    /// The city is sent upstream exactly as given; only the cache key is
    /// normalized.
    ///
    /// # Errors
    /// `Validation` for a blank city, otherwise whatever the fetch returned.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_current_weather(&self, city: &str) -> Result<WeatherResponse, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::Validation(
                "City name must not be null or empty".to_string(),
            ));
        }

        let key = CityKey::new(city);

        if let Some(cached) = self.inner.cache.get_if_fresh(&key) {
            tracing::debug!("Cache hit for city '{}'", city);
            return Ok(cached);
        }

        tracing::debug!("Cache miss for city '{}', fetching from API", city);
        let fresh = self.inner.fetcher.fetch(city).await?;
        self.inner.cache.put(key, fresh.clone());
        Ok(fresh)
    }

    /// Same as [`get_current_weather`](Self::get_current_weather), serialized to JSON.
    ///
    /// # Errors
    /// Same as `get_current_weather`.
    pub async fn get_current_weather_json(&self, city: &str) -> Result<String, WeatherError> {
        let response = self.get_current_weather(city).await?;
        serde_json::to_string(&response).map_err(|e| WeatherError::Parsing(e.to_string()))
    }

    /// Re-fetch every cached city once. Per-city failures are logged and
    /// counted, never returned.
    pub async fn refresh_all(&self) -> RefreshReport {
        self.inner.refresh_all().await
    }

    /// Stop the poller, if any. Does not wait for a running cycle and does
    /// not clear the cache. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(poller) = self.poller.lock().take() {
            tracing::info!(
                "Shutting down polling scheduler for API key '{}'",
                self.inner.fetcher.masked_key()
            );
            poller.cancel.cancel();
        }
    }
}

impl Drop for WeatherClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}
