//! At most one live client per API key.
//!
//! `ClientRegistry` is an ordinary value so tests and embedders can own
//! isolated instances. The free functions at the bottom of this module work
//! on a process-wide instance built with the default configuration.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::client::WeatherClient;
use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::fetch::mask_key;
use crate::types::Mode;

pub struct ClientRegistry {
    config: WeatherConfig,
    clients: RwLock<HashMap<String, Arc<WeatherClient>>>,
}

/// Process-wide registry
static GLOBAL: OnceLock<ClientRegistry> = OnceLock::new();

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::with_config(WeatherConfig::default())
    }

    /// Registry whose clients are all built from `config`.
    pub fn with_config(config: WeatherConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static ClientRegistry {
        GLOBAL.get_or_init(ClientRegistry::new)
    }

    /// Create and register a client for `api_key`.
    ///
    /// The client is built first and then inserted only if the key is still
    /// free. On conflict the new client is shut down and the registered one is
    /// left untouched.
    ///
    /// # Errors
    /// - `Validation` for a blank key
    /// - `AlreadyExists` when a client for the key is registered
    /// - anything [`WeatherClient::new`] returns
    pub fn create(&self, api_key: &str, mode: Mode) -> Result<Arc<WeatherClient>, WeatherError> {
        if api_key.trim().is_empty() {
            return Err(WeatherError::Validation(
                "API key must not be null or empty".to_string(),
            ));
        }

        let client = Arc::new(WeatherClient::new(api_key, mode, &self.config)?);

        let inserted = match self.clients.write().entry(api_key.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&client));
                true
            }
        };

        if !inserted {
            client.shutdown();
            return Err(WeatherError::AlreadyExists(format!(
                "WeatherClient for API key '{}' already exists. Destroy it before creating a new one.",
                mask_key(api_key)
            )));
        }

        tracing::info!("Registered {} client for API key '{}'", mode, mask_key(api_key));
        Ok(client)
    }

    pub fn get(&self, api_key: &str) -> Option<Arc<WeatherClient>> {
        self.clients.read().get(api_key).cloned()
    }

    /// Unregister and shut down the client for `api_key`. No-op if absent.
    pub fn destroy(&self, api_key: &str) {
        let removed = self.clients.write().remove(api_key);
        if let Some(client) = removed {
            client.shutdown();
            tracing::info!("Destroyed client for API key '{}'", mask_key(api_key));
        }
    }

    /// Destroy every registered client.
    pub fn shutdown_all(&self) {
        let drained: Vec<_> = self.clients.write().drain().collect();
        for (api_key, client) in drained {
            client.shutdown();
            tracing::debug!("Destroyed client for API key '{}'", mask_key(&api_key));
        }
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

/// Create a client in the process-wide registry.
///
/// # Errors
/// See [`ClientRegistry::create`].
pub fn create_client(api_key: &str, mode: Mode) -> Result<Arc<WeatherClient>, WeatherError> {
    ClientRegistry::global().create(api_key, mode)
}

pub fn get_registered_client(api_key: &str) -> Option<Arc<WeatherClient>> {
    ClientRegistry::global().get(api_key)
}

pub fn destroy_client(api_key: &str) {
    ClientRegistry::global().destroy(api_key);
}
