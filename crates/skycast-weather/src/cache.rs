//! In-memory city cache with per-entry TTL and LRU eviction.

use std::time::Duration;

use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::types::{CityKey, WeatherResponse};

#[derive(Debug)]
struct CacheEntry {
    response: WeatherResponse,
    fetched_at: Instant,
}

/// Bounded map from city key to the latest response for that city.
///
/// Entries are kept in access order: both a fresh read and a write count as
/// a use. Once more than `max_size` cities are stored, the least recently
/// used one is dropped. Expiry is checked lazily on read; `snapshot` sees
/// stale entries too.
///
/// Every operation runs under one short lock that is never held across I/O.
#[derive(Debug)]
pub struct WeatherCache {
    max_size: usize,
    ttl: Duration,
    entries: Mutex<LinkedHashMap<CityKey, CacheEntry>>,
}

impl WeatherCache {
    /// `max_size` is clamped to at least 1.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            max_size: max_size.max(1),
            ttl,
            entries: Mutex::new(LinkedHashMap::new()),
        }
    }

    /// Returns the cached response if it is younger than the TTL.
    ///
    /// An entry whose age is exactly the TTL is already expired. A fresh hit
    /// becomes the most recently used entry. An expired entry is removed and
    /// `None` is returned.
    pub fn get_if_fresh(&self, key: &CityKey) -> Option<WeatherResponse> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        let entry = entries.get_refresh(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            return Some(entry.response.clone());
        }

        tracing::debug!("Cache entry for '{}' expired", key);
        entries.remove(key);
        None
    }

    /// Insert or replace the entry for `key`, stamped with the current time.
    pub fn put(&self, key: CityKey, response: WeatherResponse) {
        let mut entries = self.entries.lock();
        let entry = CacheEntry {
            response,
            fetched_at: Instant::now(),
        };

        // Replacing an existing key moves it to the back as well
        entries.insert(key, entry);

        // One put adds at most one key, so one eviction is enough
        if entries.len() > self.max_size {
            if let Some((evicted, _)) = entries.pop_front() {
                tracing::debug!("Evicted least recently used city '{}'", evicted);
            }
        }
    }

    /// Copy of every stored entry, fresh or stale, least recently used first.
    ///
    /// Neither recency nor expiry is touched.
    pub fn snapshot(&self) -> Vec<(CityKey, WeatherResponse)> {
        self.entries
            .lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.response.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn response(name: &str) -> WeatherResponse {
        WeatherResponse {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn keys(cache: &WeatherCache) -> Vec<String> {
        cache
            .snapshot()
            .into_iter()
            .map(|(k, _)| k.as_str().to_string())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_fresh_entry() {
        let cache = WeatherCache::new(10, Duration::from_secs(600));
        cache.put(CityKey::new("London"), response("London"));

        tokio::time::advance(Duration::from_secs(599)).await;

        let hit = cache.get_if_fresh(&CityKey::new("london"));
        assert_eq!(hit, Some(response("London")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_purged() {
        let cache = WeatherCache::new(10, Duration::from_secs(600));
        cache.put(CityKey::new("london"), response("London"));

        tokio::time::advance(Duration::from_secs(600)).await;

        // Still physically present until a read touches it
        assert_eq!(cache.len(), 1);
        assert!(cache.get_if_fresh(&CityKey::new("london")).is_none());
        assert!(cache.snapshot().is_empty());
    }

    #[test]
    fn test_missing_key() {
        let cache = WeatherCache::new(2, Duration::from_secs(60));
        assert!(cache.get_if_fresh(&CityKey::new("nowhere")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let cache = WeatherCache::new(2, Duration::ZERO);
        cache.put(CityKey::new("paris"), response("Paris"));
        assert!(cache.get_if_fresh(&CityKey::new("paris")).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = WeatherCache::new(2, Duration::from_secs(60));
        cache.put(CityKey::new("a"), response("A"));
        cache.put(CityKey::new("b"), response("B"));

        // A becomes most recently used
        assert!(cache.get_if_fresh(&CityKey::new("a")).is_some());

        cache.put(CityKey::new("c"), response("C"));

        assert_eq!(keys(&cache), vec!["a", "c"]);
        assert!(cache.get_if_fresh(&CityKey::new("b")).is_none());
    }

    #[test]
    fn test_put_refreshes_recency() {
        let cache = WeatherCache::new(2, Duration::from_secs(60));
        cache.put(CityKey::new("a"), response("A"));
        cache.put(CityKey::new("b"), response("B"));
        cache.put(CityKey::new("a"), response("A2"));
        cache.put(CityKey::new("c"), response("C"));

        assert_eq!(keys(&cache), vec!["a", "c"]);
        assert_eq!(
            cache.get_if_fresh(&CityKey::new("a")).and_then(|r| r.name),
            Some("A2".to_string())
        );
    }

    #[test]
    fn test_snapshot_does_not_touch_recency() {
        let cache = WeatherCache::new(2, Duration::from_secs(60));
        cache.put(CityKey::new("a"), response("A"));
        cache.put(CityKey::new("b"), response("B"));

        assert_eq!(keys(&cache), vec!["a", "b"]);

        cache.put(CityKey::new("c"), response("C"));
        assert_eq!(keys(&cache), vec!["b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_includes_stale_entries() {
        let cache = WeatherCache::new(3, Duration::from_secs(10));
        cache.put(CityKey::new("old"), response("Old"));
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.put(CityKey::new("new"), response("New"));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].0, CityKey::new("old"));
    }

    #[test]
    fn test_capacity_clamped() {
        let cache = WeatherCache::new(0, Duration::from_secs(60));
        assert_eq!(cache.capacity(), 1);
        cache.put(CityKey::new("a"), response("A"));
        cache.put(CityKey::new("b"), response("B"));
        assert_eq!(keys(&cache), vec!["b"]);
    }

    #[test]
    fn test_size_bounded_under_concurrent_puts() {
        let cache = Arc::new(WeatherCache::new(5, Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("city-{}-{}", t, i);
                        cache.put(CityKey::new(&name), response(&name));
                        let _ = cache.get_if_fresh(&CityKey::new(&name));
                        assert!(cache.len() <= 5);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 5);
    }
}
