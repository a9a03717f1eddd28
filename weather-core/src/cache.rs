//! Process-local, time-bounded memoization.

use parking_lot::RwLock;
use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    time::{Duration, Instant},
};
use tracing::debug;

/// Window for current weather and forecast results.
pub const SHORT_TTL: Duration = Duration::from_secs(5 * 60);

/// Window for geocoding results; a city's coordinates do not change.
pub const LONG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
struct Entry<V> {
    inserted_at: Instant,
    value: V,
}

/// Map of memoized values, each valid for the TTL given at lookup time.
///
/// Concurrent misses for the same key may both run the producer; the last
/// one to finish wins.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self { entries: RwLock::new(HashMap::new()) }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh value for `key`, if any. Entries aged `ttl` or more are stale.
    pub fn get(&self, key: &K, ttl: Duration) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| e.inserted_at.elapsed() < ttl)
            .map(|e| e.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.write().insert(key, Entry { inserted_at: Instant::now(), value });
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the fresh cached value, or run `producer` and remember its result.
    /// Errors are returned as-is and never cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: K,
        ttl: Duration,
        producer: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key, ttl) {
            debug!(?key, "cache hit");
            return Ok(value);
        }

        debug!(?key, "cache miss");
        let value = producer().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_lookup_within_ttl_is_served_from_cache() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_try_insert_with("seoul".to_string(), SHORT_TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(7)
                })
                .await
                .unwrap();
            assert_eq!(v, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entries_are_recomputed() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new();
        let calls = AtomicUsize::new(0);

        for expected in 1..=2 {
            let v = cache
                .get_or_try_insert_with("k", Duration::ZERO, || async {
                    Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) as u32 + 1)
                })
                .await
                .unwrap();
            assert_eq!(v, expected);
        }
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new();
        cache.insert("k", 1);

        let ttl = Duration::from_millis(30);
        assert_eq!(cache.get(&"k", ttl), Some(1));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get(&"k", ttl), None);
        // The same entry is still fresh under a longer window.
        assert_eq!(cache.get(&"k", LONG_TTL), Some(1));
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new();

        let err = cache
            .get_or_try_insert_with("k", SHORT_TTL, || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(err, Err("boom"));
        assert!(cache.is_empty());

        let ok = cache
            .get_or_try_insert_with("k", SHORT_TTL, || async { Ok::<_, &str>(5) })
            .await;
        assert_eq!(ok, Ok(5));
    }

    #[test]
    fn invalidate_and_clear() {
        let cache: TtlCache<u8, u8> = TtlCache::new();
        cache.insert(1, 10);
        cache.insert(2, 20);

        cache.invalidate(&1);
        assert_eq!(cache.get(&1, LONG_TTL), None);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
