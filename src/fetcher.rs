use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::cache::{Cache, CacheStats, CachedEntity, CounterSnapshot, derive_key};
use crate::error::DexError;

/// Applies a fetch across keys in fixed-size concurrent windows, pausing
/// between windows. Results keep input order.
pub struct BatchFetcher {
    window_size: usize,
    window_delay: Duration,
    totals: Mutex<CounterSnapshot>,
}

impl BatchFetcher {
    pub fn new(window_size: usize, window_delay: Duration) -> Self {
        Self {
            window_size: window_size.max(1),
            window_delay,
            totals: Mutex::new(CounterSnapshot::default()),
        }
    }

    /// Cache counters summed over every finished window so far.
    pub fn cache_totals(&self) -> CounterSnapshot {
        *self
            .totals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn run<'a, K, V, F, Fut>(&self, keys: &'a [K], fetch: F) -> Result<Vec<V>, DexError>
    where
        F: Fn(&'a K) -> Fut,
        Fut: Future<Output = Result<V, DexError>>,
    {
        self.drive(keys, None, |_, key| fetch(key)).await
    }

    /// Like [`run`](Self::run), but a cache hit skips `fetch` for that key and
    /// every fetched value is written through before the window completes.
    pub async fn run_cached<'a, K, T, F, Fut>(
        &self,
        cache: &Cache<T>,
        keys: &'a [K],
        fetch: F,
    ) -> Result<Vec<T>, DexError>
    where
        K: Serialize,
        T: CachedEntity,
        F: Fn(&'a K) -> Fut,
        Fut: Future<Output = Result<T, DexError>>,
    {
        let fetch = &fetch;
        self.drive(keys, Some(cache.stats()), move |_, key| async move {
            fetch_cached(cache, key, || fetch(key)).await
        })
        .await
    }

    /// Keyed variant: maps each item (with its index) and collects the
    /// non-`None` results under the item's cache key.
    pub async fn run_map<'a, K, V, F, Fut>(
        &self,
        items: &'a [K],
        stats: Option<CacheStats<'_>>,
        mapper: F,
    ) -> Result<HashMap<String, V>, DexError>
    where
        K: Serialize,
        F: Fn(usize, &'a K) -> Fut,
        Fut: Future<Output = Result<Option<V>, DexError>>,
    {
        let results = self.drive(items, stats, mapper).await?;
        let mut mapped = HashMap::with_capacity(results.len());
        for (item, result) in items.iter().zip(results) {
            if let Some(value) = result {
                mapped.insert(derive_key(item)?, value);
            }
        }
        Ok(mapped)
    }

    async fn drive<'a, K, V, F, Fut>(
        &self,
        keys: &'a [K],
        stats: Option<CacheStats<'_>>,
        fetch: F,
    ) -> Result<Vec<V>, DexError>
    where
        F: Fn(usize, &'a K) -> Fut,
        Fut: Future<Output = Result<V, DexError>>,
    {
        let windows = keys.len().div_ceil(self.window_size);
        let mut results = Vec::with_capacity(keys.len());

        for (window, chunk) in keys.chunks(self.window_size).enumerate() {
            if let Some(stats) = stats {
                stats.counters.reset();
            }

            let offset = window * self.window_size;
            let batch = chunk
                .iter()
                .enumerate()
                .map(|(index, key)| fetch(offset + index, key));
            results.extend(try_join_all(batch).await?);

            if let Some(stats) = stats {
                let snapshot = stats.counters.snapshot();
                debug!(
                    namespace = stats.namespace,
                    window = window + 1,
                    windows,
                    memory_hits = snapshot.memory_hits,
                    disk_hits = snapshot.disk_hits,
                    misses = snapshot.misses,
                    "batch window complete"
                );
                self.totals
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .add(snapshot);
            }

            if window + 1 < windows {
                tokio::time::sleep(self.window_delay).await;
            }
        }

        Ok(results)
    }
}

/// Memory, then disk, then `fetch`; a fetched value is persisted before
/// this resolves.
pub async fn fetch_cached<K, T, F, Fut>(cache: &Cache<T>, key: &K, fetch: F) -> Result<T, DexError>
where
    K: Serialize + ?Sized,
    T: CachedEntity,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DexError>>,
{
    let cache_key = derive_key(key)?;
    if let Some(value) = cache.get(&cache_key).await.value {
        return Ok(value);
    }
    let value = fetch().await?;
    cache.set(&cache_key, &value).await?;
    Ok(value)
}
