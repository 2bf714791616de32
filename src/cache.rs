use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::DexError;
use crate::model::{Ability, Form, GrowthRate, NamedPage, Species, Variant};
use crate::store::Store;

/// An entity type with its own cache namespace.
pub trait CachedEntity: Clone + Serialize + DeserializeOwned + Send + Sync {
    const NAMESPACE: &'static str;
}

impl CachedEntity for Species {
    const NAMESPACE: &'static str = "species";
}

impl CachedEntity for Variant {
    const NAMESPACE: &'static str = "pokemon";
}

impl CachedEntity for Form {
    const NAMESPACE: &'static str = "pokemon-form";
}

impl CachedEntity for Ability {
    const NAMESPACE: &'static str = "ability";
}

impl CachedEntity for GrowthRate {
    const NAMESPACE: &'static str = "growth-rate";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SpeciesListing(pub NamedPage);

impl CachedEntity for SpeciesListing {
    const NAMESPACE: &'static str = "species-list";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct GrowthRateListing(pub NamedPage);

impl CachedEntity for GrowthRateListing {
    const NAMESPACE: &'static str = "growth-rate-list";
}

/// Reduces a lookup argument to its cache key: strings verbatim, anything
/// else as compact JSON (object keys are sorted, so value-equal arguments
/// give equal keys).
pub fn derive_key<A: Serialize + ?Sized>(arg: &A) -> Result<String, DexError> {
    let value = serde_json::to_value(arg).map_err(|err| DexError::CacheKey(err.to_string()))?;
    Ok(match value {
        Value::String(text) => text,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Memory,
    Disk,
    Miss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<T> {
    pub value: Option<T>,
    pub source: CacheSource,
}

#[derive(Debug, Default)]
pub struct CacheCounters {
    memory_hits: AtomicUsize,
    disk_hits: AtomicUsize,
    misses: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub memory_hits: usize,
    pub disk_hits: usize,
    pub misses: usize,
}

impl CounterSnapshot {
    pub fn add(&mut self, other: CounterSnapshot) {
        self.memory_hits += other.memory_hits;
        self.disk_hits += other.disk_hits;
        self.misses += other.misses;
    }
}

impl CacheCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.memory_hits.store(0, Ordering::Relaxed);
        self.disk_hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn record(&self, source: CacheSource) {
        let counter = match source {
            CacheSource::Memory => &self.memory_hits,
            CacheSource::Disk => &self.disk_hits,
            CacheSource::Miss => &self.misses,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Counters of one namespace, handed to the batch fetcher for per-window
/// reset and reporting.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats<'c> {
    pub namespace: &'static str,
    pub counters: &'c CacheCounters,
}

/// Two-tier cache for one entity type: a run-scoped map in front of the
/// persisted namespace directory.
pub struct Cache<T> {
    store: Store,
    memory: Mutex<HashMap<String, T>>,
    counters: CacheCounters,
}

impl<T: CachedEntity> Cache<T> {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            memory: Mutex::new(HashMap::new()),
            counters: CacheCounters::default(),
        }
    }

    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    pub fn stats(&self) -> CacheStats<'_> {
        CacheStats {
            namespace: T::NAMESPACE,
            counters: &self.counters,
        }
    }

    pub async fn get(&self, key: &str) -> CacheLookup<T> {
        if let Some(value) = self.memory_get(key) {
            self.counters.record(CacheSource::Memory);
            return CacheLookup {
                value: Some(value),
                source: CacheSource::Memory,
            };
        }

        let path = self.store.record_path(T::NAMESPACE, key);
        let decoded = match Store::read_record(&path).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(
                        namespace = T::NAMESPACE,
                        key,
                        error = %err,
                        "discarding malformed cache record"
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(namespace = T::NAMESPACE, key, error = %err, "unreadable cache record");
                None
            }
        };

        match decoded {
            Some(value) => {
                self.memory_insert(key, value.clone());
                self.counters.record(CacheSource::Disk);
                CacheLookup {
                    value: Some(value),
                    source: CacheSource::Disk,
                }
            }
            None => {
                self.counters.record(CacheSource::Miss);
                CacheLookup {
                    value: None,
                    source: CacheSource::Miss,
                }
            }
        }
    }

    /// Resolves once the record is durably written.
    pub async fn set(&self, key: &str, value: &T) -> Result<(), DexError> {
        self.memory_insert(key, value.clone());
        let content = serde_json::to_vec(value)
            .map_err(|err| DexError::Serialization(err.to_string()))?;
        let path = self.store.record_path(T::NAMESPACE, key);
        Store::write_record_atomic(&path, &content).await
    }

    fn memory_get(&self, key: &str) -> Option<T> {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    fn memory_insert(&self, key: &str, value: T) {
        self.memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }
}

/// Every namespace used by one export run.
pub struct Caches {
    pub species_list: Cache<SpeciesListing>,
    pub species: Cache<Species>,
    pub variants: Cache<Variant>,
    pub forms: Cache<Form>,
    pub abilities: Cache<Ability>,
    pub growth_rate_list: Cache<GrowthRateListing>,
    pub growth_rates: Cache<GrowthRate>,
}

impl Caches {
    pub fn new(store: &Store) -> Self {
        Self {
            species_list: Cache::new(store.clone()),
            species: Cache::new(store.clone()),
            variants: Cache::new(store.clone()),
            forms: Cache::new(store.clone()),
            abilities: Cache::new(store.clone()),
            growth_rate_list: Cache::new(store.clone()),
            growth_rates: Cache::new(store.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListQuery, NamedResource};

    #[test]
    fn string_keys_are_verbatim() {
        assert_eq!(derive_key("bulbasaur").unwrap(), "bulbasaur");
        assert_eq!(derive_key(&"mr-mime".to_string()).unwrap(), "mr-mime");
    }

    #[test]
    fn structured_keys_are_deterministic() {
        let a = ListQuery {
            limit: 10,
            offset: 0,
        };
        let b = ListQuery {
            limit: 10,
            offset: 0,
        };
        assert_eq!(derive_key(&a).unwrap(), derive_key(&b).unwrap());
        assert_eq!(derive_key(&a).unwrap(), r#"{"limit":10,"offset":0}"#);
    }

    #[tokio::test]
    async fn memory_hit_after_set() {
        let temp = tempfile::tempdir().unwrap();
        let root = camino::Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let cache: Cache<SpeciesListing> = Cache::new(Store::new_with_paths(root));
        let page = SpeciesListing(NamedPage {
            count: 1,
            results: vec![NamedResource::new("bulbasaur")],
        });

        assert_eq!(cache.get("k").await.source, CacheSource::Miss);
        cache.set("k", &page).await.unwrap();
        let lookup = cache.get("k").await;
        assert_eq!(lookup.source, CacheSource::Memory);
        assert_eq!(lookup.value, Some(page));
        assert_eq!(
            cache.counters().snapshot(),
            CounterSnapshot {
                memory_hits: 1,
                disk_hits: 0,
                misses: 1
            }
        );
    }
}
