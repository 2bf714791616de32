use std::time::Duration;

use camino::Utf8PathBuf;

use dex_export::cache::{Cache, CacheSource, CachedEntity, derive_key};
use dex_export::fetcher::BatchFetcher;
use dex_export::model::{Ability, EffectEntry, LocalizedName, NamedResource, Species};
use dex_export::store::Store;

fn store() -> (tempfile::TempDir, Store) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, Store::new_with_paths(root))
}

fn overgrow() -> Ability {
    Ability {
        id: 65,
        name: "overgrow".to_string(),
        names: vec![LocalizedName {
            name: "Overgrow".to_string(),
            language: NamedResource::new("en"),
        }],
        effect_entries: vec![EffectEntry {
            effect: "Strengthens grass moves, \"in a pinch\".".to_string(),
            short_effect: "Strengthens grass moves.".to_string(),
            language: NamedResource::new("en"),
        }],
    }
}

#[tokio::test]
async fn persisted_record_survives_a_fresh_memory_tier() {
    let (_temp, store) = store();
    let value = overgrow();

    let cache: Cache<Ability> = Cache::new(store.clone());
    cache.set("overgrow", &value).await.unwrap();
    assert!(store.record_path(Ability::NAMESPACE, "overgrow").as_std_path().exists());

    let restarted: Cache<Ability> = Cache::new(store.clone());
    let lookup = restarted.get("overgrow").await;
    assert_eq!(lookup.source, CacheSource::Disk);
    assert_eq!(lookup.value, Some(value.clone()));

    let again = restarted.get("overgrow").await;
    assert_eq!(again.source, CacheSource::Memory);
}

#[tokio::test]
async fn malformed_record_is_a_miss_and_gets_overwritten() {
    let (_temp, store) = store();
    let path = store.record_path(Ability::NAMESPACE, "overgrow");
    std::fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
    std::fs::write(path.as_std_path(), b"{\"id\": 65, \"name\":").unwrap();

    let cache: Cache<Ability> = Cache::new(store.clone());
    let lookup = cache.get("overgrow").await;
    assert_eq!(lookup.source, CacheSource::Miss);
    assert!(lookup.value.is_none());
    assert_eq!(cache.counters().snapshot().misses, 1);

    cache.set("overgrow", &overgrow()).await.unwrap();
    let restarted: Cache<Ability> = Cache::new(store);
    assert_eq!(restarted.get("overgrow").await.value, Some(overgrow()));
}

#[tokio::test]
async fn namespaces_do_not_collide() {
    let (_temp, store) = store();
    let abilities: Cache<Ability> = Cache::new(store.clone());
    abilities.set("static", &overgrow()).await.unwrap();

    let species: Cache<Species> = Cache::new(store.clone());
    assert_eq!(species.get("static").await.source, CacheSource::Miss);
    assert_ne!(
        store.record_path(Ability::NAMESPACE, "static"),
        store.record_path(Species::NAMESPACE, "static")
    );
}

#[tokio::test]
async fn counters_reset_to_zero() {
    let (_temp, store) = store();
    let cache: Cache<Ability> = Cache::new(store);
    cache.get("overgrow").await;
    cache.set("overgrow", &overgrow()).await.unwrap();
    cache.get("overgrow").await;
    let snapshot = cache.counters().snapshot();
    assert_eq!((snapshot.memory_hits, snapshot.disk_hits, snapshot.misses), (1, 0, 1));

    cache.counters().reset();
    let snapshot = cache.counters().snapshot();
    assert_eq!((snapshot.memory_hits, snapshot.disk_hits, snapshot.misses), (0, 0, 0));
}

#[tokio::test]
async fn duplicate_keys_in_one_window_all_persist() {
    let (_temp, store) = store();
    let cache: Cache<Ability> = Cache::new(store.clone());
    let fetcher = BatchFetcher::new(8, Duration::ZERO);
    let keys = vec!["overgrow"; 8];

    let results = fetcher
        .run_cached(&cache, &keys, |_| async { Ok(overgrow()) })
        .await
        .unwrap();
    assert_eq!(results, vec![overgrow(); 8]);

    let dir = store.namespace_dir(Ability::NAMESPACE);
    let entries: Vec<_> = std::fs::read_dir(dir.as_std_path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(entries.len(), 1);
    let restarted: Cache<Ability> = Cache::new(store);
    assert_eq!(restarted.get("overgrow").await.value, Some(overgrow()));
}

#[test]
fn clear_namespace_removes_records() {
    let (_temp, store) = store();
    let dir = store.namespace_dir("ability");
    std::fs::create_dir_all(dir.as_std_path()).unwrap();
    std::fs::write(dir.join("x.json").as_std_path(), b"{}").unwrap();
    store.clear_namespace("ability").unwrap();
    assert!(!dir.as_std_path().exists());
    assert_eq!(derive_key("x").unwrap(), "x");
}
