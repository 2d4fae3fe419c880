//! Cache-backed fallback for aggregated feeds.
//!
//! The engine persists each round's finalised buckets through an external
//! key-value capability ([`CacheStore`]) so the UI always has something to
//! render: cached data is served synchronously as initial state while a
//! fresh round runs, and a failed round leaves the stale entry untouched.
//!
//! Everything here is best-effort: a parse failure, a serialisation failure,
//! or a storage failure is logged and treated as a miss, never propagated.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::{CategoryBucket, FeedQuery};

/// External string key-value storage capability.
///
/// No transactional guarantees are assumed; last write wins. Implementations
/// must be `Send + Sync` so the engine's background round task can write.
pub trait CacheStore: Send + Sync {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str);
}

/// In-memory [`CacheStore`] for tests and embedders without durable storage.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

/// A cached aggregate: the finalised buckets plus when they were stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    pub buckets: Vec<CategoryBucket>,
    /// Unix timestamp, seconds.
    pub stored_at: u64,
}

impl CachedFeed {
    /// Age of this entry, saturating at zero for clock skew.
    pub fn age(&self) -> Duration {
        Duration::from_secs(now_unix_secs().saturating_sub(self.stored_at))
    }

    /// Soft freshness judgement: a stale entry should trigger a new round,
    /// but still serves as fallback if that round fails.
    pub fn fresh(&self, window: Duration) -> bool {
        self.age() <= window
    }
}

/// Read-through wrapper over a [`CacheStore`].
#[derive(Clone)]
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
}

impl FeedCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Look up a cached feed. Missing, unparseable, or storage-failed
    /// entries all read as `None`.
    pub fn read(&self, key: &str) -> Option<CachedFeed> {
        let raw = self.store.get_string(key)?;
        match serde_json::from_str(&raw) {
            Ok(feed) => Some(feed),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unparseable cached feed");
                None
            }
        }
    }

    /// Persist a round's buckets under `key`, stamped with the current time.
    /// Failures are logged and swallowed; a write failure is functionally a
    /// future cache miss.
    pub fn write(&self, key: &str, buckets: &[CategoryBucket]) {
        let feed = CachedFeed {
            buckets: buckets.to_vec(),
            stored_at: now_unix_secs(),
        };
        match serde_json::to_string(&feed) {
            Ok(payload) => self.store.set_string(key, &payload),
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to serialise feed for caching");
            }
        }
    }
}

/// Build the request-signature cache key for a round.
///
/// The key covers the normalised query label and an order-independent hash
/// of the provider id scope, so `[a, b]` and `[b, a]` share an entry while
/// different provider sets do not. Sampling does not narrow the scope: a
/// sampled home round still reads and writes the full-scope entry.
pub fn round_key(query: &FeedQuery, provider_ids: &[String]) -> String {
    let mut ids: Vec<&str> = provider_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    let mut hasher = DefaultHasher::new();
    for id in ids {
        id.hash(&mut hasher);
    }
    let scope = match query {
        FeedQuery::Home => "home".to_string(),
        FeedQuery::Search(_) => format!("q:{}", query.label()),
    };
    format!("feed:{}:{:016x}", scope, hasher.finish())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Item;

    fn bucket(key: &str) -> CategoryBucket {
        CategoryBucket {
            key: key.into(),
            title: key.to_uppercase(),
            items: vec![Item::new("a", "1")],
            source_provider: None,
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn write_then_read_round_trips() {
        let cache = FeedCache::new(Arc::new(MemoryCacheStore::new()));
        cache.write("k", &[bucket("trending")]);

        let feed = cache.read("k").expect("should be cached");
        assert_eq!(feed.buckets.len(), 1);
        assert_eq!(feed.buckets[0].key, "trending");
        assert!(feed.fresh(Duration::from_secs(600)));
    }

    #[test]
    fn missing_key_reads_none() {
        let cache = FeedCache::new(Arc::new(MemoryCacheStore::new()));
        assert!(cache.read("absent").is_none());
    }

    #[test]
    fn malformed_payload_reads_none() {
        let store = Arc::new(MemoryCacheStore::new());
        store.set_string("k", "{not json");
        let cache = FeedCache::new(store);
        assert!(cache.read("k").is_none());
    }

    #[test]
    fn overwrite_replaces_previous_entry() {
        let cache = FeedCache::new(Arc::new(MemoryCacheStore::new()));
        cache.write("k", &[bucket("old")]);
        cache.write("k", &[bucket("new")]);

        let feed = cache.read("k").expect("should be cached");
        assert_eq!(feed.buckets[0].key, "new");
    }

    #[test]
    fn ancient_entry_is_stale_but_readable() {
        let store = Arc::new(MemoryCacheStore::new());
        let feed = CachedFeed {
            buckets: vec![bucket("old")],
            stored_at: 0,
        };
        store.set_string("k", &serde_json::to_string(&feed).expect("serialize"));

        let cache = FeedCache::new(store);
        let read = cache.read("k").expect("stale entries still read");
        assert!(!read.fresh(Duration::from_secs(600)));
        assert_eq!(read.buckets[0].key, "old");
    }

    #[test]
    fn round_key_ignores_provider_order() {
        let a = round_key(&FeedQuery::Home, &ids(&["alpha", "beta"]));
        let b = round_key(&FeedQuery::Home, &ids(&["beta", "alpha"]));
        assert_eq!(a, b);
    }

    #[test]
    fn round_key_differs_by_provider_set() {
        let a = round_key(&FeedQuery::Home, &ids(&["alpha"]));
        let b = round_key(&FeedQuery::Home, &ids(&["beta"]));
        assert_ne!(a, b);
    }

    #[test]
    fn round_key_normalises_query_text() {
        let a = round_key(&FeedQuery::Search("  Rust ".into()), &ids(&["alpha"]));
        let b = round_key(&FeedQuery::Search("rust".into()), &ids(&["alpha"]));
        assert_eq!(a, b);
    }

    #[test]
    fn home_and_search_keys_differ() {
        let home = round_key(&FeedQuery::Home, &ids(&["alpha"]));
        let search = round_key(&FeedQuery::Search("home".into()), &ids(&["alpha"]));
        assert_ne!(home, search, "a search for the word 'home' is not the home feed");
    }
}
