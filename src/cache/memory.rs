//! Memory tier: an LRU map with per-entry TTL. Recency is a monotonic
//! access counter (§4.2), not a timestamp, so ties never occur and eviction
//! always has a unique minimum.

use super::entry::{size_estimate, CacheEntry};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub oldest_created_at: Option<i64>,
    pub newest_created_at: Option<i64>,
}

pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry<serde_json::Value>>>,
    max_entries: usize,
    default_ttl_seconds: u64,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new(max_entries: usize, default_ttl_seconds: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            default_ttl_seconds,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Expire-on-access: if present but expired, remove and report a miss.
    /// On a genuine hit, bump recency and the hit counter.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = chrono::Utc::now().timestamp();
        let mut entries = self.entries.write();
        let remove = match entries.get(key) {
            Some(e) if e.is_expired(now) => true,
            Some(_) => false,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        if remove {
            entries.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let recency = self.tick();
        let entry = entries.get_mut(key).expect("checked above");
        entry.hits += 1;
        entry.recency = recency;
        self.hits.fetch_add(1, Ordering::Relaxed);
        serde_json::from_value(entry.data.clone()).ok()
    }

    /// Evict the entry with the lowest recency key before inserting, if at
    /// capacity (§4.2, §8 scenario 2).
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) {
        let size = size_estimate(value);
        let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        let mut entries = self.entries.write();

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            if let Some(evict_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.recency)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&evict_key);
            }
        }

        let recency = self.tick();
        entries.insert(key.to_string(), CacheEntry::new(json, ttl, size, recency));
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        let oldest = entries.values().map(|e| e.created_at).min();
        let newest = entries.values().map(|e| e.created_at).max();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            size: entries.len(),
            hits,
            misses,
            hit_rate: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
            oldest_created_at: oldest,
            newest_created_at: newest,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = MemoryCache::new(10, 300);
        cache.set("k", &"v".to_string(), None);
        let value: Option<String> = cache.get("k");
        assert_eq!(value, Some("v".to_string()));
    }

    #[test]
    fn expired_entry_is_removed_on_access() {
        let cache = MemoryCache::new(10, 0);
        cache.set("k", &"v".to_string(), Some(0));
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let value: Option<String> = cache.get("k");
        assert_eq!(value, None);
        assert!(!cache.contains_key("k"));
    }

    #[test]
    fn lru_eviction_removes_least_recently_used() {
        let cache = MemoryCache::new(3, 300);
        cache.set("a", &1, None);
        cache.set("b", &2, None);
        cache.set("c", &3, None);
        let _: Option<i32> = cache.get("a");
        cache.set("d", &4, None);
        assert!(cache.contains_key("a"));
        assert!(!cache.contains_key("b"));
        assert!(cache.contains_key("c"));
        assert!(cache.contains_key("d"));
    }

    #[test]
    fn hit_rate_tracks_hits_and_misses() {
        let cache = MemoryCache::new(10, 300);
        cache.set("k", &1, None);
        let _: Option<i32> = cache.get("k");
        let _: Option<i32> = cache.get("missing");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }
}
