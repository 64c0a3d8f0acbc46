//! C2: two-tier cache facade (§4.2). Memory tier is always present; the
//! remote tier backs the `remote`/`hybrid` strategies and is consulted only
//! when configured. `CacheService` emits `cache:hit` / `cache:miss` /
//! `cache:set` / `cache:delete` / `cache:clear` through the shared event bus.

mod entry;
mod memory;
mod remote;

pub use entry::CacheEntry;
pub use memory::{CacheStats, MemoryCache};
pub use remote::{RemoteCache, UnimplementedRemoteCache};

use crate::config::knobs::{CacheConfig, CacheStrategy};
use crate::error::Result;
use crate::event_bus::EventBus;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub struct CacheService {
    memory: MemoryCache,
    remote: Option<Arc<dyn RemoteCache>>,
    strategy: CacheStrategy,
    events: Arc<EventBus>,
}

impl CacheService {
    pub fn new(config: &CacheConfig, events: Arc<EventBus>) -> Self {
        let remote: Option<Arc<dyn RemoteCache>> = match config.strategy {
            CacheStrategy::Memory => None,
            CacheStrategy::Remote | CacheStrategy::Hybrid => {
                Some(Arc::new(UnimplementedRemoteCache))
            }
        };
        Self {
            memory: MemoryCache::new(config.memory.max_entries, config.memory.ttl_seconds),
            remote,
            strategy: config.strategy,
            events,
        }
    }

    /// Memory-first lookup. `hybrid` falls through to the remote tier on a
    /// memory miss and repopulates memory on a remote hit.
    pub fn get<T: DeserializeOwned + Serialize>(&self, key: &str) -> Result<Option<T>> {
        if let Some(value) = self.memory.get::<T>(key) {
            self.events.emit("cache:hit", serde_json::json!({ "key": key, "tier": "memory" }));
            return Ok(Some(value));
        }

        if self.strategy == CacheStrategy::Hybrid {
            if let Some(remote) = &self.remote {
                match remote::get::<T>(remote.as_ref(), key) {
                    Ok(Some((value, ttl))) => {
                        self.memory.set(key, &value, Some(ttl));
                        self.events.emit(
                            "cache:hit",
                            serde_json::json!({ "key": key, "tier": "remote" }),
                        );
                        return Ok(Some(value));
                    }
                    Ok(None) => {}
                    Err(crate::error::Error::NotImplemented(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        self.events.emit("cache:miss", serde_json::json!({ "key": key }));
        Ok(None)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()> {
        self.memory.set(key, value, ttl_seconds);
        if self.strategy == CacheStrategy::Hybrid {
            if let Some(remote) = &self.remote {
                match remote::set(remote.as_ref(), key, value, ttl_seconds.unwrap_or(300)) {
                    Ok(()) | Err(crate::error::Error::NotImplemented(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        self.events.emit("cache:set", serde_json::json!({ "key": key }));
        Ok(())
    }

    pub fn delete(&self, key: &str) -> bool {
        let removed = self.memory.delete(key);
        self.events.emit("cache:delete", serde_json::json!({ "key": key }));
        removed
    }

    pub fn clear(&self) {
        self.memory.clear();
        self.events.emit("cache:clear", serde_json::Value::Null);
    }

    pub fn stats(&self) -> CacheStats {
        self.memory.stats()
    }

    /// Healthy once initialized; unhealthy only once enough requests have
    /// been observed that the hit rate is a meaningful signal (§4.2).
    pub fn is_healthy(&self, config: &CacheConfig) -> bool {
        let stats = self.stats();
        let total = stats.hits + stats.misses;
        if total < config.min_requests_for_health {
            return true;
        }
        stats.hit_rate >= config.unhealthy_hit_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::knobs::CacheMemoryConfig;

    fn service() -> CacheService {
        let config = CacheConfig {
            strategy: CacheStrategy::Memory,
            memory: CacheMemoryConfig { max_entries: 10, ttl_seconds: 300 },
            remote: None,
            unhealthy_hit_rate: 0.1,
            min_requests_for_health: 100,
        };
        CacheService::new(&config, Arc::new(EventBus::default()))
    }

    #[test]
    fn set_then_get_hits_memory_tier() {
        let svc = service();
        svc.set("k", &"v".to_string(), None).unwrap();
        let value: Option<String> = svc.get("k").unwrap();
        assert_eq!(value, Some("v".to_string()));
    }

    #[test]
    fn miss_then_set_then_hit_emits_expected_events() {
        let svc = service();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = seen.clone();
        svc.events.on("cache:miss", move |_| s.lock().push("miss"));
        let s = seen.clone();
        svc.events.on("cache:set", move |_| s.lock().push("set"));
        let s = seen.clone();
        svc.events.on("cache:hit", move |_| s.lock().push("hit"));

        let _: Option<String> = svc.get("k").unwrap();
        svc.set("k", &"v".to_string(), None).unwrap();
        let _: Option<String> = svc.get("k").unwrap();

        assert_eq!(*seen.lock(), vec!["miss", "set", "hit"]);
    }

    #[test]
    fn healthy_below_request_floor_regardless_of_hit_rate() {
        let svc = service();
        let config = CacheConfig {
            strategy: CacheStrategy::Memory,
            memory: CacheMemoryConfig::default(),
            remote: None,
            unhealthy_hit_rate: 0.9,
            min_requests_for_health: 100,
        };
        let _: Option<String> = svc.get("missing").unwrap();
        assert!(svc.is_healthy(&config));
    }
}
