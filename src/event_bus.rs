//! C1: typed named-topic pub/sub (§4.1). Dispatch is synchronous and
//! single-threaded within one `emit`; handlers registered before an emit
//! observe that emit, handlers registered during one only affect later
//! emits, and listener-table mutation is confined to register/unregister/
//! snapshot under a single lock.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

const DEFAULT_MAX_LISTENERS: usize = 100;

struct Listener {
    id: u64,
    handler: Handler,
    once: bool,
}

#[derive(Default)]
struct Topic {
    listeners: Mutex<Vec<Listener>>,
}

pub struct EventBus {
    topics: DashMap<String, Arc<Topic>>,
    next_id: AtomicU64,
    max_listeners: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LISTENERS)
    }
}

impl EventBus {
    pub fn new(max_listeners: usize) -> Self {
        Self { topics: DashMap::new(), next_id: AtomicU64::new(1), max_listeners }
    }

    fn topic(&self, name: &str) -> Arc<Topic> {
        self.topics.entry(name.to_string()).or_insert_with(|| Arc::new(Topic::default())).clone()
    }

    /// Register a handler. Exceeding `max_listeners` logs a warning but the
    /// registration still succeeds (§4.1: "must not drop registrations").
    pub fn on(&self, name: &str, handler: impl Fn(&Value) + Send + Sync + 'static) -> u64 {
        self.register(name, handler, false)
    }

    /// Register a handler that fires once, then is removed.
    pub fn once(&self, name: &str, handler: impl Fn(&Value) + Send + Sync + 'static) -> u64 {
        self.register(name, handler, true)
    }

    fn register(&self, name: &str, handler: impl Fn(&Value) + Send + Sync + 'static, once: bool) -> u64 {
        let topic = self.topic(name);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = topic.listeners.lock();
        if listeners.len() >= self.max_listeners {
            tracing::warn!(topic = name, limit = self.max_listeners, "listener count exceeds configured maximum");
        }
        listeners.push(Listener { id, handler: Arc::new(handler), once });
        id
    }

    pub fn off(&self, name: &str, id: u64) -> bool {
        if let Some(topic) = self.topics.get(name) {
            let mut listeners = topic.listeners.lock();
            let before = listeners.len();
            listeners.retain(|l| l.id != id);
            return listeners.len() != before;
        }
        false
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.topics.get(name).map(|t| t.listeners.lock().len()).unwrap_or(0)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.iter().map(|e| e.key().clone()).collect()
    }

    pub fn remove_all(&self, name: Option<&str>) {
        match name {
            Some(n) => {
                self.topics.remove(n);
            }
            None => self.topics.clear(),
        }
    }

    /// Fan out synchronously to a snapshot of the listeners registered at
    /// call time. A handler panic is caught and surfaced as
    /// `eventbus:handler-error`, except when the failing topic already is
    /// that one, in which case it is swallowed with a local log line to
    /// avoid infinite recursion.
    pub fn emit(&self, name: &str, payload: Value) {
        let topic = self.topic(name);
        let snapshot: Vec<Listener> = {
            let mut listeners = topic.listeners.lock();
            let snapshot: Vec<_> = listeners
                .iter()
                .map(|l| Listener { id: l.id, handler: l.handler.clone(), once: l.once })
                .collect();
            listeners.retain(|l| !l.once);
            snapshot
        };

        for listener in snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                (listener.handler)(&payload);
            }));
            if let Err(panic) = result {
                let message = panic_message(&panic);
                if name == "eventbus:handler-error" {
                    tracing::error!(error = %message, "handler-error listener itself panicked");
                } else {
                    self.emit(
                        "eventbus:handler-error",
                        serde_json::json!({ "topic": name, "error": message }),
                    );
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn handlers_registered_before_emit_observe_it() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.on("x", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit("x", Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_registered_during_emit_only_affects_later_emits() {
        let bus = Arc::new(EventBus::default());
        let b2 = bus.clone();
        let registered = Arc::new(AtomicUsize::new(0));
        let r2 = registered.clone();
        bus.on("x", move |_| {
            b2.on("x", move |_| {
                r2.fetch_add(1, Ordering::SeqCst);
            });
        });
        bus.emit("x", Value::Null);
        assert_eq!(registered.load(Ordering::SeqCst), 0);
        bus.emit("x", Value::Null);
        assert_eq!(registered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn one_handler_failing_does_not_stop_the_rest() {
        let bus = EventBus::default();
        let ran = Arc::new(AtomicUsize::new(0));
        bus.on("x", |_| panic!("boom"));
        let r = ran.clone();
        bus.on("x", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit("x", Value::Null);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn once_handler_fires_a_single_time() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.once("x", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.emit("x", Value::Null);
        bus.emit("x", Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exceeding_max_listeners_still_registers() {
        let bus = EventBus::new(2);
        for _ in 0..5 {
            bus.on("x", |_| {});
        }
        assert_eq!(bus.listener_count("x"), 5);
    }
}
