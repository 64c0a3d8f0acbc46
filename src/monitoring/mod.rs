//! C4: sliding-window performance and error tracking (§4.4). One global
//! window plus one per layer, each bounded to the last 1000 samples so older
//! activity ages out without an unbounded allocation.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

const WINDOW_CAPACITY: usize = 1000;
const MAX_RECENT_ERRORS: usize = 100;

#[derive(Debug, Clone, Default)]
struct Window {
    durations_ms: VecDeque<u64>,
    cache_hits: u64,
    cache_misses: u64,
    errors: u64,
}

impl Window {
    fn record_duration(&mut self, ms: u64) {
        if self.durations_ms.len() >= WINDOW_CAPACITY {
            self.durations_ms.pop_front();
        }
        self.durations_ms.push_back(ms);
    }
}

#[derive(Debug, Clone)]
pub struct RecordedError {
    pub source: String,
    pub message: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceSummary {
    pub count: usize,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
    pub cache_hit_rate: f64,
    pub error_count: u64,
}

pub struct MonitoringService {
    global: RwLock<Window>,
    per_layer: RwLock<HashMap<&'static str, Window>>,
    recent_errors: RwLock<VecDeque<RecordedError>>,
}

impl Default for MonitoringService {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoringService {
    pub fn new() -> Self {
        Self {
            global: RwLock::new(Window::default()),
            per_layer: RwLock::new(HashMap::new()),
            recent_errors: RwLock::new(VecDeque::new()),
        }
    }

    pub fn record_performance(&self, layer: Option<&'static str>, duration_ms: u64) {
        self.global.write().record_duration(duration_ms);
        if let Some(layer) = layer {
            self.per_layer.write().entry(layer).or_default().record_duration(duration_ms);
        }
    }

    pub fn record_cache_hit(&self, layer: Option<&'static str>) {
        self.global.write().cache_hits += 1;
        if let Some(layer) = layer {
            self.per_layer.write().entry(layer).or_default().cache_hits += 1;
        }
    }

    pub fn record_cache_miss(&self, layer: Option<&'static str>) {
        self.global.write().cache_misses += 1;
        if let Some(layer) = layer {
            self.per_layer.write().entry(layer).or_default().cache_misses += 1;
        }
    }

    /// Records an error against the window and appends it to the bounded,
    /// FIFO-trimmed recent-errors list used for diagnostics.
    pub fn record_error(&self, source: &str, message: impl Into<String>, layer: Option<&'static str>) {
        self.global.write().errors += 1;
        if let Some(layer) = layer {
            self.per_layer.write().entry(layer).or_default().errors += 1;
        }
        let mut errors = self.recent_errors.write();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.pop_front();
        }
        errors.push_back(RecordedError {
            source: source.to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp(),
        });
    }

    pub fn summary(&self) -> PerformanceSummary {
        summarize(&self.global.read())
    }

    pub fn layer_summary(&self, layer: &str) -> Option<PerformanceSummary> {
        self.per_layer.read().get(layer).map(summarize)
    }

    pub fn recent_errors(&self) -> Vec<RecordedError> {
        self.recent_errors.read().iter().cloned().collect()
    }
}

/// Percentile via copy-sort-index: sort ascending, index by
/// `ceil(p * len) - 1` clamped into range (§4.4).
fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p * sorted.len() as f64).ceil() as usize).saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

fn summarize(window: &Window) -> PerformanceSummary {
    let mut sorted: Vec<u64> = window.durations_ms.iter().copied().collect();
    sorted.sort_unstable();
    let total_cache = window.cache_hits + window.cache_misses;
    PerformanceSummary {
        count: sorted.len(),
        p50_ms: percentile(&sorted, 0.50),
        p95_ms: percentile(&sorted, 0.95),
        p99_ms: percentile(&sorted, 0.99),
        cache_hit_rate: if total_cache == 0 { 0.0 } else { window.cache_hits as f64 / total_cache as f64 },
        error_count: window.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentiles_match_copy_sort_index_rule() {
        let svc = MonitoringService::new();
        for ms in [10, 20, 30, 40, 50, 60, 70, 80, 90, 100] {
            svc.record_performance(None, ms);
        }
        let summary = svc.summary();
        assert_eq!(summary.p50_ms, 50);
        assert_eq!(summary.p95_ms, 100);
    }

    #[test]
    fn window_caps_at_1000_samples() {
        let svc = MonitoringService::new();
        for ms in 0..1500u64 {
            svc.record_performance(None, ms);
        }
        assert_eq!(svc.summary().count, WINDOW_CAPACITY);
    }

    #[test]
    fn recent_errors_are_bounded_and_fifo() {
        let svc = MonitoringService::new();
        for i in 0..150 {
            svc.record_error("test", format!("error {i}"), None);
        }
        let errors = svc.recent_errors();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors.first().unwrap().message, "error 50");
    }
}
