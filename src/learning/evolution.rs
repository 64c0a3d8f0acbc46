//! C9: evolution tracker (§4.9). Records file-change events, derives
//! quality-metric trends via simple linear regression over recorded
//! snapshots, and groups repeated change shapes into `EvolutionPattern`s once
//! they recur often enough to be more than noise.

use crate::config::knobs::EvolutionConfig;
use crate::model::{EvolutionEvent, EvolutionPattern, EvolutionPatternType, QualityMetrics, Timespan};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub struct EvolutionTracker {
    config: EvolutionConfig,
    events: RwLock<Vec<EvolutionEvent>>,
    quality_snapshots: RwLock<Vec<QualityMetrics>>,
    patterns: RwLock<HashMap<String, EvolutionPattern>>,
}

impl EvolutionTracker {
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            events: RwLock::new(Vec::new()),
            quality_snapshots: RwLock::new(Vec::new()),
            patterns: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, event: EvolutionEvent) {
        self.detect_pattern(&event);
        self.events.write().push(event);
    }

    pub fn record_quality_metrics(&self, metrics: QualityMetrics) {
        self.quality_snapshots.write().push(metrics);
    }

    /// Groups same-file-same-kind changes into a named pattern once the
    /// group recurs `min_occurrences` times within `max_pattern_age_days`.
    fn detect_pattern(&self, event: &EvolutionEvent) {
        let group_key = format!("{:?}:{}", event.kind, event.file);
        let mut events = self.events.write();
        let occurrences = events.iter().filter(|e| format!("{:?}:{}", e.kind, e.file) == group_key).count() as u32 + 1;
        drop(events);

        if occurrences < self.config.min_occurrences {
            return;
        }

        let kind = classify(event);
        let mut patterns = self.patterns.write();
        let pattern = patterns.entry(group_key.clone()).or_insert_with(|| EvolutionPattern {
            id: group_key.clone(),
            kind,
            name: format!("{:?} on {}", event.kind, event.file),
            description: String::new(),
            frequency: 0,
            confidence: self.config.min_confidence,
            examples: Vec::new(),
            characteristics: crate::model::EvolutionCharacteristics {
                typical_files: vec![event.file.clone()],
                typical_operations: vec![format!("{:?}", event.kind)],
                timespan: Timespan::default(),
                files_impact: event.impact.files_affected,
                symbols_impact: event.impact.symbols_affected,
            },
            detected_at: event.timestamp,
            last_seen: event.timestamp,
        });
        pattern.frequency = occurrences;
        pattern.last_seen = event.timestamp;
        pattern.confidence = (pattern.confidence + 0.05).min(1.0);
    }

    pub fn patterns(&self) -> Vec<EvolutionPattern> {
        self.patterns.read().values().cloned().collect()
    }

    /// Ordinary least squares over `(index, maintainability index)` pairs;
    /// used to project whether code health is trending up or down.
    pub fn maintainability_trend(&self) -> Option<Trend> {
        let snapshots = self.quality_snapshots.read();
        linear_regression(
            &snapshots.iter().enumerate().map(|(i, s)| (i as f64, s.maintainability.index)).collect::<Vec<_>>(),
        )
    }

    pub fn generate_report(&self) -> EvolutionReport {
        EvolutionReport {
            total_events: self.events.read().len(),
            patterns: self.patterns(),
            maintainability_trend: self.maintainability_trend(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvolutionReport {
    pub total_events: usize,
    pub patterns: Vec<EvolutionPattern>,
    pub maintainability_trend: Option<Trend>,
}

fn classify(event: &EvolutionEvent) -> EvolutionPatternType {
    use crate::model::EvolutionEventType::*;
    match event.kind {
        SignatureChanged | SymbolRenamed => EvolutionPatternType::Refactoring,
        DependencyAdded | DependencyRemoved => EvolutionPatternType::Migration,
        SymbolAdded | FileCreated => EvolutionPatternType::Growth,
        SymbolRemoved | FileDeleted => EvolutionPatternType::Cleanup,
        FileRenamed => EvolutionPatternType::Architectural,
    }
}

fn linear_regression(points: &[(f64, f64)]) -> Option<Trend> {
    let n = points.len() as f64;
    if points.len() < 2 {
        return None;
    }
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(Trend { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvolutionContext, EvolutionEventType, EvolutionImpact, EvolutionMetadata};

    fn change_event(file: &str, timestamp: i64) -> EvolutionEvent {
        EvolutionEvent {
            id: uuid::Uuid::new_v4().to_string(),
            kind: EvolutionEventType::SignatureChanged,
            timestamp,
            file: file.to_string(),
            before: None,
            after: None,
            context: EvolutionContext::default(),
            impact: EvolutionImpact::default(),
            metadata: EvolutionMetadata::default(),
        }
    }

    #[test]
    fn repeated_changes_to_same_file_become_a_pattern() {
        let tracker = EvolutionTracker::new(EvolutionConfig { min_occurrences: 2, ..EvolutionConfig::default() });
        tracker.record(change_event("a.ts", 1));
        assert!(tracker.patterns().is_empty());
        tracker.record(change_event("a.ts", 2));
        assert_eq!(tracker.patterns().len(), 1);
    }

    #[test]
    fn maintainability_trend_detects_upward_slope() {
        let tracker = EvolutionTracker::new(EvolutionConfig::default());
        for i in 0..5 {
            let mut metrics = QualityMetrics::default();
            metrics.maintainability.index = 50.0 + i as f64 * 2.0;
            tracker.record_quality_metrics(metrics);
        }
        let trend = tracker.maintainability_trend().unwrap();
        assert!(trend.slope > 0.0);
    }
}
