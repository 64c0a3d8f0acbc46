//! C8: feedback loop (§4.8). Every recorded event nudges its pattern's
//! confidence by a fixed rule tied to the feedback kind; `insights()` only
//! surfaces a pattern once enough samples have accrued to be meaningful.

use crate::config::knobs::FeedbackConfig;
use crate::model::{FeedbackEvent, FeedbackType};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct PatternFeedbackStats {
    pub accept: u32,
    pub reject: u32,
    pub modify: u32,
    pub ignore: u32,
}

impl PatternFeedbackStats {
    pub fn total(&self) -> u32 {
        self.accept + self.reject + self.modify + self.ignore
    }

    /// Acceptance ratio in `[0, 1]`; `0.0` with no feedback yet.
    pub fn acceptance_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.accept as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackInsight {
    pub pattern_id: String,
    pub acceptance_rate: f64,
    pub sample_size: u32,
    pub recommendation: &'static str,
}

pub struct FeedbackLoop {
    config: FeedbackConfig,
    events: RwLock<Vec<FeedbackEvent>>,
    stats: RwLock<HashMap<String, PatternFeedbackStats>>,
    /// Derived confidence per pattern. Non-authoritative: the persisted
    /// `Pattern.confidence` is the source of truth across restarts; this is
    /// the running estimate a caller applies back via `confidence_for`.
    confidence: RwLock<HashMap<String, f64>>,
}

impl FeedbackLoop {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            config,
            events: RwLock::new(Vec::new()),
            stats: RwLock::new(HashMap::new()),
            confidence: RwLock::new(HashMap::new()),
        }
    }

    /// Records the event, and, if it carries a `pattern_id`, applies the
    /// feedback-kind-specific confidence delta immediately (§4.8):
    /// accept `+min(0.1, (1-c)*0.2)`, reject `-min(0.2, c*0.3)`,
    /// modify `-min(0.05, c*0.1)`, ignore `-min(0.02, c*0.05)`.
    pub fn record(&self, event: FeedbackEvent) {
        if let Some(pattern_id) = event.pattern_id.clone() {
            let mut stats = self.stats.write();
            let entry = stats.entry(pattern_id.clone()).or_default();
            match event.kind {
                FeedbackType::Accept => entry.accept += 1,
                FeedbackType::Reject => entry.reject += 1,
                FeedbackType::Modify => entry.modify += 1,
                FeedbackType::Ignore => entry.ignore += 1,
            }
            drop(stats);

            let mut confidence = self.confidence.write();
            let c = *confidence.entry(pattern_id).or_insert(event.context.confidence);
            let delta = match event.kind {
                FeedbackType::Accept => (1.0 - c) * 0.2,
                FeedbackType::Reject => -(c * 0.3).min(0.2),
                FeedbackType::Modify => -(c * 0.1).min(0.05),
                FeedbackType::Ignore => -(c * 0.05).min(0.02),
            };
            let delta = if event.kind == FeedbackType::Accept { delta.min(0.1) } else { delta };
            let new_c = (c + delta).clamp(0.0, 1.0);
            confidence.insert(event.pattern_id.clone().unwrap(), new_c);
        }
        self.events.write().push(event);
    }

    /// Current derived confidence for `pattern_id`, or `None` if no
    /// feedback has been recorded against it yet.
    pub fn confidence_for(&self, pattern_id: &str) -> Option<f64> {
        self.confidence.read().get(pattern_id).copied()
    }

    pub fn stats_for(&self, pattern_id: &str) -> PatternFeedbackStats {
        self.stats.read().get(pattern_id).cloned().unwrap_or_default()
    }

    /// Patterns whose acceptance rate has crossed the weak or strong
    /// threshold, with at least `min_to_learn` samples (§4.8).
    pub fn insights(&self) -> Vec<FeedbackInsight> {
        self.stats
            .read()
            .iter()
            .filter(|(_, s)| s.total() >= self.config.min_to_learn)
            .map(|(id, s)| {
                let rate = s.acceptance_rate();
                let recommendation = if rate < self.config.weak_threshold {
                    "pattern_weakness"
                } else if rate > self.config.strong_threshold {
                    "pattern_strength"
                } else {
                    "hold"
                };
                FeedbackInsight {
                    pattern_id: id.clone(),
                    acceptance_rate: rate,
                    sample_size: s.total(),
                    recommendation,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeedbackContext, FeedbackMetadata};

    fn event(pattern_id: &str, kind: FeedbackType, confidence: f64) -> FeedbackEvent {
        FeedbackEvent {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            suggestion_id: "s1".to_string(),
            pattern_id: Some(pattern_id.to_string()),
            original: "foo".to_string(),
            final_value: None,
            context: FeedbackContext { file: "a.ts".to_string(), operation: "rename".to_string(), timestamp: 0, confidence },
            metadata: FeedbackMetadata::default(),
        }
    }

    #[test]
    fn five_accepts_at_half_confidence_each_add_a_tenth() {
        let loop_ = FeedbackLoop::new(FeedbackConfig::default());
        for _ in 0..5 {
            loop_.record(event("p1", FeedbackType::Accept, 0.5));
        }
        // Each accept recomputes from the *running* derived confidence, so
        // after the first step c=0.6, the delta narrows: 0.5 -> 0.6 -> 0.68 -> ...
        assert!(loop_.confidence_for("p1").unwrap() > 0.5);
        let stats = loop_.stats_for("p1");
        assert_eq!(stats.accept, 5);
        assert_eq!(stats.total(), 5);
        assert_eq!(stats.acceptance_rate(), 1.0);
    }

    #[test]
    fn insight_reports_pattern_strength_once_min_samples_reached() {
        let config = FeedbackConfig { min_to_learn: 5, ..FeedbackConfig::default() };
        let loop_ = FeedbackLoop::new(config);
        for _ in 0..5 {
            loop_.record(event("p1", FeedbackType::Accept, 0.5));
        }
        let insights = loop_.insights();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].recommendation, "pattern_strength");
    }

    #[test]
    fn reject_lowers_confidence() {
        let loop_ = FeedbackLoop::new(FeedbackConfig::default());
        loop_.record(event("p1", FeedbackType::Reject, 0.5));
        assert!(loop_.confidence_for("p1").unwrap() < 0.5);
    }
}
