//! C11: learning orchestrator (§4.11). Fans typed learn operations out to
//! `FeedbackLoop`, `EvolutionTracker`, and `TeamKnowledge` under a
//! concurrency cap; a request arriving at capacity fails fast rather than
//! queuing, since a stale learning update is worse than a dropped one.

use super::evolution::EvolutionTracker;
use super::feedback::FeedbackLoop;
use super::team::TeamKnowledge;
use crate::config::LearningConfig;
use crate::error::{Error, Result};
use crate::model::{EvolutionEvent, FeedbackEvent, QualityMetrics};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub enum LearnOperation {
    Feedback(FeedbackEvent),
    Evolution(EvolutionEvent),
    QualitySnapshot(QualityMetrics),
}

#[derive(Debug, Clone)]
pub struct ComponentHealth {
    pub feedback_events: usize,
    pub evolution_patterns: usize,
    pub team_patterns: usize,
}

pub struct LearningOrchestrator {
    config: LearningConfig,
    pub feedback: Arc<FeedbackLoop>,
    pub evolution: Arc<EvolutionTracker>,
    pub team: Arc<TeamKnowledge>,
    in_flight: AtomicUsize,
}

impl LearningOrchestrator {
    pub fn new(
        config: LearningConfig,
        feedback: Arc<FeedbackLoop>,
        evolution: Arc<EvolutionTracker>,
        team: Arc<TeamKnowledge>,
    ) -> Self {
        Self { config, feedback, evolution, team, in_flight: AtomicUsize::new(0) }
    }

    /// Dispatches one learn operation to its owning component. Fails fast
    /// with `CapacityExceeded` when `max_concurrent_operations` is already
    /// in flight, rather than queuing behind slower consumers.
    pub async fn learn(&self, operation: LearnOperation) -> Result<()> {
        let permit = self.acquire()?;
        let result = tokio::time::timeout(
            std::time::Duration::from_millis(self.config.max_learning_time_ms),
            self.dispatch(operation),
        )
        .await;
        drop(permit);

        match result {
            Ok(inner) => inner,
            Err(_) => Err(Error::Timeout(std::time::Duration::from_millis(self.config.max_learning_time_ms))),
        }
    }

    async fn dispatch(&self, operation: LearnOperation) -> Result<()> {
        match operation {
            LearnOperation::Feedback(event) => {
                if self.config.enabled_components.iter().any(|c| c == "feedback") {
                    self.feedback.record(event);
                }
                Ok(())
            }
            LearnOperation::Evolution(event) => {
                if self.config.enabled_components.iter().any(|c| c == "evolution") {
                    self.evolution.record(event);
                }
                Ok(())
            }
            LearnOperation::QualitySnapshot(metrics) => {
                if self.config.enabled_components.iter().any(|c| c == "evolution") {
                    self.evolution.record_quality_metrics(metrics);
                }
                Ok(())
            }
        }
    }

    fn acquire(&self) -> Result<InFlightPermit<'_>> {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        if previous >= self.config.max_concurrent_operations {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::CapacityExceeded("learning orchestrator concurrency cap reached".to_string()));
        }
        Ok(InFlightPermit { counter: &self.in_flight })
    }

    /// Runs a named sequence of learn operations within `max_pipeline_time_ms`.
    pub async fn run_pipeline(&self, _name: &str, operations: Vec<LearnOperation>) -> Result<()> {
        tokio::time::timeout(std::time::Duration::from_millis(self.config.max_pipeline_time_ms), async {
            for operation in operations {
                self.learn(operation).await?;
            }
            Ok(())
        })
        .await
        .map_err(|_| Error::Timeout(std::time::Duration::from_millis(self.config.max_pipeline_time_ms)))?
    }

    pub fn health(&self) -> ComponentHealth {
        ComponentHealth {
            feedback_events: self.feedback.insights().len(),
            evolution_patterns: self.evolution.patterns().len(),
            team_patterns: self.team.export().len(),
        }
    }
}

struct InFlightPermit<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightPermit<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::knobs::{EvolutionConfig, FeedbackConfig, TeamConfig};
    use crate::model::{FeedbackContext, FeedbackMetadata, FeedbackType};

    fn orchestrator(max_concurrent: usize) -> LearningOrchestrator {
        let config = LearningConfig { max_concurrent_operations: max_concurrent, ..LearningConfig::default() };
        LearningOrchestrator::new(
            config,
            Arc::new(FeedbackLoop::new(FeedbackConfig::default())),
            Arc::new(EvolutionTracker::new(EvolutionConfig::default())),
            Arc::new(TeamKnowledge::new(TeamConfig::default())),
        )
    }

    #[tokio::test]
    async fn feedback_operation_reaches_feedback_loop() {
        let orch = orchestrator(3);
        let event = FeedbackEvent {
            id: "1".to_string(),
            kind: FeedbackType::Accept,
            suggestion_id: "s".to_string(),
            pattern_id: Some("p1".to_string()),
            original: "x".to_string(),
            final_value: None,
            context: FeedbackContext { file: "a.ts".to_string(), operation: "rename".to_string(), timestamp: 0, confidence: 0.5 },
            metadata: FeedbackMetadata::default(),
        };
        orch.learn(LearnOperation::Feedback(event)).await.unwrap();
        assert_eq!(orch.feedback.stats_for("p1").accept, 1);
    }

    #[tokio::test]
    async fn acquire_fails_fast_at_capacity() {
        let orch = Arc::new(orchestrator(1));
        let permit = orch.acquire().unwrap();
        let second = orch.acquire();
        assert!(matches!(second, Err(Error::CapacityExceeded(_))));
        drop(permit);
        assert!(orch.acquire().is_ok());
    }
}
