//! C6: the L1-L5 layer pipeline (§4.6). Each layer gets a fixed time budget;
//! a layer that cannot answer within budget abstains rather than blocking
//! the rest of the pipeline. Results merge in layer order, with the first
//! authoritative result winning and any partial results accumulating as
//! supporting evidence.

use crate::request::CoreRequest;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum LayerOutcome {
    /// A complete, trusted answer; later layers are skipped.
    Authoritative(serde_json::Value),
    /// A partial answer that may be refined by a later layer.
    Partial(serde_json::Value),
    /// The layer had nothing to contribute for this request.
    Abstain,
}

#[async_trait]
pub trait Layer: Send + Sync {
    fn name(&self) -> &'static str;
    fn budget(&self) -> Duration;
    async fn run(&self, request: &CoreRequest) -> LayerOutcome;
}

macro_rules! budget_layer {
    ($struct_name:ident, $layer_name:literal, $budget_ms:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl Layer for $struct_name {
            fn name(&self) -> &'static str {
                $layer_name
            }

            fn budget(&self) -> Duration {
                Duration::from_millis($budget_ms)
            }

            async fn run(&self, _request: &CoreRequest) -> LayerOutcome {
                LayerOutcome::Abstain
            }
        }
    };
}

// Budgets per §4.6: exact-match lookup, full analysis, pattern application,
// learned-suggestion ranking, and cross-file context gathering respectively.
budget_layer!(ExactMatchLayer, "L1-exact-match", 5);
budget_layer!(FullAnalysisLayer, "L2-full-analysis", 50);
budget_layer!(PatternApplicationLayer, "L3-pattern-application", 10);
budget_layer!(LearnedSuggestionLayer, "L4-learned-suggestion", 10);
budget_layer!(CrossFileContextLayer, "L5-cross-file-context", 20);

#[derive(Debug, Clone)]
pub struct LayerRunResult {
    pub layer: &'static str,
    pub duration_ms: u64,
    pub authoritative: bool,
    pub error: Option<String>,
}

pub struct LayerManager {
    layers: Vec<Box<dyn Layer>>,
}

impl Default for LayerManager {
    fn default() -> Self {
        Self {
            layers: vec![
                Box::new(ExactMatchLayer),
                Box::new(FullAnalysisLayer),
                Box::new(PatternApplicationLayer),
                Box::new(LearnedSuggestionLayer),
                Box::new(CrossFileContextLayer),
            ],
        }
    }
}

impl LayerManager {
    pub fn with_layers(layers: Vec<Box<dyn Layer>>) -> Self {
        Self { layers }
    }

    /// Runs each layer in order under its own budget. Stops at the first
    /// authoritative result; accumulates partial results and abstentions
    /// otherwise. A layer that exceeds its budget abstains rather than
    /// failing the whole request (§4.6).
    pub async fn dispatch(&self, request: &CoreRequest) -> (Option<serde_json::Value>, Vec<LayerRunResult>) {
        let mut attribution = Vec::with_capacity(self.layers.len());
        let mut partials = Vec::new();

        for layer in &self.layers {
            let start = std::time::Instant::now();
            let outcome = tokio::time::timeout(layer.budget(), layer.run(request)).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(LayerOutcome::Authoritative(value)) => {
                    attribution.push(LayerRunResult {
                        layer: layer.name(),
                        duration_ms,
                        authoritative: true,
                        error: None,
                    });
                    return (Some(merge_partials(value, partials)), attribution);
                }
                Ok(LayerOutcome::Partial(value)) => {
                    attribution.push(LayerRunResult {
                        layer: layer.name(),
                        duration_ms,
                        authoritative: false,
                        error: None,
                    });
                    partials.push(value);
                }
                Ok(LayerOutcome::Abstain) => {
                    attribution.push(LayerRunResult {
                        layer: layer.name(),
                        duration_ms,
                        authoritative: false,
                        error: None,
                    });
                }
                Err(_) => {
                    attribution.push(LayerRunResult {
                        layer: layer.name(),
                        duration_ms,
                        authoritative: false,
                        error: Some("layer exceeded its time budget".to_string()),
                    });
                }
            }
        }

        if partials.is_empty() {
            (None, attribution)
        } else {
            (Some(serde_json::Value::Array(partials)), attribution)
        }
    }
}

fn merge_partials(authoritative: serde_json::Value, partials: Vec<serde_json::Value>) -> serde_json::Value {
    if partials.is_empty() {
        return authoritative;
    }
    serde_json::json!({ "result": authoritative, "supporting": partials })
}
