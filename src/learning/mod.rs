//! C8-C11: the continuous-learning substrate built on top of the analyzer
//! core. Each component owns its own state; `LearningOrchestrator` is the
//! only thing that sees all three.

pub mod evolution;
pub mod feedback;
pub mod orchestrator;
pub mod team;

pub use evolution::{EvolutionReport, EvolutionTracker, Trend};
pub use feedback::{FeedbackInsight, FeedbackLoop, PatternFeedbackStats};
pub use orchestrator::{ComponentHealth, LearnOperation, LearningOrchestrator};
pub use team::TeamKnowledge;
