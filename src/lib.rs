//! Analyzer core and continuous-learning substrate for a multi-language
//! code-intelligence service.
//!
//! `SharedServices` wires the database, cache, and monitoring services
//! together; `AnalyzerCore` runs a request through the L1-L5 layer pipeline
//! behind a fingerprint-keyed cache and single-flight coalescing;
//! `LearningOrchestrator` fans typed learn operations out to the feedback,
//! evolution, and team-knowledge components.

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod event_bus;
pub mod layers;
pub mod learning;
pub mod model;
pub mod monitoring;
pub mod request;
pub mod shared_services;

pub use analyzer::AnalyzerCore;
pub use cache::CacheService;
pub use config::{ConfigLoader, CoreConfig};
pub use db::DatabaseService;
pub use error::{Error, Result};
pub use event_bus::EventBus;
pub use layers::LayerManager;
pub use learning::{EvolutionTracker, FeedbackLoop, LearningOrchestrator, TeamKnowledge};
pub use monitoring::MonitoringService;
pub use request::{CoreRequest, CoreResponse, Fingerprint, Operation};
pub use shared_services::SharedServices;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
