//! Individual config knob structs, one per component, matching the
//! enumeration in §6.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    Memory,
    Remote,
    Hybrid,
}

impl Default for CacheStrategy {
    fn default() -> Self {
        CacheStrategy::Memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheMemoryConfig {
    pub max_entries: usize,
    pub ttl_seconds: u64,
}

impl Default for CacheMemoryConfig {
    fn default() -> Self {
        Self { max_entries: 10_000, ttl_seconds: 300 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheRemoteConfig {
    pub host: Option<String>,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub strategy: CacheStrategy,
    pub memory: CacheMemoryConfig,
    pub remote: Option<CacheRemoteConfig>,
    /// Health threshold: unhealthy if hit rate falls below this once
    /// `hits + misses` exceeds `min_requests_for_health`.
    pub unhealthy_hit_rate: f64,
    pub min_requests_for_health: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            strategy: CacheStrategy::default(),
            memory: CacheMemoryConfig::default(),
            remote: None,
            unhealthy_hit_rate: 0.1,
            min_requests_for_health: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
    pub enable_wal: bool,
    pub enable_foreign_keys: bool,
    pub pool_acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "codeintel.db".to_string(),
            max_connections: 10,
            busy_timeout_ms: 5_000,
            enable_wal: true,
            enable_foreign_keys: true,
            pool_acquire_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub metrics_interval_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self { enabled: true, metrics_interval_ms: 60_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub enabled_components: Vec<String>,
    pub max_learning_time_ms: u64,
    pub max_pipeline_time_ms: u64,
    pub max_concurrent_operations: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled_components: vec![
                "feedback".to_string(),
                "evolution".to_string(),
                "team".to_string(),
            ],
            max_learning_time_ms: 5_000,
            max_pipeline_time_ms: 15_000,
            max_concurrent_operations: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub min_to_learn: u32,
    pub weak_threshold: f64,
    pub strong_threshold: f64,
    pub similarity_threshold: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_to_learn: 5,
            weak_threshold: 0.3,
            strong_threshold: 0.8,
            similarity_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub min_occurrences: u32,
    pub min_confidence: f64,
    pub max_pattern_age_days: u32,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self { min_occurrences: 3, min_confidence: 0.6, max_pattern_age_days: 365 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamConfig {
    pub min_validators: u32,
    pub min_approval_score: f64,
    pub adoption_threshold: u32,
}

impl Default for TeamConfig {
    fn default() -> Self {
        Self { min_validators: 2, min_approval_score: 3.0, adoption_threshold: 3 }
    }
}
