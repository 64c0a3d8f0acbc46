//! Persisted data model (§3): concepts, patterns, feedback, evolution, team
//! knowledge, and quality metrics. These types are the row shapes the
//! database service reads and writes; in-memory caches hold non-authoritative
//! copies keyed by the same ids.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opaque, self-describing document used for `metadata`, `evidence`, and
/// `examples` fields. Stored as UTF-8 text (JSON) at the persistence
/// boundary; treated as an opaque value everywhere else.
pub type OpaqueDoc = serde_json::Value;

fn now_epoch() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptFlags {
    pub interface: bool,
    pub abstract_: bool,
    pub deprecated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub canonical_name: String,
    pub signature_fingerprint: Option<String>,
    pub confidence: f64,
    pub category: Option<String>,
    pub flags: ConceptFlags,
    pub created_at: i64,
    pub updated_at: i64,
    pub metadata: OpaqueDoc,
}

impl Concept {
    pub fn new(id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        let now = now_epoch();
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            signature_fingerprint: None,
            confidence: 0.5,
            category: None,
            flags: ConceptFlags::default(),
            created_at: now,
            updated_at: now,
            metadata: serde_json::json!({}),
        }
    }

    /// Clamp confidence into `[0, 1]` and bump `updated_at`.
    pub fn set_confidence(&mut self, value: f64) {
        self.confidence = value.clamp(0.0, 1.0);
        self.updated_at = now_epoch();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRepresentation {
    pub concept_id: String,
    pub name: String,
    pub uri: String,
    pub range: Range,
    pub first_seen: i64,
    pub last_seen: i64,
    pub occurrences: u32,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptRelationship {
    pub source_concept_id: String,
    pub target_concept_id: String,
    pub relationship_type: String,
    pub confidence: f64,
    pub evidence: OpaqueDoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub from: String,
    pub to: String,
    pub confidence: f64,
    pub occurrences: u32,
    pub category: String,
    pub last_applied: Option<i64>,
    pub created_at: i64,
    pub examples: Vec<OpaqueDoc>,
}

impl Pattern {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            confidence: 0.5,
            occurrences: 0,
            category: category.into(),
            last_applied: None,
            created_at: now_epoch(),
            examples: Vec::new(),
        }
    }

    /// Move confidence toward a delta while keeping it in `[0, 1]`.
    pub fn adjust_confidence(&mut self, delta: f64) {
        self.confidence = (self.confidence + delta).clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Accept,
    Reject,
    Modify,
    Ignore,
}

impl FeedbackType {
    /// Invalid wire values fall back to `accept` per §4.8's sanitization rule.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "reject" => FeedbackType::Reject,
            "modify" => FeedbackType::Modify,
            "ignore" => FeedbackType::Ignore,
            _ => FeedbackType::Accept,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackContext {
    pub file: String,
    pub operation: String,
    pub timestamp: i64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackMetadata {
    pub source: Option<String>,
    pub time_to_decision_ms: Option<u64>,
    pub keystrokes: Option<u32>,
    pub alternatives_shown: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub suggestion_id: String,
    pub pattern_id: Option<String>,
    pub original: String,
    #[serde(rename = "final")]
    pub final_value: Option<String>,
    pub context: FeedbackContext,
    pub metadata: FeedbackMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionEventType {
    FileCreated,
    FileDeleted,
    FileRenamed,
    SymbolAdded,
    SymbolRemoved,
    SymbolRenamed,
    SignatureChanged,
    DependencyAdded,
    DependencyRemoved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    pub path: String,
    pub content: Option<String>,
    pub signature: Option<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionContext {
    pub commit: Option<String>,
    pub author: Option<String>,
    pub branch: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionImpact {
    pub files_affected: u32,
    pub symbols_affected: u32,
    pub tests_affected: u32,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionMetadata {
    pub diff_size: Option<u32>,
    pub cycle_time_ms: Option<u64>,
    pub rollback: Option<bool>,
    pub automated: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EvolutionEventType,
    pub timestamp: i64,
    pub file: String,
    pub before: Option<EvolutionSnapshot>,
    pub after: Option<EvolutionSnapshot>,
    pub context: EvolutionContext,
    pub impact: EvolutionImpact,
    pub metadata: EvolutionMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionPatternType {
    Refactoring,
    Migration,
    Growth,
    Cleanup,
    Architectural,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timespan {
    pub min_seconds: i64,
    pub max_seconds: i64,
    pub avg_seconds: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionCharacteristics {
    pub typical_files: Vec<String>,
    pub typical_operations: Vec<String>,
    pub timespan: Timespan,
    pub files_impact: u32,
    pub symbols_impact: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionPattern {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EvolutionPatternType,
    pub name: String,
    pub description: String,
    pub frequency: u32,
    pub confidence: f64,
    pub examples: Vec<String>,
    pub characteristics: EvolutionCharacteristics,
    pub detected_at: i64,
    pub last_seen: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Developer,
    Senior,
    Lead,
    Architect,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharingLevel {
    Private,
    Team,
    Public,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPreferences {
    pub sharing_level: SharingLevel,
    pub receive_suggestions: bool,
    pub auto_sync: bool,
}

impl Default for MemberPreferences {
    fn default() -> Self {
        Self { sharing_level: SharingLevel::Team, receive_suggestions: true, auto_sync: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: TeamRole,
    pub expertise: HashSet<String>,
    pub joined_at: i64,
    pub last_active: i64,
    pub preferences: MemberPreferences,
}

impl TeamMember {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: TeamRole) -> Self {
        let now = now_epoch();
        Self {
            id: id.into(),
            name: name.into(),
            role,
            expertise: HashSet::new(),
            joined_at: now,
            last_active: now,
            preferences: MemberPreferences::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedPatternStatus {
    Pending,
    Validated,
    Adopted,
    Rejected,
    Deprecated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionOutcome {
    Success,
    Failure,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub validator_id: String,
    pub approved: bool,
    pub score: f64,
    pub feedback: Option<String>,
    pub criteria: Vec<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adoption {
    pub adopter_id: String,
    pub context: Option<String>,
    pub outcome: AdoptionOutcome,
    pub feedback: Option<String>,
    pub modifications: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedPatternMetrics {
    pub validation_count: u32,
    pub adoption_count: u32,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedPattern {
    pub id: String,
    pub pattern: Pattern,
    pub contributor_id: String,
    pub documentation: String,
    pub tags: HashSet<String>,
    pub status: SharedPatternStatus,
    pub validations: Vec<Validation>,
    pub adoptions: Vec<Adoption>,
    pub metrics: SharedPatternMetrics,
}

impl SharedPattern {
    pub fn new(id: impl Into<String>, pattern: Pattern, contributor_id: impl Into<String>, documentation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern,
            contributor_id: contributor_id.into(),
            documentation: documentation.into(),
            tags: HashSet::new(),
            status: SharedPatternStatus::Pending,
            validations: Vec::new(),
            adoptions: Vec::new(),
            metrics: SharedPatternMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub cyclomatic: f64,
    pub cognitive: f64,
    pub halstead: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicationMetrics {
    pub lines: u32,
    pub blocks: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyMetrics {
    pub internal: u32,
    pub external: u32,
    pub circular: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestCoverageMetrics {
    pub lines: f64,
    pub branches: f64,
    pub functions: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintainabilityMetrics {
    pub index: f64,
    pub debt_hours: f64,
    pub hotspots: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub timestamp: i64,
    pub complexity: ComplexityMetrics,
    pub duplication: DuplicationMetrics,
    pub dependencies: DependencyMetrics,
    pub test_coverage: TestCoverageMetrics,
    pub maintainability: MaintainabilityMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_confidence_clamps_to_unit_interval() {
        let mut c = Concept::new("c1", "Foo");
        c.set_confidence(1.5);
        assert_eq!(c.confidence, 1.0);
        c.set_confidence(-0.3);
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn pattern_confidence_never_leaves_unit_interval() {
        let mut p = Pattern::new("p1", "a", "b", "refactor");
        p.adjust_confidence(10.0);
        assert_eq!(p.confidence, 1.0);
        p.adjust_confidence(-10.0);
        assert_eq!(p.confidence, 0.0);
    }

    #[test]
    fn feedback_type_falls_back_to_accept_on_unknown_value() {
        assert_eq!(FeedbackType::parse_lenient("bogus"), FeedbackType::Accept);
        assert_eq!(FeedbackType::parse_lenient("reject"), FeedbackType::Reject);
    }
}
