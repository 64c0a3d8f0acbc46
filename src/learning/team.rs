//! C10: team knowledge sharing (§4.10). `SharedPattern` moves through a
//! pending -> validated -> adopted state machine; a knowledge graph links
//! team members to the patterns they authored, validated, or adopted so
//! recommendations can walk shared expertise.

use crate::config::knobs::TeamConfig;
use crate::error::{Error, Result};
use crate::model::{Adoption, Pattern, SharedPattern, SharedPatternStatus, TeamMember, Validation};
use parking_lot::RwLock;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Member,
    Pattern,
}

pub struct TeamKnowledge {
    config: TeamConfig,
    members: RwLock<HashMap<String, TeamMember>>,
    patterns: RwLock<HashMap<String, SharedPattern>>,
    graph: RwLock<UnGraph<(NodeKind, String), &'static str>>,
    nodes: RwLock<HashMap<String, NodeIndex>>,
}

impl TeamKnowledge {
    pub fn new(config: TeamConfig) -> Self {
        Self {
            config,
            members: RwLock::new(HashMap::new()),
            patterns: RwLock::new(HashMap::new()),
            graph: RwLock::new(UnGraph::new_undirected()),
            nodes: RwLock::new(HashMap::new()),
        }
    }

    fn node_for(&self, kind: NodeKind, id: &str) -> NodeIndex {
        let mut nodes = self.nodes.write();
        if let Some(idx) = nodes.get(id) {
            return *idx;
        }
        let idx = self.graph.write().add_node((kind, id.to_string()));
        nodes.insert(id.to_string(), idx);
        idx
    }

    pub fn register_member(&self, member: TeamMember) {
        self.node_for(NodeKind::Member, &member.id);
        self.members.write().insert(member.id.clone(), member);
    }

    pub fn share_pattern(&self, contributor_id: &str, pattern: Pattern, documentation: impl Into<String>) -> Result<String> {
        if !self.members.read().contains_key(contributor_id) {
            return Err(Error::InvalidInput(format!("unknown team member {contributor_id}")));
        }
        let shared = SharedPattern::new(uuid::Uuid::new_v4().to_string(), pattern, contributor_id, documentation);
        let id = shared.id.clone();
        let pattern_node = self.node_for(NodeKind::Pattern, &id);
        let contributor_node = self.node_for(NodeKind::Member, contributor_id);
        self.graph.write().add_edge(contributor_node, pattern_node, "authored");
        self.patterns.write().insert(id.clone(), shared);
        Ok(id)
    }

    /// Adds a validation and promotes the pattern to `Validated` once
    /// `min_validators` approvals with at least `min_approval_score` have
    /// accrued (§4.10).
    pub fn validate_pattern(&self, pattern_id: &str, validation: Validation) -> Result<()> {
        let validator_node = self.node_for(NodeKind::Member, &validation.validator_id);
        let pattern_node = self.node_for(NodeKind::Pattern, pattern_id);
        self.graph.write().add_edge(validator_node, pattern_node, "validated");

        let mut patterns = self.patterns.write();
        let shared = patterns.get_mut(pattern_id).ok_or_else(|| Error::InvalidInput("unknown pattern".to_string()))?;
        shared.validations.push(validation);
        shared.metrics.validation_count = shared.validations.len() as u32;

        let approvals = shared.validations.iter().filter(|v| v.approved && v.score >= self.config.min_approval_score).count() as u32;
        if shared.status == SharedPatternStatus::Pending && approvals >= self.config.min_validators {
            shared.status = SharedPatternStatus::Validated;
        }
        Ok(())
    }

    /// Records an adoption and promotes the pattern to `Adopted` once
    /// `adoption_threshold` successful adoptions have accrued.
    pub fn record_adoption(&self, pattern_id: &str, adoption: Adoption) -> Result<()> {
        let adopter_node = self.node_for(NodeKind::Member, &adoption.adopter_id);
        let pattern_node = self.node_for(NodeKind::Pattern, pattern_id);
        self.graph.write().add_edge(adopter_node, pattern_node, "adopted");

        let mut patterns = self.patterns.write();
        let shared = patterns.get_mut(pattern_id).ok_or_else(|| Error::InvalidInput("unknown pattern".to_string()))?;
        let is_success = adoption.outcome == crate::model::AdoptionOutcome::Success;
        shared.adoptions.push(adoption);
        shared.metrics.adoption_count = shared.adoptions.len() as u32;
        let successes = shared.adoptions.iter().filter(|a| a.outcome == crate::model::AdoptionOutcome::Success).count() as u32;
        shared.metrics.success_rate = successes as f64 / shared.metrics.adoption_count as f64;

        if is_success && shared.status == SharedPatternStatus::Validated && successes >= self.config.adoption_threshold {
            shared.status = SharedPatternStatus::Adopted;
        }
        Ok(())
    }

    pub fn pattern(&self, id: &str) -> Option<SharedPattern> {
        self.patterns.read().get(id).cloned()
    }

    /// Patterns authored or validated by members sharing at least one
    /// expertise tag with `member_id`, excluding patterns already adopted
    /// by that member.
    pub fn recommend(&self, member_id: &str) -> Vec<SharedPattern> {
        let members = self.members.read();
        let Some(member) = members.get(member_id) else { return Vec::new() };
        self.patterns
            .read()
            .values()
            .filter(|p| p.contributor_id != member_id)
            .filter(|p| p.status != SharedPatternStatus::Rejected && p.status != SharedPatternStatus::Deprecated)
            .filter(|p| !p.adoptions.iter().any(|a| a.adopter_id == member_id))
            .filter(|p| {
                members
                    .get(&p.contributor_id)
                    .map(|contributor| !contributor.expertise.is_disjoint(&member.expertise))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    pub fn export(&self) -> Vec<SharedPattern> {
        self.patterns.read().values().cloned().collect()
    }

    pub fn import(&self, patterns: Vec<SharedPattern>) {
        let mut store = self.patterns.write();
        for pattern in patterns {
            let node = self.node_for(NodeKind::Pattern, &pattern.id);
            let contributor_node = self.node_for(NodeKind::Member, &pattern.contributor_id);
            self.graph.write().add_edge(contributor_node, node, "authored");
            store.insert(pattern.id.clone(), pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdoptionOutcome, TeamRole};

    fn member(id: &str) -> TeamMember {
        let mut m = TeamMember::new(id, id, TeamRole::Developer);
        m.expertise.insert("rust".to_string());
        m
    }

    #[test]
    fn pattern_promotes_through_pending_validated_adopted() {
        let knowledge = TeamKnowledge::new(TeamConfig { min_validators: 1, min_approval_score: 3.0, adoption_threshold: 1 });
        knowledge.register_member(member("alice"));
        knowledge.register_member(member("bob"));
        knowledge.register_member(member("carol"));

        let pattern_id = knowledge.share_pattern("alice", Pattern::new("p1", "a", "b", "refactor"), "docs").unwrap();
        assert_eq!(knowledge.pattern(&pattern_id).unwrap().status, SharedPatternStatus::Pending);

        knowledge
            .validate_pattern(
                &pattern_id,
                Validation { validator_id: "bob".to_string(), approved: true, score: 4.0, feedback: None, criteria: vec![], timestamp: 0 },
            )
            .unwrap();
        assert_eq!(knowledge.pattern(&pattern_id).unwrap().status, SharedPatternStatus::Validated);

        knowledge
            .record_adoption(
                &pattern_id,
                Adoption { adopter_id: "carol".to_string(), context: None, outcome: AdoptionOutcome::Success, feedback: None, modifications: None, timestamp: 0 },
            )
            .unwrap();
        assert_eq!(knowledge.pattern(&pattern_id).unwrap().status, SharedPatternStatus::Adopted);
    }

    #[test]
    fn recommend_excludes_own_patterns_and_adopted_ones() {
        let knowledge = TeamKnowledge::new(TeamConfig::default());
        knowledge.register_member(member("alice"));
        knowledge.register_member(member("bob"));
        let pattern_id = knowledge.share_pattern("alice", Pattern::new("p1", "a", "b", "refactor"), "docs").unwrap();

        assert_eq!(knowledge.recommend("alice").len(), 0);
        assert_eq!(knowledge.recommend("bob").len(), 1);

        knowledge
            .record_adoption(
                &pattern_id,
                Adoption { adopter_id: "bob".to_string(), context: None, outcome: AdoptionOutcome::Success, feedback: None, modifications: None, timestamp: 0 },
            )
            .unwrap();
        assert_eq!(knowledge.recommend("bob").len(), 0);
    }
}
