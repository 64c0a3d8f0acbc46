//! Core request shapes (§6) and the request fingerprint (§3) that keys the
//! cache and the single-flight registry. These are the only shapes a
//! protocol adapter needs to translate into and out of; the analyzer core
//! never sees a wire format.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edit {
    pub uri: String,
    pub range: Range,
    pub new_text: String,
}

/// The operation name a fingerprint is keyed on; matches the core request
/// shapes in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FindDefinition,
    FindReferences,
    Rename,
    SuggestRefactoring,
    Completion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreRequest {
    pub operation: Operation,
    pub identifier: Option<String>,
    pub uri: String,
    pub position: Option<Position>,
    pub include_declaration: Option<bool>,
    pub new_name: Option<String>,
    pub prefix: Option<String>,
    /// Additional options that affect the result and must therefore be part
    /// of the fingerprint; kept sorted so that fingerprinting is stable.
    pub options: Vec<(String, String)>,
}

impl CoreRequest {
    pub fn new(operation: Operation, uri: impl Into<String>) -> Self {
        Self {
            operation,
            identifier: None,
            uri: uri.into(),
            position: None,
            include_declaration: None,
            new_name: None,
            prefix: None,
            options: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }
}

/// Stable identifier for a request: equal fingerprints must yield equal
/// canonical results within a single logical workspace revision (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn compute(request: &CoreRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", request.operation).as_bytes());
        hasher.update(b"\0");
        hasher.update(request.identifier.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"\0");
        hasher.update(request.uri.as_bytes());
        hasher.update(b"\0");
        if let Some(p) = request.position {
            hasher.update(format!("{}:{}", p.line, p.character).as_bytes());
        }
        hasher.update(b"\0");
        hasher.update(request.new_name.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"\0");
        hasher.update(request.prefix.as_deref().unwrap_or("").as_bytes());

        let mut options = request.options.clone();
        options.sort();
        for (k, v) in &options {
            hasher.update(b"\0");
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
        }

        Fingerprint(hex::encode(hasher.finalize()))
    }
}

/// Which layers (§4.6) contributed to a response, in execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerAttribution {
    pub layer: &'static str,
    pub duration_ms: u64,
    pub authoritative: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreResponse<T> {
    pub data: T,
    pub cache_hit: bool,
    pub duration_ms: u64,
    pub layer_attribution: Vec<LayerAttribution>,
}

impl<T> CoreResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data, cache_hit: false, duration_ms: 0, layer_attribution: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChangeType {
    Created,
    Modified,
    Deleted,
    Renamed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_requests_produce_equal_fingerprints() {
        let a = CoreRequest::new(Operation::FindDefinition, "file:///a.ts")
            .with_identifier("foo")
            .with_position(Position { line: 10, character: 3 });
        let b = CoreRequest::new(Operation::FindDefinition, "file:///a.ts")
            .with_identifier("foo")
            .with_position(Position { line: 10, character: 3 });
        assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }

    #[test]
    fn differing_position_changes_fingerprint() {
        let a = CoreRequest::new(Operation::FindDefinition, "file:///a.ts")
            .with_identifier("foo")
            .with_position(Position { line: 10, character: 3 });
        let b = CoreRequest::new(Operation::FindDefinition, "file:///a.ts")
            .with_identifier("foo")
            .with_position(Position { line: 11, character: 3 });
        assert_ne!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }

    #[test]
    fn option_order_does_not_affect_fingerprint() {
        let a = CoreRequest::new(Operation::Completion, "file:///a.ts")
            .with_option("z", "1")
            .with_option("a", "2");
        let b = CoreRequest::new(Operation::Completion, "file:///a.ts")
            .with_option("a", "2")
            .with_option("z", "1");
        assert_eq!(Fingerprint::compute(&a), Fingerprint::compute(&b));
    }
}
