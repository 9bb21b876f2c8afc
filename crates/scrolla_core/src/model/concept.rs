//! Concept records produced by extraction and validation.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Closed set of learning roles a concept can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptType {
    Definition,
    Principle,
    Operation,
    Complexity,
    Application,
    Pitfall,
}

impl ConceptType {
    pub const ALL: [ConceptType; 6] = [
        Self::Definition,
        Self::Principle,
        Self::Operation,
        Self::Complexity,
        Self::Application,
        Self::Pitfall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Definition => "Definition",
            Self::Principle => "Principle",
            Self::Operation => "Operation",
            Self::Complexity => "Complexity",
            Self::Application => "Application",
            Self::Pitfall => "Pitfall",
        }
    }

    /// Parses an exact type label. Relabeling of ad-hoc labels lives in the
    /// concept validator.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == label.trim())
    }
}

impl Display for ConceptType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw extraction output before validation.
///
/// `kind` stays an unvalidated label because extractors emit ad-hoc types
/// such as `Entity` that are relabeled later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptCandidate {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl ConceptCandidate {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, confidence: f32) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            confidence,
        }
    }
}

fn default_confidence() -> f32 {
    1.0
}

/// Validated concept with a closed learning role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Serialized as `concept` to match the persisted semantic file shape.
    #[serde(rename = "concept")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ConceptType,
}

impl Concept {
    pub fn new(name: impl Into<String>, kind: ConceptType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConceptCandidate, ConceptType};

    #[test]
    fn parse_accepts_only_exact_labels() {
        assert_eq!(ConceptType::parse("Operation"), Some(ConceptType::Operation));
        assert_eq!(ConceptType::parse(" Pitfall "), Some(ConceptType::Pitfall));
        assert_eq!(ConceptType::parse("operation"), None);
        assert_eq!(ConceptType::parse("Entity"), None);
    }

    #[test]
    fn candidate_confidence_defaults_to_one() {
        let candidate: ConceptCandidate =
            serde_json::from_str(r#"{"name": "Push", "type": "Operation"}"#).unwrap();
        assert_eq!(candidate.confidence, 1.0);
        assert_eq!(candidate.kind, "Operation");
    }
}
