//! Learning atom domain model.
//!
//! # Responsibility
//! - Define atom roles, plan items, generator drafts and feed records.
//! - Provide the structural checks storage enforces before writes.
//!
//! # Invariants
//! - `order` is assigned only by curation or reorder repair.
//! - A persisted feed has `order` values exactly `1..=len`.
//! - `difficulty` is always `easy` for generated atoms.

use crate::model::concept::ConceptType;
use crate::text::{word_count, Text};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of one pipeline run, recorded alongside persisted feeds.
pub type RunId = Uuid;

pub const DEFAULT_DIFFICULTY: &str = "easy";
const MIN_READ_TIME_SEC: u32 = 4;
const MAX_READ_TIME_SEC: u32 = 10;

/// Pedagogical role of an atom.
///
/// Unlisted roles coming back from a model are kept as `Other` so they can
/// still be curated with default limits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AtomType {
    Explanation,
    MentalModel,
    Example,
    KeyPoints,
    Pitfall,
    WhyItMatters,
    QuickCheck,
    Steps,
    EdgeCases,
    Intuition,
    Comparison,
    WhyItHappens,
    Impact,
    Prevention,
    RealWorldUse,
    WhySuitable,
    Rule,
    Consequence,
    Other(String),
}

impl AtomType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Explanation => "explanation",
            Self::MentalModel => "mental_model",
            Self::Example => "example",
            Self::KeyPoints => "key_points",
            Self::Pitfall => "pitfall",
            Self::WhyItMatters => "why_it_matters",
            Self::QuickCheck => "quick_check",
            Self::Steps => "steps",
            Self::EdgeCases => "edge_cases",
            Self::Intuition => "intuition",
            Self::Comparison => "comparison",
            Self::WhyItHappens => "why_it_happens",
            Self::Impact => "impact",
            Self::Prevention => "prevention",
            Self::RealWorldUse => "real_world_use",
            Self::WhySuitable => "why_suitable",
            Self::Rule => "rule",
            Self::Consequence => "consequence",
            Self::Other(label) => label.as_str(),
        }
    }

    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "explanation" => Self::Explanation,
            "mental_model" => Self::MentalModel,
            "example" => Self::Example,
            "key_points" => Self::KeyPoints,
            "pitfall" => Self::Pitfall,
            "why_it_matters" => Self::WhyItMatters,
            "quick_check" => Self::QuickCheck,
            "steps" => Self::Steps,
            "edge_cases" => Self::EdgeCases,
            "intuition" => Self::Intuition,
            "comparison" => Self::Comparison,
            "why_it_happens" => Self::WhyItHappens,
            "impact" => Self::Impact,
            "prevention" => Self::Prevention,
            "real_world_use" => Self::RealWorldUse,
            "why_suitable" => Self::WhySuitable,
            "rule" => Self::Rule,
            "consequence" => Self::Consequence,
            other => Self::Other(other.to_string()),
        }
    }

    /// Quiz atoms get answer-leak stripping and the question-mark rule.
    pub fn is_quiz(&self) -> bool {
        matches!(self, Self::QuickCheck)
    }
}

impl From<String> for AtomType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<AtomType> for String {
    fn from(value: AtomType) -> Self {
        value.as_str().to_string()
    }
}

impl Display for AtomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request descriptor for one planned atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomPlanItem {
    pub concept: String,
    pub concept_type: ConceptType,
    pub atom_type: AtomType,
}

/// Generator output for one atom before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomDraft {
    pub atom_type: AtomType,
    pub content: Text,
}

/// Structural defects that make an atom unfit for storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomValidationError {
    EmptyTopic,
    EmptyConcept,
    /// Feed `order` values are not exactly `1..=len` in sequence.
    OrderNotDense { position: usize, order: u32 },
}

impl Display for AtomValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTopic => write!(f, "atom topic must not be empty"),
            Self::EmptyConcept => write!(f, "atom concept must not be empty"),
            Self::OrderNotDense { position, order } => write!(
                f,
                "atom at position {position} has order {order}, expected {}",
                position + 1
            ),
        }
    }
}

impl Error for AtomValidationError {}

/// One unit of learning content in a topic feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub topic: String,
    pub concept: String,
    pub atom_type: AtomType,
    pub content: String,
    pub difficulty: String,
    pub estimated_read_time_sec: u32,
    /// Dense 1-based presentation rank; `0` until curation assigns it.
    #[serde(default)]
    pub order: u32,
}

impl Atom {
    /// Creates an unordered atom with the default difficulty and a read time
    /// derived from `content`.
    pub fn new(
        topic: impl Into<String>,
        concept: impl Into<String>,
        atom_type: AtomType,
        content: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            topic: topic.into(),
            concept: concept.into(),
            estimated_read_time_sec: estimate_read_time(&content),
            atom_type,
            content,
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            order: 0,
        }
    }

    /// Validates identity fields required for persistence.
    pub fn validate(&self) -> Result<(), AtomValidationError> {
        if self.topic.trim().is_empty() {
            return Err(AtomValidationError::EmptyTopic);
        }
        if self.concept.trim().is_empty() {
            return Err(AtomValidationError::EmptyConcept);
        }
        Ok(())
    }
}

/// Ordered atom sequence for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomFeed {
    pub topic: String,
    pub atoms: Vec<Atom>,
}

impl AtomFeed {
    pub fn new(topic: impl Into<String>, atoms: Vec<Atom>) -> Self {
        Self {
            topic: topic.into(),
            atoms,
        }
    }

    /// Checks that `order` values run exactly `1..=len` in sequence.
    pub fn validate_order(&self) -> Result<(), AtomValidationError> {
        for (position, atom) in self.atoms.iter().enumerate() {
            if atom.order as usize != position + 1 {
                return Err(AtomValidationError::OrderNotDense {
                    position,
                    order: atom.order,
                });
            }
        }
        Ok(())
    }

    /// Rewrites `order` to the dense rank of each atom's current position.
    pub fn assign_dense_order(&mut self) {
        for (position, atom) in self.atoms.iter_mut().enumerate() {
            atom.order = (position + 1) as u32;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }
}

/// Reading time in seconds: a quarter second per word, clamped to 4..=10.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = word_count(content) as u32;
    (words / 4).clamp(MIN_READ_TIME_SEC, MAX_READ_TIME_SEC)
}

#[cfg(test)]
mod tests {
    use super::{estimate_read_time, Atom, AtomFeed, AtomType, AtomValidationError};

    #[test]
    fn atom_type_roundtrips_known_and_unlisted_labels() {
        assert_eq!(AtomType::parse("mental_model"), AtomType::MentalModel);
        assert_eq!(AtomType::MentalModel.as_str(), "mental_model");

        let other = AtomType::parse("fun_fact");
        assert_eq!(other, AtomType::Other("fun_fact".to_string()));
        assert_eq!(serde_json::to_value(&other).unwrap(), "fun_fact");
    }

    #[test]
    fn read_time_is_clamped() {
        assert_eq!(estimate_read_time("one two"), 4);
        assert_eq!(estimate_read_time(&"word ".repeat(24)), 6);
        assert_eq!(estimate_read_time(&"word ".repeat(200)), 10);
    }

    #[test]
    fn dense_order_validation_reports_first_gap() {
        let mut feed = AtomFeed::new(
            "Stack",
            vec![
                Atom::new("Stack", "Push", AtomType::Explanation, "Push adds an item."),
                Atom::new("Stack", "Push", AtomType::QuickCheck, "Does push add an item?"),
            ],
        );
        assert_eq!(
            feed.validate_order(),
            Err(AtomValidationError::OrderNotDense {
                position: 0,
                order: 0
            })
        );

        feed.assign_dense_order();
        assert_eq!(feed.validate_order(), Ok(()));
    }

    #[test]
    fn atom_validate_rejects_blank_identity() {
        let atom = Atom::new("Stack", " ", AtomType::Example, "content here");
        assert_eq!(atom.validate(), Err(AtomValidationError::EmptyConcept));
    }
}
