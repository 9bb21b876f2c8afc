//! Concept candidate filtering and knowledge acceptance checks.
//!
//! # Responsibility
//! - Turn noisy extraction output into a short, typed concept list.
//! - Judge whether generated knowledge is usable for a topic.
//!
//! # Invariants
//! - Output keeps input order and holds at most `MAX_CONCEPTS` entries.
//! - No two outputs share (lowercase name, type).

use crate::model::concept::{Concept, ConceptCandidate, ConceptType};
use crate::model::knowledge::ConceptKnowledge;
use log::debug;
use std::collections::HashSet;

pub const CONFIDENCE_THRESHOLD: f32 = 0.75;
pub const ALIGNMENT_THRESHOLD: f32 = 0.25;
pub const MAX_CONCEPTS: usize = 12;
const MAX_NAME_TOKENS: usize = 4;

const REJECT_PHRASES: [&str; 5] = [
    "in computer science",
    "this article",
    "the following",
    "such as",
    "is a type of",
];

/// Labels extractors emit that all mean "this names a thing".
const DEFINITION_ALIASES: [&str; 4] = ["Concept", "Entity", "Structure", "Data"];

/// Rule that rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConceptRejection {
    LowConfidence,
    OffTopic,
    RejectPhrase,
    TooManyTokens,
    UnknownType,
}

impl ConceptRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::OffTopic => "off_topic",
            Self::RejectPhrase => "reject_phrase",
            Self::TooManyTokens => "too_many_tokens",
            Self::UnknownType => "unknown_type",
        }
    }
}

/// Filters, relabels and dedupes extraction candidates for `topic`.
pub fn validate_concepts(candidates: &[ConceptCandidate], topic: &str) -> Vec<Concept> {
    let mut seen = HashSet::new();
    let mut concepts = Vec::new();

    for candidate in candidates {
        let concept = match check_candidate(candidate, topic) {
            Ok(concept) => concept,
            Err(rule) => {
                debug!(
                    "event=concept_rejected module=validator concept=\"{}\" rule={}",
                    candidate.name.trim(),
                    rule.as_str()
                );
                continue;
            }
        };

        if seen.insert((concept.name.to_lowercase(), concept.kind)) {
            concepts.push(concept);
        }
    }

    concepts.truncate(MAX_CONCEPTS);
    concepts
}

/// Applies each rule in order and returns the first one that fails.
pub fn check_candidate(
    candidate: &ConceptCandidate,
    topic: &str,
) -> Result<Concept, ConceptRejection> {
    let name = candidate.name.trim();
    if candidate.confidence < CONFIDENCE_THRESHOLD {
        return Err(ConceptRejection::LowConfidence);
    }
    if topic_alignment_score(name, topic) < ALIGNMENT_THRESHOLD {
        return Err(ConceptRejection::OffTopic);
    }
    let lower = name.to_lowercase();
    if REJECT_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return Err(ConceptRejection::RejectPhrase);
    }
    if name.split_whitespace().count() > MAX_NAME_TOKENS {
        return Err(ConceptRejection::TooManyTokens);
    }
    let kind = relabel_type(&candidate.kind).ok_or(ConceptRejection::UnknownType)?;
    Ok(Concept::new(name, kind))
}

/// 1.0 on containment either way, else the share of concept tokens that
/// also occur in the topic.
pub fn topic_alignment_score(concept: &str, topic: &str) -> f32 {
    let concept = concept.to_lowercase();
    let topic = topic.to_lowercase();
    if topic.contains(&concept) || concept.contains(&topic) {
        return 1.0;
    }

    let concept_tokens: HashSet<&str> = concept.split_whitespace().collect();
    if concept_tokens.is_empty() {
        return 0.0;
    }
    let topic_tokens: HashSet<&str> = topic.split_whitespace().collect();
    let shared = concept_tokens.intersection(&topic_tokens).count();
    shared as f32 / concept_tokens.len() as f32
}

/// Maps an extractor label onto a learning role.
pub fn relabel_type(label: &str) -> Option<ConceptType> {
    let label = label.trim();
    if DEFINITION_ALIASES.contains(&label) {
        return Some(ConceptType::Definition);
    }
    ConceptType::parse(label)
}

/// The topic's own concept must be a `Definition`, and the record must be
/// dense.
pub fn knowledge_is_acceptable(knowledge: &ConceptKnowledge, topic: &str) -> bool {
    if knowledge.concept.to_lowercase() == topic.trim().to_lowercase()
        && knowledge.concept_type() != ConceptType::Definition
    {
        return false;
    }
    knowledge.knowledge.is_dense()
}
